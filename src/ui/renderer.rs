/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The field is drawn in field units scaled to terminal rows, so the game
/// plays the same on any terminal height; only the resolution changes.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::rules::{HitGrade, Rules};
use crate::sim::world::{PhaseKind, RunState, Snapshot};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap between rows matches the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn fill_rect(&mut self, r: Rect, bg: Color) {
        for y in r.y..r.y + r.h {
            for x in r.x..r.x + r.w {
                self.set(x, y, Cell::from_char(' ', Color::White, bg));
            }
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Centered on `mid`, keeping whatever background is already there.
    fn put_centered_over(&mut self, mid: usize, y: usize, s: &str, fg: Color) {
        let x0 = mid.saturating_sub(s.chars().count() / 2);
        for (i, ch) in s.chars().enumerate() {
            let bg = self.get(x0 + i, y).bg;
            self.set(x0 + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Layout ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn contains(&self, col: u16, row: u16) -> bool {
        let (c, r) = (col as usize, row as usize);
        c >= self.x && c < self.x + self.w && r >= self.y && r < self.y + self.h
    }
}

const HUD_ROW: usize = 0;
const FIELD_ROW: usize = 2;
/// HUD + gap above the field, lane labels + gap + help below it.
const RESERVED_ROWS: usize = FIELD_ROW + 3;
const MIN_FIELD_ROWS: usize = 6;
const MIN_LANE_W: usize = 4;
const MAX_LANE_W: usize = 12;

/// Where the field sits on screen for a given terminal size.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Layout {
    /// Left border column; lanes start one to the right.
    x: usize,
    y: usize,
    /// Width of each lane including its left separator.
    lane_w: usize,
    lanes: usize,
    rows: usize,
    field_height: i32,
}

impl Layout {
    fn compute(term_w: usize, term_h: usize, rules: &Rules) -> Self {
        let lanes = rules.column_count.max(1);
        let lane_w = (term_w.saturating_sub(1) / lanes).clamp(MIN_LANE_W, MAX_LANE_W);
        let width = lanes * lane_w + 1;
        Layout {
            x: term_w.saturating_sub(width) / 2,
            y: FIELD_ROW,
            lane_w,
            lanes,
            rows: term_h.saturating_sub(RESERVED_ROWS).max(MIN_FIELD_ROWS),
            field_height: rules.field_height,
        }
    }

    fn width(&self) -> usize {
        self.lanes * self.lane_w + 1
    }

    fn lane_x(&self, lane: usize) -> usize {
        self.x + lane * self.lane_w
    }

    fn lane_mid(&self, lane: usize) -> usize {
        self.lane_x(lane) + (self.lane_w + 1) / 2
    }

    /// Field-relative row for a y coordinate in field units (may be out of range).
    fn row_of(&self, y: i32) -> i64 {
        (y as i64 * self.rows as i64).div_euclid(self.field_height.max(1) as i64)
    }

    /// Rows covered by the span `[top, top + height)`, clipped to the field.
    fn rows_of_span(&self, top: i32, height: i32) -> std::ops::Range<usize> {
        let a = self.row_of(top).clamp(0, self.rows as i64) as usize;
        let b = self.row_of(top + height).clamp(0, self.rows as i64) as usize;
        a..b
    }
}

/// The menu's start button, centered below the title.
pub fn menu_button_rect(term_w: usize, term_h: usize) -> Rect {
    let w = 20;
    let h = 3;
    let y = (term_h / 2).max(9);
    Rect { x: term_w.saturating_sub(w) / 2, y, w, h }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const FIELD_BG: Color = Color::Rgb { r: 236, g: 236, b: 228 };
const HELD_BG: Color = Color::Rgb { r: 190, g: 215, b: 250 };
const TILE_BG: Color = Color::Rgb { r: 24, g: 24, b: 28 };
const SEP_FG: Color = Color::Rgb { r: 170, g: 170, b: 160 };
const LINE_FG: Color = Color::Rgb { r: 230, g: 50, b: 60 };
const ACCENT: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GOOD: Color = Color::Rgb { r: 80, g: 255, b: 80 };

const LANE_COLORS: [Color; 8] = [
    Color::Rgb { r: 230, g: 80, b: 80 },
    Color::Rgb { r: 240, g: 170, b: 50 },
    Color::Rgb { r: 90, g: 190, b: 90 },
    Color::Rgb { r: 70, g: 140, b: 230 },
    Color::Rgb { r: 170, g: 90, b: 210 },
    Color::Rgb { r: 60, g: 190, b: 190 },
    Color::Rgb { r: 220, g: 100, b: 170 },
    Color::Rgb { r: 150, g: 150, b: 60 },
];

/// Ticks a hit judgement stays on screen.
const FLASH_TICKS: u64 = 25;

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<PhaseKind>,
    /// Key label per column, drawn under each lane.
    labels: Vec<String>,
    /// Frames drawn so far; drives blinking text.
    frame: u64,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new(labels: Vec<String>) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            labels,
            frame: 0,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Does a click at this cell land on the menu's start button?
    pub fn start_button_hit(&self, col: u16, row: u16) -> bool {
        menu_button_rect(self.term_w, self.term_h).contains(col, row)
    }

    pub fn render(&mut self, snap: &Snapshot) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for clean transition
        if self.last_phase != Some(snap.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(snap.phase);
        }

        self.frame = self.frame.wrapping_add(1);
        self.compose(snap);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, snap: &Snapshot) {
        self.front.clear();
        let layout = Layout::compute(self.term_w, self.term_h, snap.rules);

        match snap.phase {
            PhaseKind::Menu => self.compose_menu(snap),
            PhaseKind::Countdown => self.compose_countdown(snap, &layout),
            PhaseKind::Playing => self.compose_play(snap, &layout),
            PhaseKind::GameOver => {
                self.compose_play(snap, &layout);
                self.compose_game_over(snap);
            }
        }
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Screens ──

    fn compose_menu(&mut self, snap: &Snapshot) {
        let title = [
            r" ___  _                    _____  _  _        ",
            r"| _ \(_) __ _  _ _   ___  |_   _|(_)| | ___  ___",
            r"|  _/| |/ _` || ' \ / _ \   | |  | || |/ -_)(_-<",
            r"|_|  |_|\__,_||_||_|\___/   |_|  |_||_|\___|/__/",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(1 + i, line, ACCENT, Color::Reset);
        }

        let btn = menu_button_rect(self.term_w, self.term_h);
        self.front.fill_rect(btn, Color::Rgb { r: 40, g: 120, b: 60 });
        let label = "▶  START";
        let lx = btn.x + btn.w.saturating_sub(label.chars().count()) / 2;
        self.front.put_str(lx, btn.y + btn.h / 2, label, Color::White, Color::Rgb { r: 40, g: 120, b: 60 });

        let keys = self.labels.join(" ");
        let help = [
            "Tiles fall toward the red line.".to_string(),
            format!("Press {keys} to hit the tile in that lane"),
            "while it crosses the line. Dead center scores double.".to_string(),
            "Let one slip past and the run is over.".to_string(),
        ];
        let base = btn.y + btn.h + 1;
        for (i, line) in help.iter().enumerate() {
            self.front.put_centered(base + i, line, Color::White, Color::Reset);
        }

        if snap.best_score > 0 {
            let best = format!("Best this session: {}", snap.best_score);
            self.front.put_centered(base + help.len() + 1, &best, GOOD, Color::Reset);
        }

        if (self.frame / 30) % 2 == 0 {
            let hint_row = self.term_h.saturating_sub(2);
            self.front.put_centered(hint_row, "Press ENTER or click START  ·  ESC to quit", Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_countdown(&mut self, snap: &Snapshot, layout: &Layout) {
        self.compose_hud(snap);
        self.compose_field(snap, layout, None);

        let remaining = snap.countdown.unwrap_or(0);
        let mid_y = layout.y + layout.rows / 2;
        let mid_x = layout.x + layout.width() / 2;
        let (text, color) = if remaining > 0 {
            (remaining.to_string(), Color::Black)
        } else {
            ("GO!".to_string(), LINE_FG)
        };
        self.front.put_centered_over(mid_x, mid_y, &text, color);

        if remaining <= 1 {
            for lane in 0..layout.lanes {
                let label = self.labels.get(lane).map(String::as_str).unwrap_or("?");
                self.front.put_centered_over(layout.lane_mid(lane), mid_y + 2, label, Color::DarkGrey);
            }
        }
    }

    fn compose_play(&mut self, snap: &Snapshot, layout: &Layout) {
        self.compose_hud(snap);
        self.compose_field(snap, layout, snap.run);

        let help_row = layout.y + layout.rows + 2;
        if help_row < self.front.height {
            let help = format!(" {}: hit lane  │  Ctrl+C: quit", self.labels.join("/"));
            self.front.put_str(0, help_row, &help, Color::DarkGrey, Color::Reset);
        }

        let Some(run) = snap.run else { return };
        if let Some((grade, at)) = snap.last_hit {
            if run.ticks.saturating_sub(at) < FLASH_TICKS {
                let color = match grade {
                    HitGrade::Perfect => ACCENT,
                    HitGrade::Normal => GOOD,
                };
                let row = layout.y + layout.row_of(snap.rules.score_line).max(1) as usize - 1;
                let mid_x = layout.x + layout.width() / 2;
                self.front.put_centered_over(mid_x, row, grade.label(), color);
            }
        }
    }

    fn compose_hud(&mut self, snap: &Snapshot) {
        let hud = format!(
            " Score:{:<6}  Speed:{:<3}  Best:{:<6}",
            snap.score(), snap.speed(), snap.best_score.max(snap.score()),
        );
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::from_char(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    /// Lanes, held highlight, tiles, the scoring line and lane labels.
    fn compose_field(&mut self, snap: &Snapshot, layout: &Layout, run: Option<&RunState>) {
        let rules = snap.rules;
        let line_row = layout.row_of(rules.score_line).clamp(0, layout.rows as i64 - 1) as usize;

        for r in 0..layout.rows {
            let y = layout.y + r;
            for lane in 0..layout.lanes {
                let x0 = layout.lane_x(lane);
                let held = snap.held.get(lane).copied().unwrap_or(false);
                let bg = if held && r >= line_row { HELD_BG } else { FIELD_BG };
                self.front.set(x0, y, Cell::from_char('│', SEP_FG, FIELD_BG));
                for x in x0 + 1..x0 + layout.lane_w {
                    self.front.set(x, y, Cell::from_char(' ', Color::Black, bg));
                }
            }
            self.front.set(layout.x + layout.width() - 1, y, Cell::from_char('│', SEP_FG, FIELD_BG));
        }

        if let Some(run) = run {
            for (_, top, tile) in run.visible_tiles(rules) {
                let rows = layout.rows_of_span(top, rules.tile_height);
                if rows.is_empty() { continue; }
                let x0 = layout.lane_x(tile.column);
                let bg = if tile.resolved {
                    LANE_COLORS[tile.column % LANE_COLORS.len()]
                } else {
                    TILE_BG
                };
                for r in rows.clone() {
                    for x in x0 + 1..x0 + layout.lane_w {
                        self.front.set(x, layout.y + r, Cell::from_char(' ', Color::White, bg));
                    }
                }
                if tile.resolved {
                    let mid_row = layout.y + (rows.start + rows.end) / 2;
                    self.front.put_centered_over(layout.lane_mid(tile.column), mid_row, "✓", Color::White);
                }
            }
        }

        // Scoring line drawn over everything, keeping the cell backgrounds
        let y = layout.y + line_row;
        for x in layout.x..layout.x + layout.width() {
            let bg = self.front.get(x, y).bg;
            self.front.set(x, y, Cell::from_char('━', LINE_FG, bg));
        }

        let label_row = layout.y + layout.rows;
        for lane in 0..layout.lanes {
            let label = self.labels.get(lane).map(String::as_str).unwrap_or("?");
            let held = snap.held.get(lane).copied().unwrap_or(false);
            let fg = if held { ACCENT } else { Color::DarkGrey };
            let x = layout.lane_mid(lane).saturating_sub(label.chars().count() / 2);
            self.front.put_str(x, label_row, label, fg, Color::Reset);
        }
    }

    fn compose_game_over(&mut self, snap: &Snapshot) {
        let Some(run) = snap.run else { return };
        let box_w = 34_usize.min(self.term_w);
        let box_h = 11_usize.min(self.term_h);
        let r = Rect {
            x: self.term_w.saturating_sub(box_w) / 2,
            y: self.term_h.saturating_sub(box_h) / 2,
            w: box_w,
            h: box_h,
        };
        let bg = Color::Rgb { r: 40, g: 20, b: 25 };
        self.front.fill_rect(r, bg);

        let mid = r.x + r.w / 2;
        let lines: [(String, Color); 8] = [
            ("✕  GAME OVER  ✕".to_string(), LINE_FG),
            (String::new(), Color::White),
            (format!("Score   {}", run.score), Color::White),
            (format!("Tiles {}  ({} normal)", run.tiles_spawned, run.normal_hits), Color::White),
            (format!("Hits {}  ({} perfect)", run.hits(), run.perfect_hits), Color::White),
            (format!("Best    {}", snap.best_score), GOOD),
            (String::new(), Color::White),
            ("ENTER / click: menu".to_string(), ACCENT),
        ];
        for (i, (text, fg)) in lines.iter().enumerate() {
            if text.is_empty() { continue; }
            self.front.put_centered_over(mid, r.y + 2 + i, text, *fg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_fits_lanes_and_rows() {
        let rules = Rules::default();
        let l = Layout::compute(80, 24, &rules);
        assert_eq!(l.lanes, 4);
        assert_eq!(l.lane_w, MAX_LANE_W);
        assert_eq!(l.width(), 49);
        assert_eq!(l.x, (80 - 49) / 2);
        assert_eq!(l.rows, 19);

        let narrow = Layout::compute(10, 8, &rules);
        assert_eq!(narrow.lane_w, MIN_LANE_W);
        assert_eq!(narrow.rows, MIN_FIELD_ROWS);
    }

    #[test]
    fn field_units_scale_to_rows() {
        let rules = Rules::default();
        let l = Layout { x: 0, y: FIELD_ROW, lane_w: 8, lanes: 4, rows: 20, field_height: rules.field_height };
        assert_eq!(l.row_of(0), 0);
        assert_eq!(l.row_of(540), 18);
        assert_eq!(l.row_of(-150), -5);
        assert_eq!(l.rows_of_span(0, 150), 0..5);
        assert_eq!(l.rows_of_span(-100, 150), 0..1);
        assert_eq!(l.rows_of_span(550, 150), 18..20);
        assert!(l.rows_of_span(-300, 150).is_empty());
    }

    #[test]
    fn start_button_hit_test() {
        let r = menu_button_rect(80, 24);
        assert!(r.contains(r.x as u16, r.y as u16));
        assert!(r.contains((r.x + r.w - 1) as u16, (r.y + r.h - 1) as u16));
        assert!(!r.contains((r.x + r.w) as u16, r.y as u16));
        assert!(!r.contains(r.x as u16, (r.y - 1) as u16));
    }

    #[test]
    fn compose_play_draws_tiles_and_line() {
        let rules = Rules::default();
        let mut run = RunState::with_columns(&rules, &[2, 0], 450);
        run.tiles[1].resolve();
        let held = [true, false, false, false];
        let snap = Snapshot {
            phase: PhaseKind::Playing,
            rules: &rules,
            run: Some(&run),
            countdown: None,
            held: &held,
            best_score: 0,
            last_hit: None,
        };

        let mut r = Renderer::new(vec!["1".into(), "2".into(), "3".into(), "4".into()]);
        r.term_w = 80;
        r.term_h = 24;
        r.front.resize(80, 24);
        r.compose(&snap);

        let l = Layout::compute(80, 24, &rules);
        // 19 field rows: tile 0 (column 2) spans 450..600 → rows 14..19
        let cell = r.front.get(l.lane_x(2) + 2, l.y + 15);
        assert_eq!(cell.bg, TILE_BG);
        // tile 1 (column 0, resolved) spans 300..450 → rows 9..14
        let cell = r.front.get(l.lane_x(0) + 2, l.y + 10);
        assert_eq!(cell.bg, LANE_COLORS[0]);
        // scoring line at row 17 (540 * 19 / 600), drawn across the field
        let line = r.front.get(l.lane_x(1) + 2, l.y + 17);
        assert_eq!(line.as_str(), "━");
        // held lane tinted below the line
        let held_cell = r.front.get(l.lane_x(0) + 2, l.y + 18);
        assert_eq!(held_cell.bg, HELD_BG);
        // HUD
        let hud: String = (0..12).map(|x| r.front.get(x, HUD_ROW).as_str().to_string()).collect();
        assert_eq!(hud, " Score:0    ");
    }

    #[test]
    fn game_over_overlay_lists_run_stats() {
        let rules = Rules::default();
        let mut run = RunState::with_columns(&rules, &[0, 1, 2, 3, 0, 1, 2], 0);
        run.score = 7;
        run.perfect_hits = 2;
        run.normal_hits = 3;
        let held = [false; 4];
        let snap = Snapshot {
            phase: PhaseKind::GameOver,
            rules: &rules,
            run: Some(&run),
            countdown: None,
            held: &held,
            best_score: 12,
            last_hit: None,
        };

        let mut r = Renderer::new(vec!["1".into(), "2".into(), "3".into(), "4".into()]);
        r.term_w = 80;
        r.term_h = 24;
        r.front.resize(80, 24);
        r.compose(&snap);

        let screen: Vec<String> = (0..24)
            .map(|y| (0..80).map(|x| r.front.get(x, y).as_str().to_string()).collect())
            .collect();
        let shows = |text: &str| screen.iter().any(|row| row.contains(text));
        assert!(shows("Score   7"));
        assert!(shows("Tiles 7  (3 normal)"));
        assert!(shows("Hits 5  (2 perfect)"));
        assert!(shows("Best    12"));
    }
}
