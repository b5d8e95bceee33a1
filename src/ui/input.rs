/// Input state tracker.
///
/// Turns raw terminal events into game-level actions:
///   - column key down / up (for hits and the held-lane highlight)
///   - start / quit
///   - left mouse clicks (hit-tested against the menu button by the caller)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEventKind,
};

use crate::config::KeysConfig;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    ColumnDown(usize),
    ColumnUp(usize),
    Start,
    Quit,
    /// Left click at a terminal cell.
    Click { column: u16, row: u16 },
    /// Ctrl+C: leave from any screen.
    Interrupt,
}

/// Parse a key name from config (`"Enter"`, `"Space"`, `"q"`, `"F1"`, ...).
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    match name.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "space" => Some(KeyCode::Char(' ')),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "backspace" => Some(KeyCode::Backspace),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        s => s.strip_prefix('f')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=12).contains(n))
            .map(KeyCode::F),
    }
}

/// Key codes per action, resolved from `KeysConfig`.
#[derive(Clone, Debug)]
pub struct KeyMap {
    columns: Vec<KeyCode>,
    start: Vec<KeyCode>,
    quit: Vec<KeyCode>,
}

impl KeyMap {
    /// Unknown names are skipped; a column whose name doesn't parse
    /// simply has no key. Returns the names that failed to parse.
    pub fn from_config(cfg: &KeysConfig) -> (Self, Vec<String>) {
        fn parse_list(names: &[String], unknown: &mut Vec<String>) -> Vec<Option<KeyCode>> {
            names.iter().map(|n| {
                let code = parse_key(n);
                if code.is_none() { unknown.push(n.clone()); }
                code
            }).collect()
        }
        let mut unknown = Vec::new();
        let columns = parse_list(&cfg.columns, &mut unknown)
            .into_iter()
            .map(|c| c.unwrap_or(KeyCode::Null))
            .collect();
        let start = parse_list(&cfg.start, &mut unknown).into_iter().flatten().collect();
        let quit = parse_list(&cfg.quit, &mut unknown).into_iter().flatten().collect();
        (KeyMap { columns, start, quit }, unknown)
    }

    fn column_of(&self, code: KeyCode) -> Option<usize> {
        if code == KeyCode::Null { return None; }
        self.columns.iter().position(|&c| c == normalize(code))
    }

    fn is_start(&self, code: KeyCode) -> bool {
        self.start.contains(&code)
    }

    fn is_quit(&self, code: KeyCode) -> bool {
        self.quit.contains(&normalize(code))
    }
}

/// Shifted letters arrive as uppercase; bindings are written lowercase.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) if c.is_ascii_uppercase() => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

pub struct InputState {
    keys: KeyMap,

    /// Timestamp of last Press/Repeat event for each held column.
    last_active: HashMap<usize, Instant>,

    /// Actions decoded during the most recent `drain_events()` call.
    actions: Vec<Action>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new(keys: KeyMap) -> Self {
        InputState {
            keys,
            last_active: HashMap::with_capacity(8),
            actions: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and decode them into actions.
    /// Call this once per frame.
    pub fn drain_events(&mut self) -> &[Action] {
        self.actions.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.handle_event(ev, Instant::now()),
                Err(e) => {
                    log::warn!("terminal event read failed: {e}");
                    break;
                }
            }
        }

        self.expire(Instant::now());
        &self.actions
    }

    /// Is this column's key currently down?
    #[cfg(test)]
    pub fn is_held(&self, column: usize) -> bool {
        self.last_active.contains_key(&column)
    }

    // ── Internal ──

    fn handle_event(&mut self, ev: Event, now: Instant) {
        match ev {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.actions.push(Action::Click { column: m.column, row: m.row });
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.actions.push(Action::Interrupt);
            return;
        }

        let column = self.keys.column_of(key.code);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                if let Some(col) = column {
                    if self.last_active.remove(&col).is_some() {
                        self.actions.push(Action::ColumnUp(col));
                    }
                }
            }
            KeyEventKind::Release => {
                // Ignore release when enhancement not confirmed;
                // rely on timeout-based expiry instead
            }
            kind => {
                if let Some(col) = column {
                    let was_held = self.last_active.insert(col, now).is_some();
                    // Without releases a quick re-tap looks like a held key,
                    // so every Press counts as a new stroke.
                    let retap = kind == KeyEventKind::Press && !self.honor_release;
                    if !was_held || retap {
                        self.actions.push(Action::ColumnDown(col));
                    }
                    return;
                }
                // Auto-repeat must not re-fire start/quit
                if kind == KeyEventKind::Repeat { return; }
                if self.keys.is_start(key.code) {
                    self.actions.push(Action::Start);
                } else if self.keys.is_quit(key.code) {
                    self.actions.push(Action::Quit);
                }
            }
        }
    }

    /// Expire columns that have timed out (fallback for terminals without Release).
    fn expire(&mut self, now: Instant) {
        if self.honor_release { return; }
        let actions = &mut self.actions;
        self.last_active.retain(|&col, t| {
            let held = now.duration_since(*t) < HOLD_TIMEOUT;
            if !held { actions.push(Action::ColumnUp(col)); }
            held
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn keymap() -> KeyMap {
        let cfg = KeysConfig {
            columns: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            start: vec!["Enter".into(), "Space".into()],
            quit: vec!["Esc".into(), "q".into()],
        };
        KeyMap::from_config(&cfg).0
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn take(input: &mut InputState) -> Vec<Action> {
        std::mem::take(&mut input.actions)
    }

    #[test]
    fn parses_key_names() {
        assert_eq!(parse_key("Enter"), Some(KeyCode::Enter));
        assert_eq!(parse_key("space"), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key("Esc"), Some(KeyCode::Esc));
        assert_eq!(parse_key("q"), Some(KeyCode::Char('q')));
        assert_eq!(parse_key("3"), Some(KeyCode::Char('3')));
        assert_eq!(parse_key("F5"), Some(KeyCode::F(5)));
        assert_eq!(parse_key("F13"), None);
        assert_eq!(parse_key("Hyper"), None);
    }

    #[test]
    fn unknown_names_are_reported() {
        let cfg = KeysConfig {
            columns: vec!["1".into(), "Bogus".into()],
            start: vec!["Enter".into()],
            quit: vec!["Nope".into()],
        };
        let (map, unknown) = KeyMap::from_config(&cfg);
        assert_eq!(unknown, vec!["Bogus".to_string(), "Nope".to_string()]);
        assert_eq!(map.column_of(KeyCode::Char('1')), Some(0));
        assert_eq!(map.column_of(KeyCode::Null), None);
        assert!(map.quit.is_empty());
    }

    #[test]
    fn press_and_release_with_enhancement() {
        let mut input = InputState::new(keymap());
        input.honor_release = true;
        let t0 = Instant::now();

        input.handle_event(key(KeyCode::Char('2'), KeyEventKind::Press), t0);
        input.handle_event(key(KeyCode::Char('2'), KeyEventKind::Repeat), t0);
        assert_eq!(take(&mut input), vec![Action::ColumnDown(1)]);
        assert!(input.is_held(1));

        // no timeout expiry while releases are honored
        input.expire(t0 + Duration::from_secs(5));
        assert!(input.is_held(1));

        input.handle_event(key(KeyCode::Char('2'), KeyEventKind::Release), t0);
        assert_eq!(take(&mut input), vec![Action::ColumnUp(1)]);
        assert!(!input.is_held(1));
    }

    #[test]
    fn release_falls_back_to_timeout() {
        let mut input = InputState::new(keymap());
        let t0 = Instant::now();

        input.handle_event(key(KeyCode::Char('1'), KeyEventKind::Press), t0);
        input.handle_event(key(KeyCode::Char('1'), KeyEventKind::Release), t0);
        assert_eq!(take(&mut input), vec![Action::ColumnDown(0)]);
        assert!(input.is_held(0));

        input.expire(t0 + Duration::from_millis(100));
        assert!(take(&mut input).is_empty());

        input.expire(t0 + HOLD_TIMEOUT);
        assert_eq!(take(&mut input), vec![Action::ColumnUp(0)]);
        assert!(!input.is_held(0));
    }

    #[test]
    fn quick_retap_fires_again_without_release_events() {
        let mut input = InputState::new(keymap());
        let t0 = Instant::now();

        input.handle_event(key(KeyCode::Char('1'), KeyEventKind::Press), t0);
        input.expire(t0 + Duration::from_millis(60));
        input.handle_event(
            key(KeyCode::Char('1'), KeyEventKind::Press),
            t0 + Duration::from_millis(120),
        );
        let downs = take(&mut input)
            .into_iter()
            .filter(|a| *a == Action::ColumnDown(0))
            .count();
        assert_eq!(downs, 2);
        assert!(input.is_held(0));
    }

    #[test]
    fn held_key_does_not_refire_with_release_events() {
        let mut input = InputState::new(keymap());
        input.honor_release = true;
        let t0 = Instant::now();
        input.handle_event(key(KeyCode::Char('3'), KeyEventKind::Press), t0);
        input.handle_event(key(KeyCode::Char('3'), KeyEventKind::Press), t0);
        assert_eq!(take(&mut input), vec![Action::ColumnDown(2)]);
    }

    #[test]
    fn start_quit_and_interrupt() {
        let mut input = InputState::new(keymap());
        let t0 = Instant::now();
        input.handle_event(key(KeyCode::Enter, KeyEventKind::Press), t0);
        input.handle_event(key(KeyCode::Enter, KeyEventKind::Repeat), t0);
        input.handle_event(key(KeyCode::Char('Q'), KeyEventKind::Press), t0);
        input.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)), t0);
        input.handle_event(key(KeyCode::Char('x'), KeyEventKind::Press), t0);
        assert_eq!(
            take(&mut input),
            vec![Action::Start, Action::Quit, Action::Interrupt],
        );
    }

    #[test]
    fn left_click_is_reported() {
        let mut input = InputState::new(keymap());
        let click = |kind| Event::Mouse(MouseEvent {
            kind,
            column: 12,
            row: 7,
            modifiers: KeyModifiers::NONE,
        });
        input.handle_event(click(MouseEventKind::Down(MouseButton::Left)), Instant::now());
        input.handle_event(click(MouseEventKind::Down(MouseButton::Right)), Instant::now());
        input.handle_event(click(MouseEventKind::Moved), Instant::now());
        assert_eq!(take(&mut input), vec![Action::Click { column: 12, row: 7 }]);
    }
}
