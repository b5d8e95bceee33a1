/// Game state: the phase machine and the per-run state it carries.
///
/// ## Phase ownership
///
/// `Phase` is a sum type, so data only exists in the phases where it's valid:
///   - `Menu`        — nothing
///   - `Countdown`   — the counter
///   - `Playing`     — a live `RunState`
///   - `GameOver`    — the finished `RunState`, kept read-only for the overlay
///
/// A `RunState` is built fresh on entry to `Playing` and dropped on the way
/// back to `Menu`; there is no other place for it to live.

use std::collections::VecDeque;

use rand::Rng;

use crate::domain::rules::{HitGrade, Rules};
use crate::domain::tile::Tile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunState {
    /// Distance the field has moved since the current front tile was spawned.
    /// Reduced by one tile height on every eviction.
    pub scroll_offset: i32,
    pub score: u32,
    pub speed: i32,
    pub tiles: VecDeque<Tile>,

    // ── Run statistics ──
    /// Total distance scrolled this run; never reduced by eviction.
    pub distance: u64,
    pub ticks: u64,
    pub tiles_spawned: u64,
    pub perfect_hits: u32,
    pub normal_hits: u32,
}

impl RunState {
    /// Fresh run seeded with `rules.initial_tiles` random tiles.
    pub fn new<R: Rng>(rules: &Rules, rng: &mut R) -> Self {
        let mut run = RunState::empty(rules);
        for _ in 0..rules.initial_tiles {
            run.push_random(rules, rng);
        }
        run
    }

    /// A run with no tiles at all. Mostly useful for building scenarios.
    pub fn empty(rules: &Rules) -> Self {
        RunState {
            scroll_offset: 0,
            score: 0,
            speed: rules.base_speed,
            tiles: VecDeque::with_capacity(rules.initial_tiles + 4),
            distance: 0,
            ticks: 0,
            tiles_spawned: 0,
            perfect_hits: 0,
            normal_hits: 0,
        }
    }

    /// Build a run from an explicit column layout (oldest first).
    #[cfg(test)]
    pub fn with_columns(rules: &Rules, columns: &[usize], scroll_offset: i32) -> Self {
        let mut run = RunState::empty(rules);
        run.tiles.extend(columns.iter().map(|&c| Tile::new(c)));
        run.tiles_spawned = columns.len() as u64;
        run.scroll_offset = scroll_offset;
        run
    }

    /// Append one tile with a uniformly random column. Returns its column.
    pub fn push_random<R: Rng>(&mut self, rules: &Rules, rng: &mut R) -> usize {
        let column = rng.random_range(0..rules.column_count);
        self.tiles.push_back(Tile::new(column));
        self.tiles_spawned += 1;
        column
    }

    #[inline]
    pub fn top_of(&self, rules: &Rules, index: usize) -> i32 {
        rules.tile_top(index, self.scroll_offset)
    }

    /// Index of the oldest tile still waiting to be hit.
    pub fn oldest_unresolved(&self) -> Option<usize> {
        self.tiles.iter().position(|t| !t.resolved)
    }

    pub fn hits(&self) -> u32 {
        self.perfect_hits + self.normal_hits
    }

    /// Tiles whose span intersects the visible field, with their top edge.
    pub fn visible_tiles<'a>(&'a self, rules: &'a Rules) -> impl Iterator<Item = (usize, i32, &'a Tile)> + 'a {
        self.tiles.iter().enumerate().filter_map(move |(i, t)| {
            let top = self.top_of(rules, i);
            (top + rules.tile_height > 0 && top < rules.field_height).then_some((i, top, t))
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Countdown { remaining: i32 },
    Playing(RunState),
    GameOver(RunState),
}

/// Data-free discriminant of `Phase`, used where only the phase matters
/// (timer scheduling, renderer transitions).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PhaseKind {
    Menu,
    Countdown,
    Playing,
    GameOver,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Menu => PhaseKind::Menu,
            Phase::Countdown { .. } => PhaseKind::Countdown,
            Phase::Playing(_) => PhaseKind::Playing,
            Phase::GameOver(_) => PhaseKind::GameOver,
        }
    }

    pub fn run(&self) -> Option<&RunState> {
        match self {
            Phase::Playing(run) | Phase::GameOver(run) => Some(run),
            _ => None,
        }
    }

    pub fn countdown(&self) -> Option<i32> {
        match self {
            Phase::Countdown { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

/// Read-only view handed to the renderer each frame.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub phase: PhaseKind,
    pub rules: &'a Rules,
    pub run: Option<&'a RunState>,
    pub countdown: Option<i32>,
    /// Per-column "key is down" flags, for lane highlighting.
    pub held: &'a [bool],
    pub best_score: u32,
    /// Most recent hit, for the judgement flash.
    pub last_hit: Option<(HitGrade, u64)>,
}

impl<'a> Snapshot<'a> {
    pub fn score(&self) -> u32 {
        self.run.map_or(0, |r| r.score)
    }

    pub fn speed(&self) -> i32 {
        self.run.map_or(self.rules.base_speed, |r| r.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn new_run_is_seeded() {
        let rules = Rules::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let run = RunState::new(&rules, &mut rng);
        assert_eq!(run.tiles.len(), 6);
        assert_eq!(run.tiles_spawned, 6);
        assert_eq!(run.scroll_offset, 0);
        assert_eq!(run.score, 0);
        assert_eq!(run.speed, 5);
        assert!(run.tiles.iter().all(|t| !t.resolved && t.column < 4));
    }

    #[test]
    fn same_seed_same_layout() {
        let rules = Rules::default();
        let a = RunState::new(&rules, &mut Pcg32::seed_from_u64(99));
        let b = RunState::new(&rules, &mut Pcg32::seed_from_u64(99));
        assert_eq!(a.tiles, b.tiles);
    }

    #[test]
    fn oldest_unresolved_skips_hit_tiles() {
        let rules = Rules::default();
        let mut run = RunState::with_columns(&rules, &[0, 1, 2], 0);
        assert_eq!(run.oldest_unresolved(), Some(0));
        run.tiles[0].resolve();
        assert_eq!(run.oldest_unresolved(), Some(1));
        run.tiles[1].resolve();
        run.tiles[2].resolve();
        assert_eq!(run.oldest_unresolved(), None);
    }

    #[test]
    fn visible_tiles_clip_to_field() {
        let rules = Rules::default();
        // tops: 650, 500, 350, 200, 50, -100, -250
        let run = RunState::with_columns(&rules, &[0, 1, 2, 3, 0, 1, 2], 650);
        let idx: Vec<usize> = run.visible_tiles(&rules).map(|(i, _, _)| i).collect();
        assert_eq!(idx, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn phase_accessors() {
        let rules = Rules::default();
        assert_eq!(Phase::Menu.kind(), PhaseKind::Menu);
        assert_eq!(Phase::Countdown { remaining: 2 }.countdown(), Some(2));
        let p = Phase::GameOver(RunState::empty(&rules));
        assert_eq!(p.kind(), PhaseKind::GameOver);
        assert!(p.run().is_some());
        assert!(Phase::Menu.run().is_none());
    }
}
