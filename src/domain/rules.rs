/// Field geometry and scoring rules.
///
/// All functions here are pure: they take a `Rules` plus plain integers and
/// answer questions about tile positions, hit windows and grades. The step
/// module composes them into the tick / hit transitions.
///
/// Coordinate system (field units, y grows downward, tiles fall):
///
/// ```text
///   top(i)    = scroll_offset - i * tile_height
///   bottom(i) = top(i) + tile_height
///   center(i) = top(i) + tile_height / 2
/// ```
///
/// Index 0 is the oldest tile, so it is always the lowest one on screen.

use std::fmt;

/// Upper bound on configurable columns (number row keys 1-8).
pub const MAX_COLUMNS: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rules {
    pub column_count: usize,
    pub tile_height: i32,
    pub field_height: i32,
    pub score_line: i32,
    /// How far past the scoring line an unresolved tile's bottom may travel.
    pub miss_slack: i32,
    /// Max center-to-line distance that still counts as a perfect hit.
    pub perfect_range: i32,
    /// Extra distance below the field before a tile is evicted.
    pub evict_margin: i32,
    pub initial_tiles: usize,
    pub base_speed: i32,
    pub score_per_speed_step: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            column_count: 4,
            tile_height: 150,
            field_height: 600,
            score_line: 540,
            miss_slack: 50,
            perfect_range: 30,
            evict_margin: 100,
            initial_tiles: 6,
            base_speed: 5,
            score_per_speed_step: 10,
        }
    }
}

/// A rules combination that can't produce a playable field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RulesError {
    ColumnCount(usize),
    NonPositive(&'static str),
    Negative(&'static str),
    LineOutsideField { line: i32, field: i32 },
    EvictBeforeMiss,
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesError::ColumnCount(n) => {
                write!(f, "column_count must be 1..={MAX_COLUMNS}, got {n}")
            }
            RulesError::NonPositive(key) => write!(f, "{key} must be greater than zero"),
            RulesError::Negative(key) => write!(f, "{key} must not be negative"),
            RulesError::LineOutsideField { line, field } => {
                write!(f, "score_line {line} must lie inside the field (0..{field})")
            }
            RulesError::EvictBeforeMiss => {
                write!(f, "evict threshold lies above the miss threshold; tiles would vanish unscored")
            }
        }
    }
}

impl std::error::Error for RulesError {}

/// Quality of a successful hit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HitGrade {
    Perfect,
    Normal,
}

impl HitGrade {
    pub fn points(self) -> u32 {
        match self {
            HitGrade::Perfect => 2,
            HitGrade::Normal => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HitGrade::Perfect => "PERFECT",
            HitGrade::Normal => "GOOD",
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.column_count == 0 || self.column_count > MAX_COLUMNS {
            return Err(RulesError::ColumnCount(self.column_count));
        }
        for (key, v) in [
            ("tile_height", self.tile_height),
            ("field_height", self.field_height),
            ("base_speed", self.base_speed),
        ] {
            if v <= 0 { return Err(RulesError::NonPositive(key)); }
        }
        if self.initial_tiles == 0 { return Err(RulesError::NonPositive("initial_tiles")); }
        if self.score_per_speed_step == 0 { return Err(RulesError::NonPositive("score_per_speed_step")); }
        for (key, v) in [
            ("miss_slack", self.miss_slack),
            ("perfect_range", self.perfect_range),
            ("evict_margin", self.evict_margin),
        ] {
            if v < 0 { return Err(RulesError::Negative(key)); }
        }
        if self.score_line <= 0 || self.score_line >= self.field_height {
            return Err(RulesError::LineOutsideField {
                line: self.score_line,
                field: self.field_height,
            });
        }
        // An unresolved tile must trip the miss check no later than eviction.
        if self.field_height + self.evict_margin + self.tile_height < self.score_line + self.miss_slack {
            return Err(RulesError::EvictBeforeMiss);
        }
        Ok(())
    }

    // ── Geometry ──

    #[inline]
    pub fn tile_top(&self, index: usize, scroll_offset: i32) -> i32 {
        scroll_offset - index as i32 * self.tile_height
    }

    #[cfg(test)]
    #[inline]
    pub fn tile_bottom(&self, index: usize, scroll_offset: i32) -> i32 {
        self.tile_top(index, scroll_offset) + self.tile_height
    }

    /// Does a tile with this top edge span the scoring line (inclusive)?
    #[inline]
    pub fn overlaps_line(&self, top: i32) -> bool {
        top <= self.score_line && self.score_line <= top + self.tile_height
    }

    /// Absolute distance between a tile's center and the scoring line.
    #[inline]
    pub fn line_distance(&self, top: i32) -> i32 {
        (top + self.tile_height / 2 - self.score_line).abs()
    }

    /// Has a tile with this top edge travelled too far past the line?
    #[inline]
    pub fn is_missed(&self, top: i32) -> bool {
        top + self.tile_height > self.score_line + self.miss_slack
    }

    /// Is a tile with this top edge fully below the field plus margin?
    #[inline]
    pub fn is_offscreen(&self, top: i32) -> bool {
        top > self.field_height + self.evict_margin
    }

    /// Once the newest tile has fully entered the field a new one is queued above it.
    #[inline]
    pub fn needs_spawn(&self, last_top: i32) -> bool {
        last_top > 0
    }

    // ── Scoring ──

    /// Scroll speed for a given score: one step every `score_per_speed_step` points.
    pub fn speed_for_score(&self, score: u32) -> i32 {
        self.base_speed + (score / self.score_per_speed_step) as i32
    }

    pub fn grade(&self, distance: i32) -> HitGrade {
        if distance <= self.perfect_range {
            HitGrade::Perfect
        } else {
            HitGrade::Normal
        }
    }
}

/// Pick the candidate closest to the line from `(index, distance)` pairs.
/// Candidates are expected in spawn order; on a tie the older one wins.
pub fn select_closest<I>(candidates: I) -> Option<(usize, i32)>
where
    I: IntoIterator<Item = (usize, i32)>,
{
    let mut best: Option<(usize, i32)> = None;
    for (index, distance) in candidates {
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((index, distance)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Rules::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_column_count() {
        let r = Rules { column_count: 0, ..Rules::default() };
        assert_eq!(r.validate(), Err(RulesError::ColumnCount(0)));
        let r = Rules { column_count: MAX_COLUMNS + 1, ..Rules::default() };
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_line_outside_field() {
        let r = Rules { score_line: 600, ..Rules::default() };
        assert!(matches!(r.validate(), Err(RulesError::LineOutsideField { .. })));
    }

    #[test]
    fn rejects_zero_speed_step() {
        let r = Rules { score_per_speed_step: 0, ..Rules::default() };
        assert_eq!(r.validate(), Err(RulesError::NonPositive("score_per_speed_step")));
    }

    #[test]
    fn rejects_evict_before_miss() {
        let r = Rules { miss_slack: 400, evict_margin: 0, tile_height: 10, ..Rules::default() };
        assert_eq!(r.validate(), Err(RulesError::EvictBeforeMiss));
    }

    // ── Geometry ──

    #[test]
    fn tile_positions_follow_index() {
        let r = Rules::default();
        assert_eq!(r.tile_top(0, 0), 0);
        assert_eq!(r.tile_top(1, 0), -150);
        assert_eq!(r.tile_top(2, 400), 100);
        assert_eq!(r.tile_bottom(2, 400), 250);
    }

    #[test]
    fn overlap_is_inclusive_on_both_edges() {
        let r = Rules::default();
        assert!(r.overlaps_line(540));        // top on the line
        assert!(r.overlaps_line(390));        // bottom on the line
        assert!(!r.overlaps_line(541));
        assert!(!r.overlaps_line(389));
    }

    #[test]
    fn distance_from_center() {
        let r = Rules::default();
        assert_eq!(r.line_distance(465), 0);  // center 540
        assert_eq!(r.line_distance(435), 30); // center 510
        assert_eq!(r.line_distance(495), 30); // center 570
        assert_eq!(r.line_distance(434), 31);
    }

    #[test]
    fn miss_threshold() {
        let r = Rules::default();
        assert!(!r.is_missed(440)); // bottom 590 == line + slack
        assert!(r.is_missed(441));  // bottom 591
    }

    #[test]
    fn offscreen_threshold() {
        let r = Rules::default();
        assert!(!r.is_offscreen(700));
        assert!(r.is_offscreen(701));
    }

    #[test]
    fn spawn_threshold() {
        let r = Rules::default();
        assert!(!r.needs_spawn(0));
        assert!(r.needs_spawn(1));
    }

    // ── Scoring ──

    #[test]
    fn speed_steps_every_ten_points() {
        let r = Rules::default();
        assert_eq!(r.speed_for_score(0), 5);
        assert_eq!(r.speed_for_score(9), 5);
        assert_eq!(r.speed_for_score(10), 6);
        assert_eq!(r.speed_for_score(25), 7);
    }

    #[test]
    fn grade_boundaries() {
        let r = Rules::default();
        assert_eq!(r.grade(0), HitGrade::Perfect);
        assert_eq!(r.grade(30), HitGrade::Perfect);
        assert_eq!(r.grade(31), HitGrade::Normal);
        assert_eq!(HitGrade::Perfect.points(), 2);
        assert_eq!(HitGrade::Normal.points(), 1);
    }

    #[test]
    fn closest_candidate_wins() {
        let picked = select_closest([(0, 40), (1, 10), (2, 25)]);
        assert_eq!(picked, Some((1, 10)));
    }

    #[test]
    fn tie_goes_to_oldest() {
        assert_eq!(select_closest([(3, 75), (4, 75)]), Some((3, 75)));
    }

    #[test]
    fn no_candidates() {
        assert_eq!(select_closest(std::iter::empty()), None);
    }
}
