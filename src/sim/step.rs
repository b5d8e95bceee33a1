/// Run transitions: the fixed-interval tick and the column hit.
///
/// Tick processing order (fixed; eviction must not see a tile the miss
/// check hasn't judged yet):
///   1. Scroll advance (by the current speed)
///   2. Speed update from score
///   3. Spawn (at most one tile)
///   4. Miss check (ends the run)
///   5. Eviction of tiles fully below the field
///
/// A hit never creates or removes tiles; it only flips `resolved` on one
/// tile and adds to the score.

use rand::Rng;

use crate::domain::rules::{self, HitGrade, Rules};
use super::event::GameEvent;
use super::world::RunState;

// ══════════════════════════════════════════════════════════════
// Tick
// ══════════════════════════════════════════════════════════════

pub fn tick<R: Rng>(run: &mut RunState, rules: &Rules, rng: &mut R) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    advance_scroll(run);
    resolve_speed(run, rules, &mut events);
    resolve_spawn(run, rules, rng, &mut events);
    if resolve_miss(run, rules, &mut events) { return events; }
    resolve_eviction(run, rules, &mut events);

    events
}

/// Did this batch of tick events end the run?
pub fn run_ended(events: &[GameEvent]) -> bool {
    events.iter().any(|e| matches!(e, GameEvent::TileMissed { .. }))
}

fn advance_scroll(run: &mut RunState) {
    run.scroll_offset += run.speed;
    run.distance += run.speed as u64;
    run.ticks += 1;
}

fn resolve_speed(run: &mut RunState, rules: &Rules, events: &mut Vec<GameEvent>) {
    let speed = rules.speed_for_score(run.score);
    if speed != run.speed {
        run.speed = speed;
        events.push(GameEvent::SpeedChanged { speed });
    }
}

fn resolve_spawn<R: Rng>(run: &mut RunState, rules: &Rules, rng: &mut R, events: &mut Vec<GameEvent>) {
    let last = match run.tiles.len().checked_sub(1) {
        Some(i) => i,
        None => return,
    };
    if rules.needs_spawn(run.top_of(rules, last)) {
        let column = run.push_random(rules, rng);
        log::trace!("spawned tile #{} in column {}", run.tiles_spawned, column);
        events.push(GameEvent::TileSpawned { column });
    }
}

/// Returns true when the oldest unresolved tile has slipped past the line.
fn resolve_miss(run: &RunState, rules: &Rules, events: &mut Vec<GameEvent>) -> bool {
    let idx = match run.oldest_unresolved() {
        Some(i) => i,
        None => return false,
    };
    if rules.is_missed(run.top_of(rules, idx)) {
        events.push(GameEvent::TileMissed { column: run.tiles[idx].column });
        return true;
    }
    false
}

fn resolve_eviction(run: &mut RunState, rules: &Rules, events: &mut Vec<GameEvent>) {
    let mut count = 0;
    while !run.tiles.is_empty() && rules.is_offscreen(run.top_of(rules, 0)) {
        run.tiles.pop_front();
        run.scroll_offset -= rules.tile_height;
        count += 1;
    }
    if count > 0 {
        events.push(GameEvent::TilesEvicted { count });
    }
}

// ══════════════════════════════════════════════════════════════
// Hit
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HitOutcome {
    pub index: usize,
    pub column: usize,
    pub grade: HitGrade,
    pub distance: i32,
}

impl HitOutcome {
    pub fn event(&self) -> GameEvent {
        GameEvent::TileHit { column: self.column, grade: self.grade, distance: self.distance }
    }
}

/// Resolve the open tile in `column` whose center is nearest the line.
/// Pressing with nothing on the line is a no-op.
pub fn hit(run: &mut RunState, rules: &Rules, column: usize) -> Option<HitOutcome> {
    let candidates = run.tiles.iter().enumerate()
        .filter(|(_, t)| t.is_open_in(column))
        .map(|(i, _)| (i, rules.tile_top(i, run.scroll_offset)))
        .filter(|&(_, top)| rules.overlaps_line(top))
        .map(|(i, top)| (i, rules.line_distance(top)));

    let (index, distance) = rules::select_closest(candidates)?;
    if !run.tiles[index].resolve() {
        return None;
    }

    let grade = rules.grade(distance);
    run.score += grade.points();
    match grade {
        HitGrade::Perfect => run.perfect_hits += 1,
        HitGrade::Normal => run.normal_hits += 1,
    }
    log::debug!("hit column {column} at distance {distance}: {grade:?}, score {}", run.score);

    Some(HitOutcome { index, column, grade, distance })
}
