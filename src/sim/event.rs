/// Events emitted by the controller and the step functions.
/// The presentation layer consumes these for feedback flashes and logging.

use crate::domain::rules::HitGrade;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CountdownStarted { from: i32 },
    CountdownTick { remaining: i32 },
    RunStarted,
    TileSpawned { column: usize },
    TileHit { column: usize, grade: HitGrade, distance: i32 },
    TilesEvicted { count: usize },
    SpeedChanged { speed: i32 },
    TileMissed { column: usize },
    ReturnedToMenu,
}
