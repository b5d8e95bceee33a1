/// Controller: the single owner of game state.
///
/// Every mutation goes through one of the `on_*` methods (or `apply`, which
/// dispatches a queued `Command` to them). Input callbacks and both interval
/// timers all end up as commands in one queue, processed in order on the
/// main thread, so no two mutations can interleave.
///
/// Phase transitions:
///
/// ```text
///   Menu ──start──▶ Countdown ──(counter < 0)──▶ Playing ──miss──▶ GameOver
///    ▲                                                                │
///    └──────────────────────────── restart ───────────────────────────┘
/// ```
///
/// Anything else is a no-op in the current phase.

use std::collections::VecDeque;

use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::domain::rules::{HitGrade, Rules};
use super::audio::{AudioPort, Tone};
use super::event::GameEvent;
use super::step;
use super::world::{Phase, PhaseKind, RunState, Snapshot};

/// Serialized unit of work for the controller.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Start,
    Restart,
    ColumnPress(usize),
    ColumnRelease(usize),
    Tick,
    CountdownTick,
}

pub struct Controller {
    phase: Phase,
    rules: Rules,
    countdown_from: i32,
    rng: Pcg32,
    audio: Box<dyn AudioPort>,
    held: Vec<bool>,
    best_score: u32,
    last_hit: Option<(HitGrade, u64)>,
}

impl Controller {
    pub fn new(rules: Rules, countdown_from: i32, seed: u64, audio: Box<dyn AudioPort>) -> Self {
        let held = vec![false; rules.column_count];
        Controller {
            phase: Phase::Menu,
            rules,
            countdown_from,
            rng: Pcg32::seed_from_u64(seed),
            audio,
            held,
            best_score: 0,
            last_hit: None,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase.kind(),
            rules: &self.rules,
            run: self.phase.run(),
            countdown: self.phase.countdown(),
            held: &self.held,
            best_score: self.best_score,
            last_hit: self.last_hit,
        }
    }

    // ── Command dispatch ──

    pub fn apply(&mut self, cmd: Command) -> Vec<GameEvent> {
        match cmd {
            Command::Start => self.on_start(),
            Command::Restart => self.on_restart(),
            Command::ColumnPress(col) => self.on_column_press(col),
            Command::ColumnRelease(col) => {
                self.on_column_release(col);
                vec![]
            }
            Command::Tick => self.on_tick(),
            Command::CountdownTick => self.on_countdown_tick(),
        }
    }

    /// Process every queued command in arrival order.
    pub fn drain(&mut self, queue: &mut VecDeque<Command>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Some(cmd) = queue.pop_front() {
            events.extend(self.apply(cmd));
        }
        events
    }

    // ── Phase transitions ──

    /// Menu → Countdown.
    pub fn on_start(&mut self) -> Vec<GameEvent> {
        if !matches!(self.phase, Phase::Menu) { return vec![]; }
        self.phase = Phase::Countdown { remaining: self.countdown_from };
        self.audio.play(Tone::Count);
        debug!("countdown from {}", self.countdown_from);
        vec![GameEvent::CountdownStarted { from: self.countdown_from }]
    }

    /// GameOver → Menu. The finished run is dropped here.
    pub fn on_restart(&mut self) -> Vec<GameEvent> {
        if !matches!(self.phase, Phase::GameOver(_)) { return vec![]; }
        self.phase = Phase::Menu;
        self.held.fill(false);
        self.last_hit = None;
        vec![GameEvent::ReturnedToMenu]
    }

    pub fn on_countdown_tick(&mut self) -> Vec<GameEvent> {
        let remaining = match &mut self.phase {
            Phase::Countdown { remaining } => {
                *remaining -= 1;
                *remaining
            }
            _ => return vec![],
        };

        if remaining < 0 {
            self.phase = Phase::Playing(RunState::new(&self.rules, &mut self.rng));
            self.last_hit = None;
            info!("run started");
            return vec![GameEvent::RunStarted];
        }

        self.audio.play(if remaining == 0 { Tone::Go } else { Tone::Count });
        vec![GameEvent::CountdownTick { remaining }]
    }

    // ── Playing ──

    pub fn on_tick(&mut self) -> Vec<GameEvent> {
        let events = match &mut self.phase {
            Phase::Playing(run) => step::tick(run, &self.rules, &mut self.rng),
            _ => return vec![],
        };

        if step::run_ended(&events) {
            let phase = std::mem::replace(&mut self.phase, Phase::Menu);
            self.phase = match phase {
                Phase::Playing(run) => {
                    info!(
                        "run over: score {} ({} perfect, {} normal) after {} ticks",
                        run.score, run.perfect_hits, run.normal_hits, run.ticks,
                    );
                    self.best_score = self.best_score.max(run.score);
                    Phase::GameOver(run)
                }
                other => other,
            };
            self.audio.play(Tone::Miss);
        }

        events
    }

    pub fn on_column_press(&mut self, column: usize) -> Vec<GameEvent> {
        if column >= self.rules.column_count { return vec![]; }
        let run = match &mut self.phase {
            Phase::Playing(run) => run,
            _ => return vec![],
        };
        self.held[column] = true;

        match step::hit(run, &self.rules, column) {
            Some(out) => {
                self.last_hit = Some((out.grade, run.ticks));
                self.audio.play(Tone::Hit { column, grade: out.grade });
                vec![out.event()]
            }
            None => vec![],
        }
    }

    /// Release is accepted in every phase so a key held across a
    /// transition doesn't leave its lane lit.
    pub fn on_column_release(&mut self, column: usize) {
        if let Some(h) = self.held.get_mut(column) {
            *h = false;
        }
    }
}
