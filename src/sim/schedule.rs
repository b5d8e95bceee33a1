/// Fixed-interval timers feeding the command queue.
///
/// Two independent intervals, each only armed in its own phase:
///   - tick       (`timing.tick_rate_ms`, Playing)
///   - countdown  (`timing.countdown_interval_ms`, Countdown)
///
/// Intervals are polled from the main loop with an explicit `now`, so the
/// whole schedule is deterministic under test. A poll fires at most once;
/// if the loop fell behind by more than a period the interval re-anchors
/// to `now` instead of bursting to catch up.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::TimingConfig;
use super::controller::Command;
use super::world::PhaseKind;

#[derive(Clone, Debug)]
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Interval { period, next_due: None }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Has the interval elapsed? Advances the deadline when it fires.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let next = due + self.period;
                self.next_due = Some(if next <= now { now + self.period } else { next });
                true
            }
            _ => false,
        }
    }
}

pub struct Scheduler {
    tick: Interval,
    countdown: Interval,
    armed_for: Option<PhaseKind>,
}

impl Scheduler {
    pub fn new(timing: &TimingConfig) -> Self {
        Scheduler {
            tick: Interval::new(Duration::from_millis(timing.tick_rate_ms)),
            countdown: Interval::new(Duration::from_millis(timing.countdown_interval_ms)),
            armed_for: None,
        }
    }

    /// Arm or disarm the intervals for the current phase.
    /// Only a phase change touches the timers; repeated calls are free.
    pub fn sync(&mut self, phase: PhaseKind, now: Instant) {
        if self.armed_for == Some(phase) { return; }
        self.armed_for = Some(phase);

        match phase {
            PhaseKind::Playing => {
                self.countdown.stop();
                self.tick.start(now);
            }
            PhaseKind::Countdown => {
                self.tick.stop();
                self.countdown.start(now);
            }
            PhaseKind::Menu | PhaseKind::GameOver => {
                self.tick.stop();
                self.countdown.stop();
            }
        }
        log::trace!("timers armed for {phase:?}");
    }

    /// Push the commands of every interval that is due.
    pub fn poll(&mut self, now: Instant, queue: &mut VecDeque<Command>) {
        if self.countdown.poll(now) {
            queue.push_back(Command::CountdownTick);
        }
        if self.tick.poll(now) {
            queue.push_back(Command::Tick);
        }
    }

    /// Earliest pending deadline, used to bound the input wait.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.tick.next_due(), self.countdown.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn timing() -> TimingConfig {
        TimingConfig { tick_rate_ms: 20, countdown_interval_ms: 1000, countdown_from: 3 }
    }

    #[test]
    fn interval_fires_on_period() {
        let t0 = Instant::now();
        let mut iv = Interval::new(ms(20));
        assert!(!iv.poll(t0 + ms(100)));
        iv.start(t0);
        assert!(!iv.poll(t0 + ms(19)));
        assert!(iv.poll(t0 + ms(20)));
        assert!(!iv.poll(t0 + ms(21)));
        assert!(iv.poll(t0 + ms(40)));
    }

    #[test]
    fn late_interval_fires_once_and_reanchors() {
        let t0 = Instant::now();
        let mut iv = Interval::new(ms(20));
        iv.start(t0);
        assert!(iv.poll(t0 + ms(95)));
        assert!(!iv.poll(t0 + ms(95)));
        assert_eq!(iv.next_due(), Some(t0 + ms(115)));
    }

    #[test]
    fn stopped_interval_never_fires() {
        let t0 = Instant::now();
        let mut iv = Interval::new(ms(20));
        iv.start(t0);
        iv.stop();
        assert!(!iv.is_running());
        assert!(!iv.poll(t0 + ms(1000)));
    }

    #[test]
    fn scheduler_arms_by_phase() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(&timing());
        let mut q = VecDeque::new();

        s.sync(PhaseKind::Menu, t0);
        s.poll(t0 + ms(5000), &mut q);
        assert!(q.is_empty());

        s.sync(PhaseKind::Countdown, t0);
        s.poll(t0 + ms(999), &mut q);
        assert!(q.is_empty());
        s.poll(t0 + ms(1000), &mut q);
        assert_eq!(q.pop_front(), Some(Command::CountdownTick));
        assert!(q.is_empty());

        let t1 = t0 + ms(4000);
        s.sync(PhaseKind::Playing, t1);
        s.poll(t1 + ms(20), &mut q);
        assert_eq!(q.drain(..).collect::<Vec<_>>(), vec![Command::Tick]);

        s.sync(PhaseKind::GameOver, t1);
        s.poll(t1 + ms(1000), &mut q);
        assert!(q.is_empty());
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn resync_same_phase_keeps_deadline() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(&timing());
        s.sync(PhaseKind::Playing, t0);
        s.sync(PhaseKind::Playing, t0 + ms(15));
        assert_eq!(s.next_deadline(), Some(t0 + ms(20)));
    }
}
