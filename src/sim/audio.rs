/// Audio port: the engine's only outbound side effect.
///
/// The controller calls `play` and moves on. Implementations must not block
/// and must swallow their own failures; the engine never learns whether a
/// sound was actually heard.

use std::rc::Rc;

use crate::domain::rules::HitGrade;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tone {
    /// A tile was hit in `column`.
    Hit { column: usize, grade: HitGrade },
    /// Countdown step (3, 2, 1).
    Count,
    /// Countdown reached zero.
    Go,
    /// A tile slipped past the line; the run is over.
    Miss,
}

pub trait AudioPort {
    fn play(&self, tone: Tone);
}

/// Port that drops every tone (no device, or sound disabled).
pub struct Silent;

impl AudioPort for Silent {
    fn play(&self, _tone: Tone) {}
}

impl<T: AudioPort + ?Sized> AudioPort for Rc<T> {
    fn play(&self, tone: Tone) {
        (**self).play(tone)
    }
}

impl<T: AudioPort + ?Sized> AudioPort for Box<T> {
    fn play(&self, tone: Tone) {
        (**self).play(tone)
    }
}
