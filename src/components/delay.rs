//! One-shot delayed signal.
//!
//! An entity carrying [`Delay`] receives a
//! [`DelayElapsed`](crate::events::delay::DelayElapsed) trigger once the
//! scaled world clock has moved `seconds` past the moment the delay was
//! armed. Like a tween it reads elapsed world time rather than summing frame
//! deltas, so a delay armed halfway through a frame does not also count that
//! frame. The component is removed as it fires.

use bevy_ecs::prelude::Component;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Delay {
    pub seconds: f32,
    /// World time (seconds) the delay was armed at.
    pub armed_at: f32,
    pub signal: &'static str,
}

impl Delay {
    pub fn new(seconds: f32, armed_at: f32, signal: &'static str) -> Self {
        Delay {
            seconds: seconds.max(0.0),
            armed_at,
            signal,
        }
    }

    /// Seconds still to wait at world time `now`.
    pub fn remaining(&self, now: f32) -> f32 {
        (self.seconds - (now - self.armed_at)).max(0.0)
    }

    pub fn is_due(&self, now: f32) -> bool {
        now - self.armed_at >= self.seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_delay_is_clamped() {
        let d = Delay::new(-1.0, 0.0, "x");
        assert_eq!(d.seconds, 0.0);
        assert!(d.is_due(0.0));
    }

    #[test]
    fn due_once_enough_world_time_passed() {
        let d = Delay::new(0.5, 2.0, "restart");
        assert!(!d.is_due(2.25));
        assert_eq!(d.remaining(2.25), 0.25);
        assert!(d.is_due(2.5));
        assert_eq!(d.remaining(9.0), 0.0);
    }
}
