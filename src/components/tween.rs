//! World-clock position tweens.
//!
//! A tween remembers the [`WorldTime`](crate::resources::worldtime::WorldTime)
//! second it started at and samples from elapsed time, so a walk lasts the
//! same on a slow frame as on a fast one.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Progress curve applied before interpolating.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    /// `1 - (1 - t)^3`: quick start, soft landing.
    CubicOut,
}

impl Easing {
    /// Map linear progress `t` through the curve. `t` is clamped to `[0, 1]`.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Moves [`MapPosition`](super::mapposition::MapPosition) from `from` to `to`.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct TweenPosition {
    pub from: Vec2,
    pub to: Vec2,
    pub duration: f32,
    pub easing: Easing,
    pub started_at: f32,
}

impl TweenPosition {
    pub fn new(from: Vec2, to: Vec2, duration: f32, started_at: f32) -> Self {
        TweenPosition {
            from,
            to,
            duration,
            easing: Easing::Linear,
            started_at,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Linear progress in `[0, 1]` at world time `now`.
    pub fn progress(&self, now: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0)
    }

    /// Eased position at world time `now`.
    pub fn sample(&self, now: f32) -> Vec2 {
        self.from.lerp(self.to, self.easing.apply(self.progress(now)))
    }
}
