//! Shared animation clock.
//!
//! Every time-bounded effect measures progress against `elapsed`, and
//! `frame_count` is what lets work scheduled during a frame start on the next
//! one.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    /// Seconds since the scene was created (scaled).
    pub elapsed: f32,
    /// Seconds covered by the current frame (scaled).
    pub delta: f32,
    pub time_scale: f32,
    /// Number of frames advanced so far.
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }
}
