use bevy_ecs::prelude::Resource;

/// Pre-launch countdown. `remaining` is derived from world time each frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct Countdown {
    pub duration: f32,
    pub started_at: f32,
    pub remaining: f32,
    pub running: bool,
}

impl Countdown {
    pub fn start(&mut self, duration: f32, now: f32) {
        self.duration = duration;
        self.started_at = now;
        self.remaining = duration;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.remaining = 0.0;
    }

    /// Whole seconds left, rounded up, for display.
    pub fn seconds_left(&self) -> u32 {
        self.remaining.max(0.0).ceil() as u32
    }
}
