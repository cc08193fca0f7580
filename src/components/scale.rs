use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Per-axis scale. A negative `x` mirrors the visual horizontally.
#[derive(Component, Clone, Debug, Copy, PartialEq)]
pub struct Scale {
    pub scale: Vec2,
}
impl Scale {
    pub fn new(sx: f32, sy: f32) -> Self {
        Self {
            scale: Vec2::new(sx, sy),
        }
    }
    pub fn uniform(s: f32) -> Self {
        Self::new(s, s)
    }
    pub fn from_vec(scale: Vec2) -> Self {
        Self { scale }
    }
}
impl Default for Scale {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}
