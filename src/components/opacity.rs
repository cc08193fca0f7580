use bevy_ecs::prelude::Component;

/// Alpha multiplier in `[0, 1]` applied by the render adapter.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Opacity(pub f32);

impl Default for Opacity {
    fn default() -> Self {
        Opacity(1.0)
    }
}
