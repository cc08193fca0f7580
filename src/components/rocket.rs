use bevy_ecs::prelude::Component;

/// Marker for the rocket entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Rocket;
