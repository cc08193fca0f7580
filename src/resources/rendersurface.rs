//! Render surface liveness.
//!
//! The stage itself is the ECS world: spawning is adding a child, despawning
//! is removing it, and [`ZIndex`](crate::components::zindex::ZIndex) is the
//! sort key. This resource tracks whether the surface exists and a
//! generation number bumped on every reset or teardown. Deferred work (asset
//! loads, delays) captures the generation when it is scheduled and must find
//! the same value, with the surface still ready, before touching the stage.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSurface {
    pub ready: bool,
    pub generation: u64,
}

impl RenderSurface {
    pub fn new() -> Self {
        RenderSurface {
            ready: true,
            generation: 0,
        }
    }

    /// Invalidate all deferred work scheduled so far.
    pub fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether work scheduled under `generation` may still mutate the stage.
    pub fn accepts(&self, generation: u64) -> bool {
        self.ready && self.generation == generation
    }
}
