//! Delivery of expired [`Delay`](crate::components::delay::Delay) signals.
//!
//! Triggered by [`crate::systems::time::update_delays`]. The rocket restart
//! choreography finishes in an observer of this event.

use bevy_ecs::prelude::*;

/// A delay on `entity` ran out.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayElapsed {
    pub entity: Entity,
    pub signal: &'static str,
}
