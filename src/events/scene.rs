//! Notifications emitted by scene subsystems.
//!
//! These are plain observer events. The orchestration itself never depends on
//! anyone listening; they exist for hosts and tests that want to react to
//! lifecycle milestones without polling.

use bevy_ecs::prelude::*;

/// A boarding walk reached the rocket and the character was removed.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct BoardingFinished {
    pub entity: Entity,
    pub id: String,
}

/// A disembark jump window ended and the character was removed.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct DisembarkFinished {
    pub entity: Entity,
    pub id: String,
}

/// A shake ended and its target was snapped back to the base pose.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ShakeCompleted {
    pub entity: Entity,
    pub signal: String,
}

/// A fade/slide transition finished and its retired entities were removed.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionCompleted {
    pub entity: Entity,
}

/// The completion barrier found no live characters.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllCharactersComplete;
