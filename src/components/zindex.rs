//! Z-index component for render ordering.
//!
//! The [`ZIndex`] component controls the order in which the render adapter
//! draws stage children. Backgrounds sit below the rocket, which sits below
//! characters. The front cloud of the recycling backdrop covers the rocket
//! but not the name labels.

use bevy_ecs::prelude::Component;

/// Rendering order hint for 2D drawing.
///
/// Higher values are drawn later (on top). Changing a `ZIndex` is the
/// equivalent of asking the stage to re-sort its children.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZIndex(pub i32);

/// Well-known layers of the stage.
pub mod layers {
    pub const BACKGROUND: i32 = -10;
    pub const CYCLE: i32 = -5;
    /// Ground fading in over the old backdrop.
    pub const INCOMING_GROUND: i32 = -1;
    pub const ROCKET: i32 = 1;
    pub const CHARACTER: i32 = 5;
    pub const FRONT_CLOUD: i32 = 8;
    pub const LABEL: i32 = 10;
    /// Front cloud sliding in over the old one.
    pub const INCOMING_FRONT_CLOUD: i32 = 20;
}
