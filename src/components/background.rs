//! Background layer components.
//!
//! Both background variants place center-anchored [`Sprite`](super::sprite::Sprite)
//! entities. The phase-based scroller tags its sprites with
//! [`BackgroundLayer`]; the recycling variant uses [`RecyclingLayer`] and
//! [`BackdropPart`].

use bevy_ecs::prelude::Component;

/// A layer managed by the phase-based scroller.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BackgroundLayer {
    /// Vertical speed in stage units per frame. `0` means static.
    pub speed: f32,
    pub active: bool,
    /// Creation order; layers are kept ordered by it.
    pub order: u64,
}

/// One of the stacked cycle sprites of the recycling backdrop.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecyclingLayer {
    pub index: usize,
}

/// Static parts of the recycling backdrop that scroll along with the cycle.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackdropPart {
    Ground,
    FrontCloud,
}
