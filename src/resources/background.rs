//! Background scroller state.
//!
//! [`BackgroundScroller`] drives the phase-based variant: one static ground
//! layer, then a staggered sequence of takeoff images, then an endless cycle
//! of flying images. [`RecyclingBackdrop`] drives the "funky" skin: a fixed
//! stack of identical sprites that are moved back above the stack as they
//! leave the viewport.
//!
//! Layer entities are created and destroyed by
//! [`crate::systems::background`] and [`crate::systems::recycling`].

use crate::components::effects::EffectHandle;
use crate::resources::scalecontext::ScaleContext;
use crate::scenelog::SceneLogger;
use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

/// Scroll phases of the phase-based variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPhase {
    #[default]
    Ground,
    Takeoff,
    Flying,
}

impl fmt::Display for BackgroundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundPhase::Ground => f.write_str("ground"),
            BackgroundPhase::Takeoff => f.write_str("takeoff"),
            BackgroundPhase::Flying => f.write_str("flying"),
        }
    }
}

/// Fraction of the takeoff scroll time before the second image is added.
pub const TAKEOFF_FIRST_FRACTION: f32 = 0.4;
/// Fraction used for every following takeoff image.
pub const TAKEOFF_NEXT_FRACTION: f32 = 0.25;
/// Fraction of a flying layer's scroll time before the next one is added.
pub const FLYING_FRACTION: f32 = 0.3;
/// Aspect ratio under which sprites are fitted by width only.
pub const NARROW_ASPECT: f32 = 0.8;

/// Scale factor for a texture of `tex_w` x `tex_h` on the viewport.
///
/// Narrow viewports (w/h < 0.8) fit the width and let the height overflow so
/// the image can scroll. Wider ones cover the whole viewport.
pub fn fit_scale(ctx: &ScaleContext, tex_w: f32, tex_h: f32) -> f32 {
    let sx = ctx.viewport_width / tex_w;
    let sy = ctx.viewport_height / tex_h;
    if ctx.viewport_width / ctx.viewport_height < NARROW_ASPECT {
        sx
    } else {
        sx.max(sy)
    }
}

/// Seconds a layer of height `distance` needs to scroll by at `speed` units
/// per frame, with frames of `frame_ms` milliseconds.
pub fn scroll_time(distance: f32, speed: f32, frame_ms: f32) -> f32 {
    if speed <= 0.0 {
        return f32::INFINITY;
    }
    distance / speed * frame_ms / 1000.0
}

#[derive(Resource, Debug)]
pub struct BackgroundScroller {
    pub phase: BackgroundPhase,
    /// Whether layers advance each frame.
    pub scrolling: bool,
    /// Speed given to newly added layers.
    pub speed: f32,
    pub takeoff_index: usize,
    pub flying_index: usize,
    /// World time at which the next image is added.
    pub next_trigger_at: Option<f32>,
    pub next_order: u64,
    pub ground: Option<Entity>,
    pub frame_ms: f32,
    pub logger: SceneLogger,
}

impl BackgroundScroller {
    pub fn new(speed: f32, frame_ms: f32) -> Self {
        BackgroundScroller {
            phase: BackgroundPhase::Ground,
            scrolling: false,
            speed,
            takeoff_index: 0,
            flying_index: 0,
            next_trigger_at: None,
            next_order: 0,
            ground: None,
            frame_ms,
            logger: SceneLogger::new("background"),
        }
    }

    pub fn take_order(&mut self) -> u64 {
        let o = self.next_order;
        self.next_order += 1;
        o
    }
}

/// Speed multipliers of the recycling backdrop, scaled by the viewport.
pub const RECYCLE_BASE_SPEED: f32 = 5.0;
pub const RECYCLE_SPEED_INCREASE: f32 = 0.02;
pub const RECYCLE_MAX_SPEED: f32 = 20.0;
/// Front cloud height cap as a fraction of the viewport height.
pub const FRONT_CLOUD_MAX_FRACTION: f32 = 0.5;

#[derive(Resource, Debug)]
pub struct RecyclingBackdrop {
    pub scrolling: bool,
    pub scroll_speed: f32,
    pub base_speed: f32,
    pub speed_increase: f32,
    pub max_speed: f32,
    /// Scaled height of one cycle sprite.
    pub layer_height: f32,
    pub ground: Option<Entity>,
    pub cloud: Option<Entity>,
    /// Resting `y` of the front cloud.
    pub cloud_rest_y: f32,
    pub transition: Option<EffectHandle>,
    pub logger: SceneLogger,
}

impl Default for RecyclingBackdrop {
    fn default() -> Self {
        Self::new(&ScaleContext::default())
    }
}

impl RecyclingBackdrop {
    pub fn new(ctx: &ScaleContext) -> Self {
        let mut b = RecyclingBackdrop {
            scrolling: false,
            scroll_speed: 0.0,
            base_speed: 0.0,
            speed_increase: 0.0,
            max_speed: 0.0,
            layer_height: 0.0,
            ground: None,
            cloud: None,
            cloud_rest_y: 0.0,
            transition: None,
            logger: SceneLogger::new("background"),
        };
        b.rescale(ctx);
        b.scroll_speed = b.base_speed;
        b
    }

    /// Recompute speed limits for a new viewport.
    pub fn rescale(&mut self, ctx: &ScaleContext) {
        let m = ctx.min_scale();
        self.base_speed = RECYCLE_BASE_SPEED * m;
        self.speed_increase = RECYCLE_SPEED_INCREASE * m;
        self.max_speed = RECYCLE_MAX_SPEED * m;
    }

    /// Advance the speed ramp by one frame.
    pub fn ramp(&mut self) -> f32 {
        self.scroll_speed = (self.scroll_speed + self.speed_increase).min(self.max_speed);
        self.scroll_speed
    }

    pub fn reset_speed(&mut self) {
        self.scroll_speed = self.base_speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_viewport_fits_width() {
        let ctx = ScaleContext::from_viewport(540.0, 958.0);
        let s = fit_scale(&ctx, 1080.0, 1000.0);
        assert!((s - 0.5).abs() < 1e-6);
    }

    #[test]
    fn wide_viewport_covers() {
        let ctx = ScaleContext::from_viewport(1000.0, 1000.0);
        let s = fit_scale(&ctx, 500.0, 250.0);
        assert!((s - 4.0).abs() < 1e-6);
    }

    #[test]
    fn takeoff_cadence_matches_formula() {
        // (958 * 1.5) / 5 * 16 ms = 4598.4 ms
        let t = scroll_time(958.0 * 1.5, 5.0, 16.0);
        assert!((t - 4.5984).abs() < 1e-3);
        assert!(scroll_time(100.0, 0.0, 16.0).is_infinite());
    }

    #[test]
    fn ramp_is_capped() {
        let mut b = RecyclingBackdrop::new(&ScaleContext::default());
        assert!((b.scroll_speed - 5.0).abs() < 1e-6);
        for _ in 0..10_000 {
            b.ramp();
        }
        assert!((b.scroll_speed - 20.0).abs() < 1e-6);
        b.reset_speed();
        assert!((b.scroll_speed - 5.0).abs() < 1e-6);
    }
}
