//! Scene scale context.
//!
//! Layout is authored against a fixed 540x958 design resolution. The live
//! viewport yields per-axis scale factors that every placement reads.

use bevy_ecs::prelude::Resource;
use glam::Vec2;

pub const DESIGN_WIDTH: f32 = 540.0;
pub const DESIGN_HEIGHT: f32 = 958.0;

/// Viewport size and derived scale factors. Recomputed on resize only.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub scale_factor_x: f32,
    pub scale_factor_y: f32,
}

impl Default for ScaleContext {
    fn default() -> Self {
        Self::from_viewport(DESIGN_WIDTH, DESIGN_HEIGHT)
    }
}

impl ScaleContext {
    pub fn from_viewport(width: f32, height: f32) -> Self {
        ScaleContext {
            viewport_width: width,
            viewport_height: height,
            scale_factor_x: width / DESIGN_WIDTH,
            scale_factor_y: height / DESIGN_HEIGHT,
        }
    }

    pub fn min_scale(&self) -> f32 {
        self.scale_factor_x.min(self.scale_factor_y)
    }

    /// Vertical offset of the rocket anchor from the viewport center.
    pub fn base_offset_y(&self) -> f32 {
        -35.0 * self.scale_factor_y
    }

    /// Base scale applied to skeletal characters and the rocket.
    pub fn base_scale(&self) -> f32 {
        0.65 * self.min_scale()
    }

    /// Rocket anchor: horizontal center, vertical center plus base offset.
    pub fn anchor(&self) -> Vec2 {
        Vec2::new(
            self.viewport_width / 2.0,
            self.viewport_height / 2.0 + self.base_offset_y(),
        )
    }
}

/// Largest size with the design aspect ratio that fits entirely inside the
/// window.
pub fn fit_game_size(window_width: f32, window_height: f32) -> (f32, f32) {
    let aspect = DESIGN_WIDTH / DESIGN_HEIGHT;
    let height_based_width = window_height * aspect;
    if height_based_width <= window_width {
        (height_based_width, window_height)
    } else {
        (window_width, window_width / aspect)
    }
}
