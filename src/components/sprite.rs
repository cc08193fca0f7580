use bevy_ecs::prelude::Component;

/// Sprite is identified by a texture key and its displayed size in stage
/// units (after scaling). Sprites are center anchored.
///
/// A `tiled` sprite repeats its texture to fill `width` x `height` instead of
/// stretching it; it is used when a fitted background is shorter than the
/// viewport.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Sprite {
    pub tex_key: String,
    pub width: f32,
    pub height: f32,
    pub tiled: bool,
}

impl Sprite {
    pub fn new(tex_key: impl Into<String>, width: f32, height: f32) -> Self {
        Sprite {
            tex_key: tex_key.into(),
            width,
            height,
            tiled: false,
        }
    }
    pub fn tiled(mut self) -> Self {
        self.tiled = true;
        self
    }
}
