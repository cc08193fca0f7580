//! Error taxonomy for scene orchestration.
//!
//! Errors never escape to a global handler. Asset failures are logged and
//! surfaced as `Err`/`None` to the caller, surface-unavailable operations
//! quietly no-op, and missing clips are recovered through
//! [`crate::components::skeleton::resolve_clip`]. The only error a caller must
//! handle explicitly is a rejected boarding
//! [`Completion`](crate::resources::completion::Completion).

use thiserror::Error;

/// Failures that can occur while driving the scene.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A skeletal, texture or audio asset could not be fetched or parsed.
    #[error("failed to load asset '{path}': {reason}")]
    AssetLoad { path: String, reason: String },
    /// The render surface was torn down (or never created) while an
    /// operation needed it.
    #[error("render surface unavailable")]
    RenderSurfaceUnavailable,
    /// A requested animation clip does not exist and no fallback was found.
    #[error("animation clip '{requested}' missing")]
    AnimationClipMissing { requested: String },
    /// The entity is not a live character.
    #[error("entity is not a live character")]
    NotACharacter,
    /// No character registered under the given id.
    #[error("character '{0}' not found")]
    NotFound(String),
}

impl SceneError {
    pub fn asset_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SceneError::AssetLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
