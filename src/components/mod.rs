//! ECS components for scene entities.
//!
//! This module groups all component types that can be attached to entities on
//! the stage. The render adapter reads the transform and visual components;
//! the orchestration systems write them.
//!
//! Submodules overview:
//! - [`background`] – phase-based and recycling background layers
//! - [`bonetracker`] – bone-following labels and moving-bone probes
//! - [`character`] – boarding/disembarking characters and their animations
//! - [`delay`] – one-shot delayed signal
//! - [`effects`] – float, shake and fade/slide effects with cancellation handles
//! - [`mapposition`] – stage-space position (center pivot)
//! - [`opacity`] – alpha multiplier
//! - [`rocket`] – rocket marker
//! - [`rotation`] – rotation angle in degrees
//! - [`scale`] – per-axis scale, negative x mirrors
//! - [`skeleton`] – skeletal animation handle and clip fallback
//! - [`sprite`] – textured quad (optionally tiled)
//! - [`textlabel`] – floating text
//! - [`tween`] – easing curves and time-based position tweens
//! - [`zindex`] – rendering order hint for 2D drawing

pub mod background;
pub mod bonetracker;
pub mod character;
pub mod delay;
pub mod effects;
pub mod mapposition;
pub mod opacity;
pub mod rocket;
pub mod rotation;
pub mod scale;
pub mod skeleton;
pub mod sprite;
pub mod textlabel;
pub mod tween;
pub mod zindex;
