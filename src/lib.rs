//! Rocket flight scene library.
//!
//! This module exposes the scene's ECS components, resources, systems and
//! events, the scene host and the headless adapters, for use by the binary,
//! by render adapters and by integration tests.

pub mod components;
pub mod error;
pub mod events;
pub mod game;
pub mod headless;
pub mod resources;
pub mod scenelog;
pub mod systems;
