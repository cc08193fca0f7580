//! Scene systems and world operations.
//!
//! Per-frame systems are added to the schedule built by
//! [`crate::game::SceneHost`]; the `&mut World` functions next to them are
//! the operations other subsystems (and hosts) call directly.
//!
//! Submodules overview
//! - [`assets`] – apply skeleton loads delivered by the asset bridge
//! - [`audio`] – state audio cues and forwarding of audio commands
//! - [`background`] – classic phased background scroller
//! - [`bonetracker`] – labels pinned to bones, moving-bone probes
//! - [`characters`] – boarding, disembarking, completion barrier, teardown
//! - [`effects`] – float, shake and fade/slide effects
//! - [`gamestate`] – transitions, entry hooks, countdown, round reset
//! - [`recycling`] – recycling backdrop with ramping speed
//! - [`rocket`] – rocket placement, float and restart choreography
//! - [`skeleton`] – advance skeletal instances
//! - [`time`] – update the shared clock, deliver delays

pub mod assets;
pub mod audio;
pub mod background;
pub mod bonetracker;
pub mod characters;
pub mod effects;
pub mod gamestate;
pub mod recycling;
pub mod rocket;
pub mod skeleton;
pub mod time;
