//! Event and message types.
//!
//! - [`audio`] – [`AudioCmd`](audio::AudioCmd) messages for the audio director
//! - [`delay`] – delayed signal delivery
//! - [`gamestate`] – state change request/announcement and the transition observer
//! - [`scene`] – lifecycle notifications (boarding finished, shake completed, ...)
pub mod audio;
pub mod delay;
pub mod gamestate;
pub mod scene;
