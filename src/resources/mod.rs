//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution: timing, round state, configuration,
//! subsystem state and the seams to external collaborators. Each submodule
//! documents the semantics and intended usage of its resource(s).
//!
//! Overview
//! - `assets` – asset loader seam, manifest and the asynchronous load bridge
//! - `audio` – audio director with BGM/sound effect playback and mute flags
//! - `background` – phase-based scroller and recycling backdrop state
//! - `characterregistry` – live characters keyed by id
//! - `completion` – one-shot completions and the polling completion barrier
//! - `countdown` – pre-launch countdown
//! - `effects` – effect token issuer
//! - `gameconfig` – INI-backed scene configuration
//! - `gamestate` – authoritative and pending round state
//! - `rendersurface` – render surface liveness and generation
//! - `rng` – injectable randomness source
//! - `rocket` – rocket controller state
//! - `round` – round plan, outcome and passengers on board
//! - `scalecontext` – viewport size and design-resolution scale factors
//! - `settings` – persisted key-value settings
//! - `statehooks` – entry hook per round state
//! - `worldtime` – shared animation clock
pub mod assets;
pub mod audio;
pub mod background;
pub mod characterregistry;
pub mod completion;
pub mod countdown;
pub mod effects;
pub mod gameconfig;
pub mod gamestate;
pub mod rendersurface;
pub mod rng;
pub mod rocket;
pub mod round;
pub mod scalecontext;
pub mod settings;
pub mod statehooks;
pub mod worldtime;
