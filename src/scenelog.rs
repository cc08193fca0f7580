//! Per-subsystem logging context.
//!
//! Every subsystem resource owns a [`SceneLogger`] built when the world is
//! assembled. The logger only carries a `log` target, so filtering works the
//! usual `env_logger` way:
//!
//! ```sh
//! RUST_LOG=rocketflight::background=debug cargo run
//! ```
//!
//! Nothing here installs a logger; the binary does that.

use log::Level;

/// Lightweight logging handle bound to a single subsystem target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLogger {
    target: String,
}

impl SceneLogger {
    /// Create a logger for `subsystem`, logging under `rocketflight::<subsystem>`.
    pub fn new(subsystem: &str) -> Self {
        SceneLogger {
            target: format!("rocketflight::{}", subsystem),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, msg: impl AsRef<str>) {
        log::log!(target: self.target.as_str(), level, "{}", msg.as_ref());
    }

    pub fn debug(&self, msg: impl AsRef<str>) {
        self.log(Level::Debug, msg);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(Level::Info, msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.log(Level::Warn, msg);
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(Level::Error, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_namespaced_by_crate() {
        let logger = SceneLogger::new("effects");
        assert_eq!(logger.target(), "rocketflight::effects");
    }
}
