//! Scene configuration resource.
//!
//! Manages scene settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [viewport]
//! width = 540
//! height = 958
//!
//! [timing]
//! boarding_duration = 3.0
//! disembark_duration = 3.0
//! barrier_poll_interval = 0.2
//! countdown = 3.0
//! rocket_restart_delay = 0.6
//! transition_duration = 0.5
//! probe_delay = 0.1
//!
//! [background]
//! mode = classic
//! flying_speed = 5.0
//! frame_ms = 16.0
//!
//! [rocket]
//! float_range = 15.0
//! float_speed = 1.2
//! shake_duration = 1.0
//! shake_intensity = 10.0
//!
//! [labels]
//! offset_y = 60.0
//! font_size = 24.0
//!
//! [assets]
//! manifest = ./assets/manifest.json
//!
//! [random]
//! seed = 42
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default safe values for startup
const DEFAULT_VIEWPORT_WIDTH: f32 = 540.0;
const DEFAULT_VIEWPORT_HEIGHT: f32 = 958.0;
const DEFAULT_BOARDING_DURATION: f32 = 3.0;
const DEFAULT_DISEMBARK_DURATION: f32 = 3.0;
const DEFAULT_BARRIER_POLL_INTERVAL: f32 = 0.2;
const DEFAULT_COUNTDOWN: f32 = 3.0;
const DEFAULT_ROCKET_RESTART_DELAY: f32 = 0.6;
const DEFAULT_TRANSITION_DURATION: f32 = 0.5;
const DEFAULT_PROBE_DELAY: f32 = 0.1;
const DEFAULT_FLYING_SPEED: f32 = 5.0;
const DEFAULT_FRAME_MS: f32 = 16.0;
const DEFAULT_FLOAT_RANGE: f32 = 15.0;
const DEFAULT_FLOAT_SPEED: f32 = 1.2;
const DEFAULT_SHAKE_DURATION: f32 = 1.0;
const DEFAULT_SHAKE_INTENSITY: f32 = 10.0;
const DEFAULT_LABEL_OFFSET_Y: f32 = 60.0;
const DEFAULT_LABEL_FONT_SIZE: f32 = 24.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Which background variant the scene uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    /// Phase-based ground/takeoff/flying scroller.
    #[default]
    Classic,
    /// Continuously recycling backdrop of the "funky" skin.
    Funky,
}

impl FromStr for BackgroundMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(BackgroundMode::Classic),
            "funky" => Ok(BackgroundMode::Funky),
            other => Err(format!("unknown background mode '{}'", other)),
        }
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundMode::Classic => f.write_str("classic"),
            BackgroundMode::Funky => f.write_str("funky"),
        }
    }
}

/// Scene configuration resource.
///
/// Times are in seconds, speeds in stage units per frame, distances in
/// design units (scaled by the viewport when used).
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub boarding_duration: f32,
    pub disembark_duration: f32,
    /// Interval between checks of the "all characters complete" barrier.
    pub barrier_poll_interval: f32,
    pub countdown: f32,
    pub rocket_restart_delay: f32,
    pub transition_duration: f32,
    /// Delay before a moving-bone probe starts sampling.
    pub probe_delay: f32,
    pub background_mode: BackgroundMode,
    pub flying_speed: f32,
    /// Nominal frame length used by the takeoff/flying cadence formulas.
    pub frame_ms: f32,
    pub float_range: f32,
    pub float_speed: f32,
    pub shake_duration: f32,
    pub shake_intensity: f32,
    pub label_offset_y: f32,
    pub label_font_size: f32,
    pub manifest_path: Option<PathBuf>,
    pub seed: Option<u64>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            boarding_duration: DEFAULT_BOARDING_DURATION,
            disembark_duration: DEFAULT_DISEMBARK_DURATION,
            barrier_poll_interval: DEFAULT_BARRIER_POLL_INTERVAL,
            countdown: DEFAULT_COUNTDOWN,
            rocket_restart_delay: DEFAULT_ROCKET_RESTART_DELAY,
            transition_duration: DEFAULT_TRANSITION_DURATION,
            probe_delay: DEFAULT_PROBE_DELAY,
            background_mode: BackgroundMode::Classic,
            flying_speed: DEFAULT_FLYING_SPEED,
            frame_ms: DEFAULT_FRAME_MS,
            float_range: DEFAULT_FLOAT_RANGE,
            float_speed: DEFAULT_FLOAT_SPEED,
            shake_duration: DEFAULT_SHAKE_DURATION,
            shake_intensity: DEFAULT_SHAKE_INTENSITY,
            label_offset_y: DEFAULT_LABEL_OFFSET_Y,
            label_font_size: DEFAULT_LABEL_FONT_SIZE,
            manifest_path: None,
            seed: None,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply_ini(&config)?;

        info!(
            "Loaded config: viewport {}x{}, background={}, countdown={}s, seed={:?}",
            self.viewport_width,
            self.viewport_height,
            self.background_mode,
            self.countdown,
            self.seed
        );

        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply_ini(&config)
    }

    fn apply_ini(&mut self, config: &Ini) -> Result<(), String> {
        let float = |section: &str, key: &str, target: &mut f32| {
            if let Some(v) = config.getfloat(section, key).ok().flatten() {
                *target = v as f32;
            }
        };

        // [viewport] section
        float("viewport", "width", &mut self.viewport_width);
        float("viewport", "height", &mut self.viewport_height);

        // [timing] section
        float("timing", "boarding_duration", &mut self.boarding_duration);
        float("timing", "disembark_duration", &mut self.disembark_duration);
        float(
            "timing",
            "barrier_poll_interval",
            &mut self.barrier_poll_interval,
        );
        float("timing", "countdown", &mut self.countdown);
        float(
            "timing",
            "rocket_restart_delay",
            &mut self.rocket_restart_delay,
        );
        float("timing", "transition_duration", &mut self.transition_duration);
        float("timing", "probe_delay", &mut self.probe_delay);

        // [background] section
        if let Some(mode) = config.get("background", "mode") {
            self.background_mode = mode.parse()?;
        }
        float("background", "flying_speed", &mut self.flying_speed);
        float("background", "frame_ms", &mut self.frame_ms);

        // [rocket] section
        float("rocket", "float_range", &mut self.float_range);
        float("rocket", "float_speed", &mut self.float_speed);
        float("rocket", "shake_duration", &mut self.shake_duration);
        float("rocket", "shake_intensity", &mut self.shake_intensity);

        // [labels] section
        float("labels", "offset_y", &mut self.label_offset_y);
        float("labels", "font_size", &mut self.label_font_size);

        // [assets] section
        if let Some(manifest) = config.get("assets", "manifest") {
            self.manifest_path = Some(PathBuf::from(manifest));
        }

        // [random] section
        if let Some(seed) = config.getuint("random", "seed").ok().flatten() {
            self.seed = Some(seed);
        }

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();
        let mut put = |section: &str, key: &str, value: String| {
            config.set(section, key, Some(value));
        };

        put("viewport", "width", self.viewport_width.to_string());
        put("viewport", "height", self.viewport_height.to_string());

        put("timing", "boarding_duration", self.boarding_duration.to_string());
        put("timing", "disembark_duration", self.disembark_duration.to_string());
        put(
            "timing",
            "barrier_poll_interval",
            self.barrier_poll_interval.to_string(),
        );
        put("timing", "countdown", self.countdown.to_string());
        put(
            "timing",
            "rocket_restart_delay",
            self.rocket_restart_delay.to_string(),
        );
        put(
            "timing",
            "transition_duration",
            self.transition_duration.to_string(),
        );
        put("timing", "probe_delay", self.probe_delay.to_string());

        put("background", "mode", self.background_mode.to_string());
        put("background", "flying_speed", self.flying_speed.to_string());
        put("background", "frame_ms", self.frame_ms.to_string());

        put("rocket", "float_range", self.float_range.to_string());
        put("rocket", "float_speed", self.float_speed.to_string());
        put("rocket", "shake_duration", self.shake_duration.to_string());
        put("rocket", "shake_intensity", self.shake_intensity.to_string());

        put("labels", "offset_y", self.label_offset_y.to_string());
        put("labels", "font_size", self.label_font_size.to_string());

        if let Some(manifest) = &self.manifest_path {
            put("assets", "manifest", manifest.display().to_string());
        }
        if let Some(seed) = self.seed {
            put("random", "seed", seed.to_string());
        }

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Set viewport size.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }
}
