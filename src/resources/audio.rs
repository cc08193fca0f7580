//! Audio director resource.
//!
//! Audio decoding and output belong to an external backend reached through
//! [`AudioBackend`]/[`AudioClip`]. The director keeps one preloaded template
//! clip per key and clones it for playback:
//! - background music is tracked per key so restarting a key replaces its
//!   instance, while distinct keys play side by side;
//! - sound effects get a fresh instance every time so they can overlap.
//!
//! BGM and sound effects are muted independently. Volume and both flags are
//! persisted in a [`SettingsStore`] under `audio-volume` (0-100),
//! `audio-bgm-enabled` and `audio-sound-enabled`.
//!
//! Game code does not call the director directly; it writes
//! [`AudioCmd`](crate::events::audio::AudioCmd) messages which
//! [`crate::systems::audio::apply_audio_cmds`] forwards once per frame.

use crate::error::SceneError;
use crate::resources::gamestate::GameStates;
use crate::resources::settings::{SettingsStore, get_bool, get_f32};
use crate::scenelog::SceneLogger;
use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

pub const KEY_VOLUME: &str = "audio-volume";
pub const KEY_BGM_ENABLED: &str = "audio-bgm-enabled";
pub const KEY_SOUND_ENABLED: &str = "audio-sound-enabled";
/// Volume in percent when nothing is persisted.
pub const DEFAULT_VOLUME_PERCENT: f32 = 50.0;

/// A playable audio instance.
pub trait AudioClip: Send + Sync {
    /// Independent instance sharing the same source.
    fn clone_instance(&self) -> Box<dyn AudioClip>;
    fn play(&mut self) -> Result<(), SceneError>;
    fn pause(&mut self);
    fn set_current_time(&mut self, seconds: f32);
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn set_loop(&mut self, looped: bool);
}

/// Loads audio by path.
pub trait AudioBackend: Send + Sync {
    fn load(&self, key: &str, path: &str) -> Result<Box<dyn AudioClip>, SceneError>;
}

#[derive(Resource)]
pub struct AudioDirector {
    backend: Box<dyn AudioBackend>,
    settings: Box<dyn SettingsStore>,
    cache: FxHashMap<String, Box<dyn AudioClip>>,
    active_bgms: FxHashMap<String, Box<dyn AudioClip>>,
    volume: f32,
    bgm_enabled: bool,
    sound_enabled: bool,
    pub logger: SceneLogger,
}

impl AudioDirector {
    /// Create a director, restoring volume and flags from `settings`.
    pub fn new(backend: Box<dyn AudioBackend>, settings: Box<dyn SettingsStore>) -> Self {
        let percent = get_f32(settings.as_ref(), KEY_VOLUME, DEFAULT_VOLUME_PERCENT);
        let bgm_enabled = get_bool(settings.as_ref(), KEY_BGM_ENABLED, true);
        let sound_enabled = get_bool(settings.as_ref(), KEY_SOUND_ENABLED, true);
        AudioDirector {
            backend,
            settings,
            cache: FxHashMap::default(),
            active_bgms: FxHashMap::default(),
            volume: (percent / 100.0).clamp(0.0, 1.0),
            bgm_enabled,
            sound_enabled,
            logger: SceneLogger::new("audio"),
        }
    }

    /// Load every `(key, path)` pair. Failures are logged and skipped.
    pub fn preload<'a>(&mut self, catalog: impl IntoIterator<Item = (&'a str, &'a str)>) -> usize {
        let mut loaded = 0;
        for (key, path) in catalog {
            match self.backend.load(key, path) {
                Ok(mut clip) => {
                    clip.set_volume(self.volume);
                    self.cache.insert(key.to_string(), clip);
                    loaded += 1;
                    self.logger.debug(format!("preloaded '{}' from {}", key, path));
                }
                Err(e) => self.logger.error(format!("audio preload failed: {}", e)),
            }
        }
        loaded
    }

    /// Start background music under `key`, restarting it if already playing.
    pub fn play_bgm(&mut self, key: &str, looped: bool) {
        if !self.bgm_enabled {
            return;
        }
        self.stop_bgm(Some(key));
        let Some(template) = self.cache.get(key) else {
            self.logger.warn(format!("unknown BGM key '{}'", key));
            return;
        };
        let mut instance = template.clone_instance();
        instance.set_loop(looped);
        instance.set_current_time(0.0);
        instance.set_volume(self.volume);
        if let Err(e) = instance.play() {
            self.logger.warn(format!("BGM '{}' failed to play: {}", key, e));
        }
        self.active_bgms.insert(key.to_string(), instance);
        self.logger.info(format!(
            "BGM '{}' playing ({} active)",
            key,
            self.active_bgms.len()
        ));
    }

    /// Stop one BGM, or every BGM when `key` is `None`.
    pub fn stop_bgm(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                if let Some(mut bgm) = self.active_bgms.remove(key) {
                    bgm.pause();
                    bgm.set_current_time(0.0);
                    self.logger.debug(format!("BGM '{}' stopped", key));
                }
            }
            None => {
                for (_, mut bgm) in self.active_bgms.drain() {
                    bgm.pause();
                    bgm.set_current_time(0.0);
                }
                self.logger.debug("all BGM stopped");
            }
        }
    }

    /// Fire a one-shot sound effect on a fresh instance.
    pub fn play_sound(&mut self, key: &str) {
        if !self.sound_enabled {
            return;
        }
        let Some(template) = self.cache.get(key) else {
            self.logger.warn(format!("unknown sound key '{}'", key));
            return;
        };
        let mut instance = template.clone_instance();
        instance.set_current_time(0.0);
        instance.set_volume(self.volume);
        if let Err(e) = instance.play() {
            self.logger.warn(format!("sound '{}' failed to play: {}", key, e));
        }
    }

    /// Set the normalized volume, clamped to `[0, 1]`, on every cached and
    /// playing instance.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        for clip in self.cache.values_mut() {
            clip.set_volume(volume);
        }
        for bgm in self.active_bgms.values_mut() {
            bgm.set_volume(volume);
        }
        let percent = (volume * 100.0).round() as u32;
        self.settings.set(KEY_VOLUME, &percent.to_string());
    }

    pub fn toggle_bgm(&mut self) {
        self.set_bgm_enabled(!self.bgm_enabled);
    }

    pub fn toggle_sound_effect(&mut self) {
        self.set_sound_effect_enabled(!self.sound_enabled);
    }

    /// Enable or disable BGM. Disabling stops everything that plays.
    pub fn set_bgm_enabled(&mut self, enabled: bool) {
        self.bgm_enabled = enabled;
        self.settings.set(KEY_BGM_ENABLED, &enabled.to_string());
        if !enabled {
            self.stop_bgm(None);
        }
        self.logger
            .info(format!("BGM {}", if enabled { "on" } else { "off" }));
    }

    pub fn set_sound_effect_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        self.settings.set(KEY_SOUND_ENABLED, &enabled.to_string());
        self.logger
            .info(format!("sound effects {}", if enabled { "on" } else { "off" }));
    }

    /// Background music for a round state.
    pub fn play_bgm_for_state(&mut self, state: GameStates) {
        match state {
            GameStates::Boarding | GameStates::Countdown | GameStates::Launching => {
                self.play_bgm("bgm_open", true);
            }
            GameStates::Flying | GameStates::Disembarking => {
                self.play_bgm("bgm_fly", true);
                self.play_bgm("rocket_fly", true);
            }
            GameStates::Idle | GameStates::Exploding | GameStates::Completed => {}
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
    pub fn bgm_enabled(&self) -> bool {
        self.bgm_enabled
    }
    pub fn sound_effect_enabled(&self) -> bool {
        self.sound_enabled
    }
    pub fn is_bgm_active(&self, key: &str) -> bool {
        self.active_bgms.contains_key(key)
    }
    /// Volume of the playing instance under `key`.
    pub fn bgm_volume(&self, key: &str) -> Option<f32> {
        self.active_bgms.get(key).map(|bgm| bgm.volume())
    }
    pub fn active_bgm_count(&self) -> usize {
        self.active_bgms.len()
    }
    /// Keys of the BGMs currently playing, sorted.
    pub fn active_bgm_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.active_bgms.keys().cloned().collect();
        keys.sort();
        keys
    }
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }

    /// Stop all music and release every cached clip.
    pub fn dispose(&mut self) {
        self.stop_bgm(None);
        for (_, mut clip) in self.cache.drain() {
            clip.pause();
        }
        self.logger.info("audio director disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{AudioLog, RecordingAudioBackend};
    use crate::resources::settings::MemorySettingsStore;

    const EPSILON: f32 = 1e-6;

    fn director() -> (AudioDirector, AudioLog, MemorySettingsStore) {
        let log = AudioLog::default();
        let settings = MemorySettingsStore::new();
        let mut director = AudioDirector::new(
            Box::new(RecordingAudioBackend::new(log.clone())),
            Box::new(settings.clone()),
        );
        director.preload([
            ("bgm_fly", "audio/bgm_fly.mp3"),
            ("rocket_fly", "audio/rocket_fly.mp3"),
            ("win", "audio/win.mp3"),
        ]);
        (director, log, settings)
    }

    #[test]
    fn replaying_a_bgm_key_keeps_one_instance() {
        let (mut director, log, _) = director();
        director.play_bgm("bgm_fly", true);
        director.play_bgm("bgm_fly", true);
        assert_eq!(director.active_bgm_count(), 1);
        assert_eq!(director.active_bgm_keys(), vec!["bgm_fly".to_string()]);
        assert_eq!(log.count("play bgm_fly"), 2);
        assert_eq!(log.count("pause bgm_fly"), 1);

        director.play_bgm("rocket_fly", true);
        assert_eq!(director.active_bgm_count(), 2);
    }

    #[test]
    fn volume_reaches_playing_music_clamped() {
        let (mut director, _, settings) = director();
        director.play_bgm("bgm_fly", true);
        assert!((director.bgm_volume("bgm_fly").unwrap() - 0.5).abs() < EPSILON);

        director.set_volume(1.7);
        assert_eq!(director.bgm_volume("bgm_fly"), Some(1.0));
        assert_eq!(settings.get(KEY_VOLUME).as_deref(), Some("100"));

        director.set_volume(0.3);
        assert!((director.bgm_volume("bgm_fly").unwrap() - 0.3).abs() < EPSILON);
        director.set_volume(-2.0);
        assert_eq!(director.bgm_volume("bgm_fly"), Some(0.0));
        assert_eq!(director.bgm_volume("win"), None);
    }

    #[test]
    fn muted_sound_effects_do_not_play() {
        let (mut director, log, _) = director();
        director.toggle_sound_effect();
        director.play_sound("win");
        assert_eq!(log.count("play win"), 0);
        director.toggle_sound_effect();
        director.play_sound("win");
        director.play_sound("win");
        assert_eq!(log.count("play win"), 2);
        assert_eq!(director.active_bgm_count(), 0);
    }
}
