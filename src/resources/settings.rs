//! Persisted key-value settings.
//!
//! The audio director keeps its volume and mute flags here. Two stores are
//! provided: [`IniSettingsStore`] writes through to an INI file with
//! `configparser`, and [`MemorySettingsStore`] keeps values in memory (its
//! clones share the same map).

use configparser::ini::Ini;
use log::warn;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// String key-value store.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// Read a boolean setting, falling back to `default` when absent or invalid.
pub fn get_bool(store: &dyn SettingsStore, key: &str, default: bool) -> bool {
    store
        .get(key)
        .and_then(|v| v.trim().parse::<bool>().ok())
        .unwrap_or(default)
}

/// Read a numeric setting, falling back to `default` when absent or invalid.
pub fn get_f32(store: &dyn SettingsStore, key: &str, default: f32) -> f32 {
    store
        .get(key)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

const SECTION: &str = "settings";

/// Settings persisted in an INI file under a `[settings]` section.
pub struct IniSettingsStore {
    path: PathBuf,
    ini: Ini,
}

impl IniSettingsStore {
    /// Open `path`; a missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        // Keys are case sensitive, e.g. "audio-bgm-enabled".
        let mut ini = Ini::new_cs();
        if path.exists() {
            if let Err(e) = ini.load(&path) {
                warn!("Failed to load settings {:?}: {}", path, e);
            }
        }
        IniSettingsStore { path, ini }
    }
}

impl SettingsStore for IniSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.ini.get(SECTION, key)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.ini.set(SECTION, key, Some(value.to_string()));
        if let Err(e) = self.ini.write(&self.path) {
            warn!("Failed to save settings {:?}: {}", self.path, e);
        }
    }
}

/// In-memory settings. Clones share storage.
#[derive(Clone, Default)]
pub struct MemorySettingsStore {
    values: Arc<Mutex<FxHashMap<String, String>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.values.lock() {
            Ok(map) => map.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        let mut map = match self.values.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_clones_share_values() {
        let mut a = MemorySettingsStore::new();
        let b = a.clone();
        a.set("audio-volume", "70");
        assert_eq!(b.get("audio-volume").as_deref(), Some("70"));
    }

    #[test]
    fn typed_getters_fall_back_on_garbage() {
        let mut s = MemorySettingsStore::new();
        s.set("audio-bgm-enabled", "nope");
        assert!(get_bool(&s, "audio-bgm-enabled", true));
        assert_eq!(get_f32(&s, "audio-volume", 50.0), 50.0);
    }
}
