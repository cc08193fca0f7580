//! Asset loading seam.
//!
//! Parsing skeleton, atlas and image files is the render adapter's job; the
//! core sees it through the [`AssetLoader`] trait. Paths come from an
//! [`AssetManifest`] (JSON, with built-in defaults).
//!
//! Two access paths exist:
//! - [`SceneAssets`] loads synchronously and caches texture sizes. Used by
//!   operations that return the loaded entity directly.
//! - [`AssetBridge`] runs loads on a worker thread fed by crossbeam channels.
//!   Every request is stamped with the render-surface generation; results are
//!   applied by [`apply_loaded_assets`](crate::systems::assets::apply_loaded_assets)
//!   only if that generation is still current, otherwise dropped.

use crate::components::character::CharacterKind;
use crate::components::skeleton::SkeletalInstance;
use crate::error::SceneError;
use crate::scenelog::SceneLogger;
use bevy_ecs::prelude::Resource;
use crossbeam_channel::{Receiver, Sender, unbounded};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Files that make up one skeletal asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkeletonAssets {
    pub skel_path: String,
    pub atlas_path: String,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl SkeletonAssets {
    /// Assets laid out as `<root>/<name>/<name>.{skel,atlas,png}`.
    pub fn named(root: &str, name: &str) -> Self {
        SkeletonAssets {
            skel_path: format!("{}/{}/{}.skel", root, name, name),
            atlas_path: format!("{}/{}/{}.atlas", root, name, name),
            image_path: Some(format!("{}/{}/{}.png", root, name, name)),
        }
    }
}

/// Native size of a loaded texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureInfo {
    pub width: f32,
    pub height: f32,
}

/// External loader for skeletons and textures.
pub trait AssetLoader: Send + Sync {
    fn load_skeleton(&self, assets: &SkeletonAssets)
    -> Result<Box<dyn SkeletalInstance>, SceneError>;
    fn load_texture(&self, path: &str) -> Result<TextureInfo, SceneError>;
}

/// Images of the phase-based scroller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicBackgroundAssets {
    pub ground: String,
    pub takeoff: Vec<String>,
    pub flying: Vec<String>,
}

impl Default for ClassicBackgroundAssets {
    fn default() -> Self {
        let root = "/cashorcrash2/avif/assets/bg";
        ClassicBackgroundAssets {
            ground: format!("{}/low_altitude_bg_5.avif", root),
            takeoff: (1..=4)
                .rev()
                .map(|i| format!("{}/low_altitude_bg_{}.avif", root, i))
                .collect(),
            flying: (1..=8)
                .rev()
                .map(|i| format!("{}/high_altitude_bg_{}.avif", root, i))
                .collect(),
        }
    }
}

/// Images of the recycling backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunkyBackgroundAssets {
    pub ground: String,
    pub cycle: String,
    pub front_cloud: String,
}

impl Default for FunkyBackgroundAssets {
    fn default() -> Self {
        FunkyBackgroundAssets {
            ground: "/funkyRocket/png/bgDefault.png".into(),
            cycle: "/funkyRocket/png/bgCycle.png".into(),
            front_cloud: "/funkyRocket/png/frontCloud.png".into(),
        }
    }
}

/// Every asset path the scene uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub rocket: SkeletonAssets,
    pub walk: SkeletonAssets,
    pub jump: SkeletonAssets,
    pub classic_background: ClassicBackgroundAssets,
    pub funky_background: FunkyBackgroundAssets,
    /// Audio key to file path.
    pub audio: BTreeMap<String, String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        let spine = "/funkyRocket/spine";
        let audio = [
            ("into", "into.mp3"),
            ("button_bet", "button_bet.mp3"),
            ("button_normal", "button_normal.mp3"),
            ("bgm_open", "start.mp3"),
            ("bgm_fly", "loop.mp3"),
            ("rocket_fly", "rocketFly.mp3"),
            ("countdown_5_sec", "countdown5sec.mp3"),
            ("countdown_10_sec", "countdown10sec.mp3"),
            ("rocket_prelaunch", "launch.mp3"),
            ("user_jump", "jumpMe.mp3"),
            ("other_jump", "jumpOther.mp3"),
            ("win", "win.mp3"),
            ("rocket_explode", "explode.mp3"),
            ("return", "return.mp3"),
        ]
        .into_iter()
        .map(|(k, f)| (k.to_string(), format!("/funkyRocket/mp3/{}", f)))
        .collect();

        AssetManifest {
            rocket: SkeletonAssets::named(spine, "rocket"),
            walk: SkeletonAssets::named(spine, "walk"),
            jump: SkeletonAssets::named(spine, "jump"),
            classic_background: ClassicBackgroundAssets::default(),
            funky_background: FunkyBackgroundAssets::default(),
            audio,
        }
    }
}

impl AssetManifest {
    /// Parse a manifest from JSON. Missing sections keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        serde_json::from_str(text).map_err(|e| SceneError::asset_load("manifest", e.to_string()))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SceneError::asset_load(path.display().to_string(), e.to_string()))?;
        Self::from_json(&text)
    }
}

/// Synchronous access to the loader plus a texture size cache.
#[derive(Resource)]
pub struct SceneAssets {
    pub loader: Arc<dyn AssetLoader>,
    pub manifest: AssetManifest,
    textures: FxHashMap<String, TextureInfo>,
    pub logger: SceneLogger,
}

impl SceneAssets {
    pub fn new(loader: Arc<dyn AssetLoader>, manifest: AssetManifest) -> Self {
        SceneAssets {
            loader,
            manifest,
            textures: FxHashMap::default(),
            logger: SceneLogger::new("assets"),
        }
    }

    /// Texture size, loading and caching it on first use.
    pub fn texture(&mut self, path: &str) -> Result<TextureInfo, SceneError> {
        if let Some(info) = self.textures.get(path) {
            return Ok(*info);
        }
        match self.loader.load_texture(path) {
            Ok(info) => {
                self.textures.insert(path.to_string(), info);
                Ok(info)
            }
            Err(e) => {
                self.logger.error(format!("texture load failed: {}", e));
                Err(e)
            }
        }
    }

    /// Load every texture in `paths`, returning how many succeeded.
    pub fn preload_textures<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) -> usize {
        let mut ok = 0;
        for p in paths {
            if self.texture(p).is_ok() {
                ok += 1;
            }
        }
        self.logger.debug(format!("preloaded {} textures", ok));
        ok
    }

    pub fn skeleton(
        &self,
        assets: &SkeletonAssets,
    ) -> Result<Box<dyn SkeletalInstance>, SceneError> {
        self.loader.load_skeleton(assets).inspect_err(|e| {
            self.logger.error(format!("skeleton load failed: {}", e));
        })
    }
}

/// What to do with a skeleton once it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPurpose {
    /// Spawn a boarding character and start its walk.
    Boarding { id: String, kind: CharacterKind },
}

/// Request sent to the loader worker.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub generation: u64,
    pub assets: SkeletonAssets,
    pub purpose: LoadPurpose,
}

/// Result sent back by the loader worker.
pub struct LoadResult {
    pub generation: u64,
    pub assets: SkeletonAssets,
    pub purpose: LoadPurpose,
    pub outcome: Result<Box<dyn SkeletalInstance>, SceneError>,
}

fn run_request(loader: &dyn AssetLoader, req: LoadRequest) -> LoadResult {
    let outcome = loader.load_skeleton(&req.assets);
    LoadResult {
        generation: req.generation,
        assets: req.assets,
        purpose: req.purpose,
        outcome,
    }
}

/// Entry point of the loader worker thread.
///
/// Runs until every request sender is dropped or the result receiver goes
/// away.
pub fn asset_worker(
    loader: Arc<dyn AssetLoader>,
    rx_req: Receiver<LoadRequest>,
    tx_res: Sender<LoadResult>,
) {
    log::debug!(
        target: "rocketflight::assets",
        "loader thread starting (id={:?})",
        std::thread::current().id()
    );
    for req in rx_req.iter() {
        if tx_res.send(run_request(loader.as_ref(), req)).is_err() {
            break;
        }
    }
    log::debug!(target: "rocketflight::assets", "loader thread exiting");
}

enum BridgeMode {
    Threaded {
        tx_req: Sender<LoadRequest>,
        handle: JoinHandle<()>,
    },
    Inline {
        loader: Arc<dyn AssetLoader>,
        tx_res: Sender<LoadResult>,
    },
    Closed,
}

/// Bridge between the world and asynchronous skeleton loads.
#[derive(Resource)]
pub struct AssetBridge {
    mode: BridgeMode,
    rx_res: Receiver<LoadResult>,
    pending: usize,
    pub logger: SceneLogger,
}

impl AssetBridge {
    /// Spawn a worker thread that performs loads.
    pub fn threaded(loader: Arc<dyn AssetLoader>) -> Self {
        let (tx_req, rx_req) = unbounded::<LoadRequest>();
        let (tx_res, rx_res) = unbounded::<LoadResult>();
        let handle = std::thread::spawn(move || asset_worker(loader, rx_req, tx_res));
        AssetBridge {
            mode: BridgeMode::Threaded { tx_req, handle },
            rx_res,
            pending: 0,
            logger: SceneLogger::new("assets"),
        }
    }

    /// Perform loads on the calling thread. Results are still delivered
    /// through the channel and applied on the next frame, which keeps
    /// ordering identical to the threaded bridge while staying deterministic.
    pub fn inline(loader: Arc<dyn AssetLoader>) -> Self {
        let (tx_res, rx_res) = unbounded::<LoadResult>();
        AssetBridge {
            mode: BridgeMode::Inline { loader, tx_res },
            rx_res,
            pending: 0,
            logger: SceneLogger::new("assets"),
        }
    }

    /// Queue a skeleton load. Returns `false` if the bridge is closed.
    pub fn request(&mut self, req: LoadRequest) -> bool {
        let sent = match &self.mode {
            BridgeMode::Threaded { tx_req, .. } => tx_req.send(req).is_ok(),
            BridgeMode::Inline { loader, tx_res } => {
                tx_res.send(run_request(loader.as_ref(), req)).is_ok()
            }
            BridgeMode::Closed => false,
        };
        if sent {
            self.pending += 1;
        } else {
            self.logger.warn("load requested on a closed asset bridge");
        }
        sent
    }

    /// Loads requested but not yet applied.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Take every result that has arrived so far.
    pub fn drain(&mut self) -> Vec<LoadResult> {
        let results: Vec<LoadResult> = self.rx_res.try_iter().collect();
        self.pending = self.pending.saturating_sub(results.len());
        results
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(&mut self) {
        match std::mem::replace(&mut self.mode, BridgeMode::Closed) {
            BridgeMode::Threaded { tx_req, handle } => {
                drop(tx_req);
                if handle.join().is_err() {
                    self.logger.error("loader thread panicked");
                }
            }
            BridgeMode::Inline { .. } | BridgeMode::Closed => {}
        }
        self.pending = 0;
    }
}

impl Drop for AssetBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_has_full_audio_catalog() {
        let m = AssetManifest::default();
        for key in [
            "into",
            "bgm_open",
            "bgm_fly",
            "rocket_fly",
            "rocket_prelaunch",
            "win",
            "rocket_explode",
        ] {
            assert!(m.audio.contains_key(key), "missing {}", key);
        }
        assert_eq!(m.classic_background.takeoff.len(), 4);
        assert_eq!(m.classic_background.flying.len(), 8);
        assert_eq!(m.rocket.skel_path, "/funkyRocket/spine/rocket/rocket.skel");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let m = AssetManifest::from_json(
            r#"{"funky_background": {"ground": "g.png", "cycle": "c.png", "front_cloud": "f.png"}}"#,
        )
        .unwrap();
        assert_eq!(m.funky_background.cycle, "c.png");
        assert_eq!(m.classic_background.flying.len(), 8);
    }

    #[test]
    fn malformed_json_is_an_asset_error() {
        let err = AssetManifest::from_json("{not json").unwrap_err();
        assert!(matches!(err, SceneError::AssetLoad { .. }));
    }
}
