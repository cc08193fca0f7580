//! Headless adapters for the skeletal, asset and audio seams.
//!
//! Nothing here draws or plays anything. [`HeadlessSkeleton`] evaluates clips
//! as linear bone offsets over their duration, [`HeadlessAssetLoader`] hands
//! out rigs and texture sizes from memory, and [`RecordingAudioBackend`]
//! writes every playback call to a shared [`AudioLog`]. The binary drives
//! rounds with them; integration tests use them as fakes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::components::skeleton::{Bone, SkeletalInstance, TrackEntry};
use crate::error::SceneError;
use crate::resources::assets::{AssetLoader, AssetManifest, SkeletonAssets, TextureInfo};
use crate::resources::audio::{AudioBackend, AudioClip};
use crate::resources::scalecontext::{DESIGN_HEIGHT, DESIGN_WIDTH};

/// An animation clip: a duration plus per-bone offsets reached at its end.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpec {
    pub name: String,
    pub duration: f32,
    pub motion: Vec<(usize, Vec2)>,
}

impl ClipSpec {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        ClipSpec {
            name: name.into(),
            duration,
            motion: Vec::new(),
        }
    }

    /// Move bone `bone` by `delta` over the clip.
    pub fn moving(mut self, bone: usize, delta: Vec2) -> Self {
        self.motion.push((bone, delta));
        self
    }
}

#[derive(Debug, Clone)]
struct Queued {
    name: String,
    looped: bool,
    delay: f32,
}

/// In-memory skeletal instance.
#[derive(Debug, Clone)]
pub struct HeadlessSkeleton {
    clips: Vec<ClipSpec>,
    setup: Vec<Bone>,
    bones: Vec<Bone>,
    tracks: Vec<Option<TrackEntry>>,
    times: Vec<f32>,
    queues: Vec<VecDeque<Queued>>,
}

impl HeadlessSkeleton {
    pub fn new(bones: Vec<Bone>, clips: Vec<ClipSpec>) -> Self {
        HeadlessSkeleton {
            clips,
            setup: bones.clone(),
            bones,
            tracks: Vec::new(),
            times: Vec::new(),
            queues: Vec::new(),
        }
    }

    /// Bones named `names`, stacked 10 units apart above the origin.
    pub fn rig(names: &[&str]) -> Vec<Bone> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let p = Vec2::new(0.0, -10.0 * i as f32);
                Bone::new(*n, p, p)
            })
            .collect()
    }

    fn clip(&self, name: &str) -> Option<&ClipSpec> {
        self.clips.iter().find(|c| c.name == name)
    }

    fn ensure_track(&mut self, track: usize) {
        if self.tracks.len() <= track {
            self.tracks.resize(track + 1, None);
            self.times.resize(track + 1, 0.0);
            self.queues.resize_with(track + 1, VecDeque::new);
        }
    }

    fn start(&mut self, track: usize, name: String, looped: bool) {
        self.tracks[track] = Some(TrackEntry {
            animation: name,
            looped,
        });
        self.times[track] = 0.0;
    }

    fn progress(&self, track: usize) -> Option<(&ClipSpec, f32)> {
        let entry = self.tracks.get(track)?.as_ref()?;
        let clip = self.clip(&entry.animation)?;
        if clip.duration <= 0.0 {
            return Some((clip, 1.0));
        }
        let t = self.times[track] / clip.duration;
        let p = if entry.looped { t.fract() } else { t.min(1.0) };
        Some((clip, p))
    }

    fn pose(&mut self) {
        let mut offsets = vec![Vec2::ZERO; self.setup.len()];
        for track in 0..self.tracks.len() {
            if let Some((clip, p)) = self.progress(track) {
                for (bone, delta) in clip.motion.iter() {
                    if let Some(o) = offsets.get_mut(*bone) {
                        *o += *delta * p;
                    }
                }
            }
        }
        for ((bone, setup), offset) in self.bones.iter_mut().zip(&self.setup).zip(offsets) {
            bone.local = setup.local + offset;
            bone.world = setup.world + offset;
        }
    }

    fn advance_track(&mut self, track: usize, dt: f32) {
        let Some(entry) = self.tracks[track].clone() else {
            if let Some(front) = self.queues[track].front_mut() {
                front.delay -= dt;
                if front.delay <= 0.0
                    && let Some(q) = self.queues[track].pop_front()
                {
                    self.start(track, q.name, q.looped);
                }
            }
            return;
        };
        self.times[track] += dt;
        let duration = self.clip(&entry.animation).map_or(0.0, |c| c.duration);
        if !entry.looped && self.times[track] >= duration {
            match self.queues[track].pop_front() {
                Some(q) => self.start(track, q.name, q.looped),
                None => self.tracks[track] = None,
            }
            return;
        }
        if entry.looped
            && let Some(front) = self.queues[track].front_mut()
        {
            front.delay -= dt;
            if front.delay <= 0.0
                && let Some(q) = self.queues[track].pop_front()
            {
                self.start(track, q.name, q.looped);
            }
        }
    }
}

impl SkeletalInstance for HeadlessSkeleton {
    fn animation_names(&self) -> Vec<String> {
        self.clips.iter().map(|c| c.name.clone()).collect()
    }

    fn bones(&self) -> &[Bone] {
        &self.bones
    }

    fn tracks(&self) -> &[Option<TrackEntry>] {
        &self.tracks
    }

    fn set_animation(&mut self, track: usize, name: &str, looped: bool) -> bool {
        if self.clip(name).is_none() {
            return false;
        }
        self.ensure_track(track);
        self.queues[track].clear();
        self.start(track, name.to_string(), looped);
        self.pose();
        true
    }

    fn add_animation(&mut self, track: usize, name: &str, looped: bool, delay: f32) -> bool {
        if self.clip(name).is_none() {
            return false;
        }
        self.ensure_track(track);
        self.queues[track].push_back(Queued {
            name: name.to_string(),
            looped,
            delay,
        });
        true
    }

    fn clear_track(&mut self, track: usize) {
        if track < self.tracks.len() {
            self.tracks[track] = None;
            self.queues[track].clear();
            self.pose();
        }
    }

    fn clear_tracks(&mut self) {
        self.tracks.clear();
        self.times.clear();
        self.queues.clear();
        self.pose();
    }

    fn set_to_setup_pose(&mut self) {
        self.bones = self.setup.clone();
    }

    fn update(&mut self, dt: f32) {
        for track in 0..self.tracks.len() {
            self.advance_track(track, dt);
        }
        self.pose();
    }
}

/// Default rocket rig: a looping `launch`, a short `restart` and the
/// player's `launch_player` overlay.
pub fn rocket_rig() -> (Vec<Bone>, Vec<ClipSpec>) {
    (
        HeadlessSkeleton::rig(&["root", "body", "flame"]),
        vec![
            ClipSpec::new("launch", 1.0).moving(2, Vec2::new(0.0, 4.0)),
            ClipSpec::new("restart", 0.5).moving(1, Vec2::new(0.0, -2.0)),
            ClipSpec::new("launch_player", 1.2).moving(2, Vec2::new(0.0, 8.0)),
        ],
    )
}

/// Default walk rig with one clip per walking direction.
pub fn walk_rig() -> (Vec<Bone>, Vec<ClipSpec>) {
    (
        HeadlessSkeleton::rig(&["root", "body", "me"]),
        vec![
            ClipSpec::new("me_walk", 3.0).moving(0, Vec2::new(-40.0, 0.0)),
            ClipSpec::new("others_walk", 3.0).moving(0, Vec2::new(40.0, 0.0)),
        ],
    )
}

/// Default jump rig with three variants per character kind.
pub fn jump_rig() -> (Vec<Bone>, Vec<ClipSpec>) {
    let mut clips = Vec::new();
    for base in ["jump_me", "jump_others"] {
        for suffix in ["", "2", "3"] {
            clips.push(
                ClipSpec::new(format!("{}{}", base, suffix), 3.0)
                    .moving(0, Vec2::new(0.0, 120.0))
                    .moving(3, Vec2::new(0.0, 120.0)),
            );
        }
    }
    (HeadlessSkeleton::rig(&["root", "arm", "body", "me"]), clips)
}

/// Asset loader serving rigs and texture sizes from memory.
///
/// Every texture reports the design resolution unless overridden. Paths
/// registered with [`fail`](Self::fail) refuse to load.
#[derive(Debug, Clone)]
pub struct HeadlessAssetLoader {
    skeletons: FxHashMap<String, (Vec<Bone>, Vec<ClipSpec>)>,
    textures: FxHashMap<String, TextureInfo>,
    default_texture: TextureInfo,
    failing: FxHashSet<String>,
}

impl HeadlessAssetLoader {
    /// Loader with the default rigs registered under the manifest's paths.
    pub fn new(manifest: &AssetManifest) -> Self {
        let mut skeletons = FxHashMap::default();
        skeletons.insert(manifest.rocket.skel_path.clone(), rocket_rig());
        skeletons.insert(manifest.walk.skel_path.clone(), walk_rig());
        skeletons.insert(manifest.jump.skel_path.clone(), jump_rig());
        HeadlessAssetLoader {
            skeletons,
            textures: FxHashMap::default(),
            default_texture: TextureInfo {
                width: DESIGN_WIDTH,
                height: DESIGN_HEIGHT,
            },
            failing: FxHashSet::default(),
        }
    }

    pub fn with_skeleton(
        mut self,
        skel_path: impl Into<String>,
        bones: Vec<Bone>,
        clips: Vec<ClipSpec>,
    ) -> Self {
        self.skeletons.insert(skel_path.into(), (bones, clips));
        self
    }

    pub fn with_texture(mut self, path: impl Into<String>, width: f32, height: f32) -> Self {
        self.textures
            .insert(path.into(), TextureInfo { width, height });
        self
    }

    /// Make every load of `path` fail.
    pub fn fail(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }
}

impl AssetLoader for HeadlessAssetLoader {
    fn load_skeleton(
        &self,
        assets: &SkeletonAssets,
    ) -> Result<Box<dyn SkeletalInstance>, SceneError> {
        let path = &assets.skel_path;
        if self.failing.contains(path) {
            return Err(SceneError::asset_load(path.as_str(), "refused"));
        }
        let (bones, clips) = self
            .skeletons
            .get(path)
            .ok_or_else(|| SceneError::asset_load(path.as_str(), "unknown skeleton"))?;
        Ok(Box::new(HeadlessSkeleton::new(bones.clone(), clips.clone())))
    }

    fn load_texture(&self, path: &str) -> Result<TextureInfo, SceneError> {
        if self.failing.contains(path) {
            return Err(SceneError::asset_load(path, "refused"));
        }
        Ok(self
            .textures
            .get(path)
            .copied()
            .unwrap_or(self.default_texture))
    }
}

/// Shared, append-only record of audio calls, e.g. `play bgm_fly`.
#[derive(Debug, Clone, Default)]
pub struct AudioLog(Arc<Mutex<Vec<String>>>);

impl AudioLog {
    pub fn push(&self, entry: String) {
        if let Ok(mut v) = self.0.lock() {
            v.push(entry);
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// How many entries equal `entry`.
    pub fn count(&self, entry: &str) -> usize {
        self.0
            .lock()
            .map(|v| v.iter().filter(|e| *e == entry).count())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut v) = self.0.lock() {
            v.clear();
        }
    }
}

/// Audio clip that records what it is asked to do.
pub struct RecordingClip {
    key: String,
    log: AudioLog,
    volume: f32,
}

impl AudioClip for RecordingClip {
    fn clone_instance(&self) -> Box<dyn AudioClip> {
        Box::new(RecordingClip {
            key: self.key.clone(),
            log: self.log.clone(),
            volume: self.volume,
        })
    }

    fn play(&mut self) -> Result<(), SceneError> {
        self.log.push(format!("play {}", self.key));
        Ok(())
    }

    fn pause(&mut self) {
        self.log.push(format!("pause {}", self.key));
    }

    fn set_current_time(&mut self, _seconds: f32) {}

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_loop(&mut self, _looped: bool) {}
}

/// Audio backend whose clips write to an [`AudioLog`].
#[derive(Debug, Clone, Default)]
pub struct RecordingAudioBackend {
    pub log: AudioLog,
    missing: FxHashSet<String>,
}

impl RecordingAudioBackend {
    pub fn new(log: AudioLog) -> Self {
        RecordingAudioBackend {
            log,
            missing: FxHashSet::default(),
        }
    }

    /// Make loading `key` fail.
    pub fn without(mut self, key: impl Into<String>) -> Self {
        self.missing.insert(key.into());
        self
    }
}

impl AudioBackend for RecordingAudioBackend {
    fn load(&self, key: &str, path: &str) -> Result<Box<dyn AudioClip>, SceneError> {
        if self.missing.contains(key) {
            return Err(SceneError::asset_load(path, "no such clip"));
        }
        Ok(Box::new(RecordingClip {
            key: key.to_string(),
            log: self.log.clone(),
            volume: 1.0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton() -> HeadlessSkeleton {
        let (bones, clips) = rocket_rig();
        HeadlessSkeleton::new(bones, clips)
    }

    #[test]
    fn one_shot_clip_clears_its_track() {
        let mut s = skeleton();
        assert!(s.set_animation(0, "restart", false));
        s.update(0.3);
        assert!(matches!(s.tracks().first(), Some(Some(_))));
        s.update(0.3);
        assert!(matches!(s.tracks().first(), Some(None)));
    }

    #[test]
    fn queued_clip_follows_one_shot() {
        let mut s = skeleton();
        s.set_animation(0, "restart", false);
        s.add_animation(0, "launch", true, 0.0);
        s.update(0.6);
        let entry = s.tracks()[0].clone();
        assert_eq!(entry.map(|e| e.animation).as_deref(), Some("launch"));
    }

    #[test]
    fn unknown_clip_is_refused() {
        let mut s = skeleton();
        assert!(!s.set_animation(0, "dance", true));
        assert!(s.tracks().is_empty());
    }

    #[test]
    fn motion_moves_only_listed_bones() {
        let mut s = skeleton();
        s.set_animation(0, "launch", true);
        s.update(0.5);
        assert_eq!(s.bones()[0].world, Vec2::new(0.0, 0.0));
        assert!((s.bones()[2].world.y - (-20.0 + 2.0)).abs() < 1e-4);
        s.set_to_setup_pose();
        assert_eq!(s.bones()[2].world, Vec2::new(0.0, -20.0));
    }
}
