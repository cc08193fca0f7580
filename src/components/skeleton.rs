//! Skeletal animation handle and the capability set the core relies on.
//!
//! Skeletal evaluation belongs to the render adapter. The core only needs a
//! small surface of it: list clips, read bones, drive numbered tracks and
//! return to the setup pose. Adapters implement [`SkeletalInstance`]; the
//! entity carries it boxed inside a [`Skeleton`] component, while the
//! transform lives in the usual [`MapPosition`](super::mapposition::MapPosition),
//! [`Rotation`](super::rotation::Rotation) and [`Scale`](super::scale::Scale)
//! components.
//!
//! Missing clips are never fatal. [`play_clip`] resolves a requested name
//! through [`resolve_clip`]: exact match first, then a substring search over
//! known synonyms, then the first clip the skeleton has.

use crate::error::SceneError;
use crate::scenelog::SceneLogger;
use bevy_ecs::prelude::Component;
use glam::Vec2;

/// A single bone sample: local position relative to its parent and world
/// position relative to the skeleton origin (before the owner's scale).
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub local: Vec2,
    pub world: Vec2,
}

impl Bone {
    pub fn new(name: impl Into<String>, local: Vec2, world: Vec2) -> Self {
        Bone {
            name: name.into(),
            local,
            world,
        }
    }
}

/// Clip currently occupying an animation track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub animation: String,
    pub looped: bool,
}

/// Capabilities of a loaded skeletal animation instance.
pub trait SkeletalInstance: Send + Sync {
    /// Names of every clip in the skeleton data.
    fn animation_names(&self) -> Vec<String>;
    /// Current bone samples, in skeleton order.
    fn bones(&self) -> &[Bone];
    /// Track list; an empty list or a `None` first track means nothing plays.
    fn tracks(&self) -> &[Option<TrackEntry>];
    /// Replace whatever plays on `track` with `name`. Returns `false` when the
    /// clip does not exist.
    fn set_animation(&mut self, track: usize, name: &str, looped: bool) -> bool;
    /// Queue `name` on `track` after `delay` seconds.
    fn add_animation(&mut self, track: usize, name: &str, looped: bool, delay: f32) -> bool;
    fn clear_track(&mut self, track: usize);
    fn clear_tracks(&mut self);
    fn set_to_setup_pose(&mut self);
    /// Advance the animation state by `dt` seconds. Adapters that are
    /// evaluated by their own renderer leave this as a no-op.
    fn update(&mut self, _dt: f32) {}

    fn has_animation(&self, name: &str) -> bool {
        self.animation_names().iter().any(|n| n == name)
    }
}

/// Skeletal animation attached to an entity.
#[derive(Component)]
pub struct Skeleton {
    /// Path of the skeleton file the instance was loaded from.
    pub source: String,
    pub instance: Box<dyn SkeletalInstance>,
}

impl Skeleton {
    pub fn new(source: impl Into<String>, instance: Box<dyn SkeletalInstance>) -> Self {
        Skeleton {
            source: source.into(),
            instance,
        }
    }
}

/// Synonym groups used when a requested clip is missing.
const CLIP_SYNONYMS: &[&[&str]] = &[
    &["walk", "run", "move"],
    &["jump", "hop", "leap"],
    &["launch", "idle", "loop", "fly"],
    &["restart", "shake", "reset", "idle"],
];

/// Resolve `requested` against the clips in `available`.
///
/// Returns the exact name when present. Otherwise every synonym group that
/// mentions a keyword contained in `requested` is searched in order, and the
/// first clip containing one of its keywords wins. As a last resort the first
/// available clip is returned. `None` only when the skeleton has no clips.
pub fn resolve_clip(available: &[String], requested: &str) -> Option<String> {
    if available.iter().any(|n| n == requested) {
        return Some(requested.to_string());
    }
    let wanted = requested.to_lowercase();
    for group in CLIP_SYNONYMS {
        if !group.iter().any(|k| wanted.contains(k)) {
            continue;
        }
        for keyword in group.iter() {
            if let Some(found) = available
                .iter()
                .find(|n| n.to_lowercase().contains(keyword))
            {
                return Some(found.clone());
            }
        }
    }
    available.first().cloned()
}

/// Play `requested` on `track`, falling back through [`resolve_clip`].
///
/// Returns the clip name that actually plays. A fallback is logged as a
/// warning; a skeleton without any clips yields
/// [`SceneError::AnimationClipMissing`].
pub fn play_clip(
    instance: &mut dyn SkeletalInstance,
    track: usize,
    requested: &str,
    looped: bool,
    logger: &SceneLogger,
) -> Result<String, SceneError> {
    let names = instance.animation_names();
    let Some(clip) = resolve_clip(&names, requested) else {
        logger.warn(format!("no clips available for '{}'", requested));
        return Err(SceneError::AnimationClipMissing {
            requested: requested.to_string(),
        });
    };
    if clip != requested {
        logger.warn(format!(
            "clip '{}' missing, falling back to '{}' (available: {})",
            requested,
            clip,
            names.join(", ")
        ));
    }
    if !instance.set_animation(track, &clip, looped) {
        return Err(SceneError::AnimationClipMissing { requested: clip });
    }
    logger.debug(format!("playing '{}' on track {} (loop: {})", clip, track, looped));
    Ok(clip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_clip_wins() {
        let clips = names(&["idle", "me_walk", "others_walk"]);
        assert_eq!(resolve_clip(&clips, "me_walk").as_deref(), Some("me_walk"));
    }

    #[test]
    fn synonym_substring_is_used_when_missing() {
        let clips = names(&["idle", "run_cycle"]);
        assert_eq!(
            resolve_clip(&clips, "others_walk").as_deref(),
            Some("run_cycle")
        );
    }

    #[test]
    fn launch_falls_back_to_idle() {
        let clips = names(&["restart", "idle_loop"]);
        assert_eq!(resolve_clip(&clips, "launch").as_deref(), Some("idle_loop"));
    }

    #[test]
    fn unknown_request_takes_first_clip() {
        let clips = names(&["spin", "wave"]);
        assert_eq!(resolve_clip(&clips, "dance").as_deref(), Some("spin"));
    }

    #[test]
    fn no_clips_resolves_to_none() {
        assert_eq!(resolve_clip(&[], "launch"), None);
    }
}
