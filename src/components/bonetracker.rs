//! Bone tracking components.
//!
//! [`BoneTracker`] lives on a label entity and pins it to a bone of its
//! owner's skeleton, like a sticky attachment that follows a bone instead of
//! an entity origin. [`BoneProbe`] lives on a skeletal entity while
//! [`detect_moving_bones`](crate::systems::bonetracker::detect_moving_bones)
//! samples it.

use crate::components::skeleton::Bone;
use crate::resources::completion::Completion;
use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;

/// Default vertical distance between the tracked bone and the label.
pub const DEFAULT_LABEL_OFFSET_Y: f32 = 60.0;
/// Bone index used when no preferred bone name exists.
pub const FALLBACK_BONE_INDEX: usize = 24;
/// Preferred bone names, highest priority first.
pub const PREFERRED_BONES: [&str; 3] = ["me", "body", "jump"];
/// Minimum coordinate change for a bone to count as moving.
pub const MOVEMENT_THRESHOLD: f32 = 0.1;

/// Pick the bone a label should follow.
///
/// `me`, then `body`, then `jump`, then the bone at
/// [`FALLBACK_BONE_INDEX`]. `None` when none of those exist.
pub fn find_main_bone(bones: &[Bone]) -> Option<usize> {
    PREFERRED_BONES
        .iter()
        .find_map(|wanted| bones.iter().position(|b| b.name == *wanted))
        .or_else(|| (bones.len() > FALLBACK_BONE_INDEX).then_some(FALLBACK_BONE_INDEX))
}

/// Pins the entity's position to a bone of `owner`.
#[derive(Component, Debug, Clone)]
pub struct BoneTracker {
    pub owner: Entity,
    pub offset_y: f32,
    /// Index of the resolved bone, set by `start_tracking`.
    pub bone: Option<usize>,
    /// Local position of the bone when tracking started.
    pub initial_local: Vec2,
    pub tracking: bool,
}

impl BoneTracker {
    pub fn new(owner: Entity) -> Self {
        BoneTracker {
            owner,
            offset_y: DEFAULT_LABEL_OFFSET_Y,
            bone: None,
            initial_local: Vec2::ZERO,
            tracking: false,
        }
    }
    pub fn with_offset_y(mut self, offset_y: f32) -> Self {
        self.offset_y = offset_y;
        self
    }
}

/// Snapshot of one bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfo {
    pub name: String,
    pub index: usize,
    pub local: Vec2,
    pub world: Vec2,
}

impl BoneInfo {
    pub fn from_bone(index: usize, bone: &Bone) -> Self {
        let name = if bone.name.is_empty() {
            format!("bone-{}", index)
        } else {
            bone.name.clone()
        };
        BoneInfo {
            name,
            index,
            local: bone.local,
            world: bone.world,
        }
    }

    /// Whether any of the four coordinates moved beyond the threshold.
    pub fn moved_from(&self, initial: &BoneInfo) -> bool {
        (self.local.x - initial.local.x).abs() > MOVEMENT_THRESHOLD
            || (self.local.y - initial.local.y).abs() > MOVEMENT_THRESHOLD
            || (self.world.x - initial.world.x).abs() > MOVEMENT_THRESHOLD
            || (self.world.y - initial.world.y).abs() > MOVEMENT_THRESHOLD
    }
}

/// Outcome of a moving-bone probe.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingBoneReport {
    /// Bones that moved, in first-seen order, no duplicates.
    pub moving_bones: Vec<BoneInfo>,
    pub total_bones: usize,
    /// Seconds from probe start to resolution.
    pub detection_duration: f32,
}

impl MovingBoneReport {
    pub fn names(&self) -> Vec<&str> {
        self.moving_bones.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Active moving-bone probe on a skeletal entity.
#[derive(Component, Debug, Clone)]
pub struct BoneProbe {
    pub snapshot: Vec<BoneInfo>,
    pub started_at: f32,
    pub delay: f32,
    pub window: f32,
    pub moving: Vec<BoneInfo>,
    pub completion: Completion<MovingBoneReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bones(names: &[&str]) -> Vec<Bone> {
        names
            .iter()
            .map(|n| Bone::new(*n, Vec2::ZERO, Vec2::ZERO))
            .collect()
    }

    #[test]
    fn me_beats_body_and_jump() {
        let b = bones(&["root", "jump", "body", "me"]);
        assert_eq!(find_main_bone(&b), Some(3));
    }

    #[test]
    fn jump_is_used_without_me_and_body() {
        let b = bones(&["root", "arm", "jump"]);
        assert_eq!(find_main_bone(&b), Some(2));
    }

    #[test]
    fn fallback_index_needs_enough_bones() {
        let few = bones(&["root", "arm"]);
        assert_eq!(find_main_bone(&few), None);

        let names: Vec<String> = (0..30).map(|i| format!("b{}", i)).collect();
        let many: Vec<Bone> = names
            .iter()
            .map(|n| Bone::new(n.as_str(), Vec2::ZERO, Vec2::ZERO))
            .collect();
        assert_eq!(find_main_bone(&many), Some(FALLBACK_BONE_INDEX));
    }

    #[test]
    fn movement_threshold_is_strict() {
        let a = BoneInfo {
            name: "arm".into(),
            index: 0,
            local: Vec2::ZERO,
            world: Vec2::ZERO,
        };
        let mut b = a.clone();
        b.world.y = 0.1;
        assert!(!b.moved_from(&a));
        b.world.y = 0.11;
        assert!(b.moved_from(&a));
    }
}
