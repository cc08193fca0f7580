//! Bone tracking and moving-bone probes.
//!
//! A tracked label follows one bone of its owner's skeleton. Each frame the
//! bone's world coordinates are mapped onto the stage through the owner's
//! position and scale, then the label's vertical offset is added. Tracking
//! stops by itself once the owner's first animation track is empty.
//!
//! [`detect_moving_bones`] snapshots every bone, optionally kicks off an
//! animation, and reports which bones moved during the probe window.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::bonetracker::{
    BoneInfo, BoneProbe, BoneTracker, MovingBoneReport, find_main_bone,
};
use crate::components::mapposition::MapPosition;
use crate::components::scale::Scale;
use crate::components::skeleton::{SkeletalInstance, Skeleton};
use crate::error::SceneError;
use crate::resources::completion::Completion;
use crate::resources::gameconfig::GameConfig;
use crate::resources::worldtime::WorldTime;
use crate::scenelog::SceneLogger;

const DEFAULT_PROBE_DELAY: f32 = 0.1;

fn logger() -> SceneLogger {
    SceneLogger::new("bones")
}

/// Stage position of bone `index` for an owner at `owner_pos` scaled by
/// `owner_scale`, shifted down by `offset_y`.
pub fn bone_screen_position(
    instance: &dyn SkeletalInstance,
    index: usize,
    owner_pos: Vec2,
    owner_scale: Vec2,
    offset_y: f32,
) -> Option<Vec2> {
    let bone = instance.bones().get(index)?;
    Some(owner_pos + bone.world * owner_scale + Vec2::new(0.0, offset_y))
}

fn track_active(instance: &dyn SkeletalInstance) -> bool {
    matches!(instance.tracks().first(), Some(Some(_)))
}

/// Resolve the tracked bone and begin following it.
///
/// Returns `false` when the label has no tracker, the owner has no skeleton,
/// or no bone can be resolved.
pub fn start_tracking(world: &mut World, label: Entity) -> bool {
    let Some(tracker) = world.get::<BoneTracker>(label).cloned() else {
        logger().warn(format!("{:?} has no bone tracker", label));
        return false;
    };
    let Some(skeleton) = world.get::<Skeleton>(tracker.owner) else {
        logger().warn(format!("owner {:?} has no skeleton", tracker.owner));
        return false;
    };
    let bones = skeleton.instance.bones();
    let Some(index) = find_main_bone(bones) else {
        logger().warn(format!(
            "no trackable bone on '{}' ({} bones)",
            skeleton.source,
            bones.len()
        ));
        return false;
    };
    let initial_local = bones[index].local;
    logger().debug(format!("tracking bone '{}' ({})", bones[index].name, index));

    let owner_pos = world
        .get::<MapPosition>(tracker.owner)
        .map(|p| p.pos)
        .unwrap_or(Vec2::ZERO);
    let owner_scale = world
        .get::<Scale>(tracker.owner)
        .map(|s| s.scale)
        .unwrap_or(Vec2::ONE);
    let placed = world.get::<Skeleton>(tracker.owner).and_then(|s| {
        bone_screen_position(
            s.instance.as_ref(),
            index,
            owner_pos,
            owner_scale,
            tracker.offset_y,
        )
    });

    let mut em = world.entity_mut(label);
    if let Some(mut t) = em.get_mut::<BoneTracker>() {
        t.bone = Some(index);
        t.initial_local = initial_local;
        t.tracking = true;
    }
    if let Some(pos) = placed {
        em.insert(MapPosition::from_vec(pos));
    }
    true
}

/// Stop following the bone. Safe to call repeatedly.
pub fn stop_tracking(world: &mut World, label: Entity) {
    if let Some(mut t) = world.get_mut::<BoneTracker>(label) {
        t.tracking = false;
    }
}

pub fn is_tracking(world: &World, label: Entity) -> bool {
    world
        .get::<BoneTracker>(label)
        .is_some_and(|t| t.tracking)
}

/// Moves tracked labels onto their bone.
pub fn bone_tracking_system(
    mut labels: Query<(&mut BoneTracker, &mut MapPosition)>,
    owners: Query<(&Skeleton, &MapPosition, Option<&Scale>), Without<BoneTracker>>,
) {
    for (mut tracker, mut pos) in labels.iter_mut() {
        if !tracker.tracking {
            continue;
        }
        let Some(index) = tracker.bone else {
            tracker.tracking = false;
            continue;
        };
        let Ok((skeleton, owner_pos, owner_scale)) = owners.get(tracker.owner) else {
            tracker.tracking = false;
            continue;
        };
        let instance = skeleton.instance.as_ref();
        if !track_active(instance) {
            tracker.tracking = false;
            logger().debug(format!("animation on '{}' ended, tracking stopped", skeleton.source));
            continue;
        }
        let scale = owner_scale.map(|s| s.scale).unwrap_or(Vec2::ONE);
        if let Some(p) =
            bone_screen_position(instance, index, owner_pos.pos, scale, tracker.offset_y)
        {
            pos.pos = p;
        }
    }
}

/// Current local and world coordinates of every bone of `entity`.
pub fn check_all_bone_positions(world: &World, entity: Entity) -> Vec<BoneInfo> {
    world
        .get::<Skeleton>(entity)
        .map(|s| {
            s.instance
                .bones()
                .iter()
                .enumerate()
                .map(|(i, b)| BoneInfo::from_bone(i, b))
                .collect()
        })
        .unwrap_or_default()
}

/// Probe which bones of `entity` move during the next `window` seconds.
///
/// Every bone is snapshotted first, then `on_start` runs (typically to start
/// the animation under test). Sampling begins after a short delay.
pub fn detect_moving_bones(
    world: &mut World,
    entity: Entity,
    window: f32,
    on_start: Option<Box<dyn FnOnce(&mut World)>>,
) -> Completion<MovingBoneReport> {
    if world.get::<Skeleton>(entity).is_none() {
        logger().warn(format!("cannot probe {:?}: no skeleton", entity));
        return Completion::rejected(SceneError::NotACharacter);
    }
    let snapshot = check_all_bone_positions(world, entity);
    if let Some(f) = on_start {
        f(world);
    }
    let delay = world
        .get_resource::<GameConfig>()
        .map(|c| c.probe_delay)
        .unwrap_or(DEFAULT_PROBE_DELAY);
    let started_at = world
        .get_resource::<WorldTime>()
        .map(|t| t.elapsed)
        .unwrap_or(0.0);
    let completion = Completion::new();
    logger().debug(format!(
        "probing {} bones for {:.2}s",
        snapshot.len(),
        window
    ));
    if let Ok(mut em) = world.get_entity_mut(entity) {
        em.insert(BoneProbe {
            snapshot,
            started_at,
            delay,
            window,
            moving: Vec::new(),
            completion: completion.clone(),
        });
    }
    completion
}

fn finish_probe(probe: &BoneProbe, elapsed: f32) {
    let report = MovingBoneReport {
        moving_bones: probe.moving.clone(),
        total_bones: probe.snapshot.len(),
        detection_duration: elapsed,
    };
    logger().info(format!(
        "{} of {} bones moved: [{}]",
        report.moving_bones.len(),
        report.total_bones,
        report.names().join(", ")
    ));
    probe.completion.resolve(report);
}

/// End a running probe early, resolving it with what was seen so far.
pub fn stop_detection(world: &mut World, entity: Entity) -> bool {
    let now = world
        .get_resource::<WorldTime>()
        .map(|t| t.elapsed)
        .unwrap_or(0.0);
    let Ok(mut em) = world.get_entity_mut(entity) else {
        return false;
    };
    match em.take::<BoneProbe>() {
        Some(probe) => {
            finish_probe(&probe, (now - probe.started_at).max(0.0));
            true
        }
        None => false,
    }
}

/// Samples running probes and resolves them when their window closes.
pub fn bone_probe_system(
    world_time: Res<WorldTime>,
    mut probes: Query<(Entity, &mut BoneProbe, &Skeleton)>,
    mut commands: Commands,
) {
    for (entity, mut probe, skeleton) in probes.iter_mut() {
        let elapsed = (world_time.elapsed - probe.started_at).max(0.0);
        if elapsed >= probe.delay {
            let bones = skeleton.instance.bones();
            let mut newly_moved = Vec::new();
            for initial in probe.snapshot.iter() {
                if probe.moving.iter().any(|m| m.index == initial.index) {
                    continue;
                }
                let Some(bone) = bones.get(initial.index) else {
                    continue;
                };
                let current = BoneInfo::from_bone(initial.index, bone);
                if current.moved_from(initial) {
                    newly_moved.push(current);
                }
            }
            probe.moving.extend(newly_moved);
        }
        if elapsed >= probe.window {
            finish_probe(&probe, elapsed);
            commands.entity(entity).remove::<BoneProbe>();
        }
    }
}
