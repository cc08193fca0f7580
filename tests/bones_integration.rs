//! Bone tracking and moving-bone probe tests.

mod common;

use bevy_ecs::prelude::*;
use glam::Vec2;

use common::{DT, approx_v2, make_host, make_world, spawn_skeleton, test_config, tick_until};
use rocketflight::components::bonetracker::{BoneTracker, FALLBACK_BONE_INDEX};
use rocketflight::components::character::Character;
use rocketflight::components::mapposition::MapPosition;
use rocketflight::components::scale::Scale;
use rocketflight::components::skeleton::Skeleton;
use rocketflight::components::textlabel::TextLabel;
use rocketflight::headless::{ClipSpec, HeadlessSkeleton};
use rocketflight::resources::gameconfig::BackgroundMode;
use rocketflight::resources::gamestate::GameStates;
use rocketflight::resources::round::{Passenger, RoundOutcome, RoundPlan};
use rocketflight::components::character::CharacterKind;
use rocketflight::systems::bonetracker::{
    bone_probe_system, bone_tracking_system, check_all_bone_positions, detect_moving_bones,
    is_tracking, start_tracking, stop_detection,
};
use rocketflight::systems::skeleton::advance_skeletons;
use rocketflight::systems::time::update_world_time;

fn bone_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((advance_skeletons, bone_tracking_system, bone_probe_system).chain());
    schedule
}

fn frames(world: &mut World, schedule: &mut Schedule, n: u32) {
    for _ in 0..n {
        update_world_time(world, DT);
        schedule.run(world);
    }
}

fn unnamed_rig(count: usize) -> Vec<rocketflight::components::skeleton::Bone> {
    let names: Vec<String> = (0..count).map(|i| format!("b{}", i)).collect();
    let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    HeadlessSkeleton::rig(&refs)
}

#[test]
fn label_follows_fallback_bone_while_animation_plays() {
    let mut world = make_world(DT);
    let mut schedule = bone_schedule();
    let owner = spawn_skeleton(
        &mut world,
        unnamed_rig(30),
        vec![ClipSpec::new("jump", 0.5).moving(FALLBACK_BONE_INDEX, Vec2::new(0.0, -50.0))],
        Vec2::new(100.0, 200.0),
    );
    world.entity_mut(owner).insert(Scale::uniform(0.5));
    let label = world
        .spawn((
            MapPosition::new(0.0, 0.0),
            BoneTracker::new(owner).with_offset_y(60.0),
        ))
        .id();

    world
        .get_mut::<Skeleton>(owner)
        .unwrap()
        .instance
        .set_animation(0, "jump", false);
    assert!(start_tracking(&mut world, label));
    assert_eq!(
        world.get::<BoneTracker>(label).unwrap().bone,
        Some(FALLBACK_BONE_INDEX)
    );
    // Bone 24 sits at (0, -240) in skeleton space.
    assert!(approx_v2(
        world.get::<MapPosition>(label).unwrap().pos,
        Vec2::new(100.0, 200.0 - 120.0 + 60.0)
    ));

    frames(&mut world, &mut schedule, 10);
    assert!(is_tracking(&world, label));
    let mid = world.get::<MapPosition>(label).unwrap().pos;
    assert!(mid.y < 140.0, "label should rise with the bone, at {:?}", mid);

    frames(&mut world, &mut schedule, 40);
    assert!(!is_tracking(&world, label));
    let parked = world.get::<MapPosition>(label).unwrap().pos;
    frames(&mut world, &mut schedule, 10);
    assert_eq!(world.get::<MapPosition>(label).unwrap().pos, parked);
}

#[test]
fn tracking_refused_without_a_usable_bone() {
    let mut world = make_world(DT);
    let owner = spawn_skeleton(&mut world, unnamed_rig(5), Vec::new(), Vec2::ZERO);
    let label = world
        .spawn((MapPosition::new(0.0, 0.0), BoneTracker::new(owner)))
        .id();
    assert!(!start_tracking(&mut world, label));
    assert!(!is_tracking(&world, label));

    let plain = world.spawn(MapPosition::new(0.0, 0.0)).id();
    assert!(!start_tracking(&mut world, plain));
}

fn waving_owner(world: &mut World) -> Entity {
    spawn_skeleton(
        world,
        HeadlessSkeleton::rig(&["root", "arm", "leg"]),
        vec![
            ClipSpec::new("wave", 1.0)
                .moving(0, Vec2::new(10.0, 0.0))
                .moving(1, Vec2::new(0.0, 10.0)),
        ],
        Vec2::ZERO,
    )
}

#[test]
fn probe_reports_only_bones_that_moved() {
    let mut world = make_world(DT);
    let mut schedule = bone_schedule();
    let owner = waving_owner(&mut world);

    let completion = detect_moving_bones(
        &mut world,
        owner,
        0.5,
        Some(Box::new(move |w: &mut World| {
            if let Some(mut s) = w.get_mut::<Skeleton>(owner) {
                s.instance.set_animation(0, "wave", true);
            }
        })),
    );
    assert!(!completion.is_settled());

    frames(&mut world, &mut schedule, 40);
    let report = completion
        .outcome()
        .expect("probe finished")
        .as_ref()
        .expect("probe succeeded")
        .clone();
    assert_eq!(report.names(), vec!["root", "arm"]);
    assert_eq!(report.total_bones, 3);
    assert!(report.detection_duration >= 0.5);
}

#[test]
fn probe_without_movement_reports_nothing() {
    let mut world = make_world(DT);
    let mut schedule = bone_schedule();
    let owner = waving_owner(&mut world);

    let completion = detect_moving_bones(&mut world, owner, 0.3, None);
    frames(&mut world, &mut schedule, 30);
    let report = completion.outcome().unwrap().as_ref().unwrap().clone();
    assert!(report.moving_bones.is_empty());
    assert_eq!(report.total_bones, 3);
}

#[test]
fn stopped_probe_resolves_with_partial_results() {
    let mut world = make_world(DT);
    let mut schedule = bone_schedule();
    let owner = waving_owner(&mut world);
    world
        .get_mut::<Skeleton>(owner)
        .unwrap()
        .instance
        .set_animation(0, "wave", true);

    let completion = detect_moving_bones(&mut world, owner, 10.0, None);
    frames(&mut world, &mut schedule, 20);
    assert!(!completion.is_settled());

    assert!(stop_detection(&mut world, owner));
    let report = completion.outcome().unwrap().as_ref().unwrap().clone();
    assert_eq!(report.names(), vec!["root", "arm"]);
    assert!(report.detection_duration < 10.0);
    assert!(!stop_detection(&mut world, owner));
}

#[test]
fn probe_on_entity_without_skeleton_is_rejected() {
    let mut world = make_world(DT);
    let e = world.spawn(MapPosition::new(0.0, 0.0)).id();
    let completion = detect_moving_bones(&mut world, e, 0.5, None);
    assert!(matches!(completion.outcome(), Some(Err(_))));
}

#[test]
fn bone_snapshot_lists_every_bone() {
    let mut world = make_world(DT);
    let owner = waving_owner(&mut world);
    let bones = check_all_bone_positions(&world, owner);
    assert_eq!(bones.len(), 3);
    assert_eq!(bones[1].name, "arm");
    assert_eq!(bones[1].world, Vec2::new(0.0, -10.0));
}

#[test]
fn disembark_labels_show_one_frame_after_tracking_starts() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    let plan = RoundPlan::new(vec![
        Passenger::new("me", CharacterKind::Player).with_label("You"),
    ]);
    host.start_round(plan);
    assert!(tick_until(&mut host, GameStates::Flying, 15.0));
    host.begin_disembark(RoundOutcome::Completed);

    let world = host.world_mut();
    let mut q = world.query::<(Entity, &TextLabel, &BoneTracker)>();
    let (label, text, tracker) = q.single(world).expect("one label");
    assert!(!text.visible);
    assert!(tracker.tracking);
    let owner = tracker.owner;
    assert!(world.get::<Character>(owner).is_some());

    host.tick(DT);
    assert!(host.world().get::<TextLabel>(label).unwrap().visible);
    let tracker = host.world().get::<BoneTracker>(label).unwrap();
    // The jump rig has a bone named `me`.
    assert_eq!(tracker.bone, Some(3));
}
