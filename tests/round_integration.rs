//! Whole-round scenarios driven through the scene host.

mod common;

use bevy_ecs::prelude::*;
use glam::Vec2;

use common::{
    approx_v2, entered, make_host, make_host_with, record_transitions, test_config,
    three_passengers, tick_for, tick_until,
};
use rocketflight::components::character::{BoardingMove, Character, CharacterKind, Direction};
use rocketflight::components::effects::{FloatEffect, ShakeEffect};
use rocketflight::components::mapposition::MapPosition;
use rocketflight::components::scale::Scale;
use rocketflight::components::tween::TweenPosition;
use rocketflight::components::skeleton::Skeleton;
use rocketflight::components::textlabel::TextLabel;
use rocketflight::headless::HeadlessAssetLoader;
use rocketflight::resources::assets::AssetManifest;
use rocketflight::resources::audio::AudioDirector;
use rocketflight::resources::gameconfig::BackgroundMode;
use rocketflight::resources::gamestate::GameStates;
use rocketflight::resources::round::{OnBoard, Passenger, RoundOutcome, RoundPlan};
use rocketflight::resources::scalecontext::ScaleContext;
use rocketflight::systems::characters::{
    animate_boarding, animate_disembarking, character_count, create_disembarking,
};
use rocketflight::systems::rocket::rocket;

fn rocket_pos(world: &World) -> Vec2 {
    let e = rocket(world).expect("rocket");
    world.get::<MapPosition>(e).unwrap().pos
}

fn label_count(world: &mut World) -> usize {
    world.query::<&TextLabel>().iter(world).count()
}

#[test]
fn completed_round_walks_every_state_in_order() {
    let (mut host, audio) = make_host(test_config(BackgroundMode::Classic));
    record_transitions(&mut host);

    assert!(host.start_round(three_passengers()));
    assert_eq!(host.state(), GameStates::Boarding);
    assert!(tick_until(&mut host, GameStates::Flying, 15.0));
    tick_for(&mut host, 2.0);
    assert!(host.begin_disembark(RoundOutcome::Completed));
    assert!(tick_until(&mut host, GameStates::Completed, 10.0));
    host.tick(common::DT);

    assert_eq!(
        entered(&host),
        vec![
            GameStates::Boarding,
            GameStates::Countdown,
            GameStates::Launching,
            GameStates::Flying,
            GameStates::Disembarking,
            GameStates::Completed,
        ]
    );
    assert_eq!(character_count(host.world()), 0);
    assert_eq!(audio.count("play into"), 1);
    assert_eq!(audio.count("play countdown_5_sec"), 1);
    assert_eq!(audio.count("play rocket_prelaunch"), 1);
    assert_eq!(audio.count("play user_jump"), 1);
    assert_eq!(audio.count("play other_jump"), 2);
    assert_eq!(audio.count("play win"), 1);
    assert_eq!(host.world().resource::<AudioDirector>().active_bgm_count(), 0);
}

#[test]
fn boarding_waits_for_every_walk_before_counting_down() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());

    host.tick(common::DT);
    assert_eq!(character_count(host.world()), 3);

    // Walks take the boarding duration; nobody has arrived yet.
    tick_for(&mut host, 2.5);
    assert_eq!(host.state(), GameStates::Boarding);
    assert_eq!(character_count(host.world()), 3);

    assert!(tick_until(&mut host, GameStates::Countdown, 2.0));
    assert_eq!(character_count(host.world()), 0);
    assert_eq!(host.world().resource::<OnBoard>().count(), 2);
}

#[test]
fn music_is_not_doubled_across_states() {
    let (mut host, audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());

    assert!(tick_until(&mut host, GameStates::Launching, 10.0));
    host.tick(common::DT);
    {
        let director = host.world().resource::<AudioDirector>();
        assert_eq!(director.active_bgm_keys(), vec!["bgm_open".to_string()]);
    }
    assert_eq!(audio.count("play bgm_open"), 1);

    assert!(tick_until(&mut host, GameStates::Flying, 5.0));
    host.tick(common::DT);
    {
        let director = host.world().resource::<AudioDirector>();
        assert_eq!(
            director.active_bgm_keys(),
            vec!["bgm_fly".to_string(), "rocket_fly".to_string()]
        );
    }
    assert_eq!(audio.count("pause bgm_open"), 1);
    assert_eq!(audio.count("play bgm_fly"), 1);
    assert_eq!(audio.count("play rocket_fly"), 1);

    host.begin_disembark(RoundOutcome::Completed);
    tick_for(&mut host, 0.5);
    assert_eq!(host.world().resource::<AudioDirector>().active_bgm_count(), 2);
    assert_eq!(audio.count("play bgm_fly"), 1);
}

#[test]
fn player_launch_clip_plays_once_per_round() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    assert!(tick_until(&mut host, GameStates::Launching, 10.0));

    let world = host.world();
    assert!(world.resource::<OnBoard>().launch_player_played);
    let e = rocket(world).unwrap();
    let tracks = world.get::<Skeleton>(e).unwrap().instance.tracks().to_vec();
    assert_eq!(
        tracks.get(1).and_then(|t| t.as_ref()).map(|t| t.animation.as_str()),
        Some("launch_player")
    );
}

#[test]
fn launch_clip_skipped_without_the_player() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    let plan = RoundPlan::new(vec![Passenger::new("bob", CharacterKind::Npc)]);
    host.start_round(plan);
    assert!(tick_until(&mut host, GameStates::Launching, 10.0));
    assert!(!host.world().resource::<OnBoard>().launch_player_played);
}

#[test]
fn exploding_round_shakes_and_settles_on_base_pose() {
    let (mut host, audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers().with_outcome(RoundOutcome::Exploded));
    assert!(tick_until(&mut host, GameStates::Flying, 15.0));
    tick_for(&mut host, 1.0);
    host.begin_disembark(RoundOutcome::Exploded);
    assert!(tick_until(&mut host, GameStates::Exploding, 10.0));

    let e = rocket(host.world()).unwrap();
    let base = host
        .world()
        .get::<ShakeEffect>(e)
        .expect("shake running")
        .base
        .pos;
    assert!(host.world().get::<FloatEffect>(e).is_none());

    tick_for(&mut host, 2.0);
    assert!(host.world().get::<ShakeEffect>(e).is_none());
    assert_eq!(rocket_pos(host.world()), base);
    assert_eq!(audio.count("play rocket_explode"), 1);
    assert_eq!(host.world().resource::<AudioDirector>().active_bgm_count(), 0);
}

#[test]
fn reset_mid_flight_returns_everything_to_idle() {
    let (mut host, audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    assert!(tick_until(&mut host, GameStates::Flying, 15.0));
    tick_for(&mut host, 1.0);

    let e = rocket(host.world()).unwrap();
    assert!(host.world().get::<FloatEffect>(e).is_some());
    let anchor = host.world().resource::<ScaleContext>().anchor();
    assert_ne!(rocket_pos(host.world()), anchor);

    host.reset_round();
    assert_eq!(host.state(), GameStates::Idle);
    assert!(host.world().get::<FloatEffect>(e).is_none());
    assert_eq!(rocket_pos(host.world()), anchor);

    tick_for(&mut host, 1.0);
    assert_eq!(rocket_pos(host.world()), anchor);
    assert_eq!(host.world().resource::<AudioDirector>().active_bgm_count(), 0);
    assert_eq!(audio.count("play return"), 1);
}

#[test]
fn reset_during_disembark_removes_characters_and_labels() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    assert!(tick_until(&mut host, GameStates::Flying, 15.0));
    host.begin_disembark(RoundOutcome::Completed);
    host.tick(common::DT);
    assert_eq!(character_count(host.world()), 3);
    assert_eq!(label_count(host.world_mut()), 2);

    host.reset_round();
    assert_eq!(character_count(host.world()), 0);
    assert_eq!(label_count(host.world_mut()), 0);
    let mut q = host.world_mut().query::<&Character>();
    assert_eq!(q.iter(host.world()).count(), 0);

    // The barrier was disarmed with the round.
    tick_for(&mut host, 2.0);
    assert_eq!(host.state(), GameStates::Idle);
}

#[test]
fn loads_finishing_after_a_reset_are_dropped() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    // Loads are done but not applied yet.
    host.reset_round();
    tick_for(&mut host, 0.5);

    assert_eq!(host.state(), GameStates::Idle);
    assert_eq!(character_count(host.world()), 0);
    let mut q = host.world_mut().query::<&Character>();
    assert_eq!(q.iter(host.world()).count(), 0);
}

#[test]
fn failed_walk_load_does_not_block_boarding() {
    let manifest = AssetManifest::default();
    let loader = HeadlessAssetLoader::new(&manifest).fail(manifest.walk.skel_path.clone());
    let (mut host, _audio) = make_host_with(test_config(BackgroundMode::Classic), loader, manifest);

    host.start_round(three_passengers());
    assert!(tick_until(&mut host, GameStates::Countdown, 2.0));
    assert_eq!(host.world().resource::<OnBoard>().count(), 0);
}

#[test]
fn rounds_can_be_played_back_to_back() {
    let (mut host, audio) = make_host(test_config(BackgroundMode::Funky));
    for _ in 0..2 {
        assert!(host.start_round(three_passengers()));
        assert!(tick_until(&mut host, GameStates::Flying, 15.0));
        tick_for(&mut host, 0.5);
        host.begin_disembark(RoundOutcome::Completed);
        assert!(tick_until(&mut host, GameStates::Completed, 10.0));
        host.reset_round();
        tick_for(&mut host, 1.0);
    }
    assert_eq!(audio.count("play win"), 2);
    assert_eq!(audio.count("play bgm_open"), 2);
}

#[test]
fn state_changes_outside_the_round_are_refused() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    assert!(!host.begin_disembark(RoundOutcome::Completed));
    assert!(host.start_round(three_passengers()));
    assert!(!host.start_round(three_passengers()));
    assert_eq!(host.state(), GameStates::Boarding);
}

#[test]
fn destroy_leaves_an_empty_stage() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    host.tick(common::DT);
    host.destroy();

    assert_eq!(character_count(host.world()), 0);
    assert!(rocket(host.world()).is_none());
    tick_for(&mut host, 0.5);
    let mut q = host.world_mut().query::<&Character>();
    assert_eq!(q.iter(host.world()).count(), 0);
}

#[test]
fn boarding_again_mid_walk_keeps_the_running_walk() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    tick_for(&mut host, 1.0);

    let world = host.world_mut();
    let mut q = world.query::<(Entity, &Character, &BoardingMove, &TweenPosition)>();
    let (e, kind, first, started_at) = q
        .iter(world)
        .map(|(e, c, b, t)| (e, c.kind, b.completion.clone(), t.started_at))
        .next()
        .expect("a walking character");
    let before = world.get::<MapPosition>(e).unwrap().pos;

    let again = animate_boarding(world, e, Direction::for_kind(kind)).expect("walk running");
    assert!(again.same_as(&first));
    assert_eq!(world.get::<TweenPosition>(e).unwrap().started_at, started_at);
    assert_eq!(world.get::<MapPosition>(e).unwrap().pos, before);

    tick_for(&mut host, 0.5);
    assert!(!first.is_settled());
    assert!(tick_until(&mut host, GameStates::Countdown, 3.0));
    assert!(first.is_ok());
}

#[test]
fn resize_while_exploding_settles_on_the_new_anchor() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers().with_outcome(RoundOutcome::Exploded));
    assert!(tick_until(&mut host, GameStates::Flying, 15.0));
    host.begin_disembark(RoundOutcome::Exploded);
    assert!(tick_until(&mut host, GameStates::Exploding, 10.0));
    host.tick(common::DT);

    let e = rocket(host.world()).unwrap();
    assert!(host.world().get::<ShakeEffect>(e).is_some());
    host.resize(1080.0, 1916.0);
    let anchor = host.world().resource::<ScaleContext>().anchor();
    let base = host.world().get::<ShakeEffect>(e).unwrap().base;
    assert_eq!(base.pos, anchor);
    assert!(approx_v2(base.scale, Vec2::splat(1.3)));

    tick_for(&mut host, 2.0);
    assert!(host.world().get::<ShakeEffect>(e).is_none());
    assert_eq!(rocket_pos(host.world()), anchor);
    assert!(approx_v2(host.world().get::<Scale>(e).unwrap().scale, Vec2::splat(1.3)));
}

#[test]
fn disembarking_character_shows_when_its_jump_starts() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    host.tick(common::DT);
    {
        let world = host.world_mut();
        let mut q = world.query::<&Character>();
        assert!(q.iter(world).all(|c| c.visible));
    }
    assert!(tick_until(&mut host, GameStates::Flying, 15.0));

    let world = host.world_mut();
    let e = create_disembarking(world, CharacterKind::Npc, "zed", "Zed").expect("spawned");
    assert!(!world.get::<Character>(e).unwrap().visible);
    animate_disembarking(world, e).unwrap();
    assert!(world.get::<Character>(e).unwrap().visible);
}
