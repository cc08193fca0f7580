//! Background scroller, recycling backdrop and resize layout tests.

mod common;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use glam::Vec2;

use common::{DT, make_host, make_world_with_assets, test_config, three_passengers};
use rocketflight::components::background::{BackdropPart, BackgroundLayer, RecyclingLayer};
use rocketflight::components::character::Character;
use rocketflight::components::effects::FadeSlideTransition;
use rocketflight::components::mapposition::MapPosition;
use rocketflight::components::opacity::Opacity;
use rocketflight::components::scale::Scale;
use rocketflight::components::sprite::Sprite;
use rocketflight::components::zindex::{ZIndex, layers};
use rocketflight::resources::background::{BackgroundPhase, BackgroundScroller, RecyclingBackdrop};
use rocketflight::resources::gameconfig::{BackgroundMode, GameConfig};
use rocketflight::resources::gamestate::GameStates;
use rocketflight::resources::scalecontext::ScaleContext;
use rocketflight::systems::background::{
    background_cadence_system, background_scroll_system, background_status, reset_background,
    set_ground, start_takeoff, stop_background, update_flying_speed,
};
use rocketflight::systems::effects::fade_slide_system;
use rocketflight::systems::recycling::{
    observe_backdrop_transition, recycling_scroll_system, reset_with_transition, setup_recycling,
    start_scroll,
};
use rocketflight::systems::rocket::rocket;
use rocketflight::systems::time::update_world_time;

fn near(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

fn classic_world(speed: f32) -> World {
    let mut world = make_world_with_assets(DT);
    world.insert_resource(BackgroundScroller::new(speed, 16.0));
    world
}

fn layers_of(world: &mut World) -> Vec<(BackgroundLayer, Vec2, f32)> {
    let mut q = world.query::<(&BackgroundLayer, &MapPosition, &Sprite, &Scale)>();
    q.iter(world)
        .map(|(l, p, s, sc)| (*l, p.pos, s.height * sc.scale.y))
        .collect()
}

#[test]
fn ground_is_a_single_static_layer() {
    let mut world = classic_world(5.0);
    let ground = set_ground(&mut world).expect("ground");
    let all = layers_of(&mut world);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].0.speed, 0.0);
    assert_eq!(world.get::<ZIndex>(ground), Some(&ZIndex(layers::BACKGROUND)));
    assert_eq!(
        background_status(&mut world),
        "Phase: ground, Layers: 1, Active: 1"
    );
}

#[test]
fn takeoff_feeds_images_and_prunes_scrolled_out_layers() {
    let mut world = classic_world(50.0);
    let mut schedule = Schedule::default();
    schedule.add_systems((background_cadence_system, background_scroll_system).chain());

    set_ground(&mut world);
    start_takeoff(&mut world, 50.0);
    let first = layers_of(&mut world);
    assert_eq!(first.len(), 1, "ground replaced by the first takeoff image");
    assert!(first[0].0.speed > 0.0);
    assert!(near(first[0].1.y, -first[0].2 / 2.0));
    assert_eq!(world.resource::<BackgroundScroller>().phase, BackgroundPhase::Takeoff);

    let vh = world.resource::<ScaleContext>().viewport_height;
    let mut peak = 0;
    for _ in 0..180 {
        update_world_time(&mut world, DT);
        schedule.run(&mut world);
        let live = layers_of(&mut world);
        peak = peak.max(live.len());
        for (_, pos, h) in live {
            assert!(pos.y <= vh + h / 2.0 + 50.0);
        }
    }
    assert_eq!(world.resource::<BackgroundScroller>().phase, BackgroundPhase::Flying);
    assert!(peak >= 2);
    assert!(peak <= 8, "layers must be pruned, saw {}", peak);
    assert!(world.resource::<BackgroundScroller>().next_order > peak as u64);
}

#[test]
fn stopped_background_keeps_layers_in_place() {
    let mut world = classic_world(20.0);
    let mut schedule = Schedule::default();
    schedule.add_systems((background_cadence_system, background_scroll_system).chain());
    start_takeoff(&mut world, 20.0);
    for _ in 0..5 {
        update_world_time(&mut world, DT);
        schedule.run(&mut world);
    }
    stop_background(&mut world);
    let before: Vec<Vec2> = layers_of(&mut world).iter().map(|l| l.1).collect();
    for _ in 0..30 {
        update_world_time(&mut world, DT);
        schedule.run(&mut world);
    }
    let after: Vec<Vec2> = layers_of(&mut world).iter().map(|l| l.1).collect();
    assert_eq!(before, after);

    reset_background(&mut world);
    let all = layers_of(&mut world);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].0.speed, 0.0);
}

#[test]
fn flying_speed_only_changes_moving_layers() {
    let mut world = classic_world(5.0);
    let mut schedule = Schedule::default();
    schedule.add_systems((background_cadence_system, background_scroll_system).chain());

    // On the ground nothing moves and the scroller keeps its speed.
    let ground = set_ground(&mut world).expect("ground");
    update_flying_speed(&mut world, 40.0);
    assert_eq!(world.get::<BackgroundLayer>(ground).unwrap().speed, 0.0);
    assert_eq!(world.resource::<BackgroundScroller>().speed, 5.0);

    start_takeoff(&mut world, 20.0);
    for _ in 0..30 {
        update_world_time(&mut world, DT);
        schedule.run(&mut world);
    }
    let moving: Vec<Entity> = world
        .query::<(Entity, &BackgroundLayer)>()
        .iter(&world)
        .filter(|(_, l)| l.speed > 0.0)
        .map(|(e, _)| e)
        .collect();
    assert!(!moving.is_empty());
    let still = world
        .spawn((
            BackgroundLayer {
                speed: 0.0,
                active: true,
                order: 1_000,
            },
            MapPosition::new(270.0, 479.0),
        ))
        .id();

    update_flying_speed(&mut world, 40.0);
    for e in moving {
        assert_eq!(world.get::<BackgroundLayer>(e).unwrap().speed, 40.0);
    }
    assert_eq!(world.get::<BackgroundLayer>(still).unwrap().speed, 0.0);
    assert_eq!(world.resource::<BackgroundScroller>().speed, 40.0);
}

fn funky_world() -> World {
    let mut world = make_world_with_assets(DT);
    let ctx = *world.resource::<ScaleContext>();
    world.insert_resource(RecyclingBackdrop::new(&ctx));
    world.insert_resource(GameConfig::new());
    world.spawn(Observer::new(observe_backdrop_transition));
    world.flush();
    world
}

fn part_count(world: &mut World) -> (usize, usize) {
    let parts = world.query::<&BackdropPart>().iter(world).count();
    let cycles = world.query::<&RecyclingLayer>().iter(world).count();
    (parts, cycles)
}

#[test]
fn recycling_column_keeps_covering_the_viewport() {
    let mut world = funky_world();
    let mut schedule = Schedule::default();
    schedule.add_systems(recycling_scroll_system);
    setup_recycling(&mut world);
    assert_eq!(part_count(&mut world), (2, 3));

    start_scroll(&mut world);
    let vh = world.resource::<ScaleContext>().viewport_height;
    for _ in 0..900 {
        update_world_time(&mut world, DT);
        schedule.run(&mut world);
    }
    let backdrop = world.resource::<RecyclingBackdrop>();
    assert!(near(backdrop.scroll_speed, backdrop.max_speed));
    assert_eq!(part_count(&mut world), (2, 3));

    // Some cycle image always overlaps the viewport.
    let mut q = world.query_filtered::<(&MapPosition, &Sprite, &Scale), With<RecyclingLayer>>();
    let covering = q.iter(&world).any(|(p, s, sc)| {
        let h = s.height * sc.scale.y;
        p.pos.y - h / 2.0 < vh && p.pos.y + h / 2.0 > 0.0
    });
    assert!(covering);
}

#[test]
fn reset_transition_swaps_the_backdrop() {
    let mut world = funky_world();
    let mut schedule = Schedule::default();
    schedule.add_systems((recycling_scroll_system, fade_slide_system).chain());
    setup_recycling(&mut world);
    let old_ground = world.resource::<RecyclingBackdrop>().ground.unwrap();

    start_scroll(&mut world);
    for _ in 0..20 {
        update_world_time(&mut world, DT);
        schedule.run(&mut world);
    }
    reset_with_transition(&mut world);
    let backdrop = world.resource::<RecyclingBackdrop>();
    assert!(!backdrop.scrolling);
    let cloud = backdrop.cloud.unwrap();
    let ground = backdrop.ground.unwrap();
    let rest_y = backdrop.cloud_rest_y;
    assert_ne!(ground, old_ground);
    assert!(world.get::<FadeSlideTransition>(cloud).is_some());
    assert_eq!(world.get::<ZIndex>(cloud), Some(&ZIndex(layers::INCOMING_FRONT_CLOUD)));
    assert_eq!(world.get::<Opacity>(ground), Some(&Opacity(0.0)));

    for _ in 0..45 {
        update_world_time(&mut world, DT);
        schedule.run(&mut world);
    }
    assert!(world.get_entity(old_ground).is_err());
    assert_eq!(part_count(&mut world), (2, 3));
    assert!(near(world.get::<MapPosition>(cloud).unwrap().pos.y, rest_y));
    assert_eq!(world.get::<Opacity>(ground), Some(&Opacity(1.0)));
    assert_eq!(world.get::<ZIndex>(cloud), Some(&ZIndex(layers::FRONT_CLOUD)));
    assert_eq!(world.get::<ZIndex>(ground), Some(&ZIndex(layers::BACKGROUND)));
    assert!(world.resource::<RecyclingBackdrop>().transition.is_none());
}

#[test]
fn resize_doubles_layout_on_a_double_window() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Classic));
    host.start_round(three_passengers());
    host.tick(DT);
    host.tick(DT);

    let mut q = host.world_mut().query::<(&Character, &MapPosition)>();
    let before: Vec<(String, Vec2)> = q
        .iter(host.world())
        .map(|(c, p)| (c.id.clone(), p.pos))
        .collect();
    assert_eq!(before.len(), 3);

    let (w, h) = host.resize(1080.0, 1916.0);
    assert!(near(w, 1080.0) && near(h, 1916.0));

    let world = host.world();
    let ctx = *world.resource::<ScaleContext>();
    assert!(near(ctx.anchor().x, 540.0) && near(ctx.anchor().y, 888.0));
    assert!(near(ctx.base_scale(), 1.3));
    let cfg = world.resource::<GameConfig>();
    assert!(near(cfg.viewport_width, w) && near(cfg.viewport_height, h));

    let r = rocket(world).unwrap();
    let rp = world.get::<MapPosition>(r).unwrap().pos;
    assert!(near(rp.x, 540.0) && near(rp.y, 888.0));
    assert!(near(world.get::<Scale>(r).unwrap().scale.x, 1.3));

    let mut q = host.world_mut().query::<(&Character, &MapPosition)>();
    for (c, p) in q.iter(host.world()) {
        let old = before.iter().find(|(id, _)| *id == c.id).unwrap().1;
        assert!(near(p.pos.x, old.x * 2.0) && near(p.pos.y, old.y * 2.0));
    }

    // Walks now end on the doubled door positions.
    assert!(common::tick_until(&mut host, GameStates::Countdown, 5.0));
}

#[test]
fn resize_to_same_size_changes_nothing() {
    let (mut host, _audio) = make_host(test_config(BackgroundMode::Funky));
    let before = *host.world().resource::<ScaleContext>();
    host.resize(540.0, 958.0);
    assert_eq!(*host.world().resource::<ScaleContext>(), before);
}
