//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use glam::Vec2;

use rocketflight::components::mapposition::MapPosition;
use rocketflight::components::scale::Scale;
use rocketflight::components::skeleton::{Bone, Skeleton};
use rocketflight::events::audio::AudioCmd;
use rocketflight::events::gamestate::GameStateEntered;
use rocketflight::game::{SceneAdapters, SceneHost};
use rocketflight::headless::{
    AudioLog, ClipSpec, HeadlessAssetLoader, HeadlessSkeleton, RecordingAudioBackend,
};
use rocketflight::resources::assets::{AssetManifest, SceneAssets};
use rocketflight::resources::effects::EffectRuntime;
use rocketflight::resources::gameconfig::{BackgroundMode, GameConfig};
use rocketflight::resources::gamestate::GameStates;
use rocketflight::resources::rendersurface::RenderSurface;
use rocketflight::resources::rng::SceneRng;
use rocketflight::resources::round::{Passenger, RoundPlan};
use rocketflight::resources::scalecontext::ScaleContext;
use rocketflight::resources::settings::MemorySettingsStore;
use rocketflight::resources::worldtime::WorldTime;
use rocketflight::components::character::CharacterKind;

pub const EPSILON: f32 = 1e-4;
pub const DT: f32 = 1.0 / 60.0;

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn approx_v2(a: Vec2, b: Vec2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

/// Bare world with the clock and the resources most systems need.
pub fn make_world(delta: f32) -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime {
        elapsed: 0.0,
        delta,
        time_scale: 1.0,
        frame_count: 0,
    });
    world.insert_resource(EffectRuntime::default());
    world.insert_resource(SceneRng::seeded(7));
    world.insert_resource(ScaleContext::default());
    world.insert_resource(RenderSurface::new());
    world.init_resource::<Messages<AudioCmd>>();
    world
}

/// `make_world` plus the headless asset loader with default rigs.
pub fn make_world_with_assets(delta: f32) -> World {
    let mut world = make_world(delta);
    let manifest = AssetManifest::default();
    let loader = Arc::new(HeadlessAssetLoader::new(&manifest));
    world.insert_resource(SceneAssets::new(loader, manifest));
    world
}

/// Spawn a skeletal entity at `pos` with unit scale.
pub fn spawn_skeleton(world: &mut World, bones: Vec<Bone>, clips: Vec<ClipSpec>, pos: Vec2) -> Entity {
    world
        .spawn((
            Skeleton::new("test.skel", Box::new(HeadlessSkeleton::new(bones, clips))),
            MapPosition::from_vec(pos),
            Scale::default(),
        ))
        .id()
}

/// Deterministic configuration for host tests.
pub fn test_config(mode: BackgroundMode) -> GameConfig {
    let mut cfg = GameConfig::new();
    cfg.background_mode = mode;
    cfg.seed = Some(42);
    cfg
}

/// Scene host on headless adapters with same-thread loads.
pub fn make_host(config: GameConfig) -> (SceneHost, AudioLog) {
    let manifest = AssetManifest::default();
    make_host_with(config, HeadlessAssetLoader::new(&manifest), manifest)
}

pub fn make_host_with(
    config: GameConfig,
    loader: HeadlessAssetLoader,
    manifest: AssetManifest,
) -> (SceneHost, AudioLog) {
    let log = AudioLog::default();
    let adapters = SceneAdapters {
        loader: Arc::new(loader),
        audio: Box::new(RecordingAudioBackend::new(log.clone())),
        settings: Box::new(MemorySettingsStore::new()),
        manifest,
        threaded_loads: false,
    };
    (SceneHost::new(config, adapters), log)
}

/// Three passengers: the player and two others.
pub fn three_passengers() -> RoundPlan {
    RoundPlan::new(vec![
        Passenger::new("me", CharacterKind::Player).with_label("You"),
        Passenger::new("bob", CharacterKind::Npc).with_label("Bob"),
        Passenger::new("ann", CharacterKind::Npc),
    ])
}

/// Every state entered, in order.
#[derive(Resource, Default, Debug)]
pub struct Entered(pub Vec<GameStates>);

pub fn record_transitions(host: &mut SceneHost) {
    let world = host.world_mut();
    world.init_resource::<Entered>();
    world.spawn(Observer::new(
        |trigger: On<GameStateEntered>, mut entered: ResMut<Entered>| {
            entered.0.push(trigger.event().state);
        },
    ));
    world.flush();
}

pub fn entered(host: &SceneHost) -> Vec<GameStates> {
    host.world().resource::<Entered>().0.clone()
}

pub fn tick_for(host: &mut SceneHost, seconds: f32) {
    let frames = (seconds / DT).ceil() as u32;
    for _ in 0..frames {
        host.tick(DT);
    }
}

/// Tick until `state` is current. Gives up after `max_seconds`.
pub fn tick_until(host: &mut SceneHost, state: GameStates, max_seconds: f32) -> bool {
    let frames = (max_seconds / DT).ceil() as u32;
    for _ in 0..frames {
        if host.state() == state {
            return true;
        }
        host.tick(DT);
    }
    host.state() == state
}
