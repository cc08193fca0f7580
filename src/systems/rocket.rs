//! Rocket controller operations.
//!
//! The rocket is a single skeletal entity sitting on the scene anchor. While
//! flying it floats around that anchor; the restart choreography plays a
//! one-shot `restart` clip and switches back to the looping `launch` clip
//! when the restart delay runs out.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::delay::Delay;
use crate::components::effects::{FloatParams, ShakeEffect};
use crate::components::mapposition::MapPosition;
use crate::components::opacity::Opacity;
use crate::components::rocket::Rocket;
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;
use crate::components::skeleton::{Skeleton, play_clip};
use crate::components::zindex::{ZIndex, layers};
use crate::error::SceneError;
use crate::events::delay::DelayElapsed;
use crate::resources::assets::SceneAssets;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::rendersurface::RenderSurface;
use crate::resources::rocket::{RESTART_SIGNAL, RocketController};
use crate::resources::scalecontext::ScaleContext;
use crate::resources::worldtime::WorldTime;
use crate::systems::effects::{start_float, stop_effect};

pub const LAUNCH_CLIP: &str = "launch";
pub const RESTART_CLIP: &str = "restart";

fn rocket_entity(world: &World) -> Option<Entity> {
    world
        .get_resource::<RocketController>()
        .and_then(|r| r.entity)
        .filter(|e| world.get_entity(*e).is_ok())
}

fn scale_context(world: &World) -> ScaleContext {
    world
        .get_resource::<ScaleContext>()
        .copied()
        .unwrap_or_default()
}

/// Load the rocket skeleton and place it on the anchor, looping `launch`
/// when the skeleton has it.
pub fn initialize_rocket(world: &mut World) -> Result<Entity, SceneError> {
    if !world
        .get_resource::<RenderSurface>()
        .is_some_and(|s| s.ready)
    {
        return Err(SceneError::RenderSurfaceUnavailable);
    }
    if let Some(existing) = rocket_entity(world) {
        return Ok(existing);
    }
    world.get_resource_or_insert_with(RocketController::default);
    let loaded = {
        let Some(assets) = world.get_resource::<SceneAssets>() else {
            return Err(SceneError::asset_load("rocket", "no asset loader installed"));
        };
        let rocket = assets.manifest.rocket.clone();
        assets.skeleton(&rocket).map(|i| (rocket.skel_path, i))
    };
    let logger = world.resource::<RocketController>().logger.clone();
    let (source, mut instance) = loaded.inspect_err(|e| {
        logger.error(format!("rocket creation failed: {}", e));
    })?;

    let mut current = String::new();
    if instance.has_animation(LAUNCH_CLIP) && instance.set_animation(0, LAUNCH_CLIP, true) {
        current = LAUNCH_CLIP.to_string();
    }
    let ctx = scale_context(world);
    let entity = world
        .spawn((
            Rocket,
            Skeleton::new(source, instance),
            MapPosition::from_vec(ctx.anchor()),
            Rotation::default(),
            Scale::uniform(ctx.base_scale()),
            Opacity::default(),
            ZIndex(layers::ROCKET),
        ))
        .id();
    let mut rc = world.resource_mut::<RocketController>();
    rc.entity = Some(entity);
    rc.current_animation = current;
    rc.logger.info("rocket ready");
    Ok(entity)
}

/// Start floating around the current position. Refused while a float runs.
pub fn start_rocket_float(world: &mut World) -> bool {
    let Some(entity) = rocket_entity(world) else {
        return false;
    };
    if world.resource::<RocketController>().is_floating() {
        return false;
    }
    let ctx = scale_context(world);
    let (range, speed) = world
        .get_resource::<GameConfig>()
        .map(|c| (c.float_range, c.float_speed))
        .unwrap_or((15.0, 1.2));
    let handle = start_float(
        world,
        entity,
        FloatParams {
            range: range * ctx.min_scale(),
            speed,
        },
    );
    let mut rc = world.resource_mut::<RocketController>();
    rc.float = handle;
    rc.logger.info("rocket floating");
    handle.is_some()
}

/// Stop the float, leaving the rocket where it is.
pub fn stop_rocket_float(world: &mut World) {
    let Some(handle) = world
        .get_resource_mut::<RocketController>()
        .and_then(|mut rc| rc.float.take())
    else {
        return;
    };
    stop_effect(world, &handle);
    world
        .resource::<RocketController>()
        .logger
        .info("rocket float stopped");
}

/// Put the rocket back on the base transform. `at` overrides the anchor.
pub fn place_rocket(world: &mut World, at: Option<Vec2>) {
    let Some(entity) = rocket_entity(world) else {
        return;
    };
    let ctx = scale_context(world);
    world.entity_mut(entity).insert((
        MapPosition::from_vec(at.unwrap_or_else(|| ctx.anchor())),
        Rotation::default(),
        Scale::uniform(ctx.base_scale()),
    ));
}

/// Restart choreography: clear, restore the base transform, play `restart`
/// once and switch back to looping `launch` when the restart delay runs out.
pub fn reset_rocket(world: &mut World) {
    let Some(entity) = rocket_entity(world) else {
        return;
    };
    clear_rocket_state(world);
    place_rocket(world, None);
    play_rocket_animation(world, RESTART_CLIP, false);
    let delay = world
        .get_resource::<GameConfig>()
        .map(|c| c.rocket_restart_delay)
        .unwrap_or(0.6);
    let now = world
        .get_resource::<WorldTime>()
        .map(|t| t.elapsed)
        .unwrap_or(0.0);
    world
        .entity_mut(entity)
        .insert(Delay::new(delay, now, RESTART_SIGNAL));
    world
        .resource::<RocketController>()
        .logger
        .info("rocket restarting");
}

/// Finishes the restart choreography and lets a launching round fly.
pub fn observe_rocket_restart(
    trigger: On<DelayElapsed>,
    mut rocket: ResMut<RocketController>,
    mut skeletons: Query<&mut Skeleton>,
    game_state: Option<Res<GameState>>,
    next_state: Option<ResMut<NextGameState>>,
) {
    let event = trigger.event();
    if event.signal != RESTART_SIGNAL || rocket.entity != Some(event.entity) {
        return;
    }
    let Ok(mut skeleton) = skeletons.get_mut(event.entity) else {
        return;
    };
    skeleton.instance.clear_tracks();
    if let Ok(clip) = play_clip(skeleton.instance.as_mut(), 0, LAUNCH_CLIP, true, &rocket.logger) {
        rocket.current_animation = clip;
    }
    rocket.logger.info("rocket back on launch loop");
    if let (Some(gs), Some(mut ns)) = (game_state, next_state)
        && gs.is_launching()
    {
        ns.request(GameStates::Flying);
    }
}

/// Play `name` on track 0.
pub fn play_rocket_animation(world: &mut World, name: &str, looped: bool) -> bool {
    play_rocket_animation_on_track(world, name, looped, 0, None)
}

/// Play `name` on `track`. With `delay`, the clip is queued behind the
/// current one instead of replacing it.
pub fn play_rocket_animation_on_track(
    world: &mut World,
    name: &str,
    looped: bool,
    track: usize,
    delay: Option<f32>,
) -> bool {
    let Some(entity) = rocket_entity(world) else {
        return false;
    };
    world.resource_scope(|world, mut rc: Mut<RocketController>| {
        let Some(mut skeleton) = world.get_mut::<Skeleton>(entity) else {
            return false;
        };
        let played = match delay {
            Some(d) => {
                let ok = skeleton.instance.add_animation(track, name, looped, d);
                if !ok {
                    rc.logger.warn(format!("cannot queue '{}' on track {}", name, track));
                }
                ok.then(|| name.to_string())
            }
            None => play_clip(skeleton.instance.as_mut(), track, name, looped, &rc.logger).ok(),
        };
        match played {
            Some(clip) => {
                if track == 0 {
                    rc.current_animation = clip;
                }
                true
            }
            None => false,
        }
    })
}

/// Clear every track and return to the setup pose.
pub fn clear_rocket_state(world: &mut World) {
    let Some(entity) = rocket_entity(world) else {
        return;
    };
    if let Some(mut skeleton) = world.get_mut::<Skeleton>(entity) {
        skeleton.instance.clear_tracks();
        skeleton.instance.set_to_setup_pose();
    }
    if let Some(mut rc) = world.get_resource_mut::<RocketController>() {
        rc.current_animation.clear();
    }
}

pub fn clear_rocket_track(world: &mut World, track: usize) {
    let Some(entity) = rocket_entity(world) else {
        return;
    };
    if let Some(mut skeleton) = world.get_mut::<Skeleton>(entity) {
        skeleton.instance.clear_track(track);
    }
}

/// Recenter and rescale after a resize. A running float restarts around the
/// new anchor and a running shake settles on it.
pub fn relayout_rocket(world: &mut World) {
    let Some(entity) = rocket_entity(world) else {
        return;
    };
    let floating = world.resource::<RocketController>().is_floating();
    if floating {
        stop_rocket_float(world);
    }
    place_rocket(world, None);
    if floating {
        start_rocket_float(world);
    }
    let ctx = scale_context(world);
    if let Some(mut shake) = world.get_mut::<ShakeEffect>(entity) {
        shake.base.pos = ctx.anchor();
        shake.base.scale = Vec2::splat(ctx.base_scale());
    }
}

/// Remove the rocket entity.
pub fn destroy_rocket(world: &mut World) {
    stop_rocket_float(world);
    let Some(entity) = rocket_entity(world) else {
        return;
    };
    world.despawn(entity);
    let mut rc = world.resource_mut::<RocketController>();
    rc.entity = None;
    rc.current_animation.clear();
    rc.logger.info("rocket destroyed");
}

pub fn rocket(world: &World) -> Option<Entity> {
    rocket_entity(world)
}
