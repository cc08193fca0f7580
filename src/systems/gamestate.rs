//! Round state machine: transition requests, entry hooks and reset.
//!
//! A transition is applied by
//! [`observe_gamestate_change_event`](crate::events::gamestate::observe_gamestate_change_event),
//! which runs the entry hook registered here for the new state. Hooks are
//! exclusive systems stored in [`StateHooks`].
//!
//! Transitions are driven by:
//! - [`start_round`]: IDLE to BOARDING
//! - the completion barrier: BOARDING to COUNTDOWN, DISEMBARKING to the
//!   round outcome
//! - [`countdown_system`]: COUNTDOWN to LAUNCHING
//! - the rocket restart delay: LAUNCHING to FLYING
//! - [`begin_disembark`]: FLYING to DISEMBARKING
//! - [`reset_round`]: any state back to IDLE

use bevy_ecs::prelude::*;

use crate::components::bonetracker::BoneProbe;
use crate::components::character::Direction;
use crate::components::effects::ShakeParams;
use crate::components::skeleton::Skeleton;
use crate::components::delay::Delay;
use crate::events::gamestate::GameStateChangedEvent;
use crate::resources::assets::{AssetBridge, LoadPurpose, LoadRequest, SceneAssets};
use crate::resources::completion::CompletionBarrier;
use crate::resources::countdown::Countdown;
use crate::resources::gameconfig::{BackgroundMode, GameConfig};
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::rendersurface::RenderSurface;
use crate::resources::rocket::RocketController;
use crate::resources::round::{OnBoard, RoundOutcome, RoundPlan};
use crate::resources::scalecontext::ScaleContext;
use crate::resources::statehooks::StateHooks;
use crate::resources::worldtime::WorldTime;
use crate::scenelog::SceneLogger;
use crate::systems::background::{reset_background, start_takeoff, stop_background};
use crate::systems::bonetracker::stop_detection;
use crate::systems::characters::{
    animate_boarding, animate_disembarking, create_boarding, create_disembarking, destroy_all,
    wait_for_all_complete,
};
use crate::systems::effects::{start_shake, stop_all_effects};
use crate::systems::recycling::{reset_with_transition, start_scroll, stop_scroll};
use crate::systems::rocket::{
    LAUNCH_CLIP, clear_rocket_state, place_rocket, play_rocket_animation,
    play_rocket_animation_on_track, reset_rocket, rocket, start_rocket_float, stop_rocket_float,
};

/// Signal carried by the explosion shake.
pub const EXPLODE_SIGNAL: &str = "rocket_explode";
/// Rocket clip played once per round when a self character launches.
pub const LAUNCH_PLAYER_CLIP: &str = "launch_player";

fn logger() -> SceneLogger {
    SceneLogger::new("state")
}

fn config(world: &World) -> GameConfig {
    world
        .get_resource::<GameConfig>()
        .cloned()
        .unwrap_or_default()
}

fn now(world: &World) -> f32 {
    world
        .get_resource::<WorldTime>()
        .map(|t| t.elapsed)
        .unwrap_or(0.0)
}

/// Trigger the transition observer when a state change is pending.
pub fn check_pending_state(mut commands: Commands, next_state: Res<NextGameState>) {
    if next_state.pending().is_some() {
        commands.trigger(GameStateChangedEvent);
    }
}

pub fn current_state(world: &World) -> GameStates {
    world
        .get_resource::<GameState>()
        .map(|s| s.get())
        .unwrap_or_default()
}

/// Apply a transition right away.
///
/// Returns `false` when `next` is already the current state. Entry hooks run
/// before this returns.
pub fn set_state(world: &mut World, next: GameStates) -> bool {
    if current_state(world) == next {
        return false;
    }
    match world.get_resource_mut::<NextGameState>() {
        Some(mut ns) => ns.request(next),
        None => {
            logger().warn("NextGameState missing, cannot change state");
            return false;
        }
    }
    world.trigger(GameStateChangedEvent);
    world.flush();
    true
}

/// Ask for a transition applied at the start of the next frame.
pub fn request_state(world: &mut World, next: GameStates) {
    if let Some(mut ns) = world.get_resource_mut::<NextGameState>() {
        ns.request(next);
    }
}

/// Start a round from IDLE with `plan`.
pub fn start_round(world: &mut World, plan: RoundPlan) -> bool {
    let state = current_state(world);
    if state != GameStates::Idle {
        logger().warn(format!("cannot start a round while {}", state));
        return false;
    }
    logger().info(format!(
        "round with {} passengers, outcome {:?}",
        plan.passengers.len(),
        plan.outcome
    ));
    world.insert_resource(plan);
    set_state(world, GameStates::Boarding)
}

/// Leave FLYING and let the passengers jump out; the round then ends with
/// `outcome`.
pub fn begin_disembark(world: &mut World, outcome: RoundOutcome) -> bool {
    let state = current_state(world);
    if state != GameStates::Flying {
        logger().warn(format!("cannot disembark while {}", state));
        return false;
    }
    if let Some(mut plan) = world.get_resource_mut::<RoundPlan>() {
        plan.outcome = outcome;
    }
    set_state(world, GameStates::Disembarking)
}

/// Return to IDLE from any state.
///
/// Everything in flight is stopped synchronously: effects, characters,
/// delays, the countdown and the barrier. The rocket goes back to its base
/// pose and the background to the ground. Loads still in flight are
/// invalidated.
pub fn reset_round(world: &mut World) {
    let stopped = stop_all_effects(world);
    if let Some(mut rc) = world.get_resource_mut::<RocketController>() {
        rc.float = None;
    }
    let removed = destroy_all(world);

    let mut delays = world.query_filtered::<Entity, With<Delay>>();
    let waiting: Vec<Entity> = delays.iter(world).collect();
    for e in waiting {
        world.entity_mut(e).remove::<Delay>();
    }
    let mut probes = world.query_filtered::<Entity, With<BoneProbe>>();
    let probing: Vec<Entity> = probes.iter(world).collect();
    for e in probing {
        stop_detection(world, e);
    }
    if let Some(mut c) = world.get_resource_mut::<Countdown>() {
        c.stop();
    }
    if let Some(mut b) = world.get_resource_mut::<CompletionBarrier>() {
        let dropped = b.disarm();
        if !dropped.is_empty() {
            logger().debug(format!("{} barrier waiters dropped", dropped.len()));
        }
    }
    if let Some(mut s) = world.get_resource_mut::<RenderSurface>() {
        s.bump();
    }
    if let Some(mut ob) = world.get_resource_mut::<OnBoard>() {
        ob.clear();
    }

    clear_rocket_state(world);
    place_rocket(world, None);
    play_rocket_animation(world, LAUNCH_CLIP, true);

    match config(world).background_mode {
        BackgroundMode::Classic => reset_background(world),
        BackgroundMode::Funky => reset_with_transition(world),
    }

    logger().info(format!(
        "round reset ({} effects stopped, {} characters removed)",
        stopped, removed
    ));
    if !set_state(world, GameStates::Idle)
        && let Some(mut ns) = world.get_resource_mut::<NextGameState>()
    {
        ns.clear();
    }
}

/// Advances a running countdown and launches when it reaches zero.
pub fn countdown_system(
    world_time: Res<WorldTime>,
    mut countdown: ResMut<Countdown>,
    mut next_state: ResMut<NextGameState>,
) {
    if !countdown.running {
        return;
    }
    countdown.remaining = countdown.duration - (world_time.elapsed - countdown.started_at);
    if countdown.remaining <= 0.0 {
        countdown.stop();
        next_state.request(GameStates::Launching);
    }
}

pub fn enter_idle(world: &mut World) {
    let previous = world
        .get_resource::<GameState>()
        .and_then(|s| s.previous());
    logger().debug(format!("idle (from {:?})", previous));
}

pub fn enter_boarding(world: &mut World) {
    let cfg = config(world);
    match cfg.background_mode {
        BackgroundMode::Classic => reset_background(world),
        BackgroundMode::Funky => stop_scroll(world),
    }
    if let Some(mut ob) = world.get_resource_mut::<OnBoard>() {
        ob.clear();
    }
    let passengers = world
        .get_resource::<RoundPlan>()
        .map(|p| p.passengers.clone())
        .unwrap_or_default();
    let generation = world
        .get_resource::<RenderSurface>()
        .map(|s| s.generation)
        .unwrap_or(0);
    let walk = world
        .get_resource::<SceneAssets>()
        .map(|a| a.manifest.walk.clone());

    for p in passengers {
        let queued = match (&walk, world.get_resource_mut::<AssetBridge>()) {
            (Some(assets), Some(mut bridge)) => bridge.request(LoadRequest {
                generation,
                assets: assets.clone(),
                purpose: LoadPurpose::Boarding {
                    id: p.id.clone(),
                    kind: p.kind,
                },
            }),
            _ => false,
        };
        if queued {
            continue;
        }
        // No loader thread: load and walk on the spot.
        match create_boarding(world, p.kind, &p.id) {
            Ok(e) => {
                if let Err(err) = animate_boarding(world, e, Direction::for_kind(p.kind)) {
                    logger().error(format!("'{}' cannot board: {}", p.id, err));
                }
            }
            Err(err) => logger().error(format!("'{}' cannot board: {}", p.id, err)),
        }
    }
    wait_for_all_complete(world, Some(GameStates::Countdown));
}

pub fn enter_countdown(world: &mut World) {
    let duration = config(world).countdown;
    let t = now(world);
    world
        .get_resource_or_insert_with(Countdown::default)
        .start(duration, t);
    logger().info(format!("countdown {:.0}s", duration));
}

pub fn enter_launching(world: &mut World) {
    reset_rocket(world);
    let self_on_board = world
        .get_resource::<OnBoard>()
        .is_some_and(|ob| ob.has_self() && !ob.launch_player_played);
    let has_clip = rocket(world)
        .and_then(|e| world.get::<Skeleton>(e))
        .is_some_and(|s| s.instance.has_animation(LAUNCH_PLAYER_CLIP));
    if self_on_board && has_clip {
        play_rocket_animation_on_track(world, LAUNCH_PLAYER_CLIP, false, 1, None);
        if let Some(mut ob) = world.get_resource_mut::<OnBoard>() {
            ob.launch_player_played = true;
        }
    }
}

pub fn enter_flying(world: &mut World) {
    start_rocket_float(world);
    let cfg = config(world);
    match cfg.background_mode {
        BackgroundMode::Classic => start_takeoff(world, cfg.flying_speed),
        BackgroundMode::Funky => start_scroll(world),
    }
}

pub fn enter_disembarking(world: &mut World) {
    stop_rocket_float(world);
    let plan = world
        .get_resource::<RoundPlan>()
        .cloned()
        .unwrap_or_default();
    for p in plan.passengers.iter() {
        let Some(e) = create_disembarking(world, p.kind, &p.id, &p.label) else {
            continue;
        };
        if let Err(err) = animate_disembarking(world, e) {
            logger().error(format!("'{}' cannot disembark: {}", p.id, err));
        }
    }
    let then = match plan.outcome {
        RoundOutcome::Completed => GameStates::Completed,
        RoundOutcome::Exploded => GameStates::Exploding,
    };
    wait_for_all_complete(world, Some(then));
}

pub fn enter_exploding(world: &mut World) {
    stop_rocket_float(world);
    let cfg = config(world);
    let m = world
        .get_resource::<ScaleContext>()
        .map(|c| c.min_scale())
        .unwrap_or(1.0);
    if let Some(entity) = rocket(world) {
        start_shake(
            world,
            entity,
            ShakeParams {
                duration: cfg.shake_duration,
                intensity: cfg.shake_intensity * m,
            },
            EXPLODE_SIGNAL,
        );
    }
    stop_all_scrolling(world);
}

pub fn enter_completed(world: &mut World) {
    stop_all_scrolling(world);
}

fn stop_all_scrolling(world: &mut World) {
    match config(world).background_mode {
        BackgroundMode::Classic => stop_background(world),
        BackgroundMode::Funky => stop_scroll(world),
    }
}

/// Register every state entry hook in [`StateHooks`].
pub fn register_state_hooks(world: &mut World) {
    let ids = [
        (GameStates::Idle, world.register_system(enter_idle)),
        (GameStates::Boarding, world.register_system(enter_boarding)),
        (GameStates::Countdown, world.register_system(enter_countdown)),
        (GameStates::Launching, world.register_system(enter_launching)),
        (GameStates::Flying, world.register_system(enter_flying)),
        (GameStates::Disembarking, world.register_system(enter_disembarking)),
        (GameStates::Exploding, world.register_system(enter_exploding)),
        (GameStates::Completed, world.register_system(enter_completed)),
    ];
    let mut hooks = world.get_resource_or_insert_with(StateHooks::new);
    for (state, id) in ids {
        hooks.on_enter(state, id);
    }
}
