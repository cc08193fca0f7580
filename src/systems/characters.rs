//! Character lifecycle: boarding walks, disembark jumps and teardown.
//!
//! Characters are registered by id in the
//! [`CharacterRegistry`](crate::resources::characterregistry::CharacterRegistry)
//! from creation until removal. Boarding characters walk to the rocket door and
//! vanish; disembarking ones jump out of the rocket in place, optionally with a
//! name label pinned to one of their bones.
//!
//! The completion barrier in this module opens once no registered character
//! remains and no character load is still in flight.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::character::{
    BoardingMove, Character, CharacterKind, DisembarkJump, Direction, JumpVariant, LabelReveal,
};
use crate::components::bonetracker::BoneTracker;
use crate::components::mapposition::MapPosition;
use crate::components::opacity::Opacity;
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;
use crate::components::skeleton::{SkeletalInstance, Skeleton, play_clip};
use crate::components::textlabel::TextLabel;
use crate::components::tween::{Easing, TweenPosition};
use crate::components::zindex::{ZIndex, layers};
use crate::error::SceneError;
use crate::events::audio::AudioCmd;
use crate::events::scene::{AllCharactersComplete, BoardingFinished, DisembarkFinished};
use crate::resources::assets::{AssetBridge, SceneAssets};
use crate::resources::characterregistry::CharacterRegistry;
use crate::resources::completion::{Completion, CompletionBarrier, Waiter};
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::rendersurface::RenderSurface;
use crate::resources::rng::SceneRng;
use crate::resources::rocket::RocketController;
use crate::resources::round::OnBoard;
use crate::resources::scalecontext::ScaleContext;
use crate::resources::worldtime::WorldTime;
use crate::scenelog::SceneLogger;
use crate::systems::audio::queue_audio;
use crate::systems::bonetracker::{start_tracking, stop_tracking};

/// Boarding characters are drawn slightly larger than the rocket.
const BOARDING_SCALE_BOOST: f32 = 1.1;
/// Horizontal distance from the viewport center where a walk ends.
const BOARDING_DOOR_OFFSET: f32 = 10.0;

fn logger(world: &World) -> SceneLogger {
    world
        .get_resource::<CharacterRegistry>()
        .map(|r| r.logger.clone())
        .unwrap_or_else(|| SceneLogger::new("characters"))
}

fn surface_ready(world: &World) -> bool {
    world
        .get_resource::<RenderSurface>()
        .is_some_and(|s| s.ready)
}

fn clock(world: &World) -> (f32, u64) {
    world
        .get_resource::<WorldTime>()
        .map(|t| (t.elapsed, t.frame_count))
        .unwrap_or((0.0, 0))
}

fn scale_context(world: &World) -> ScaleContext {
    world
        .get_resource::<ScaleContext>()
        .copied()
        .unwrap_or_default()
}

fn config(world: &World) -> GameConfig {
    world
        .get_resource::<GameConfig>()
        .cloned()
        .unwrap_or_default()
}

/// Signed horizontal scale of a walking character. Self characters face the
/// other way.
fn boarding_scale(ctx: &ScaleContext, kind: CharacterKind) -> Vec2 {
    let s = ctx.base_scale() * BOARDING_SCALE_BOOST;
    if kind.is_self() {
        Vec2::new(-s, s)
    } else {
        Vec2::new(s, s)
    }
}

/// Signed horizontal scale of a jumping character. Npcs are mirrored.
fn disembark_scale(ctx: &ScaleContext, kind: CharacterKind) -> Vec2 {
    let s = ctx.base_scale();
    if kind.is_self() {
        Vec2::new(s, s)
    } else {
        Vec2::new(-s, s)
    }
}

/// Where a boarding walk in `direction` ends.
pub fn boarding_target(ctx: &ScaleContext, direction: Direction) -> Vec2 {
    let anchor = ctx.anchor();
    let dx = BOARDING_DOOR_OFFSET * ctx.scale_factor_x;
    match direction {
        Direction::Left => Vec2::new(anchor.x - dx, anchor.y),
        Direction::Right => Vec2::new(anchor.x + dx, anchor.y),
    }
}

/// Spawn a boarding character from an already loaded skeleton.
pub fn spawn_boarding_from_skeleton(
    world: &mut World,
    kind: CharacterKind,
    id: &str,
    source: &str,
    instance: Box<dyn SkeletalInstance>,
) -> Entity {
    let ctx = scale_context(world);
    let entity = world
        .spawn((
            Character::new(id, kind),
            Skeleton::new(source, instance),
            MapPosition::from_vec(ctx.anchor()),
            Rotation::default(),
            Scale::from_vec(boarding_scale(&ctx, kind)),
            Opacity::default(),
            ZIndex(layers::CHARACTER),
        ))
        .id();
    if let Some(mut registry) = world.get_resource_mut::<CharacterRegistry>() {
        registry.add(id, entity);
    }
    logger(world).debug(format!("boarding {} '{}' spawned as {:?}", kind, id, entity));
    entity
}

/// Load the walk skeleton and place a boarding character on the rocket
/// anchor.
pub fn create_boarding(
    world: &mut World,
    kind: CharacterKind,
    id: &str,
) -> Result<Entity, SceneError> {
    if !surface_ready(world) {
        return Err(SceneError::RenderSurfaceUnavailable);
    }
    let loaded = {
        let Some(assets) = world.get_resource::<SceneAssets>() else {
            return Err(SceneError::asset_load("walk", "no asset loader installed"));
        };
        let walk = assets.manifest.walk.clone();
        assets.skeleton(&walk).map(|inst| (walk.skel_path, inst))
    };
    let (source, instance) = loaded.inspect_err(|e| {
        logger(world).error(format!("cannot create boarding '{}': {}", id, e));
    })?;
    Ok(spawn_boarding_from_skeleton(
        world, kind, id, &source, instance,
    ))
}

/// Walk a boarding character to the rocket door.
///
/// The returned completion resolves once the character has reached the door
/// and been removed. Calling this again while the walk runs returns the same
/// completion.
pub fn animate_boarding(
    world: &mut World,
    entity: Entity,
    direction: Direction,
) -> Result<Completion<()>, SceneError> {
    if !surface_ready(world) {
        return Err(SceneError::RenderSurfaceUnavailable);
    }
    if let Some(existing) = world.get::<BoardingMove>(entity) {
        return Ok(existing.completion.clone());
    }
    let Some(character) = world.get::<Character>(entity).cloned() else {
        return Err(SceneError::NotACharacter);
    };
    let log = logger(world);
    let ctx = scale_context(world);
    let cfg = config(world);
    let (now, frame) = clock(world);

    let clip = match direction {
        Direction::Left => "me_walk",
        Direction::Right => "others_walk",
    };
    if let Some(mut skeleton) = world.get_mut::<Skeleton>(entity) {
        let _ = play_clip(skeleton.instance.as_mut(), 0, clip, false, &log);
    }

    let from = world
        .get::<MapPosition>(entity)
        .map(|p| p.pos)
        .unwrap_or_else(|| ctx.anchor());
    let to = boarding_target(&ctx, direction);
    let completion = Completion::new();
    world.entity_mut(entity).insert((
        TweenPosition::new(from, to, cfg.boarding_duration, now).with_easing(Easing::CubicOut),
        BoardingMove {
            completion: completion.clone(),
            start_frame: frame,
        },
    ));
    log.info(format!(
        "'{}' boarding ({:?}) over {:.1}s",
        character.id, direction, cfg.boarding_duration
    ));
    Ok(completion)
}

/// Advances boarding walks and removes characters that reached the door.
#[allow(clippy::too_many_arguments)]
pub fn boarding_move_system(
    world_time: Res<WorldTime>,
    surface: Res<RenderSurface>,
    mut registry: ResMut<CharacterRegistry>,
    mut on_board: ResMut<OnBoard>,
    mut query: Query<(
        Entity,
        &Character,
        &TweenPosition,
        &BoardingMove,
        &mut MapPosition,
    )>,
    mut commands: Commands,
) {
    for (entity, character, tween, boarding, mut pos) in query.iter_mut() {
        if !surface.ready {
            boarding
                .completion
                .reject(SceneError::RenderSurfaceUnavailable);
            commands
                .entity(entity)
                .remove::<(BoardingMove, TweenPosition)>();
            continue;
        }
        if world_time.frame_count <= boarding.start_frame {
            continue;
        }
        pos.pos = tween.sample(world_time.elapsed);
        if tween.progress(world_time.elapsed) < 1.0 {
            continue;
        }
        registry.remove_entity(&character.id, entity);
        on_board.add(character.kind);
        if let Some(label) = character.label
            && let Ok(mut ec) = commands.get_entity(label)
        {
            ec.try_despawn();
        }
        commands.entity(entity).try_despawn();
        boarding.completion.resolve(());
        registry
            .logger
            .debug(format!("'{}' is on board", character.id));
        commands.trigger(BoardingFinished {
            entity,
            id: character.id.clone(),
        });
    }
}

/// Load the jump skeleton and place a disembarking character on the rocket.
///
/// The character stays hidden inside the rocket until its jump starts. A
/// non-empty `label` attaches a hidden name tag that follows one of the
/// character's bones once the jump starts.
pub fn create_disembarking(
    world: &mut World,
    kind: CharacterKind,
    id: &str,
    label: &str,
) -> Option<Entity> {
    if !surface_ready(world) {
        return None;
    }
    let log = logger(world);
    let loaded = {
        let assets = world.get_resource::<SceneAssets>()?;
        let jump = assets.manifest.jump.clone();
        assets.skeleton(&jump).map(|inst| (jump.skel_path, inst))
    };
    let (source, instance) = match loaded {
        Ok(v) => v,
        Err(e) => {
            log.error(format!("cannot create disembarking '{}': {}", id, e));
            return None;
        }
    };
    let ctx = scale_context(world);
    let cfg = config(world);
    let start = world
        .get_resource::<RocketController>()
        .and_then(|r| r.entity)
        .and_then(|e| world.get::<MapPosition>(e))
        .map(|p| p.pos)
        .unwrap_or_else(|| ctx.anchor());

    let entity = world
        .spawn((
            Character::new(id, kind).hidden(),
            Skeleton::new(source, instance),
            MapPosition::from_vec(start),
            Rotation::default(),
            Scale::from_vec(disembark_scale(&ctx, kind)),
            Opacity::default(),
            ZIndex(layers::CHARACTER),
        ))
        .id();

    if !label.is_empty() {
        let tag = world
            .spawn((
                TextLabel::new(label, cfg.label_font_size),
                MapPosition::from_vec(start),
                ZIndex(layers::LABEL),
                BoneTracker::new(entity).with_offset_y(cfg.label_offset_y),
            ))
            .id();
        if let Some(mut c) = world.get_mut::<Character>(entity) {
            c.label = Some(tag);
        }
    }
    if let Some(mut registry) = world.get_resource_mut::<CharacterRegistry>() {
        registry.add(id, entity);
    }
    if let Some(mut on_board) = world.get_resource_mut::<OnBoard>() {
        on_board.remove(kind);
    }
    log.debug(format!("disembarking {} '{}' spawned as {:?}", kind, id, entity));
    Some(entity)
}

/// Play a random jump variant in place and schedule the character's removal.
pub fn animate_disembarking(world: &mut World, entity: Entity) -> Result<(), SceneError> {
    let Some(character) = world.get::<Character>(entity).cloned() else {
        return Err(SceneError::NotACharacter);
    };
    let log = logger(world);
    let cfg = config(world);
    let (now, frame) = clock(world);

    let variant = match world.get_resource_mut::<SceneRng>() {
        Some(mut rng) => JumpVariant::pick(&mut rng.0),
        None => JumpVariant::Base,
    };
    let clip = variant.clip_for(character.kind);
    if let Some(mut skeleton) = world.get_mut::<Skeleton>(entity) {
        let _ = play_clip(skeleton.instance.as_mut(), 0, &clip, false, &log);
    }
    if let Some(mut c) = world.get_mut::<Character>(entity) {
        c.visible = true;
    }

    if let Some(label) = character.label {
        if start_tracking(world, label) {
            world.entity_mut(label).insert(LabelReveal {
                armed_frame: frame,
            });
        } else {
            log.warn(format!("label of '{}' will not follow a bone", character.id));
        }
    }

    world.entity_mut(entity).insert(DisembarkJump {
        started_at: now,
        start_frame: frame,
        duration: cfg.disembark_duration,
    });
    let sound = if character.kind.is_self() {
        "user_jump"
    } else {
        "other_jump"
    };
    queue_audio(world, AudioCmd::sound(sound));
    log.info(format!("'{}' jumps with '{}'", character.id, clip));
    Ok(())
}

/// Shows labels one frame after their tracker started.
pub fn label_reveal_system(
    world_time: Res<WorldTime>,
    mut query: Query<(Entity, &LabelReveal, &mut TextLabel)>,
    mut commands: Commands,
) {
    for (entity, reveal, mut label) in query.iter_mut() {
        if world_time.frame_count > reveal.armed_frame {
            label.visible = true;
            commands.entity(entity).remove::<LabelReveal>();
        }
    }
}

/// Removes disembarking characters once their jump window is over.
pub fn disembark_system(
    world_time: Res<WorldTime>,
    mut registry: ResMut<CharacterRegistry>,
    query: Query<(Entity, &Character, &DisembarkJump)>,
    mut trackers: Query<&mut BoneTracker>,
    mut commands: Commands,
) {
    for (entity, character, jump) in query.iter() {
        if world_time.frame_count <= jump.start_frame
            || world_time.elapsed - jump.started_at < jump.duration
        {
            continue;
        }
        if let Some(label) = character.label {
            if let Ok(mut t) = trackers.get_mut(label) {
                t.tracking = false;
            }
            if let Ok(mut ec) = commands.get_entity(label) {
                ec.try_despawn();
            }
        }
        registry.remove_entity(&character.id, entity);
        commands.entity(entity).try_despawn();
        registry
            .logger
            .debug(format!("'{}' finished disembarking", character.id));
        commands.trigger(DisembarkFinished {
            entity,
            id: character.id.clone(),
        });
    }
}

/// Arm the completion barrier.
///
/// The returned completion resolves once no character is registered and no
/// character load is pending. `then` is requested as the next state at that
/// moment.
pub fn wait_for_all_complete(world: &mut World, then: Option<GameStates>) -> Completion<()> {
    let now = clock(world).0;
    let completion = Completion::new();
    let mut barrier = world.get_resource_or_insert_with(CompletionBarrier::default);
    if !barrier.is_armed() {
        barrier.next_poll = now;
    }
    barrier.waiters.push(Waiter {
        completion: completion.clone(),
        then,
    });
    completion
}

/// Polls the registry for the completion barrier.
pub fn barrier_system(world: &mut World) {
    let now = clock(world).0;
    let due = world
        .get_resource::<CompletionBarrier>()
        .is_some_and(|b| b.is_armed() && now >= b.next_poll);
    if !due {
        return;
    }
    let live = world
        .get_resource::<CharacterRegistry>()
        .map(|r| r.len())
        .unwrap_or(0);
    let loading = world
        .get_resource::<AssetBridge>()
        .map(|b| b.pending())
        .unwrap_or(0);
    let Some(mut barrier) = world.get_resource_mut::<CompletionBarrier>() else {
        return;
    };
    if live > 0 || loading > 0 {
        barrier.next_poll = now + barrier.poll_interval;
        return;
    }
    let waiters = barrier.disarm();
    let mut then = None;
    for w in waiters {
        w.completion.resolve(());
        if w.then.is_some() {
            then = w.then;
        }
    }
    logger(world).info("all characters complete");
    world.trigger(AllCharactersComplete);
    if let Some(next) = then
        && let Some(mut ns) = world.get_resource_mut::<NextGameState>()
    {
        ns.request(next);
    }
}

/// Remove every live character synchronously.
///
/// Outstanding boarding completions are rejected.
pub fn destroy_all(world: &mut World) -> usize {
    let Some(snapshot) = world
        .get_resource::<CharacterRegistry>()
        .map(|r| r.snapshot())
    else {
        return 0;
    };
    for (_, entity) in snapshot.iter() {
        despawn_character(world, *entity);
    }
    // Walks that finished registering but are still queued for removal.
    let mut stray = world.query_filtered::<Entity, With<Character>>();
    let leftovers: Vec<Entity> = stray.iter(world).collect();
    for e in leftovers {
        despawn_character(world, e);
    }
    if let Some(mut registry) = world.get_resource_mut::<CharacterRegistry>() {
        registry.clear();
    }
    logger(world).debug(format!("destroyed {} characters", snapshot.len()));
    snapshot.len()
}

fn despawn_character(world: &mut World, entity: Entity) {
    let Ok(em) = world.get_entity(entity) else {
        return;
    };
    if let Some(boarding) = em.get::<BoardingMove>() {
        boarding
            .completion
            .reject(SceneError::RenderSurfaceUnavailable);
    }
    if let Some(label) = em.get::<Character>().and_then(|c| c.label) {
        stop_tracking(world, label);
        if world.get_entity(label).is_ok() {
            world.despawn(label);
        }
    }
    world.despawn(entity);
}

pub fn get_character(world: &World, id: &str) -> Option<Entity> {
    world.get_resource::<CharacterRegistry>()?.get(id)
}

/// Ids and entities of every live character.
pub fn all_characters(world: &World) -> Vec<(String, Entity)> {
    world
        .get_resource::<CharacterRegistry>()
        .map(|r| r.snapshot())
        .unwrap_or_default()
}

pub fn character_count(world: &World) -> usize {
    world
        .get_resource::<CharacterRegistry>()
        .map(|r| r.len())
        .unwrap_or(0)
}

/// Rescale live characters after the viewport changed.
///
/// Walks are retargeted to the new door position; jumping characters keep
/// their place relative to the rocket.
pub fn relayout_characters(world: &mut World, old: &ScaleContext, new: &ScaleContext) {
    let rx = new.viewport_width / old.viewport_width.max(f32::EPSILON);
    let ry = new.viewport_height / old.viewport_height.max(f32::EPSILON);
    let mut q = world.query::<(
        &Character,
        &mut MapPosition,
        &mut Scale,
        Option<&mut TweenPosition>,
        Has<DisembarkJump>,
    )>();
    for (character, mut pos, mut scale, tween, jumping) in q.iter_mut(world) {
        pos.pos = Vec2::new(pos.pos.x * rx, pos.pos.y * ry);
        scale.scale = if jumping {
            disembark_scale(new, character.kind)
        } else {
            boarding_scale(new, character.kind)
        };
        if let Some(mut t) = tween {
            t.from = Vec2::new(t.from.x * rx, t.from.y * ry);
            t.to = boarding_target(new, Direction::for_kind(character.kind));
        }
    }
}
