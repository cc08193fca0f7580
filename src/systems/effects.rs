//! Effect runtime: float, shake and fade/slide.
//!
//! Starting an effect inserts its component on the target and returns an
//! [`EffectHandle`]. Stopping removes the component on the spot, so nothing
//! is written to the target afterwards, not even on the current frame.
//!
//! The update systems only write from the frame after the one an effect was
//! started on (see [`EffectState::runs_on`]).

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::effects::{
    BasePose, EffectHandle, EffectKind, EffectState, FadeSlideParams, FadeSlideTransition,
    FloatEffect, FloatParams, ShakeEffect, ShakeParams,
};
use crate::components::mapposition::MapPosition;
use crate::components::opacity::Opacity;
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;
use crate::components::tween::Easing;
use crate::events::scene::{ShakeCompleted, TransitionCompleted};
use crate::resources::effects::EffectRuntime;
use crate::resources::rng::SceneRng;
use crate::resources::worldtime::WorldTime;

/// Maximum rotation of a floating target, in degrees.
const FLOAT_ROTATION_DEG: f32 = 5.0;
/// Shake never drops below this fraction of its intensity before snapping.
const SHAKE_MIN_FACTOR: f32 = 0.2;
const SHAKE_POS_GAIN: f32 = 3.0;
const SHAKE_ROT_GAIN: f32 = 0.8;

fn begin(world: &mut World) -> EffectState {
    let token = world
        .get_resource_mut::<EffectRuntime>()
        .map(|mut rt| rt.issue())
        .unwrap_or_default();
    let (now, frame) = world
        .get_resource::<WorldTime>()
        .map(|wt| (wt.elapsed, wt.frame_count))
        .unwrap_or((0.0, 0));
    EffectState::new(now, frame, token)
}

fn warn_missing(world: &World, kind: EffectKind, target: Entity) {
    if let Some(rt) = world.get_resource::<EffectRuntime>() {
        rt.logger
            .warn(format!("cannot start {:?} on missing entity {:?}", kind, target));
    }
}

fn base_pose(world: &World, target: Entity) -> BasePose {
    BasePose {
        pos: world
            .get::<MapPosition>(target)
            .map(|p| p.pos)
            .unwrap_or(Vec2::ZERO),
        rotation: world
            .get::<Rotation>(target)
            .map(|r| r.degrees)
            .unwrap_or(0.0),
        scale: world
            .get::<Scale>(target)
            .map(|s| s.scale)
            .unwrap_or(Vec2::ONE),
    }
}

/// Put a target still carrying a float or shake back on that effect's base,
/// so a restarted effect does not capture an offset pose.
fn settle_running(world: &mut World, target: Entity) {
    let floating = world.get::<FloatEffect>(target).map(|f| f.base);
    let shaking = world.get::<ShakeEffect>(target).map(|s| s.base);
    let Ok(mut em) = world.get_entity_mut(target) else {
        return;
    };
    if let Some(base) = floating {
        if let Some(mut p) = em.get_mut::<MapPosition>() {
            p.pos = base;
        }
        if let Some(mut r) = em.get_mut::<Rotation>() {
            r.degrees = 0.0;
        }
    }
    if let Some(base) = shaking {
        if let Some(mut p) = em.get_mut::<MapPosition>() {
            p.pos = base.pos;
        }
        if let Some(mut r) = em.get_mut::<Rotation>() {
            r.degrees = base.rotation;
        }
        if let Some(mut s) = em.get_mut::<Scale>() {
            s.scale = base.scale;
        }
    }
}

/// Start an indefinite float around the target's resting position.
///
/// Replaces any float already running on `target`; the new one floats around
/// the old one's base.
pub fn start_float(world: &mut World, target: Entity, params: FloatParams) -> Option<EffectHandle> {
    if world.get_entity(target).is_err() {
        warn_missing(world, EffectKind::Float, target);
        return None;
    }
    settle_running(world, target);
    let base = base_pose(world, target).pos;
    let state = begin(world);
    world.entity_mut(target).insert(FloatEffect {
        state,
        params,
        base,
    });
    Some(EffectHandle {
        target,
        kind: EffectKind::Float,
        token: state.token,
    })
}

/// Start a shake that ends exactly on the target's resting pose.
///
/// A float or shake already running on `target` is settled on its base
/// first. `signal` is carried by the [`ShakeCompleted`] event.
pub fn start_shake(
    world: &mut World,
    target: Entity,
    params: ShakeParams,
    signal: impl Into<String>,
) -> Option<EffectHandle> {
    if world.get_entity(target).is_err() {
        warn_missing(world, EffectKind::Shake, target);
        return None;
    }
    settle_running(world, target);
    let base = base_pose(world, target);
    let state = begin(world);
    world.entity_mut(target).insert(ShakeEffect {
        state,
        params,
        base,
        signal: signal.into(),
    });
    Some(EffectHandle {
        target,
        kind: EffectKind::Shake,
        token: state.token,
    })
}

/// Start a fade-in plus vertical slide on `target`.
///
/// The fade targets start fully transparent and the slide target is moved to
/// `slide_from` right away.
pub fn start_fade_slide(
    world: &mut World,
    target: Entity,
    params: FadeSlideParams,
) -> Option<EffectHandle> {
    if world.get_entity(target).is_err() {
        warn_missing(world, EffectKind::FadeSlide, target);
        return None;
    }
    for e in params.fade_in.iter() {
        if let Ok(mut em) = world.get_entity_mut(*e) {
            em.insert(Opacity(0.0));
        }
    }
    let x = world
        .get::<MapPosition>(target)
        .map(|p| p.pos.x)
        .unwrap_or(0.0);
    let state = begin(world);
    world.entity_mut(target).insert((
        MapPosition::new(x, params.slide_from),
        FadeSlideTransition { state, params },
    ));
    Some(EffectHandle {
        target,
        kind: EffectKind::FadeSlide,
        token: state.token,
    })
}

/// Whether the effect behind `handle` is still running.
pub fn is_running(world: &World, handle: &EffectHandle) -> bool {
    let state = match handle.kind {
        EffectKind::Float => world.get::<FloatEffect>(handle.target).map(|e| e.state),
        EffectKind::Shake => world.get::<ShakeEffect>(handle.target).map(|e| e.state),
        EffectKind::FadeSlide => world
            .get::<FadeSlideTransition>(handle.target)
            .map(|e| e.state),
    };
    state.is_some_and(|s| s.active && s.token == handle.token)
}

/// Stop the effect behind `handle`.
///
/// Idempotent. A handle from an earlier run never stops a newer effect of the
/// same kind.
pub fn stop_effect(world: &mut World, handle: &EffectHandle) -> bool {
    if !is_running(world, handle) {
        return false;
    }
    let Ok(mut em) = world.get_entity_mut(handle.target) else {
        return false;
    };
    match handle.kind {
        EffectKind::Float => {
            em.remove::<FloatEffect>();
        }
        EffectKind::Shake => {
            em.remove::<ShakeEffect>();
        }
        EffectKind::FadeSlide => {
            em.remove::<FadeSlideTransition>();
        }
    }
    true
}

/// Stop every running effect. Returns how many were stopped.
pub fn stop_all_effects(world: &mut World) -> usize {
    let mut targets: Vec<(Entity, EffectKind)> = Vec::new();
    let mut q = world.query::<(Entity, Has<FloatEffect>, Has<ShakeEffect>, Has<FadeSlideTransition>)>();
    for (e, f, s, t) in q.iter(world) {
        if f {
            targets.push((e, EffectKind::Float));
        }
        if s {
            targets.push((e, EffectKind::Shake));
        }
        if t {
            targets.push((e, EffectKind::FadeSlide));
        }
    }
    let count = targets.len();
    for (e, kind) in targets {
        let mut em = world.entity_mut(e);
        match kind {
            EffectKind::Float => {
                em.remove::<FloatEffect>();
            }
            EffectKind::Shake => {
                em.remove::<ShakeEffect>();
            }
            EffectKind::FadeSlide => {
                em.remove::<FadeSlideTransition>();
            }
        }
    }
    if count > 0
        && let Some(rt) = world.get_resource::<EffectRuntime>()
    {
        rt.logger.debug(format!("stopped {} effects", count));
    }
    count
}

/// Offset and tilt of a float `elapsed` seconds after it started.
pub fn float_offset(params: &FloatParams, elapsed: f32) -> (Vec2, f32) {
    let t = elapsed * params.speed;
    let dx = (t * 1.2).sin() * params.range * 0.8;
    let dy = (t * 0.8).cos() * params.range;
    let rot = (t * 1.5).sin() * FLOAT_ROTATION_DEG;
    (Vec2::new(dx, dy), rot)
}

/// Fraction of the shake intensity applied at `progress`.
pub fn shake_factor(progress: f32) -> f32 {
    (1.0 - progress).max(SHAKE_MIN_FACTOR)
}

/// Moves floating targets around their base.
pub fn float_system(
    world_time: Res<WorldTime>,
    mut query: Query<(&FloatEffect, &mut MapPosition, Option<&mut Rotation>)>,
) {
    for (effect, mut pos, rotation) in query.iter_mut() {
        if !effect.state.runs_on(world_time.frame_count) {
            continue;
        }
        let (offset, rot) = float_offset(&effect.params, effect.state.elapsed(world_time.elapsed));
        pos.pos = effect.base + offset;
        if let Some(mut r) = rotation {
            r.degrees = rot;
        }
    }
}

/// Jitters shaking targets and snaps them back to their base when done.
pub fn shake_system(
    world_time: Res<WorldTime>,
    mut rng: ResMut<SceneRng>,
    mut query: Query<(
        Entity,
        &mut ShakeEffect,
        &mut MapPosition,
        Option<&mut Rotation>,
        Option<&mut Scale>,
    )>,
    mut commands: Commands,
) {
    for (entity, mut shake, mut pos, rotation, scale) in query.iter_mut() {
        if !shake.state.runs_on(world_time.frame_count) {
            continue;
        }
        let duration = shake.params.duration.max(f32::EPSILON);
        let progress = shake.state.elapsed(world_time.elapsed) / duration;
        if progress >= 1.0 {
            pos.pos = shake.base.pos;
            if let Some(mut r) = rotation {
                r.degrees = shake.base.rotation;
            }
            if let Some(mut s) = scale {
                s.scale = shake.base.scale;
            }
            shake.state.active = false;
            commands.entity(entity).remove::<ShakeEffect>();
            commands.trigger(ShakeCompleted {
                entity,
                signal: shake.signal.clone(),
            });
            continue;
        }
        let amp = shake.params.intensity * shake_factor(progress);
        let jx = (rng.0.f32() - 0.5) * amp * SHAKE_POS_GAIN;
        let jy = (rng.0.f32() - 0.5) * amp * SHAKE_POS_GAIN;
        let jr = (rng.0.f32() - 0.5) * amp * SHAKE_ROT_GAIN;
        pos.pos = shake.base.pos + Vec2::new(jx, jy);
        if let Some(mut r) = rotation {
            r.degrees = shake.base.rotation + jr;
        }
    }
}

/// Drives fade/slide transitions and retires the replaced entities.
pub fn fade_slide_system(
    world_time: Res<WorldTime>,
    mut transitions: Query<(Entity, &mut FadeSlideTransition, &mut MapPosition)>,
    mut opacities: Query<&mut Opacity>,
    mut commands: Commands,
) {
    for (entity, mut tr, mut pos) in transitions.iter_mut() {
        if !tr.state.runs_on(world_time.frame_count) {
            continue;
        }
        let duration = tr.params.duration.max(f32::EPSILON);
        let progress = (tr.state.elapsed(world_time.elapsed) / duration).min(1.0);
        let eased = Easing::CubicOut.apply(progress);
        for e in tr.params.fade_in.iter() {
            if let Ok(mut o) = opacities.get_mut(*e) {
                o.0 = eased;
            }
        }
        pos.pos.y = tr.params.slide_from + (tr.params.slide_to - tr.params.slide_from) * eased;
        if progress >= 1.0 {
            tr.state.active = false;
            for old in tr.params.retire.drain(..) {
                if let Ok(mut ec) = commands.get_entity(old) {
                    ec.try_despawn();
                }
            }
            commands.entity(entity).remove::<FadeSlideTransition>();
            commands.trigger(TransitionCompleted { entity });
        }
    }
}
