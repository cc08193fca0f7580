//! Recycling backdrop: a ground image, a front cloud and an endless column of
//! identical cycle images.
//!
//! While scrolling, everything moves down at a speed that ramps up every
//! frame towards a cap. A cycle image that has fully left the bottom edge is
//! moved back on top of the highest image, so a handful of sprites covers an
//! unbounded flight.
//!
//! All positions are sprite centers.

use bevy_ecs::prelude::*;
use glam::Vec2;
use smallvec::smallvec;

use crate::components::background::{BackdropPart, RecyclingLayer};
use crate::components::effects::FadeSlideParams;
use crate::components::mapposition::MapPosition;
use crate::components::opacity::Opacity;
use crate::components::scale::Scale;
use crate::components::sprite::Sprite;
use crate::components::zindex::{ZIndex, layers};
use crate::events::scene::TransitionCompleted;
use crate::resources::assets::{SceneAssets, TextureInfo};
use crate::resources::background::{FRONT_CLOUD_MAX_FRACTION, RecyclingBackdrop};
use crate::resources::gameconfig::GameConfig;
use crate::resources::scalecontext::ScaleContext;
use crate::systems::effects::start_fade_slide;

const DEFAULT_TRANSITION: f32 = 0.5;

fn texture(world: &mut World, path: &str) -> Option<TextureInfo> {
    world
        .get_resource_mut::<SceneAssets>()
        .and_then(|mut a| a.texture(path).ok())
}

fn paths(world: &World) -> Option<(String, String, String)> {
    let m = &world.get_resource::<SceneAssets>()?.manifest.funky_background;
    Some((m.ground.clone(), m.cycle.clone(), m.front_cloud.clone()))
}

/// Cover-fit placement of the ground: scale and center.
fn ground_layout(ctx: &ScaleContext, tex: &TextureInfo) -> (f32, Vec2) {
    let s = (ctx.viewport_width / tex.width).max(ctx.viewport_height / tex.height);
    let left = ((ctx.viewport_width - tex.width * s) / 2.0).floor();
    let top = ((ctx.viewport_height - tex.height * s) / 2.0).floor();
    (s, Vec2::new(left + tex.width * s / 2.0, top + tex.height * s / 2.0))
}

/// Width-filling front cloud, capped in height and resting on the bottom
/// edge: non-uniform scale and center.
fn cloud_layout(ctx: &ScaleContext, tex: &TextureInfo) -> (Vec2, Vec2) {
    let sx = ctx.viewport_width / tex.width;
    let height = (tex.height * sx).min(ctx.viewport_height * FRONT_CLOUD_MAX_FRACTION);
    let sy = height / tex.height;
    (
        Vec2::new(sx, sy),
        Vec2::new(ctx.viewport_width / 2.0, ctx.viewport_height - height / 2.0),
    )
}

/// Width-filling cycle layer `index`, stacked above the viewport.
fn cycle_layout(ctx: &ScaleContext, tex: &TextureInfo, index: usize) -> (f32, f32, Vec2) {
    let s = ctx.viewport_width / tex.width;
    let h = tex.height * s;
    let top = (-h * (index as f32 + 1.0)).floor();
    (s, h, Vec2::new(ctx.viewport_width / 2.0, top + h / 2.0))
}

/// Number of cycle sprites needed for a viewport of height `viewport_h`.
pub fn cycle_count(viewport_h: f32, layer_h: f32) -> usize {
    if layer_h <= 0.0 {
        return 0;
    }
    (viewport_h / layer_h).ceil() as usize + 2
}

fn spawn_ground(world: &mut World, ctx: &ScaleContext, path: &str, z: i32) -> Option<Entity> {
    let tex = texture(world, path)?;
    let (s, center) = ground_layout(ctx, &tex);
    Some(
        world
            .spawn((
                Sprite::new(path, tex.width, tex.height),
                Scale::uniform(s),
                MapPosition::from_vec(center),
                Opacity::default(),
                ZIndex(z),
                BackdropPart::Ground,
            ))
            .id(),
    )
}

fn spawn_cloud(world: &mut World, ctx: &ScaleContext, path: &str, z: i32) -> Option<(Entity, f32)> {
    let tex = texture(world, path)?;
    let (scale, center) = cloud_layout(ctx, &tex);
    let e = world
        .spawn((
            Sprite::new(path, tex.width, tex.height),
            Scale::from_vec(scale),
            MapPosition::from_vec(center),
            Opacity::default(),
            ZIndex(z),
            BackdropPart::FrontCloud,
        ))
        .id();
    Some((e, center.y))
}

fn spawn_cycle(world: &mut World, ctx: &ScaleContext, path: &str) -> Option<f32> {
    let tex = texture(world, path)?;
    let (_, h, _) = cycle_layout(ctx, &tex, 0);
    let count = cycle_count(ctx.viewport_height, h);
    for i in 0..count {
        let (s, _, center) = cycle_layout(ctx, &tex, i);
        world.spawn((
            Sprite::new(path, tex.width, tex.height),
            Scale::uniform(s),
            MapPosition::from_vec(center),
            Opacity::default(),
            ZIndex(layers::CYCLE),
            RecyclingLayer { index: i },
        ));
    }
    if let Some(b) = world.get_resource::<RecyclingBackdrop>() {
        b.logger.debug(format!("{} cycle layers of height {:.0}", count, h));
    }
    Some(h)
}

/// Build the ground, the front cloud and the cycle column.
pub fn setup_recycling(world: &mut World) {
    let Some(ctx) = world.get_resource::<ScaleContext>().copied() else {
        return;
    };
    let Some((ground, cycle, cloud)) = paths(world) else {
        return;
    };
    let g = spawn_ground(world, &ctx, &ground, layers::BACKGROUND);
    let c = spawn_cloud(world, &ctx, &cloud, layers::FRONT_CLOUD);
    let h = spawn_cycle(world, &ctx, &cycle);
    if let Some(mut b) = world.get_resource_mut::<RecyclingBackdrop>() {
        b.rescale(&ctx);
        b.ground = g;
        b.cloud = c.map(|(e, _)| e);
        b.cloud_rest_y = c.map(|(_, y)| y).unwrap_or(0.0);
        b.layer_height = h.unwrap_or(0.0);
        if g.is_none() || c.is_none() || h.is_none() {
            b.logger.error("recycling backdrop is missing images");
        } else {
            b.logger.info("recycling backdrop ready");
        }
    }
}

/// Start scrolling from the base speed. No-op while already scrolling.
pub fn start_scroll(world: &mut World) {
    if let Some(mut b) = world.get_resource_mut::<RecyclingBackdrop>() {
        if b.scrolling {
            return;
        }
        b.scrolling = true;
        b.reset_speed();
        b.logger.info("backdrop scrolling");
    }
}

pub fn stop_scroll(world: &mut World) {
    if let Some(mut b) = world.get_resource_mut::<RecyclingBackdrop>()
        && b.scrolling
    {
        b.scrolling = false;
        b.logger.info("backdrop stopped");
    }
}

/// Moves the backdrop and recycles cycle layers that left the viewport.
pub fn recycling_scroll_system(
    mut backdrop: ResMut<RecyclingBackdrop>,
    ctx: Res<ScaleContext>,
    mut parts: Query<
        (&BackdropPart, &mut MapPosition, &Sprite, &Scale),
        Without<RecyclingLayer>,
    >,
    mut cycles: Query<(&mut MapPosition, &Sprite, &Scale), With<RecyclingLayer>>,
) {
    if !backdrop.scrolling {
        return;
    }
    let speed = backdrop.ramp();
    let mut ground_tops: Vec<f32> = Vec::new();
    for (part, mut pos, sprite, scale) in parts.iter_mut() {
        pos.pos.y += speed;
        if *part == BackdropPart::Ground {
            ground_tops.push(pos.pos.y - sprite.height * scale.scale.y / 2.0);
        }
    }
    let mut column: Vec<(Mut<MapPosition>, f32)> = cycles
        .iter_mut()
        .map(|(mut pos, sprite, scale)| {
            pos.pos.y += speed;
            (pos, sprite.height * scale.scale.y)
        })
        .collect();
    for i in 0..column.len() {
        let h = column[i].1;
        let top = column[i].0.pos.y - h / 2.0;
        if top <= ctx.viewport_height + h {
            continue;
        }
        let highest = column
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, (p, lh))| p.pos.y - lh / 2.0)
            .chain(ground_tops.iter().copied())
            .fold(f32::INFINITY, f32::min);
        if highest.is_finite() {
            column[i].0.pos.y = (highest - h).floor() + h / 2.0;
        }
    }
}

/// Swap in a fresh ground and front cloud with a fade/slide, then drop the
/// old backdrop.
///
/// Scrolling stops. The cycle column is rebuilt above the viewport so the
/// next flight starts from a clean stack.
pub fn reset_with_transition(world: &mut World) {
    stop_scroll(world);
    let Some(ctx) = world.get_resource::<ScaleContext>().copied() else {
        return;
    };
    let Some((ground, cycle, cloud)) = paths(world) else {
        return;
    };
    let mut retire: Vec<Entity> = Vec::new();
    let mut q = world.query_filtered::<Entity, Or<(With<BackdropPart>, With<RecyclingLayer>)>>();
    retire.extend(q.iter(world));

    let g = spawn_ground(world, &ctx, &ground, layers::INCOMING_GROUND);
    let c = spawn_cloud(world, &ctx, &cloud, layers::INCOMING_FRONT_CLOUD);
    let h = spawn_cycle(world, &ctx, &cycle);

    let duration = world
        .get_resource::<GameConfig>()
        .map(|c| c.transition_duration)
        .unwrap_or(DEFAULT_TRANSITION);
    let handle = match (g, c) {
        (_, Some((cloud_e, rest_y))) => {
            let cloud_h = world
                .get::<Sprite>(cloud_e)
                .zip(world.get::<Scale>(cloud_e))
                .map(|(s, sc)| s.height * sc.scale.y)
                .unwrap_or(0.0);
            // Top edge starts one cloud height below the viewport.
            let params = FadeSlideParams {
                duration,
                fade_in: g.into_iter().collect(),
                slide_from: ctx.viewport_height + cloud_h * 1.5,
                slide_to: rest_y,
                retire,
            };
            start_fade_slide(world, cloud_e, params)
        }
        (Some(ground_e), None) => {
            let y = world
                .get::<MapPosition>(ground_e)
                .map(|p| p.pos.y)
                .unwrap_or(0.0);
            let params = FadeSlideParams {
                duration,
                fade_in: smallvec![ground_e],
                slide_from: y,
                slide_to: y,
                retire,
            };
            start_fade_slide(world, ground_e, params)
        }
        (None, None) => {
            for e in retire {
                if world.get_entity(e).is_ok() {
                    world.despawn(e);
                }
            }
            None
        }
    };
    if let Some(mut b) = world.get_resource_mut::<RecyclingBackdrop>() {
        b.ground = g;
        b.cloud = c.map(|(e, _)| e);
        b.cloud_rest_y = c.map(|(_, y)| y).unwrap_or(0.0);
        b.layer_height = h.unwrap_or(b.layer_height);
        b.transition = handle;
        b.logger.info("backdrop reset with transition");
    }
}

/// Settles the z order of the new backdrop once its transition is over.
pub fn observe_backdrop_transition(
    trigger: On<TransitionCompleted>,
    mut backdrop: ResMut<RecyclingBackdrop>,
    mut parts: Query<(&BackdropPart, &mut ZIndex)>,
) {
    let Some(handle) = backdrop.transition else {
        return;
    };
    if handle.target != trigger.event().entity {
        return;
    }
    backdrop.transition = None;
    for (part, mut z) in parts.iter_mut() {
        z.0 = match part {
            BackdropPart::Ground => layers::BACKGROUND,
            BackdropPart::FrontCloud => layers::FRONT_CLOUD,
        };
    }
    backdrop.logger.debug("backdrop transition finished");
}

/// Refit the backdrop to a resized viewport.
pub fn relayout_recycling(world: &mut World) {
    let Some(ctx) = world.get_resource::<ScaleContext>().copied() else {
        return;
    };
    let mut rest_y = None;
    let mut layer_h = None;
    let mut q = world.query::<(
        &Sprite,
        &mut Scale,
        &mut MapPosition,
        Option<&BackdropPart>,
        Option<&RecyclingLayer>,
    )>();
    for (sprite, mut scale, mut pos, part, cycle) in q.iter_mut(world) {
        let tex = TextureInfo {
            width: sprite.width,
            height: sprite.height,
        };
        match (part, cycle) {
            (Some(BackdropPart::Ground), _) => {
                let (s, center) = ground_layout(&ctx, &tex);
                scale.scale = Vec2::splat(s);
                pos.pos = center;
            }
            (Some(BackdropPart::FrontCloud), _) => {
                let (s, center) = cloud_layout(&ctx, &tex);
                scale.scale = s;
                pos.pos = center;
                rest_y = Some(center.y);
            }
            (None, Some(layer)) => {
                let (s, h, center) = cycle_layout(&ctx, &tex, layer.index);
                scale.scale = Vec2::splat(s);
                pos.pos = center;
                layer_h = Some(h);
            }
            (None, None) => {}
        }
    }
    if let Some(mut b) = world.get_resource_mut::<RecyclingBackdrop>() {
        b.rescale(&ctx);
        if let Some(y) = rest_y {
            b.cloud_rest_y = y;
        }
        if let Some(h) = layer_h {
            b.layer_height = h;
        }
    }
}

/// Stop and remove the whole backdrop.
pub fn dispose_recycling(world: &mut World) {
    stop_scroll(world);
    let mut q = world.query_filtered::<Entity, Or<(With<BackdropPart>, With<RecyclingLayer>)>>();
    let all: Vec<Entity> = q.iter(world).collect();
    for e in all {
        world.despawn(e);
    }
    if let Some(mut b) = world.get_resource_mut::<RecyclingBackdrop>() {
        b.ground = None;
        b.cloud = None;
        b.transition = None;
    }
}
