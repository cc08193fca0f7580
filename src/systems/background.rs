//! Classic phased background: ground, takeoff sequence, endless flying loop.
//!
//! The ground image is static. Takeoff removes it and feeds the takeoff
//! images in one after another; once they run out the flying images are fed
//! in a cycle. Every scrolling layer enters just above the top edge, moves
//! down by its speed each frame and is removed once it has fully left the
//! bottom edge.
//!
//! Image cadence is measured on the shared clock: the next image is added
//! when a fixed fraction of the current one's scroll time has elapsed.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::background::BackgroundLayer;
use crate::components::mapposition::MapPosition;
use crate::components::opacity::Opacity;
use crate::components::scale::Scale;
use crate::components::sprite::Sprite;
use crate::components::zindex::{ZIndex, layers};
use crate::resources::assets::{SceneAssets, TextureInfo};
use crate::resources::background::{
    BackgroundPhase, BackgroundScroller, FLYING_FRACTION, TAKEOFF_FIRST_FRACTION,
    TAKEOFF_NEXT_FRACTION, fit_scale, scroll_time,
};
use crate::resources::scalecontext::ScaleContext;
use crate::resources::worldtime::WorldTime;

/// Texture key drawn as a flat color when the ground image is unavailable.
pub const FALLBACK_GROUND_KEY: &str = "#1a4a6b";
/// Distance covered by a takeoff image, in viewport heights.
const TAKEOFF_TRAVEL: f32 = 1.5;

fn now(world: &World) -> f32 {
    world
        .get_resource::<WorldTime>()
        .map(|t| t.elapsed)
        .unwrap_or(0.0)
}

fn texture(world: &mut World, path: &str) -> Option<TextureInfo> {
    world
        .get_resource_mut::<SceneAssets>()
        .and_then(|mut a| a.texture(path).ok())
}

fn layer_entities(world: &mut World) -> Vec<(Entity, BackgroundLayer)> {
    let mut q = world.query::<(Entity, &BackgroundLayer)>();
    let mut v: Vec<(Entity, BackgroundLayer)> = q.iter(world).map(|(e, l)| (e, *l)).collect();
    v.sort_by_key(|(_, l)| l.order);
    v
}

fn clear_layers(world: &mut World) -> usize {
    let layers = layer_entities(world);
    for (e, _) in layers.iter() {
        world.despawn(*e);
    }
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.ground = None;
    }
    layers.len()
}

/// Put the static ground image up, tiling it when it is too short for the
/// viewport.
pub fn set_ground(world: &mut World) -> Option<Entity> {
    let ctx = world.get_resource::<ScaleContext>().copied()?;
    let path = world
        .get_resource::<SceneAssets>()?
        .manifest
        .classic_background
        .ground
        .clone();
    let center = Vec2::new(ctx.viewport_width / 2.0, ctx.viewport_height / 2.0);
    let (sprite, scale) = match texture(world, &path) {
        Some(tex) => {
            let s = fit_scale(&ctx, tex.width, tex.height);
            if tex.height * s < ctx.viewport_height {
                (
                    Sprite::new(path.as_str(), ctx.viewport_width, ctx.viewport_height).tiled(),
                    Scale::default(),
                )
            } else {
                (Sprite::new(path.as_str(), tex.width, tex.height), Scale::uniform(s))
            }
        }
        None => (
            Sprite::new(FALLBACK_GROUND_KEY, ctx.viewport_width, ctx.viewport_height),
            Scale::default(),
        ),
    };
    let tiled = sprite.tiled;
    let mut scroller = world.get_resource_mut::<BackgroundScroller>()?;
    scroller.phase = BackgroundPhase::Ground;
    let order = scroller.take_order();
    let e = world
        .spawn((
            sprite,
            scale,
            MapPosition::from_vec(center),
            Opacity::default(),
            ZIndex(layers::BACKGROUND),
            BackgroundLayer {
                speed: 0.0,
                active: true,
                order,
            },
        ))
        .id();
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.ground = Some(e);
        s.logger
            .debug(format!("ground set ({})", if tiled { "tiled" } else { "fitted" }));
    }
    Some(e)
}

/// Stop scrolling, clear every layer and show the ground again.
pub fn reset_background(world: &mut World) {
    stop_background(world);
    let removed = clear_layers(world);
    set_ground(world);
    if let Some(s) = world.get_resource::<BackgroundScroller>() {
        s.logger
            .info(format!("background reset ({} layers cleared)", removed));
    }
}

/// Halt scrolling and cancel pending image cadence. Layers stay in place.
pub fn stop_background(world: &mut World) {
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.scrolling = false;
        s.next_trigger_at = None;
        s.phase = BackgroundPhase::Ground;
    }
}

/// Stop and remove every layer.
pub fn dispose_background(world: &mut World) {
    stop_background(world);
    clear_layers(world);
}

fn remove_ground(world: &mut World) {
    for (e, layer) in layer_entities(world) {
        if layer.speed == 0.0 {
            world.despawn(e);
        }
    }
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.ground = None;
    }
}

/// Spawn `path` just above the top edge, scrolling at `speed`. Returns the
/// scaled layer height.
fn add_scrolling_layer(world: &mut World, path: &str, speed: f32) -> Option<f32> {
    let ctx = world.get_resource::<ScaleContext>().copied()?;
    let Some(tex) = texture(world, path) else {
        if let Some(s) = world.get_resource::<BackgroundScroller>() {
            s.logger.error(format!("cannot add background '{}'", path));
        }
        return None;
    };
    let scale = fit_scale(&ctx, tex.width, tex.height);
    let layer_h = tex.height * scale;
    let mut scroller = world.get_resource_mut::<BackgroundScroller>()?;
    let order = scroller.take_order();
    scroller.scrolling = true;
    world.spawn((
        Sprite::new(path, tex.width, tex.height),
        Scale::uniform(scale),
        MapPosition::new(ctx.viewport_width / 2.0, -layer_h / 2.0),
        Opacity::default(),
        ZIndex(layers::BACKGROUND),
        BackgroundLayer {
            speed,
            active: true,
            order,
        },
    ));
    if let Some(s) = world.get_resource::<BackgroundScroller>() {
        s.logger.debug(format!(
            "scrolling '{}' (speed {}, height {:.0})",
            path.rsplit('/').next().unwrap_or(path),
            speed,
            layer_h
        ));
    }
    Some(layer_h)
}

/// Remove the ground and start feeding the takeoff images at `speed`.
pub fn start_takeoff(world: &mut World, speed: f32) {
    let t = now(world);
    let Some(ctx) = world.get_resource::<ScaleContext>().copied() else {
        return;
    };
    let Some(first) = world
        .get_resource::<SceneAssets>()
        .and_then(|a| a.manifest.classic_background.takeoff.first().cloned())
    else {
        start_flying(world, speed);
        return;
    };
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.phase = BackgroundPhase::Takeoff;
        s.takeoff_index = 0;
        s.speed = speed;
        s.logger.info(format!("takeoff at speed {}", speed));
    }
    remove_ground(world);
    add_scrolling_layer(world, &first, speed);
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.takeoff_index = 1;
        let travel = scroll_time(ctx.viewport_height * TAKEOFF_TRAVEL, speed, s.frame_ms);
        s.next_trigger_at = Some(t + travel * TAKEOFF_FIRST_FRACTION);
    }
}

/// Switch to the endless flying cycle.
pub fn start_flying(world: &mut World, speed: f32) {
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.phase = BackgroundPhase::Flying;
        s.flying_index = 0;
        s.speed = speed;
        s.logger.info("flying backgrounds started");
    }
    cycle_flying(world);
}

fn cycle_flying(world: &mut World) {
    let t = now(world);
    let Some(ctx) = world.get_resource::<ScaleContext>().copied() else {
        return;
    };
    let flying = world
        .get_resource::<SceneAssets>()
        .map(|a| a.manifest.classic_background.flying.clone())
        .unwrap_or_default();
    let Some((index, speed)) = world
        .get_resource::<BackgroundScroller>()
        .map(|s| (s.flying_index, s.speed))
    else {
        return;
    };
    if flying.is_empty() {
        if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
            s.next_trigger_at = None;
        }
        return;
    }
    let path = &flying[index % flying.len()];
    let layer_h = add_scrolling_layer(world, path, speed);
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.flying_index = (index + 1) % flying.len();
        let distance = layer_h.unwrap_or(ctx.viewport_height) + ctx.viewport_height;
        s.next_trigger_at = Some(t + scroll_time(distance, speed, s.frame_ms) * FLYING_FRACTION);
    }
}

fn next_takeoff(world: &mut World) {
    let t = now(world);
    let Some(ctx) = world.get_resource::<ScaleContext>().copied() else {
        return;
    };
    let takeoff = world
        .get_resource::<SceneAssets>()
        .map(|a| a.manifest.classic_background.takeoff.clone())
        .unwrap_or_default();
    let Some((index, speed)) = world
        .get_resource::<BackgroundScroller>()
        .map(|s| (s.takeoff_index, s.speed))
    else {
        return;
    };
    if index >= takeoff.len() {
        start_flying(world, speed);
        return;
    }
    add_scrolling_layer(world, &takeoff[index], speed);
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        s.takeoff_index = index + 1;
        let travel = scroll_time(ctx.viewport_height * TAKEOFF_TRAVEL, speed, s.frame_ms);
        s.next_trigger_at = Some(t + travel * TAKEOFF_NEXT_FRACTION);
    }
}

/// Adds the next takeoff or flying image when its time has come.
pub fn background_cadence_system(world: &mut World) {
    let t = now(world);
    let Some((phase, due)) = world
        .get_resource::<BackgroundScroller>()
        .map(|s| (s.phase, s.next_trigger_at.is_some_and(|at| t >= at)))
    else {
        return;
    };
    if !due {
        return;
    }
    match phase {
        BackgroundPhase::Takeoff => next_takeoff(world),
        BackgroundPhase::Flying => cycle_flying(world),
        BackgroundPhase::Ground => {
            if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
                s.next_trigger_at = None;
            }
        }
    }
}

/// Moves scrolling layers down and removes the ones that left the viewport.
pub fn background_scroll_system(
    scroller: Res<BackgroundScroller>,
    ctx: Res<ScaleContext>,
    mut query: Query<(Entity, &mut BackgroundLayer, &mut MapPosition, &Sprite, &Scale)>,
    mut commands: Commands,
) {
    if !scroller.scrolling {
        return;
    }
    for (entity, mut layer, mut pos, sprite, scale) in query.iter_mut() {
        if !layer.active || layer.speed <= 0.0 {
            continue;
        }
        pos.pos.y += layer.speed;
        let layer_h = sprite.height * scale.scale.y;
        if pos.pos.y > ctx.viewport_height + layer_h / 2.0 {
            layer.active = false;
            commands.entity(entity).try_despawn();
            scroller.logger.debug("scrolled-out background removed");
        }
    }
}

/// Change the speed of every moving layer. Static layers are left alone.
pub fn update_flying_speed(world: &mut World, speed: f32) {
    let mut q = world.query::<&mut BackgroundLayer>();
    for mut layer in q.iter_mut(world) {
        if layer.speed > 0.0 {
            layer.speed = speed;
        }
    }
    if let Some(mut s) = world.get_resource_mut::<BackgroundScroller>() {
        if s.phase != BackgroundPhase::Ground {
            s.speed = speed;
        }
        s.logger.info(format!("flying speed set to {}", speed));
    }
}

/// One-line summary of the scroller for diagnostics.
pub fn background_status(world: &mut World) -> String {
    let layers = layer_entities(world);
    let active = layers.iter().filter(|(_, l)| l.active).count();
    let phase = world
        .get_resource::<BackgroundScroller>()
        .map(|s| s.phase.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Phase: {}, Layers: {}, Active: {}",
        phase,
        layers.len(),
        active
    )
}

/// Refit every layer to a resized viewport, keeping vertical progress.
pub fn relayout_background(world: &mut World, old: &ScaleContext, new: &ScaleContext) {
    let ry = new.viewport_height / old.viewport_height.max(f32::EPSILON);
    let mut q = world.query::<(&BackgroundLayer, &mut Sprite, &mut Scale, &mut MapPosition)>();
    for (layer, mut sprite, mut scale, mut pos) in q.iter_mut(world) {
        if sprite.tiled || sprite.tex_key == FALLBACK_GROUND_KEY {
            sprite.width = new.viewport_width;
            sprite.height = new.viewport_height;
            pos.pos = Vec2::new(new.viewport_width / 2.0, new.viewport_height / 2.0);
            continue;
        }
        let s = fit_scale(new, sprite.width, sprite.height);
        scale.scale = Vec2::splat(s);
        pos.pos.x = new.viewport_width / 2.0;
        pos.pos.y = if layer.speed == 0.0 {
            new.viewport_height / 2.0
        } else {
            pos.pos.y * ry
        };
    }
}
