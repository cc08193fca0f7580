//! Applies asynchronous skeleton loads to the stage.
//!
//! Results are only applied when they were requested under the current
//! render surface generation and the surface is still ready. Anything older
//! belongs to a round that has since been reset and is dropped.

use bevy_ecs::prelude::*;

use crate::components::character::Direction;
use crate::resources::assets::{AssetBridge, LoadPurpose, LoadResult};
use crate::resources::rendersurface::RenderSurface;
use crate::scenelog::SceneLogger;
use crate::systems::characters::{animate_boarding, spawn_boarding_from_skeleton};

/// Drain finished loads and spawn what they were requested for.
pub fn apply_loaded_assets(world: &mut World) {
    let Some(results) = world
        .get_resource_mut::<AssetBridge>()
        .map(|mut b| b.drain())
    else {
        return;
    };
    if results.is_empty() {
        return;
    }
    let surface = world
        .get_resource::<RenderSurface>()
        .copied()
        .unwrap_or_default();
    let logger = world.resource::<AssetBridge>().logger.clone();
    for result in results {
        if !surface.accepts(result.generation) {
            logger.debug(format!(
                "dropping late load of '{}' (generation {} vs {})",
                result.assets.skel_path, result.generation, surface.generation
            ));
            continue;
        }
        apply_one(world, result, &logger);
    }
}

fn apply_one(world: &mut World, result: LoadResult, logger: &SceneLogger) {
    let LoadResult {
        assets,
        purpose,
        outcome,
        ..
    } = result;
    match (purpose, outcome) {
        (LoadPurpose::Boarding { id, kind }, Ok(instance)) => {
            let entity = spawn_boarding_from_skeleton(world, kind, &id, &assets.skel_path, instance);
            if let Err(e) = animate_boarding(world, entity, Direction::for_kind(kind)) {
                logger.error(format!("'{}' cannot start boarding: {}", id, e));
            }
        }
        (LoadPurpose::Boarding { id, .. }, Err(e)) => {
            logger.error(format!("'{}' not boarding: {}", id, e));
        }
    }
}
