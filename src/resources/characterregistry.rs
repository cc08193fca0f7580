//! Registry of live characters keyed by id.
//!
//! The registry owns lifetime bookkeeping only; entities live in the world.
//! Teardown code iterates a [`CharacterRegistry::snapshot`] so despawning
//! while walking the set is safe.

use crate::scenelog::SceneLogger;
use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

#[derive(Resource, Debug)]
pub struct CharacterRegistry {
    map: FxHashMap<String, Entity>,
    pub logger: SceneLogger,
}

impl Default for CharacterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterRegistry {
    pub fn new() -> Self {
        CharacterRegistry {
            map: FxHashMap::default(),
            logger: SceneLogger::new("characters"),
        }
    }

    /// Register `entity` under `id`, returning the entity it replaced.
    pub fn add(&mut self, id: impl Into<String>, entity: Entity) -> Option<Entity> {
        let id = id.into();
        let previous = self.map.insert(id.clone(), entity);
        if previous.is_some() {
            self.logger
                .warn(format!("character id '{}' registered twice", id));
        }
        previous
    }

    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        self.map.remove(id)
    }

    /// Remove `id` only if it still maps to `entity`.
    pub fn remove_entity(&mut self, id: &str, entity: Entity) -> bool {
        if self.map.get(id) == Some(&entity) {
            self.map.remove(id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: &str) -> Option<Entity> {
        self.map.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Owned copy of the current entries.
    pub fn snapshot(&self) -> Vec<(String, Entity)> {
        self.map.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
