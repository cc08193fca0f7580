//! Entry hooks per round state.
//!
//! Every [`GameStates`] value may own one registered exclusive system. The
//! transition observer looks the hook up here instead of knowing about the
//! subsystems each state drives.

use bevy_ecs::prelude::Resource;
use bevy_ecs::system::SystemId;
use rustc_hash::FxHashMap;

use crate::resources::gamestate::GameStates;

#[derive(Resource, Default)]
pub struct StateHooks {
    hooks: FxHashMap<GameStates, SystemId>,
}

impl StateHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as the entry hook of `state`, replacing any earlier one.
    pub fn on_enter(&mut self, state: GameStates, id: SystemId) -> Option<SystemId> {
        self.hooks.insert(state, id)
    }

    pub fn entry_hook(&self, state: GameStates) -> Option<SystemId> {
        self.hooks.get(&state).copied()
    }

    /// Number of states with a hook.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
