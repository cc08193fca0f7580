//! Round state transitions.
//!
//! A request sits in [`NextGameState`] until a [`GameStateChangedEvent`] is
//! triggered, either by `check_pending_state` at the top of a frame or
//! directly by `set_state`. [`observe_gamestate_change_event`] then moves
//! [`GameState`] forward, queues the entry hook from [`StateHooks`] and
//! announces [`GameStateEntered`].
//!
//! Hook and announcement are queued commands, so a state's side effects are
//! in place before any effect they start sees its first frame.
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::statehooks::StateHooks;
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info, warn};

/// Apply whatever [`NextGameState`] holds.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct GameStateChangedEvent;

/// A transition was applied. Audio cues and tests listen for this.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStateEntered {
    pub state: GameStates,
    pub previous: GameStates,
}

/// Consume the pending request and enter the requested state.
///
/// A request for the state already in force is dropped. Steps outside the
/// round sequence are logged and still applied, since a host may force its
/// way out of a stuck round.
pub fn observe_gamestate_change_event(
    _trigger: On<GameStateChangedEvent>,
    mut commands: Commands,
    next: Option<ResMut<NextGameState>>,
    current: Option<ResMut<GameState>>,
    hooks: Option<Res<StateHooks>>,
) {
    let (Some(mut next), Some(mut current)) = (next, current) else {
        warn!("state resources missing, transition ignored");
        return;
    };
    let Some(target) = next.take() else {
        debug!("state change triggered with nothing pending");
        return;
    };
    let from = current.get();
    if from == target {
        debug!("already in {}", target);
        return;
    }
    if !from.allows(target) {
        warn!("out-of-order transition {} -> {}", from, target);
    }
    info!("{} -> {}", from, target);
    current.set(target);

    match hooks.as_deref().and_then(|h| h.entry_hook(target)) {
        Some(id) => commands.run_system(id),
        None => debug!("no entry hook for {}", target),
    }
    commands.trigger(GameStateEntered {
        state: target,
        previous: from,
    });
}
