//! High-level game state resources.
//!
//! These resources track the authoritative current state of a round and any
//! pending transition requested by systems. See
//! `crate::events::gamestate::observe_gamestate_change_event` for how a
//! transition is applied and entry hooks are invoked.

use bevy_ecs::prelude::Resource;
use std::fmt;

/// Discrete phases of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameStates {
    #[default]
    Idle,
    Boarding,
    Countdown,
    Launching,
    Flying,
    Disembarking,
    Exploding,
    Completed,
}

impl GameStates {
    /// Whether `next` is a forward step of the round sequence from `self`.
    ///
    /// Any state may go back to `Idle` through a reset.
    pub fn allows(&self, next: GameStates) -> bool {
        use GameStates::*;
        matches!(
            (self, next),
            (_, Idle)
                | (Idle, Boarding)
                | (Boarding, Countdown)
                | (Countdown, Launching)
                | (Launching, Flying)
                | (Flying, Disembarking)
                | (Disembarking, Exploding)
                | (Disembarking, Completed)
        )
    }
}

impl fmt::Display for GameStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStates::Idle => "IDLE",
            GameStates::Boarding => "BOARDING",
            GameStates::Countdown => "COUNTDOWN",
            GameStates::Launching => "LAUNCHING",
            GameStates::Flying => "FLYING",
            GameStates::Disembarking => "DISEMBARKING",
            GameStates::Exploding => "EXPLODING",
            GameStates::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

/// Round state currently in force.
///
/// Changed only by the transition observer; everything else requests a
/// change through [`NextGameState`].
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameState {
    current: GameStates,
    previous: Option<GameStates>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> GameStates {
        self.current
    }

    /// State left by the last transition, `None` before the first one.
    pub fn previous(&self) -> Option<GameStates> {
        self.previous
    }

    /// Overwrite the state without running entry hooks.
    ///
    /// Use [`crate::systems::gamestate::set_state`] from outside the observer.
    pub fn set(&mut self, state: GameStates) {
        self.previous = Some(self.current);
        self.current = state;
    }

    pub fn is(&self, state: GameStates) -> bool {
        self.current == state
    }

    pub fn is_launching(&self) -> bool {
        self.is(GameStates::Launching)
    }
}

/// Deferred transition request.
///
/// The last request of a frame wins. `check_pending_state` notices it at the
/// start of the next frame and the observer [`take`](Self::take)s it.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NextGameState {
    pending: Option<GameStates>,
}

impl NextGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, next: GameStates) {
        self.pending = Some(next);
    }

    pub fn pending(&self) -> Option<GameStates> {
        self.pending
    }

    /// Hand the request over, leaving nothing pending.
    pub fn take(&mut self) -> Option<GameStates> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_sequence_is_allowed() {
        use GameStates::*;
        let seq = [
            Idle,
            Boarding,
            Countdown,
            Launching,
            Flying,
            Disembarking,
            Completed,
        ];
        for pair in seq.windows(2) {
            assert!(pair[0].allows(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(Disembarking.allows(Exploding));
    }

    #[test]
    fn skipping_and_going_back_is_out_of_order() {
        use GameStates::*;
        assert!(!Idle.allows(Flying));
        assert!(!Flying.allows(Boarding));
        assert!(Exploding.allows(Idle));
    }

    #[test]
    fn set_records_previous() {
        let mut gs = GameState::new();
        gs.set(GameStates::Boarding);
        assert_eq!(gs.get(), GameStates::Boarding);
        assert_eq!(gs.previous(), Some(GameStates::Idle));
        assert!(gs.is(GameStates::Boarding));
    }

    #[test]
    fn last_request_wins_and_take_clears() {
        let mut ns = NextGameState::new();
        assert_eq!(ns.pending(), None);
        ns.request(GameStates::Boarding);
        ns.request(GameStates::Idle);
        assert_eq!(ns.take(), Some(GameStates::Idle));
        assert_eq!(ns.take(), None);
    }
}
