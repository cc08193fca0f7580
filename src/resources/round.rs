//! Per-round bookkeeping: who boards, how the round ends, who is on board.

use crate::components::character::CharacterKind;
use bevy_ecs::prelude::Resource;
use smallvec::SmallVec;

/// How the flight ends once everybody has jumped off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundOutcome {
    #[default]
    Completed,
    Exploded,
}

/// One passenger of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct Passenger {
    pub id: String,
    pub kind: CharacterKind,
    /// Text shown above the character while it jumps off. Empty means no label.
    pub label: String,
}

impl Passenger {
    pub fn new(id: impl Into<String>, kind: CharacterKind) -> Self {
        Passenger {
            id: id.into(),
            kind,
            label: String::new(),
        }
    }
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Plan of the round currently being played.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct RoundPlan {
    pub passengers: Vec<Passenger>,
    pub outcome: RoundOutcome,
}

impl RoundPlan {
    pub fn new(passengers: Vec<Passenger>) -> Self {
        RoundPlan {
            passengers,
            outcome: RoundOutcome::Completed,
        }
    }
    pub fn with_outcome(mut self, outcome: RoundOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Passengers currently inside the rocket.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct OnBoard {
    kinds: SmallVec<[CharacterKind; 4]>,
    /// Whether the player's launch clip already played this round.
    pub launch_player_played: bool,
}

impl OnBoard {
    pub fn add(&mut self, kind: CharacterKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }
    pub fn remove(&mut self, kind: CharacterKind) {
        self.kinds.retain(|k| *k != kind);
    }
    pub fn contains(&self, kind: CharacterKind) -> bool {
        self.kinds.contains(&kind)
    }
    pub fn has_self(&self) -> bool {
        self.kinds.iter().any(|k| k.is_self())
    }
    pub fn count(&self) -> usize {
        self.kinds.len()
    }
    pub fn clear(&mut self) {
        self.kinds.clear();
        self.launch_player_played = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_board_keeps_kinds_unique() {
        let mut ob = OnBoard::default();
        ob.add(CharacterKind::Npc);
        ob.add(CharacterKind::Npc);
        ob.add(CharacterKind::Player);
        assert_eq!(ob.count(), 2);
        ob.remove(CharacterKind::Npc);
        assert!(!ob.contains(CharacterKind::Npc));
        assert!(ob.contains(CharacterKind::Player));
    }
}
