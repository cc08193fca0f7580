//! Character components.
//!
//! A character is a transient skeletal entity that either walks into the
//! rocket (boarding) or jumps out of it (disembarking). Its lifetime is owned
//! by the [`CharacterRegistry`](crate::resources::characterregistry::CharacterRegistry):
//! it is registered on creation and unregistered when its animation window
//! ends or the scene is torn down.
//!
//! A disembarking character may own a label entity. The label carries the
//! [`BoneTracker`](super::bonetracker::BoneTracker), so a character with a
//! label always has a tracker and both are despawned together.

use crate::resources::completion::Completion;
use bevy_ecs::prelude::{Component, Entity};
use std::fmt;
use std::str::FromStr;

/// Who a character represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterKind {
    Player,
    Streamer,
    Npc,
}

impl CharacterKind {
    /// Player and streamer are "self" characters; they use the `me` clips.
    pub fn is_self(&self) -> bool {
        matches!(self, CharacterKind::Player | CharacterKind::Streamer)
    }
}

impl fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CharacterKind::Player => "player",
            CharacterKind::Streamer => "streamer",
            CharacterKind::Npc => "npc",
        };
        f.write_str(s)
    }
}

impl FromStr for CharacterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "player" => Ok(CharacterKind::Player),
            "streamer" => Ok(CharacterKind::Streamer),
            "npc" => Ok(CharacterKind::Npc),
            other => Err(format!("unknown character kind '{}'", other)),
        }
    }
}

/// Walking direction used when boarding. `Left` is the self walk, `Right`
/// the walk used by other passengers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn for_kind(kind: CharacterKind) -> Self {
        if kind.is_self() {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

/// A live character.
#[derive(Component, Debug, Clone)]
pub struct Character {
    pub id: String,
    pub kind: CharacterKind,
    /// Whether the render adapter draws the character.
    pub visible: bool,
    /// Floating label entity; it owns the bone tracker.
    pub label: Option<Entity>,
}

impl Character {
    pub fn new(id: impl Into<String>, kind: CharacterKind) -> Self {
        Character {
            id: id.into(),
            kind,
            visible: true,
            label: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// In-flight boarding walk. The position tween is the
/// [`TweenPosition`](super::tween::TweenPosition) on the same entity.
#[derive(Component, Debug, Clone)]
pub struct BoardingMove {
    pub completion: Completion<()>,
    pub start_frame: u64,
}

/// Jump clip variants; one is picked uniformly per disembark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpVariant {
    Base,
    Two,
    Three,
}

impl JumpVariant {
    pub const ALL: [JumpVariant; 3] = [JumpVariant::Base, JumpVariant::Two, JumpVariant::Three];

    pub fn suffix(&self) -> &'static str {
        match self {
            JumpVariant::Base => "",
            JumpVariant::Two => "2",
            JumpVariant::Three => "3",
        }
    }

    /// Pick a variant uniformly using the injected generator.
    pub fn pick(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }

    /// Clip name for the given character kind.
    pub fn clip_for(&self, kind: CharacterKind) -> String {
        let base = if kind.is_self() { "jump_me" } else { "jump_others" };
        format!("{}{}", base, self.suffix())
    }
}

/// In-flight disembark jump, in place, for a fixed window.
#[derive(Component, Debug, Clone, Copy)]
pub struct DisembarkJump {
    pub started_at: f32,
    pub start_frame: u64,
    pub duration: f32,
}

/// Reveals a label on the first frame after `armed_frame`.
#[derive(Component, Debug, Clone, Copy)]
pub struct LabelReveal {
    pub armed_frame: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_clip_names() {
        assert_eq!(JumpVariant::Base.clip_for(CharacterKind::Npc), "jump_others");
        assert_eq!(JumpVariant::Two.clip_for(CharacterKind::Player), "jump_me2");
        assert_eq!(JumpVariant::Three.clip_for(CharacterKind::Streamer), "jump_me3");
    }

    #[test]
    fn seeded_pick_covers_every_variant() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let v = JumpVariant::pick(&mut rng);
            let idx = JumpVariant::ALL.iter().position(|x| *x == v).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("NPC".parse::<CharacterKind>(), Ok(CharacterKind::Npc));
        assert!("pilot".parse::<CharacterKind>().is_err());
    }
}
