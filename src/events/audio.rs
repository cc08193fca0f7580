use crate::resources::gamestate::GameStates;
use bevy_ecs::message::Message;

/// Commands sent *to* the audio director.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioCmd {
    PlayBgm { key: String, looped: bool },
    /// Stop one BGM, or all of them when `key` is `None`.
    StopBgm { key: Option<String> },
    PlaySound { key: String },
    /// Normalized volume; clamped to `[0, 1]` by the director.
    SetVolume { volume: f32 },
    ToggleBgm,
    ToggleSoundEffect,
    SetBgmEnabled { enabled: bool },
    SetSoundEffectEnabled { enabled: bool },
    /// Background music mapped from a round state.
    PlayForState { state: GameStates },
}

impl AudioCmd {
    pub fn bgm(key: impl Into<String>) -> Self {
        AudioCmd::PlayBgm {
            key: key.into(),
            looped: true,
        }
    }
    pub fn sound(key: impl Into<String>) -> Self {
        AudioCmd::PlaySound { key: key.into() }
    }
    pub fn stop_all_bgm() -> Self {
        AudioCmd::StopBgm { key: None }
    }
    pub fn stop_bgm(key: impl Into<String>) -> Self {
        AudioCmd::StopBgm {
            key: Some(key.into()),
        }
    }
}
