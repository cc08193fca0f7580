//! Audio command plumbing.
//!
//! Scene code never talks to the [`AudioDirector`] directly. It writes
//! [`AudioCmd`] messages (from systems through a `MessageWriter`, from
//! `&mut World` operations through [`queue_audio`]) and the director applies
//! them once per frame in [`apply_audio_cmds`].
//!
//! State cues are derived in one place, [`audio_cues_for_state`], and written
//! by the [`observe_state_audio`] observer whenever a state is entered.

use bevy_ecs::prelude::*;

use crate::events::audio::AudioCmd;
use crate::events::gamestate::GameStateEntered;
use crate::resources::audio::AudioDirector;
use crate::resources::countdown::Countdown;
use crate::resources::gamestate::GameStates;

/// Countdowns up to this many seconds use the short countdown cue.
pub const SHORT_COUNTDOWN_SECS: f32 = 5.0;

/// Queue an audio command from exclusive world code.
pub fn queue_audio(world: &mut World, cmd: AudioCmd) {
    if let Some(mut msgs) = world.get_resource_mut::<Messages<AudioCmd>>() {
        msgs.write(cmd);
    }
}

/// Audio commands that accompany entering `state`.
pub fn audio_cues_for_state(
    state: GameStates,
    previous: GameStates,
    countdown_secs: f32,
) -> Vec<AudioCmd> {
    match state {
        GameStates::Boarding => vec![
            AudioCmd::PlayForState { state },
            AudioCmd::sound("into"),
        ],
        GameStates::Countdown => {
            let cue = if countdown_secs <= SHORT_COUNTDOWN_SECS {
                "countdown_5_sec"
            } else {
                "countdown_10_sec"
            };
            vec![AudioCmd::sound(cue)]
        }
        GameStates::Launching => vec![AudioCmd::sound("rocket_prelaunch")],
        GameStates::Flying => vec![
            AudioCmd::stop_bgm("bgm_open"),
            AudioCmd::PlayForState { state },
        ],
        GameStates::Disembarking => Vec::new(),
        GameStates::Exploding => vec![AudioCmd::stop_all_bgm(), AudioCmd::sound("rocket_explode")],
        GameStates::Completed => vec![AudioCmd::stop_all_bgm(), AudioCmd::sound("win")],
        GameStates::Idle => {
            if previous == GameStates::Idle {
                Vec::new()
            } else {
                vec![AudioCmd::stop_all_bgm(), AudioCmd::sound("return")]
            }
        }
    }
}

/// Writes the audio cues of every entered state.
pub fn observe_state_audio(
    trigger: On<GameStateEntered>,
    countdown: Option<Res<Countdown>>,
    mut writer: MessageWriter<AudioCmd>,
) {
    let event = trigger.event();
    let secs = countdown.map(|c| c.duration).unwrap_or(0.0);
    writer.write_batch(audio_cues_for_state(event.state, event.previous, secs));
}

/// Apply every pending audio command to the director.
pub fn apply_audio_cmds(mut director: ResMut<AudioDirector>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        match cmd {
            AudioCmd::PlayBgm { key, looped } => director.play_bgm(key, *looped),
            AudioCmd::StopBgm { key } => director.stop_bgm(key.as_deref()),
            AudioCmd::PlaySound { key } => director.play_sound(key),
            AudioCmd::SetVolume { volume } => director.set_volume(*volume),
            AudioCmd::ToggleBgm => director.toggle_bgm(),
            AudioCmd::ToggleSoundEffect => director.toggle_sound_effect(),
            AudioCmd::SetBgmEnabled { enabled } => director.set_bgm_enabled(*enabled),
            AudioCmd::SetSoundEffectEnabled { enabled } => {
                director.set_sound_effect_enabled(*enabled)
            }
            AudioCmd::PlayForState { state } => director.play_bgm_for_state(*state),
        }
    }
}

/// Advance the ECS message queue for AudioCmd so same-frame readers can observe writes.
pub fn update_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flying_swaps_open_theme_for_flight_themes() {
        let cues = audio_cues_for_state(GameStates::Flying, GameStates::Launching, 3.0);
        assert_eq!(
            cues,
            vec![
                AudioCmd::stop_bgm("bgm_open"),
                AudioCmd::PlayForState {
                    state: GameStates::Flying
                }
            ]
        );
    }

    #[test]
    fn countdown_cue_depends_on_length() {
        let short = audio_cues_for_state(GameStates::Countdown, GameStates::Boarding, 3.0);
        assert_eq!(short, vec![AudioCmd::sound("countdown_5_sec")]);
        let long = audio_cues_for_state(GameStates::Countdown, GameStates::Boarding, 10.0);
        assert_eq!(long, vec![AudioCmd::sound("countdown_10_sec")]);
    }

    #[test]
    fn idle_only_plays_return_after_a_round() {
        assert!(audio_cues_for_state(GameStates::Idle, GameStates::Idle, 0.0).is_empty());
        let back = audio_cues_for_state(GameStates::Idle, GameStates::Completed, 0.0);
        assert_eq!(back, vec![AudioCmd::stop_all_bgm(), AudioCmd::sound("return")]);
    }
}
