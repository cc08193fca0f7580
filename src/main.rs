//! Rocket flight headless driver.
//!
//! Orchestration core of a rocket-flight mini-game built on:
//! - **bevy_ecs** for the entity-component-system architecture
//! - **configparser** for the INI configuration
//! - **serde_json** for the asset manifest
//!
//! This executable plays rounds against the headless adapters, which is
//! handy for checking timings and logs without a renderer.
//!
//! # Main Loop
//!
//! 1. Load `config.ini` and the asset manifest
//! 2. Build the scene host (world, resources, observers, schedule)
//! 3. For each round:
//!    - start boarding and tick until the rocket flies
//!    - fly for a while, then let everybody jump out
//!    - tick until the round ends, then reset to idle
//! 4. Tear the scene down
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=rocketflight=debug cargo run --release -- --rounds 3 --outcome exploded
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};

use rocketflight::components::character::CharacterKind;
use rocketflight::game::{SceneAdapters, SceneHost};
use rocketflight::headless::{AudioLog, HeadlessAssetLoader, RecordingAudioBackend};
use rocketflight::resources::assets::AssetManifest;
use rocketflight::resources::gameconfig::GameConfig;
use rocketflight::resources::gamestate::GameStates;
use rocketflight::resources::round::{Passenger, RoundOutcome, RoundPlan};
use rocketflight::resources::settings::IniSettingsStore;

const FRAME_DT: f32 = 1.0 / 60.0;
/// Upper bound on frames spent waiting for any single state.
const MAX_WAIT_FRAMES: u32 = 60 * 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutcomeArg {
    Completed,
    Exploded,
}

impl From<OutcomeArg> for RoundOutcome {
    fn from(o: OutcomeArg) -> Self {
        match o {
            OutcomeArg::Completed => RoundOutcome::Completed,
            OutcomeArg::Exploded => RoundOutcome::Exploded,
        }
    }
}

/// Rocket flight scene
#[derive(Parser)]
#[command(version, about = "Plays rocket flight rounds against headless adapters")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Asset manifest (JSON). Overrides the one named in the config.
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Number of rounds to play.
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Seed for shake jitter and jump variants.
    #[arg(long)]
    seed: Option<u64>,

    /// How every round ends.
    #[arg(long, value_enum, default_value_t = OutcomeArg::Completed)]
    outcome: OutcomeArg,

    /// Window width; the game is fitted into it.
    #[arg(long)]
    width: Option<f32>,

    /// Window height; the game is fitted into it.
    #[arg(long)]
    height: Option<f32>,

    /// Seconds to fly before the passengers jump out.
    #[arg(long, default_value_t = 5.0)]
    flight_secs: f32,

    /// File persisting audio settings.
    #[arg(long, value_name = "PATH", default_value = "./settings.ini")]
    settings: PathBuf,
}

fn load_manifest(path: Option<PathBuf>) -> AssetManifest {
    let Some(path) = path else {
        return AssetManifest::default();
    };
    match AssetManifest::load_from_file(&path) {
        Ok(m) => {
            info!("Loaded manifest {:?}", path);
            m
        }
        Err(e) => {
            error!("{}; using built-in manifest", e);
            AssetManifest::default()
        }
    }
}

fn tick_until(host: &mut SceneHost, wanted: &[GameStates]) -> bool {
    for _ in 0..MAX_WAIT_FRAMES {
        if wanted.contains(&host.state()) {
            return true;
        }
        host.tick(FRAME_DT);
    }
    wanted.contains(&host.state())
}

fn tick_for(host: &mut SceneHost, seconds: f32) {
    let frames = (seconds / FRAME_DT).ceil() as u32;
    for _ in 0..frames {
        host.tick(FRAME_DT);
    }
}

fn plan_round(round: u32, outcome: RoundOutcome) -> RoundPlan {
    RoundPlan::new(vec![
        Passenger::new("me", CharacterKind::Player).with_label("You"),
        Passenger::new(format!("npc-{}-a", round), CharacterKind::Npc).with_label("Lucky"),
        Passenger::new(format!("npc-{}-b", round), CharacterKind::Npc),
    ])
    .with_outcome(outcome)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    let manifest = load_manifest(cli.manifest.clone().or_else(|| config.manifest_path.clone()));

    let audio_log = AudioLog::default();
    let adapters = SceneAdapters {
        loader: Arc::new(HeadlessAssetLoader::new(&manifest)),
        audio: Box::new(RecordingAudioBackend::new(audio_log.clone())),
        settings: Box::new(IniSettingsStore::open(&cli.settings)),
        manifest,
        threaded_loads: true,
    };
    let mut host = SceneHost::new(config, adapters);
    if let (Some(w), Some(h)) = (cli.width, cli.height) {
        host.resize(w, h);
    }

    let outcome = RoundOutcome::from(cli.outcome);
    for round in 1..=cli.rounds {
        info!("--- round {} ---", round);
        if !host.start_round(plan_round(round, outcome)) {
            error!("round {} could not start", round);
            break;
        }
        if !tick_until(&mut host, &[GameStates::Flying]) {
            error!("round {} stuck in {}", round, host.state());
            host.reset_round();
            continue;
        }
        tick_for(&mut host, cli.flight_secs);
        host.begin_disembark(outcome);
        if !tick_until(&mut host, &[GameStates::Completed, GameStates::Exploding]) {
            error!("round {} stuck in {}", round, host.state());
        }
        tick_for(&mut host, 1.5);
        info!("round {} ended in {}", round, host.state());
        host.reset_round();
        tick_for(&mut host, 1.0);
    }

    host.destroy();
    info!("{} audio calls recorded", audio_log.entries().len());
}
