//! Scene host: builds the world, the frame schedule and the stage.
//!
//! [`SceneHost::new`] inserts every resource, registers the observers and
//! the state entry hooks, loads the rocket and the background and preloads
//! audio. After that the host only needs [`SceneHost::tick`] once per frame
//! and [`SceneHost::resize`] whenever the window changes.

use std::sync::Arc;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;

use crate::events::audio::AudioCmd;
use crate::events::gamestate::observe_gamestate_change_event;
use crate::resources::assets::{AssetBridge, AssetLoader, AssetManifest, SceneAssets};
use crate::resources::audio::{AudioBackend, AudioDirector};
use crate::resources::background::{BackgroundScroller, RecyclingBackdrop};
use crate::resources::characterregistry::CharacterRegistry;
use crate::resources::completion::CompletionBarrier;
use crate::resources::countdown::Countdown;
use crate::resources::effects::EffectRuntime;
use crate::resources::gameconfig::{BackgroundMode, GameConfig};
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::rendersurface::RenderSurface;
use crate::resources::rng::SceneRng;
use crate::resources::rocket::RocketController;
use crate::resources::round::{OnBoard, RoundOutcome, RoundPlan};
use crate::resources::scalecontext::{ScaleContext, fit_game_size};
use crate::resources::settings::SettingsStore;
use crate::resources::statehooks::StateHooks;
use crate::resources::worldtime::WorldTime;
use crate::scenelog::SceneLogger;
use crate::systems::assets::apply_loaded_assets;
use crate::systems::audio::{apply_audio_cmds, observe_state_audio, update_audio_cmds};
use crate::systems::background::{
    background_cadence_system, background_scroll_system, dispose_background,
    relayout_background, set_ground,
};
use crate::systems::bonetracker::{bone_probe_system, bone_tracking_system};
use crate::systems::characters::{
    barrier_system, boarding_move_system, destroy_all, disembark_system, label_reveal_system,
    relayout_characters,
};
use crate::systems::effects::{fade_slide_system, float_system, shake_system, stop_all_effects};
use crate::systems::gamestate::{
    begin_disembark, check_pending_state, countdown_system, current_state, register_state_hooks,
    reset_round, start_round,
};
use crate::systems::recycling::{
    dispose_recycling, observe_backdrop_transition, recycling_scroll_system, relayout_recycling,
    setup_recycling,
};
use crate::systems::rocket::{
    destroy_rocket, initialize_rocket, observe_rocket_restart, relayout_rocket,
};
use crate::systems::skeleton::advance_skeletons;
use crate::systems::time::{update_delays, update_world_time};

/// External collaborators handed to the host.
pub struct SceneAdapters {
    pub loader: Arc<dyn AssetLoader>,
    pub audio: Box<dyn AudioBackend>,
    pub settings: Box<dyn SettingsStore>,
    pub manifest: AssetManifest,
    /// Run boarding skeleton loads on a worker thread. When `false` loads
    /// still go through the bridge but complete on the calling thread.
    pub threaded_loads: bool,
}

/// Owns the world and the per-frame schedule of one scene.
pub struct SceneHost {
    world: World,
    update: Schedule,
    logger: SceneLogger,
}

impl SceneHost {
    /// Build the scene for `config`.
    ///
    /// A missing rocket or background image is logged; the scene still comes
    /// up without it.
    pub fn new(config: GameConfig, adapters: SceneAdapters) -> Self {
        let logger = SceneLogger::new("scene");
        let SceneAdapters {
            loader,
            audio,
            settings,
            manifest,
            threaded_loads,
        } = adapters;

        // --------------- ECS world + resources ---------------
        let mut world = World::new();
        let ctx = ScaleContext::from_viewport(config.viewport_width, config.viewport_height);
        world.insert_resource(WorldTime::default().with_time_scale(1.0));
        world.insert_resource(GameState::new());
        world.insert_resource(NextGameState::new());
        world.insert_resource(ctx);
        world.insert_resource(RenderSurface::new());
        world.insert_resource(CharacterRegistry::new());
        world.insert_resource(CompletionBarrier::new(config.barrier_poll_interval));
        world.insert_resource(Countdown::default());
        world.insert_resource(BackgroundScroller::new(config.flying_speed, config.frame_ms));
        world.insert_resource(RecyclingBackdrop::new(&ctx));
        world.insert_resource(RocketController::default());
        world.insert_resource(EffectRuntime::default());
        world.insert_resource(match config.seed {
            Some(seed) => SceneRng::seeded(seed),
            None => SceneRng::from_entropy(),
        });
        world.insert_resource(RoundPlan::default());
        world.insert_resource(OnBoard::default());
        world.init_resource::<Messages<AudioCmd>>();

        let bridge = if threaded_loads {
            AssetBridge::threaded(loader.clone())
        } else {
            AssetBridge::inline(loader.clone())
        };
        world.insert_resource(bridge);

        let mut director = AudioDirector::new(audio, settings);
        let preloaded =
            director.preload(manifest.audio.iter().map(|(k, p)| (k.as_str(), p.as_str())));
        logger.debug(format!("{} audio clips preloaded", preloaded));
        world.insert_resource(director);
        world.insert_resource(SceneAssets::new(loader, manifest));

        let mode = config.background_mode;
        world.insert_resource(config);

        // --------------- Observers and state hooks ---------------
        world.spawn(Observer::new(observe_gamestate_change_event));
        world.spawn(Observer::new(observe_state_audio));
        world.spawn(Observer::new(observe_rocket_restart));
        world.spawn(Observer::new(observe_backdrop_transition));
        world.insert_resource(StateHooks::new());
        register_state_hooks(&mut world);
        // Ensure the observers are registered before anything triggers.
        world.flush();

        // --------------- Stage ---------------
        if let Err(e) = initialize_rocket(&mut world) {
            logger.error(format!("scene starts without a rocket: {}", e));
        }
        match mode {
            BackgroundMode::Classic => {
                if set_ground(&mut world).is_none() {
                    logger.warn("scene starts without a ground layer");
                }
            }
            BackgroundMode::Funky => setup_recycling(&mut world),
        }

        let mut update = Schedule::default();
        update.add_systems(
            (
                apply_loaded_assets,
                check_pending_state,
                update_delays,
                advance_skeletons,
                countdown_system,
            )
                .chain(),
        );
        update.add_systems(
            (float_system, shake_system, fade_slide_system)
                .chain()
                .after(countdown_system),
        );
        update.add_systems(
            (
                boarding_move_system,
                disembark_system,
                label_reveal_system,
                bone_tracking_system,
                bone_probe_system,
            )
                .chain()
                .after(fade_slide_system),
        );
        update.add_systems(
            (
                background_cadence_system,
                background_scroll_system,
                recycling_scroll_system,
            )
                .chain()
                .after(bone_probe_system),
        );
        update.add_systems(
            (barrier_system, apply_audio_cmds, update_audio_cmds)
                .chain()
                .after(recycling_scroll_system),
        );

        logger.info(format!("scene ready ({} background)", mode));
        SceneHost {
            world,
            update,
            logger,
        }
    }

    /// Advance the scene by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.update.run(&mut self.world);
        self.world.clear_trackers();
    }

    /// Fit the game into a `window_w` x `window_h` window and lay everything
    /// out again. Returns the new game size.
    pub fn resize(&mut self, window_w: f32, window_h: f32) -> (f32, f32) {
        let (w, h) = fit_game_size(window_w, window_h);
        let old = self
            .world
            .get_resource::<ScaleContext>()
            .copied()
            .unwrap_or_default();
        let new = ScaleContext::from_viewport(w, h);
        if old == new {
            return (w, h);
        }
        self.world.insert_resource(new);
        let mode = {
            let mut cfg = self.world.resource_mut::<GameConfig>();
            cfg.set_viewport_size(w, h);
            cfg.background_mode
        };
        relayout_rocket(&mut self.world);
        match mode {
            BackgroundMode::Classic => relayout_background(&mut self.world, &old, &new),
            BackgroundMode::Funky => relayout_recycling(&mut self.world),
        }
        relayout_characters(&mut self.world, &old, &new);
        self.logger.info(format!(
            "resized to {:.0}x{:.0} (window {:.0}x{:.0})",
            w, h, window_w, window_h
        ));
        (w, h)
    }

    /// Tear the stage down and mark the render surface unavailable.
    ///
    /// Anything still scheduled finds the surface gone and does nothing.
    pub fn destroy(&mut self) {
        let removed = destroy_all(&mut self.world);
        stop_all_effects(&mut self.world);
        dispose_background(&mut self.world);
        dispose_recycling(&mut self.world);
        destroy_rocket(&mut self.world);
        if let Some(mut barrier) = self.world.get_resource_mut::<CompletionBarrier>() {
            barrier.disarm();
        }
        if let Some(mut countdown) = self.world.get_resource_mut::<Countdown>() {
            countdown.stop();
        }
        if let Some(mut director) = self.world.get_resource_mut::<AudioDirector>() {
            director.dispose();
        }
        if let Some(mut bridge) = self.world.get_resource_mut::<AssetBridge>() {
            bridge.shutdown();
        }
        if let Some(mut surface) = self.world.get_resource_mut::<RenderSurface>() {
            surface.ready = false;
            surface.bump();
        }
        self.logger
            .info(format!("scene destroyed ({} characters removed)", removed));
    }

    /// Start a round from IDLE.
    pub fn start_round(&mut self, plan: RoundPlan) -> bool {
        start_round(&mut self.world, plan)
    }

    /// Let the passengers jump out; the round then ends with `outcome`.
    pub fn begin_disembark(&mut self, outcome: RoundOutcome) -> bool {
        begin_disembark(&mut self.world, outcome)
    }

    pub fn reset_round(&mut self) {
        reset_round(&mut self.world);
    }

    pub fn state(&self) -> GameStates {
        current_state(&self.world)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
