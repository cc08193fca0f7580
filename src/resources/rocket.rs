use crate::components::effects::EffectHandle;
use crate::scenelog::SceneLogger;
use bevy_ecs::prelude::{Entity, Resource};

/// Delay signal that finishes the rocket restart choreography.
pub const RESTART_SIGNAL: &str = "rocket_restart";

/// Rocket state. Exists once the scene is initialized.
#[derive(Resource, Debug)]
pub struct RocketController {
    pub entity: Option<Entity>,
    pub float: Option<EffectHandle>,
    pub current_animation: String,
    pub logger: SceneLogger,
}

impl Default for RocketController {
    fn default() -> Self {
        RocketController {
            entity: None,
            float: None,
            current_animation: String::new(),
            logger: SceneLogger::new("rocket"),
        }
    }
}

impl RocketController {
    pub fn is_floating(&self) -> bool {
        self.float.is_some()
    }
}
