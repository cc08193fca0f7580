use crate::scenelog::SceneLogger;
use bevy_ecs::prelude::Resource;

/// Issues effect tokens.
#[derive(Resource, Debug)]
pub struct EffectRuntime {
    next_token: u64,
    pub logger: SceneLogger,
}

impl Default for EffectRuntime {
    fn default() -> Self {
        EffectRuntime {
            next_token: 1,
            logger: SceneLogger::new("effects"),
        }
    }
}

impl EffectRuntime {
    pub fn issue(&mut self) -> u64 {
        let t = self.next_token;
        self.next_token += 1;
        t
    }
}
