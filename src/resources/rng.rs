use bevy_ecs::prelude::Resource;

/// Randomness source for shake jitter and jump variants.
///
/// Seed it through [`GameConfig::seed`](crate::resources::gameconfig::GameConfig)
/// to make a run reproducible.
#[derive(Resource, Debug, Clone)]
pub struct SceneRng(pub fastrand::Rng);

impl SceneRng {
    pub fn seeded(seed: u64) -> Self {
        SceneRng(fastrand::Rng::with_seed(seed))
    }
    pub fn from_entropy() -> Self {
        SceneRng(fastrand::Rng::new())
    }
}

impl Default for SceneRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
