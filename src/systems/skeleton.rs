use bevy_ecs::prelude::*;

use crate::components::skeleton::Skeleton;
use crate::resources::worldtime::WorldTime;

/// Advance every skeletal instance by the frame delta.
pub fn advance_skeletons(world_time: Res<WorldTime>, mut query: Query<&mut Skeleton>) {
    for mut skeleton in query.iter_mut() {
        skeleton.instance.update(world_time.delta);
    }
}
