//! Frame clock and delayed signals.
//!
//! [`update_world_time`] runs before the schedule each frame; every other
//! time-driven system reads the scaled delta it leaves in [`WorldTime`].
use bevy_ecs::prelude::*;

use crate::components::delay::Delay;
use crate::events::delay::DelayElapsed;
use crate::resources::worldtime::WorldTime;

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is expected to be the unscaled frame delta in seconds. The function
/// applies the current `time_scale`, writes both `elapsed` and `delta` and
/// counts the frame.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt.max(0.0) * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

/// Deliver every [`Delay`] that is due at the current world time.
pub fn update_delays(
    world_time: Res<WorldTime>,
    delays: Query<(Entity, &Delay)>,
    mut commands: Commands,
) {
    for (entity, delay) in delays.iter() {
        if !delay.is_due(world_time.elapsed) {
            continue;
        }
        let signal = delay.signal;
        commands.entity(entity).remove::<Delay>();
        commands.trigger(DelayElapsed { entity, signal });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::observer::{Observer, On};

    const DT: f32 = 0.125;

    #[derive(Resource, Default)]
    struct Fired(Vec<(u64, &'static str)>);

    #[derive(Resource)]
    struct Target(Entity);

    fn arm_once(
        world_time: Res<WorldTime>,
        target: Res<Target>,
        mut done: Local<bool>,
        mut commands: Commands,
    ) {
        if *done {
            return;
        }
        *done = true;
        commands
            .entity(target.0)
            .insert(Delay::new(0.25, world_time.elapsed, "go"));
    }

    fn world_with_recorder() -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.init_resource::<Fired>();
        world.spawn(Observer::new(
            |trigger: On<DelayElapsed>, wt: Res<WorldTime>, mut fired: ResMut<Fired>| {
                fired.0.push((wt.frame_count, trigger.event().signal));
            },
        ));
        world.flush();
        world
    }

    #[test]
    fn delay_armed_mid_frame_waits_its_full_duration() {
        let mut world = world_with_recorder();
        let e = world.spawn_empty().id();
        world.insert_resource(Target(e));
        let mut schedule = Schedule::default();
        schedule.add_systems((arm_once, update_delays).chain());

        // Frame 1 arms the delay before delays are checked.
        for _ in 0..2 {
            update_world_time(&mut world, DT);
            schedule.run(&mut world);
        }
        assert!(world.resource::<Fired>().0.is_empty());
        assert!(world.get::<Delay>(e).is_some());

        update_world_time(&mut world, DT);
        schedule.run(&mut world);
        assert_eq!(world.resource::<Fired>().0, vec![(3, "go")]);
        assert!(world.get::<Delay>(e).is_none());
    }

    #[test]
    fn world_time_applies_time_scale() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default().with_time_scale(0.5));
        update_world_time(&mut world, 0.5);
        update_world_time(&mut world, -1.0);
        let wt = world.resource::<WorldTime>();
        assert_eq!(wt.elapsed, 0.25);
        assert_eq!(wt.delta, 0.0);
        assert_eq!(wt.frame_count, 2);
    }
}
