use bevy_ecs::prelude::Resource;

/// Stage clock, advanced by [`advance_world_time`](crate::systems::time::advance_world_time).
///
/// `delta` is already scaled by `time_scale`. Setting `time_scale` to zero
/// freezes every animation without touching sprite state.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame: 0,
        }
    }
}
