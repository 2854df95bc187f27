use bevy_ecs::prelude::Component;

/// Playback cursor of a sprite.
///
/// Tracks which state it belongs to so a state switch restarts playback
/// from the first frame.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct SpritePlayback {
    pub state: String,
    pub frame_index: u32,
    pub elapsed_time: f32,
}

impl SpritePlayback {
    pub fn restart(&mut self, state: &str) {
        self.state.clear();
        self.state.push_str(state);
        self.frame_index = 0;
        self.elapsed_time = 0.0;
    }
}
