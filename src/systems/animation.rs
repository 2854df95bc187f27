//! Sprite animation.
//!
//! [`sprite_animation`] advances the playback cursor of every animated
//! sprite from the stage clock.
//!
//! - Cycles loop over frames `0..length` forever.
//! - Instances play frames `0..length` once. After the last frame has been
//!   shown for one step the sprite switches to the state's `transition_to`
//!   and a [`SpriteStateEndedEvent`] is triggered.
//! - The step is `frame_time / (sprite.rate * state.rate)`. A non-positive
//!   combined rate halts playback, as does `paused`.
use bevy_ecs::prelude::*;

use crate::components::playback::SpritePlayback;
use crate::components::sprite::Sprite;
use crate::events::animation::SpriteStateEndedEvent;
use crate::resources::spritesheet::StateConfig;
use crate::resources::spritesheetstore::SpriteSheetStore;
use crate::resources::worldtime::WorldTime;

/// Seconds a frame stays on screen, or `None` when playback is halted.
pub fn frame_step(frame_time: f32, rate: f32) -> Option<f32> {
    if !(rate.is_finite() && rate > 0.0) {
        return None;
    }
    let step = frame_time / rate;
    (step.is_finite() && step > 0.0).then_some(step)
}

/// Seconds per full cycle: `frame_time * length / rate`.
pub fn cycle_duration(frame_time: f32, length: u32, rate: f32) -> Option<f32> {
    frame_step(frame_time, rate).map(|step| step * length as f32)
}

/// Advance playback of all sprites.
pub fn sprite_animation(
    mut query: Query<(Entity, &mut Sprite, &mut SpritePlayback)>,
    store: Res<SpriteSheetStore>,
    time: Res<WorldTime>,
    mut commands: Commands,
) {
    for (entity, mut sprite, mut playback) in query.iter_mut() {
        if playback.state != sprite.state {
            playback.restart(&sprite.state);
        }
        if sprite.paused {
            continue;
        }
        let Some(sheet) = store.get(sprite.sheet) else {
            continue;
        };
        let options = sheet.options();
        let Some(config) = options.state(&sprite.state) else {
            continue;
        };
        let Some(step) = frame_step(options.frame_time, sprite.rate * config.rate()) else {
            continue;
        };

        match config {
            StateConfig::Tile { .. } => {}
            StateConfig::AnimatedCycle { length, .. } => {
                playback.elapsed_time += time.delta;
                while playback.elapsed_time >= step {
                    playback.elapsed_time -= step;
                    playback.frame_index = (playback.frame_index + 1) % (*length).max(1);
                }
            }
            StateConfig::AnimatedInstance {
                length,
                transition_to,
                ..
            } => {
                playback.elapsed_time += time.delta;
                let mut ended = false;
                while playback.elapsed_time >= step {
                    playback.elapsed_time -= step;
                    if playback.frame_index + 1 < *length {
                        playback.frame_index += 1;
                    } else {
                        ended = true;
                        break;
                    }
                }
                if ended {
                    let from = std::mem::replace(&mut sprite.state, transition_to.clone());
                    playback.restart(&sprite.state);
                    commands.trigger(SpriteStateEndedEvent {
                        entity,
                        from,
                        to: transition_to.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_halts_on_non_positive_rate() {
        assert_eq!(frame_step(0.25, 0.0), None);
        assert_eq!(frame_step(0.25, -1.0), None);
        assert_eq!(frame_step(0.25, f32::NAN), None);
        assert_eq!(frame_step(0.25, 2.0), Some(0.125));
    }

    #[test]
    fn cycle_duration_scales_with_length() {
        assert_eq!(cycle_duration(0.25, 4, 1.0), Some(1.0));
        assert_eq!(cycle_duration(0.25, 4, 2.0), Some(0.5));
        assert_eq!(cycle_duration(0.25, 4, 0.0), None);
    }
}
