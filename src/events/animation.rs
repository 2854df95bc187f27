use bevy_ecs::prelude::*;

/// A one-shot animation on `entity` played its last frame and the sprite
/// switched from state `from` to state `to`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SpriteStateEndedEvent {
    pub entity: Entity,
    pub from: String,
    pub to: String,
}
