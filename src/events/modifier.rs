use bevy_ecs::prelude::*;

use crate::resources::spritesheet::SheetId;

/// A modifier result was published (or replaced) for `sheet`.
///
/// Every sprite of the sheet using modifier `id` switches to `version` on
/// the next view pass.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ModifierPublishedEvent {
    pub sheet: SheetId,
    pub id: String,
    pub version: u64,
}
