//! Sprite sheet load notifications.
//!
//! Triggered on the main thread by
//! [`dispatch_loader_events`](crate::systems::loader::dispatch_loader_events)
//! once the loader thread settles a sheet. Observers can use them to kick off
//! follow-up work such as registering modifiers or revealing a scene.
use bevy_ecs::prelude::*;

use crate::error::ResourceLoadError;
use crate::resources::spritesheet::SheetId;

/// The sheet image was fetched and decoded.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheetLoadedEvent {
    pub sheet: SheetId,
}

/// The sheet image could not be fetched or decoded. Terminal for that sheet.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SpriteSheetLoadFailedEvent {
    pub sheet: SheetId,
    pub error: ResourceLoadError,
}
