//! Viewport entry handling.
//!
//! Lazy sheets start fetching the first time any of their sprites is
//! reported visible. The lifecycle guard makes sure that happens once per
//! sheet no matter how many sprites become visible.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::sprite::Sprite;
use crate::components::visibility::ViewportVisibility;
use crate::events::layout::BecameVisibleEvent;
use crate::resources::spritesheet::LoadingStrategy;
use crate::resources::spritesheetstore::SpriteSheetStore;

/// Observer marking a sprite as seen and starting its lazy sheet.
pub fn on_became_visible(
    trigger: On<BecameVisibleEvent>,
    mut query: Query<(&Sprite, &mut ViewportVisibility)>,
    store: Res<SpriteSheetStore>,
) {
    let entity = trigger.event().entity;
    let Ok((sprite, mut visibility)) = query.get_mut(entity) else {
        return;
    };
    if visibility.seen {
        return;
    }
    visibility.seen = true;

    let Some(sheet) = store.get(sprite.sheet) else {
        return;
    };
    if sheet.options().loading_strategy == LoadingStrategy::Lazy
        && sheet.controls().start_fetch(false)
    {
        debug!("{:?} revealed lazy {}", entity, sheet.id());
    }
}
