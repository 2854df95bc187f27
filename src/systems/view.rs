//! Sprite view resolution.
//!
//! Turns sprite settings, playback and sheet state into a [`SpriteFrame`].
//! The frame geometry follows the sheet layout: one row per layer, one
//! column per frame, every cell `tile_size` pixels.
//!
//! ```text
//! width    = tile_width  * scale
//! height   = tile_height * scale
//! offset_x = -(tile_width  * scale * frame)
//! offset_y =  (tile_height * scale * layer)
//! ```
//!
//! The vertical offset is positive on purpose: hosts address the layer row
//! with it as is.
use bevy_ecs::prelude::*;
use log::error;

use crate::components::playback::SpritePlayback;
use crate::components::resizeto::ResizeTo;
use crate::components::scalable::Scalable;
use crate::components::sprite::Sprite;
use crate::components::view::{CycleTiming, ImageRef, SpriteContent, SpriteFrame, SpriteView};
use crate::components::visibility::ViewportVisibility;
use crate::error::SpriteError;
use crate::resources::spritesheet::{LoadState, LoadingStrategy, StateConfig, TileSize};
use crate::resources::spritesheetstore::SpriteSheetStore;
use crate::systems::animation::cycle_duration;
use crate::systems::report::ReportedEntities;

/// Clip box and background offset of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Geometry of the zero-based `frame` on row `layer`.
pub fn frame_geometry(tile: TileSize, layer: u32, frame: u32, scale: f32) -> FrameGeometry {
    let width = tile.width as f32 * scale;
    let height = tile.height as f32 * scale;
    FrameGeometry {
        width,
        height,
        offset_x: -(width * frame as f32),
        offset_y: height * layer as f32,
    }
}

/// Resolve the frame a sprite shows right now.
pub fn resolve_frame(
    store: &SpriteSheetStore,
    sprite: &Sprite,
    playback: &SpritePlayback,
    visibility: &ViewportVisibility,
    resize: Option<&ResizeTo>,
) -> Result<SpriteFrame, SpriteError> {
    let sheet = store.sheet(sprite.sheet)?;
    let options = sheet.options();
    let config = sheet.state(&sprite.state)?;

    let scale = sprite.effective_scale() * resize.map_or(1.0, |r| r.computed_scale);
    let frame = match config {
        StateConfig::Tile { .. } => sprite.tile.saturating_sub(1),
        _ if playback.state == sprite.state => playback.frame_index,
        _ => 0,
    };
    let geometry = frame_geometry(options.tile_size, config.layer(), frame, scale);

    let cycle = config.is_animated().then(|| {
        let frames = config.length();
        CycleTiming {
            frames,
            duration: cycle_duration(options.frame_time, frames, sprite.rate * config.rate())
                .filter(|_| !sprite.paused),
            looping: matches!(config, StateConfig::AnimatedCycle { .. }),
            end_offset_x: -(geometry.width * frames as f32),
        }
    });

    let eligible = options.loading_strategy != LoadingStrategy::Lazy || visibility.seen;
    let image = match sprite.use_modifier.as_deref() {
        Some(id) => sheet.pipeline().get(id).map(|derived| ImageRef::Derived {
            id: id.to_string(),
            version: derived.version,
            locator: derived.locator,
        }),
        None => (sheet.load_state() == LoadState::Loaded).then(|| ImageRef::Sheet {
            locator: sheet.source_arc(),
        }),
    };
    let content = match (eligible, image) {
        (false, _) => SpriteContent::Pending,
        (true, Some(image)) => SpriteContent::Image(image),
        (true, None) => sprite
            .fallback
            .clone()
            .map_or(SpriteContent::Empty, SpriteContent::Fallback),
    };

    Ok(SpriteFrame {
        content,
        width: geometry.width,
        height: geometry.height,
        offset_x: geometry.offset_x,
        offset_y: geometry.offset_y,
        effective_scale: scale,
        cycle,
        animation_overlay: sprite.animation_overlay.clone(),
    })
}

/// Refresh every [`SpriteView`]. Views only change (and bump their revision)
/// when the resolved frame differs.
///
/// Sprites pointing at unknown sheets or states render nothing; the error is
/// logged once per entity.
pub fn sprite_view_system(
    mut query: Query<(
        Entity,
        &Sprite,
        &SpritePlayback,
        &ViewportVisibility,
        Option<&ResizeTo>,
        &mut SpriteView,
    )>,
    store: Res<SpriteSheetStore>,
    mut reported: Local<ReportedEntities>,
) {
    for (entity, sprite, playback, visibility, resize, mut view) in query.iter_mut() {
        let frame = match resolve_frame(&store, sprite, playback, visibility, resize) {
            Ok(frame) => {
                reported.recover(entity);
                frame
            }
            Err(e) => {
                if reported.report(entity) {
                    error!("Sprite {:?} cannot render: {}", entity, e);
                }
                SpriteFrame::default()
            }
        };
        if view.frame != frame {
            view.update(frame);
        }
    }
    reported.retain(|entity| query.contains(entity));
}
