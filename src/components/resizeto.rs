//! Responsive sizing.
//!
//! [`LayoutBox`] holds the last measured size of an entity, reported by the
//! host through [`BoxResizedEvent`](crate::events::layout::BoxResizedEvent).
//! [`ResizeTo`] makes a sprite (or a stack container) follow the box of
//! another entity.
use bevy_ecs::prelude::{Component, Entity};

/// Measured size of an entity's box, in pixels.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutBox {
    pub width: f32,
    pub height: f32,
}

impl LayoutBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// Follow the box of `target`.
///
/// For sprites, `computed_scale` is `min(width, height) / tile_width` of the
/// target box and multiplies the sprite scale. It stays `1.0` until the
/// target has been measured.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ResizeTo {
    pub target: Entity,
    pub computed_scale: f32,
}

impl ResizeTo {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            computed_scale: 1.0,
        }
    }
}
