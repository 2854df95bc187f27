//! Resolved presentation of a sprite.
//!
//! [`sprite_view_system`](crate::systems::view::sprite_view_system) writes a
//! [`SpriteView`] for every sprite each frame. The host surface only needs
//! the view to draw: which image to show, the clip box, the background
//! offset that selects the frame and, for cycles, the timing it needs to
//! run the animation on its own.
use std::sync::Arc;

use bevy_ecs::prelude::Component;

use crate::components::sprite::Fallback;

/// Image backing a sprite view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// The decoded sheet itself.
    Sheet { locator: Arc<str> },
    /// A published modifier result.
    Derived {
        id: String,
        version: u64,
        locator: Arc<str>,
    },
}

impl ImageRef {
    pub fn locator(&self) -> &str {
        match self {
            ImageRef::Sheet { locator } | ImageRef::Derived { locator, .. } => locator,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SpriteContent {
    /// Nothing to draw.
    #[default]
    Empty,
    /// Lazy sheet not yet seen. The host should render an empty placeholder box.
    Pending,
    Fallback(Fallback),
    Image(ImageRef),
}

/// Timing of an animated state, for hosts that animate the offset themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleTiming {
    pub frames: u32,
    /// Seconds per full cycle, `None` when playback is halted.
    pub duration: Option<f32>,
    pub looping: bool,
    /// Horizontal offset one past the last frame.
    pub end_offset_x: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteFrame {
    pub content: SpriteContent,
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub effective_scale: f32,
    pub cycle: Option<CycleTiming>,
    pub animation_overlay: Option<String>,
}

impl SpriteFrame {
    pub fn modifier_version(&self) -> Option<u64> {
        match &self.content {
            SpriteContent::Image(ImageRef::Derived { version, .. }) => Some(*version),
            _ => None,
        }
    }
}

/// Last resolved frame and a counter bumped every time it changes.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct SpriteView {
    pub frame: SpriteFrame,
    pub revision: u64,
}

impl SpriteView {
    /// Replace the frame when it differs. Returns `true` on change.
    pub fn update(&mut self, frame: SpriteFrame) -> bool {
        if self.frame == frame {
            return false;
        }
        self.frame = frame;
        self.revision += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_bumps_revision_only_on_change() {
        let mut view = SpriteView::default();
        let frame = SpriteFrame {
            content: SpriteContent::Pending,
            width: 10.0,
            height: 10.0,
            effective_scale: 1.0,
            ..Default::default()
        };
        assert!(view.update(frame.clone()));
        assert!(!view.update(frame));
        assert_eq!(view.revision, 1);
    }
}
