use bevy_ecs::prelude::Component;

use crate::components::playback::SpritePlayback;
use crate::components::scalable::Scalable;
use crate::components::view::SpriteView;
use crate::components::visibility::ViewportVisibility;
use crate::resources::spritesheet::{DEFAULT_STATE, SheetId};

/// Content shown while the sheet image (or the requested modifier) is not ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub content: String,
}

impl Fallback {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// A sprite instance bound to a declared sheet.
///
/// `state` names an entry of the sheet structure. `tile` is the 1-based
/// frame of a static tile state. `rate` multiplies the playback speed of
/// animated states; zero or negative halts playback. `frame_scale` is owned
/// by stack layout and should not be set by hand.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(SpritePlayback, ViewportVisibility, SpriteView)]
pub struct Sprite {
    pub sheet: SheetId,
    pub state: String,
    pub tile: u32,
    pub rate: f32,
    pub scale: f32,
    pub paused: bool,
    pub use_modifier: Option<String>,
    pub fallback: Option<Fallback>,
    pub animation_overlay: Option<String>,
    pub frame_scale: f32,
}

impl Sprite {
    pub fn new(sheet: SheetId, state: impl Into<String>) -> Self {
        Self {
            sheet,
            state: state.into(),
            tile: 1,
            rate: 1.0,
            scale: 1.0,
            paused: false,
            use_modifier: None,
            fallback: None,
            animation_overlay: None,
            frame_scale: 1.0,
        }
    }

    /// Sprite showing the sheet's default state.
    pub fn main(sheet: SheetId) -> Self {
        Self::new(sheet, DEFAULT_STATE)
    }

    pub fn with_tile(mut self, tile: u32) -> Self {
        self.tile = tile;
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Display the result of modifier `id` instead of the base image.
    /// An empty id keeps the base image.
    pub fn with_modifier(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.use_modifier = (!id.is_empty()).then_some(id);
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Extra animation name the host surface layers over the frame cycle.
    pub fn with_animation_overlay(mut self, overlay: impl Into<String>) -> Self {
        self.animation_overlay = Some(overlay.into());
        self
    }
}

impl Scalable for Sprite {
    fn declared_scale(&self) -> f32 {
        self.scale
    }

    fn frame_scale(&self) -> f32 {
        self.frame_scale
    }

    fn set_frame_scale(&mut self, factor: f32) {
        self.frame_scale = factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let sprite = Sprite::main(SheetId(1));
        assert_eq!(sprite.state, "main");
        assert_eq!(sprite.tile, 1);
        assert_eq!(sprite.rate, 1.0);
        assert_eq!(sprite.effective_scale(), 1.0);
        assert!(sprite.use_modifier.is_none());
    }

    #[test]
    fn empty_modifier_means_base_image() {
        let sprite = Sprite::main(SheetId(1)).with_modifier("");
        assert!(sprite.use_modifier.is_none());
        let sprite = sprite.with_modifier("green");
        assert_eq!(sprite.use_modifier.as_deref(), Some("green"));
    }

    #[test]
    fn effective_scale_composes_frame_scale() {
        let mut sprite = Sprite::main(SheetId(1)).with_scale(2.0);
        sprite.set_frame_scale(1.5);
        assert_eq!(sprite.effective_scale(), 3.0);
    }
}
