//! Stack composition components.
//!
//! A [`StackContainer`] groups one base sprite (tagged [`StackBase`]) and any
//! number of [`StackEntity`] children, all positioned in the base sprite's
//! unscaled pixel space. Sprites attached to an entity are its children in
//! the ECS hierarchy.
use bevy_ecs::prelude::Component;

use crate::components::scalable::Scalable;

/// Root of a stacked composition.
///
/// `dynamic_scale` and `resizing` are written by
/// [`stack_layout`](crate::systems::stack::stack_layout).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct StackContainer {
    pub scale: f32,
    pub dynamic_scale: f32,
    pub resizing: bool,
    pub frame_scale: f32,
}

impl StackContainer {
    pub fn new(scale: f32) -> Self {
        Self {
            scale,
            dynamic_scale: scale,
            resizing: false,
            frame_scale: 1.0,
        }
    }
}

impl Default for StackContainer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Scalable for StackContainer {
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

/// Marks the sprite that defines a container's coordinate space.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackBase;

/// A positioned layer inside a container.
///
/// `x` and `y` are in base-sprite pixels; `left` and `top` are the resolved
/// offsets after scaling.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct StackEntity {
    pub x: f32,
    pub y: f32,
    pub left: f32,
    pub top: f32,
}

impl StackEntity {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            left: x,
            top: y,
        }
    }
}
