//! Notifications coming from the host surface.
//!
//! The engine does not measure boxes or track scrolling itself. Whatever
//! hosts it reports layout changes with [`BoxResizedEvent`] and viewport
//! entry with [`BecameVisibleEvent`]; the observers live in
//! [`crate::systems::resize`] and [`crate::systems::visibility`].
use bevy_ecs::prelude::*;

/// The measured box of `entity` changed size.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BoxResizedEvent {
    pub entity: Entity,
    pub width: f32,
    pub height: f32,
}

/// `entity` entered the viewport. Repeated notifications are harmless.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BecameVisibleEvent {
    pub entity: Entity,
}
