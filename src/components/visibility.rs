use bevy_ecs::prelude::Component;

/// Whether the sprite was ever reported inside the viewport.
///
/// Flipped by [`on_became_visible`](crate::systems::visibility::on_became_visible).
/// Lazy sheets keep sprites pending until this is set.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportVisibility {
    pub seen: bool,
}
