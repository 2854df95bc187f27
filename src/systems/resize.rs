//! Responsive sprite scaling.
//!
//! - [`on_box_resized`] records host measurements into [`LayoutBox`].
//! - [`resize_scale_system`] recomputes `min(width, height) / tile_width` for
//!   every sprite with a [`ResizeTo`] and writes it only when it changed.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::resizeto::{LayoutBox, ResizeTo};
use crate::components::sprite::Sprite;
use crate::events::layout::BoxResizedEvent;
use crate::resources::spritesheetstore::SpriteSheetStore;

/// Scale that fits one tile of `tile_width` into the smaller side of the box.
pub fn resize_scale(layout: &LayoutBox, tile_width: u32) -> Option<f32> {
    if tile_width == 0 {
        return None;
    }
    let side = layout.min_side();
    (side.is_finite() && side >= 0.0).then(|| side / tile_width as f32)
}

/// Observer storing the reported size on the entity.
pub fn on_box_resized(
    trigger: On<BoxResizedEvent>,
    mut boxes: Query<&mut LayoutBox>,
    mut commands: Commands,
) {
    let event = trigger.event();
    let measured = LayoutBox::new(event.width, event.height);
    match boxes.get_mut(event.entity) {
        Ok(mut layout) => {
            if *layout != measured {
                *layout = measured;
            }
        }
        Err(_) => {
            if let Ok(mut entity) = commands.get_entity(event.entity) {
                entity.insert(measured);
            }
        }
    }
    debug!(
        "Box of {:?} is {}x{}",
        event.entity, event.width, event.height
    );
}

/// Recompute resize scales from the current target boxes.
pub fn resize_scale_system(
    mut query: Query<(&Sprite, &mut ResizeTo)>,
    boxes: Query<&LayoutBox>,
    store: Res<SpriteSheetStore>,
) {
    for (sprite, mut resize) in query.iter_mut() {
        let Ok(layout) = boxes.get(resize.target) else {
            continue;
        };
        let Some(sheet) = store.get(sprite.sheet) else {
            continue;
        };
        if let Some(scale) = resize_scale(layout, sheet.options().tile_size.width)
            && resize.computed_scale != scale
        {
            resize.computed_scale = scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_smaller_side() {
        assert_eq!(resize_scale(&LayoutBox::new(400.0, 300.0), 100), Some(3.0));
        assert_eq!(resize_scale(&LayoutBox::new(50.0, 800.0), 100), Some(0.5));
        assert_eq!(resize_scale(&LayoutBox::new(50.0, 800.0), 0), None);
    }
}
