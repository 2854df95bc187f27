//! Stack layout for composed sprites.
//!
//! A container scales its whole composition from the base sprite's tile
//! size. When it follows a target box:
//!
//! ```text
//! dynamic = min(box.width, box.height) / (tile_width * base.scale) * container.scale
//! ```
//!
//! otherwise `dynamic = container.scale`. Then:
//!
//! - the base sprite gets `frame_scale = dynamic`;
//! - every [`StackEntity`] is offset by `(x * dynamic, y * dynamic)`;
//! - sprites inside an entity get `frame_scale = dynamic` while the
//!   container has a resize target, and `1.0` otherwise;
//! - nested containers inherit that same factor and are laid out recursively.
//!
//! # Schedule position
//!
//! Runs after [`resize_scale_system`](crate::systems::resize::resize_scale_system)
//! and before [`sprite_view_system`](crate::systems::view::sprite_view_system).
use bevy_ecs::hierarchy::{ChildOf, Children};
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use log::error;

use crate::components::resizeto::{LayoutBox, ResizeTo};
use crate::components::scalable::Scalable;
use crate::components::sprite::Sprite;
use crate::components::stack::{StackBase, StackContainer, StackEntity};
use crate::resources::spritesheetstore::SpriteSheetStore;
use crate::systems::report::ReportedEntities;

/// Compute the container's dynamic scale.
///
/// `scale` is the container's effective scale. Without a measured target,
/// or with a degenerate base tile, the container keeps `scale`.
pub fn container_dynamic_scale(
    scale: f32,
    target: Option<&LayoutBox>,
    tile_width: u32,
    base_scale: f32,
) -> f32 {
    let base_width = tile_width as f32 * base_scale;
    match target {
        Some(layout) if base_width > 0.0 => layout.min_side() / base_width * scale,
        _ => scale,
    }
}

/// Queries touched while walking a stack.
#[derive(SystemParam)]
pub struct StackLayoutParams<'w, 's> {
    pub containers: Query<
        'w,
        's,
        (
            &'static mut StackContainer,
            Option<&'static ResizeTo>,
            Option<&'static Children>,
        ),
    >,
    pub bases: Query<'w, 's, &'static mut Sprite, With<StackBase>>,
    pub sprites: Query<'w, 's, &'static mut Sprite, Without<StackBase>>,
    pub entities: Query<'w, 's, (&'static mut StackEntity, Option<&'static Children>)>,
    pub boxes: Query<'w, 's, &'static LayoutBox>,
    pub store: Res<'w, SpriteSheetStore>,
}

fn apply_frame_scale<S: Scalable>(mut node: Mut<S>, factor: f32) {
    if node.frame_scale() != factor {
        node.set_frame_scale(factor);
    }
}

/// Lay out every stack from its root containers down.
pub fn stack_layout(
    roots: Query<(Entity, Option<&ChildOf>), With<StackContainer>>,
    orphans: Query<(Entity, Option<&ChildOf>), With<StackEntity>>,
    mut params: StackLayoutParams,
    mut reported: Local<ReportedEntities>,
) {
    let nested = |child_of: Option<&ChildOf>| {
        child_of.is_some_and(|c| params.entities.contains(c.parent()))
    };
    let root_entities: Vec<Entity> = roots
        .iter()
        .filter(|(_, child_of)| !nested(*child_of))
        .map(|(entity, _)| entity)
        .collect();
    let stray: Vec<Entity> = orphans
        .iter()
        .filter(|(_, child_of)| {
            !child_of.is_some_and(|c| params.containers.contains(c.parent()))
        })
        .map(|(entity, _)| entity)
        .collect();

    for &entity in &stray {
        if reported.report(entity) {
            error!("Stack entity {:?} has no enclosing container", entity);
        }
    }
    reported.retain(|entity| stray.contains(&entity));

    for root in root_entities {
        layout_container(root, 1.0, &mut params);
    }
}

fn layout_container(container: Entity, inherited: f32, params: &mut StackLayoutParams) {
    let Ok((mut frame, resize, children)) = params.containers.get_mut(container) else {
        return;
    };
    let children: Vec<Entity> = children.map(|c| c.iter().collect()).unwrap_or_default();
    let target = resize.map(|r| r.target);
    if frame.frame_scale != inherited {
        frame.set_frame_scale(inherited);
    }
    let scale = frame.effective_scale();

    let base = children
        .iter()
        .copied()
        .find(|child| params.bases.contains(*child));
    let base_metrics = base
        .and_then(|b| params.bases.get(b).ok())
        .and_then(|sprite| {
            params
                .store
                .get(sprite.sheet)
                .map(|sheet| (sheet.options().tile_size.width, sprite.scale))
        });
    let target_box = target.and_then(|t| params.boxes.get(t).ok());
    let dynamic = match base_metrics {
        Some((tile_width, base_scale)) => {
            container_dynamic_scale(scale, target_box, tile_width, base_scale)
        }
        None => scale,
    };
    let resizing = target.is_some();

    if frame.dynamic_scale != dynamic || frame.resizing != resizing {
        frame.dynamic_scale = dynamic;
        frame.resizing = resizing;
    }

    if let Some(base) = base
        && let Ok(sprite) = params.bases.get_mut(base)
    {
        apply_frame_scale(sprite, dynamic);
    }

    let inner = if resizing { dynamic } else { 1.0 };
    for child in children {
        let grandchildren: Vec<Entity> = match params.entities.get_mut(child) {
            Ok((mut entity, grandchildren)) => {
                let (left, top) = (entity.x * dynamic, entity.y * dynamic);
                if entity.left != left || entity.top != top {
                    entity.left = left;
                    entity.top = top;
                }
                grandchildren
                    .map(|c| c.iter().collect())
                    .unwrap_or_default()
            }
            Err(_) => continue,
        };
        for grandchild in grandchildren {
            if let Ok(sprite) = params.sprites.get_mut(grandchild) {
                apply_frame_scale(sprite, inner);
            } else if params.containers.contains(grandchild) {
                layout_container(grandchild, inner, params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_scale_without_target_is_declared_scale() {
        assert_eq!(container_dynamic_scale(1.5, None, 100, 1.0), 1.5);
    }

    #[test]
    fn dynamic_scale_fits_base_tile_into_box() {
        let layout = LayoutBox::new(400.0, 200.0);
        assert_eq!(container_dynamic_scale(1.0, Some(&layout), 100, 1.0), 2.0);
        assert_eq!(container_dynamic_scale(1.0, Some(&layout), 100, 2.0), 1.0);
        assert_eq!(container_dynamic_scale(0.5, Some(&layout), 100, 1.0), 1.0);
        assert_eq!(container_dynamic_scale(0.5, Some(&layout), 0, 1.0), 0.5);
    }
}
