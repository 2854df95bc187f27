//! Draw list extraction.
//!
//! The engine is headless: [`collect_draw_list`] flattens the resolved
//! views into a list a host surface can paint in order. Stack children are
//! positioned relative to their outermost container's origin and never
//! receive pointer events.
use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;

use crate::components::stack::{StackBase, StackContainer, StackEntity};
use crate::components::view::{SpriteContent, SpriteFrame, SpriteView};

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub entity: Entity,
    /// Outermost container the position is relative to. `None` for free sprites.
    pub origin: Option<Entity>,
    pub left: f32,
    pub top: f32,
    /// Stack nesting level. Items paint in ascending depth.
    pub depth: u32,
    pub pointer_events: bool,
    pub frame: SpriteFrame,
}

fn stack_depth(world: &World, mut container: Entity) -> u32 {
    let mut depth = 0;
    while let Some(parent) = world.get::<ChildOf>(container).map(|c| c.parent()) {
        if world.get::<StackEntity>(parent).is_none() {
            break;
        }
        depth += 1;
        match world.get::<ChildOf>(parent).map(|c| c.parent()) {
            Some(next) if world.get::<StackContainer>(next).is_some() => container = next,
            _ => break,
        }
    }
    depth
}

/// Walk from `container` up to its outermost container, summing the slot
/// offsets of every nested container on the way.
fn root_placement(world: &World, mut container: Entity) -> (Entity, f32, f32) {
    let (mut dx, mut dy) = (0.0, 0.0);
    while let Some(slot) = world.get::<ChildOf>(container).map(|c| c.parent())
        && let Some(placed) = world.get::<StackEntity>(slot)
        && let Some(outer) = world.get::<ChildOf>(slot).map(|c| c.parent())
        && world.get::<StackContainer>(outer).is_some()
    {
        dx += placed.left;
        dy += placed.top;
        container = outer;
    }
    (container, dx, dy)
}

/// Collect everything that currently has something to show.
pub fn collect_draw_list(world: &mut World) -> Vec<DrawItem> {
    let mut views = world.query::<(Entity, &SpriteView, Option<&ChildOf>, Has<StackBase>)>();
    let world = &*world;

    let mut items: Vec<DrawItem> = Vec::new();
    for (entity, view, child_of, is_base) in views.iter(world) {
        if view.frame.content == SpriteContent::Empty {
            continue;
        }
        let parent = child_of.map(|c| c.parent());
        let (origin, left, top, pointer_events) = match parent {
            Some(container) if is_base => (Some(container), 0.0, 0.0, true),
            Some(layer) => match world.get::<StackEntity>(layer) {
                Some(placed) => {
                    let container = world.get::<ChildOf>(layer).map(|c| c.parent());
                    (container, placed.left, placed.top, false)
                }
                None => (None, 0.0, 0.0, true),
            },
            None => (None, 0.0, 0.0, true),
        };
        let depth = origin.map_or(0, |c| stack_depth(world, c) + u32::from(!is_base));
        // A nested base sits inside the outer composition like any layer.
        let (origin, left, top, pointer_events) = match origin {
            Some(container) => {
                let (root, dx, dy) = root_placement(world, container);
                let nested = root != container;
                (Some(root), left + dx, top + dy, pointer_events && !nested)
            }
            None => (None, left, top, pointer_events),
        };
        items.push(DrawItem {
            entity,
            origin,
            left,
            top,
            depth,
            pointer_events,
            frame: view.frame.clone(),
        });
    }
    items.sort_by_key(|item| (item.depth, item.entity));
    items
}
