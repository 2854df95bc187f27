//! Integration tests for stacked compositions and the draw list.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test stack_integration
//! ```

use std::sync::Arc;

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;
use image::{Rgba, RgbaImage};

use spritestage::components::stack::{StackContainer, StackEntity};
use spritestage::prelude::*;
use spritestage::resources::modifier::encode_png;
use spritestage::stage::{attach_sprite, spawn_stack_entity};

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Stage with a loaded 100x100-tile "room" sheet and a 20x20-tile "prop" sheet.
fn setup() -> (Stage, SpriteSheetHandle, SpriteSheetHandle) {
    let room_png = encode_png(&RgbaImage::from_pixel(200, 100, Rgba([10, 20, 30, 255]))).unwrap();
    let prop_png = encode_png(&RgbaImage::from_pixel(40, 20, Rgba([200, 0, 0, 255]))).unwrap();
    let source = Arc::new(
        MemoryImageSource::new()
            .with_image("room.png", room_png)
            .with_image("prop.png", prop_png),
    );
    let mut stage = Stage::new(StageConfig::new(), Box::new(source));

    let (room, room_controls) = stage.declare("room.png", SheetOptions::new()).unwrap();
    let (prop, prop_controls) = stage
        .declare("prop.png", SheetOptions::new().with_tile_size(20, 20))
        .unwrap();
    room_controls.load().wait().unwrap();
    prop_controls.load().wait().unwrap();
    (stage, room, prop)
}

fn container(stage: &Stage, entity: Entity) -> StackContainer {
    *stage.world.get::<StackContainer>(entity).unwrap()
}

fn placed(stage: &Stage, entity: Entity) -> StackEntity {
    *stage.world.get::<StackEntity>(entity).unwrap()
}

fn frame_scale(stage: &Stage, entity: Entity) -> f32 {
    stage.world.get::<Sprite>(entity).unwrap().frame_scale
}

fn base_of(stage: &mut Stage, container: Entity) -> Entity {
    let mut bases = stage
        .world
        .query_filtered::<(Entity, &ChildOf), With<StackBase>>();
    bases
        .iter(&stage.world)
        .find(|(_, child_of)| child_of.parent() == container)
        .map(|(entity, _)| entity)
        .unwrap()
}

#[test]
fn entity_offsets_scale_with_container() {
    let (mut stage, room, _) = setup();
    let frame = stage
        .spawn_container(room.sprite("main").unwrap(), 2.0, None)
        .unwrap();
    let layer = stage.spawn_stack_entity(frame, 10.0, 20.0).unwrap();
    stage.tick(0.0);

    assert!(approx_eq(container(&stage, frame).dynamic_scale, 2.0));
    assert!(!container(&stage, frame).resizing);
    let placed = placed(&stage, layer);
    assert!(approx_eq(placed.left, 20.0));
    assert!(approx_eq(placed.top, 40.0));
}

#[test]
fn base_sprite_renders_at_dynamic_scale() {
    let (mut stage, room, _) = setup();
    let frame = stage
        .spawn_container(room.sprite("main").unwrap().with_scale(1.5), 2.0, None)
        .unwrap();
    stage.tick(0.0);

    let base = base_of(&mut stage, frame);
    assert!(approx_eq(frame_scale(&stage, base), 2.0));
    let view = stage.world.get::<SpriteView>(base).unwrap();
    assert!(approx_eq(view.frame.effective_scale, 3.0));
    assert!(approx_eq(view.frame.width, 300.0));
}

#[test]
fn resize_target_drives_dynamic_scale() {
    let (mut stage, room, _) = setup();
    let target = stage.spawn_box(400.0, 200.0);
    let frame = stage
        .spawn_container(room.sprite("main").unwrap(), 1.0, Some(target))
        .unwrap();
    let layer = stage.spawn_stack_entity(frame, 10.0, 20.0).unwrap();
    stage.tick(0.0);

    assert!(container(&stage, frame).resizing);
    assert!(approx_eq(container(&stage, frame).dynamic_scale, 2.0));
    assert!(approx_eq(placed(&stage, layer).left, 20.0));
    assert!(approx_eq(placed(&stage, layer).top, 40.0));

    stage.resize(target, 100.0, 300.0);
    stage.tick(0.0);
    assert!(approx_eq(container(&stage, frame).dynamic_scale, 1.0));
    assert!(approx_eq(placed(&stage, layer).left, 10.0));
    assert!(approx_eq(placed(&stage, layer).top, 20.0));
}

#[test]
fn resize_accounts_for_base_and_container_scale() {
    let (mut stage, room, _) = setup();
    let target = stage.spawn_box(400.0, 400.0);
    let frame = stage
        .spawn_container(room.sprite("main").unwrap().with_scale(2.0), 0.5, Some(target))
        .unwrap();
    stage.tick(0.0);

    // 400 / (100 * 2) * 0.5
    assert!(approx_eq(container(&stage, frame).dynamic_scale, 1.0));
}

#[test]
fn nested_sprites_scale_only_while_resizing() {
    let (mut stage, room, prop) = setup();

    let target = stage.spawn_box(300.0, 300.0);
    let resizing = stage
        .spawn_container(room.sprite("main").unwrap(), 1.0, Some(target))
        .unwrap();
    let resizing_layer = stage.spawn_stack_entity(resizing, 5.0, 5.0).unwrap();
    let resized_prop = stage
        .attach_sprite(resizing_layer, prop.sprite("main").unwrap())
        .unwrap();

    let fixed = stage
        .spawn_container(room.sprite("main").unwrap(), 3.0, None)
        .unwrap();
    let fixed_layer = stage.spawn_stack_entity(fixed, 5.0, 5.0).unwrap();
    let fixed_prop = stage
        .attach_sprite(fixed_layer, prop.sprite("main").unwrap().with_scale(2.0))
        .unwrap();

    stage.tick(0.0);

    assert!(approx_eq(frame_scale(&stage, resized_prop), 3.0));
    let view = stage.world.get::<SpriteView>(resized_prop).unwrap();
    assert!(approx_eq(view.frame.width, 60.0));

    assert!(approx_eq(frame_scale(&stage, fixed_prop), 1.0));
    let view = stage.world.get::<SpriteView>(fixed_prop).unwrap();
    assert!(approx_eq(view.frame.width, 40.0));
    assert!(approx_eq(placed(&stage, fixed_layer).left, 15.0));
}

#[test]
fn nested_containers_inherit_scale() {
    let (mut stage, room, prop) = setup();
    let target = stage.spawn_box(200.0, 200.0);
    let outer = stage
        .spawn_container(room.sprite("main").unwrap(), 1.0, Some(target))
        .unwrap();
    let slot = stage.spawn_stack_entity(outer, 50.0, 0.0).unwrap();
    let inner = stage
        .attach_container(slot, prop.sprite("main").unwrap(), 1.5, None)
        .unwrap();
    let inner_slot = stage.spawn_stack_entity(inner, 4.0, 2.0).unwrap();
    stage.tick(0.0);

    assert!(approx_eq(container(&stage, outer).dynamic_scale, 2.0));
    assert!(approx_eq(container(&stage, inner).frame_scale, 2.0));
    assert!(approx_eq(container(&stage, inner).dynamic_scale, 3.0));
    assert!(approx_eq(placed(&stage, inner_slot).left, 12.0));
    assert!(approx_eq(placed(&stage, inner_slot).top, 6.0));
}

#[test]
fn nested_container_items_are_placed_from_outer_origin() {
    let (mut stage, room, prop) = setup();
    let target = stage.spawn_box(200.0, 200.0);
    let outer = stage
        .spawn_container(room.sprite("main").unwrap(), 1.0, Some(target))
        .unwrap();
    let slot = stage.spawn_stack_entity(outer, 50.0, 30.0).unwrap();
    let inner = stage
        .attach_container(slot, prop.sprite("main").unwrap(), 1.5, None)
        .unwrap();
    let inner_slot = stage.spawn_stack_entity(inner, 4.0, 2.0).unwrap();
    let item = stage
        .attach_sprite(inner_slot, prop.sprite("main").unwrap())
        .unwrap();
    stage.tick(0.0);

    let inner_base = base_of(&mut stage, inner);
    let list = stage.draw_list();

    let base_item = list.iter().find(|i| i.entity == inner_base).unwrap();
    assert_eq!(base_item.origin, Some(outer));
    assert!(approx_eq(base_item.left, 100.0));
    assert!(approx_eq(base_item.top, 60.0));
    assert!(!base_item.pointer_events);
    assert_eq!(base_item.depth, 1);

    let nested_item = list.iter().find(|i| i.entity == item).unwrap();
    assert_eq!(nested_item.origin, Some(outer));
    assert!(approx_eq(nested_item.left, 112.0));
    assert!(approx_eq(nested_item.top, 66.0));
    assert_eq!(nested_item.depth, 2);
}

#[test]
fn stack_entity_requires_container() {
    let (mut stage, room, _) = setup();
    let loose = stage.spawn_sprite(room.sprite("main").unwrap()).unwrap();

    match spawn_stack_entity(&mut stage.world, loose, 1.0, 1.0) {
        Err(SpriteError::MissingFrameContext { entity }) => assert_eq!(entity, loose),
        other => panic!("expected MissingFrameContext, got {other:?}"),
    }
    assert!(matches!(
        stage.attach_container(loose, room.sprite("main").unwrap(), 1.0, None),
        Err(SpriteError::MissingFrameContext { .. })
    ));
}

#[test]
fn stray_stack_entity_is_skipped() {
    let (mut stage, _, prop) = setup();
    let stray = stage.world.spawn(StackEntity::new(3.0, 4.0)).id();
    let child = attach_sprite(&mut stage.world, stray, prop.sprite("main").unwrap()).unwrap();
    stage.tick(0.0);
    stage.tick(0.0);

    let placed = placed(&stage, stray);
    assert!(approx_eq(placed.left, 3.0));
    assert!(approx_eq(frame_scale(&stage, child), 1.0));
}

#[test]
fn unknown_base_state_fails_fast() {
    let (mut stage, room, _) = setup();
    let result = stage.spawn_container(Sprite::new(room.id(), "missing"), 1.0, None);
    assert!(matches!(result, Err(SpriteError::UnknownState { .. })));
}

#[test]
fn draw_list_orders_base_before_layers() {
    let (mut stage, room, prop) = setup();
    let free = stage.spawn_sprite(prop.sprite("main").unwrap()).unwrap();
    let frame = stage
        .spawn_container(room.sprite("main").unwrap(), 2.0, None)
        .unwrap();
    let layer = stage.spawn_stack_entity(frame, 10.0, 20.0).unwrap();
    let item = stage
        .attach_sprite(layer, prop.sprite("main").unwrap())
        .unwrap();
    stage.tick(0.0);

    let base = base_of(&mut stage, frame);
    let list = stage.draw_list();
    assert_eq!(list.len(), 3);

    let free_item = list.iter().find(|i| i.entity == free).unwrap();
    assert_eq!(free_item.origin, None);
    assert!(free_item.pointer_events);

    let base_pos = list.iter().position(|i| i.entity == base).unwrap();
    let item_pos = list.iter().position(|i| i.entity == item).unwrap();
    assert!(base_pos < item_pos);

    let base_item = &list[base_pos];
    assert_eq!(base_item.origin, Some(frame));
    assert!(approx_eq(base_item.left, 0.0));

    let layer_item = &list[item_pos];
    assert_eq!(layer_item.origin, Some(frame));
    assert!(!layer_item.pointer_events);
    assert!(approx_eq(layer_item.left, 20.0));
    assert!(approx_eq(layer_item.top, 40.0));
    assert!(layer_item.depth > base_item.depth);
}
