//! Stage setup, scheduling and spawning.
//!
//! A stage is a `World` with the sprite resources, the loader thread and the
//! layout observers installed, plus the [`Schedule`] that advances it.
//!
//! ```no_run
//! use spritestage::prelude::*;
//!
//! let config = StageConfig::new();
//! let source = Box::new(config.image_source());
//! let mut stage = Stage::new(config, source);
//! let (sheet, controls) = stage
//!     .declare("hero.png", SheetOptions::new().with_state("walk", StateConfig::cycle(1, 4)))
//!     .unwrap();
//! controls.load().wait().unwrap();
//! let hero = stage.spawn_sprite(sheet.sprite("walk").unwrap()).unwrap();
//! stage.tick(1.0 / 60.0);
//! # let _ = hero;
//! ```
//!
//! # Schedule
//!
//! 1. Loader notifications are drained and dispatched as events.
//! 2. Resize scales and stack layout are recomputed.
//! 3. Animations advance.
//! 4. Views are resolved.
use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;
use log::info;

use crate::components::resizeto::ResizeTo;
use crate::components::sprite::Sprite;
use crate::components::stack::{StackBase, StackContainer, StackEntity};
use crate::error::SpriteError;
use crate::events::layout::{BecameVisibleEvent, BoxResizedEvent};
use crate::resources::loader::{ImageSource, setup_sprite_loader, shutdown_sprite_loader};
use crate::resources::spritesheet::{SheetControls, SheetOptions, SpriteSheetHandle};
use crate::resources::spritesheetstore::{SpriteSheetStore, declare_spritesheet};
use crate::resources::stageconfig::StageConfig;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::sprite_animation;
use crate::systems::loader::{
    dispatch_loader_events, poll_loader_messages, update_loader_messages,
};
use crate::systems::render::{DrawItem, collect_draw_list};
use crate::systems::resize::{on_box_resized, resize_scale_system};
use crate::systems::stack::stack_layout;
use crate::systems::time::advance_world_time;
use crate::systems::view::sprite_view_system;
use crate::systems::visibility::on_became_visible;

/// Insert stage resources, start the loader thread and register observers.
pub fn setup_stage(world: &mut World, config: StageConfig, source: Box<dyn ImageSource>) {
    info!(
        "Setting up stage ({}x{} viewport)",
        config.viewport_width, config.viewport_height
    );
    world.insert_resource(config);
    world.insert_resource(WorldTime::default());
    world.insert_resource(SpriteSheetStore::new());
    setup_sprite_loader(world, source);

    world.add_observer(on_box_resized);
    world.add_observer(on_became_visible);
    world.flush();
}

/// Build the per-frame schedule.
pub fn stage_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            poll_loader_messages,
            update_loader_messages,
            dispatch_loader_events,
        )
            .chain(),
    );
    update.add_systems(resize_scale_system.after(dispatch_loader_events));
    update.add_systems(stack_layout.after(resize_scale_system));
    update.add_systems(sprite_animation.after(dispatch_loader_events));
    update.add_systems(
        sprite_view_system
            .after(stack_layout)
            .after(sprite_animation),
    );
    update
}

/// Advance the clock by `dt` seconds and run one frame.
pub fn tick_stage(world: &mut World, schedule: &mut Schedule, dt: f32) {
    advance_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers();
}

/// Stop the loader thread.
pub fn shutdown_stage(world: &mut World) {
    shutdown_sprite_loader(world);
}

fn check_sprite(world: &World, sprite: &Sprite) -> Result<(), SpriteError> {
    let store = world
        .get_resource::<SpriteSheetStore>()
        .ok_or_else(|| SpriteError::UnknownSheet(sprite.sheet.to_string()))?;
    store.sheet(sprite.sheet)?.state(&sprite.state)?;
    Ok(())
}

/// Spawn a free sprite. Fails fast on unknown sheets or states.
pub fn spawn_sprite(world: &mut World, sprite: Sprite) -> Result<Entity, SpriteError> {
    check_sprite(world, &sprite)?;
    Ok(world.spawn(sprite).id())
}

/// Spawn a sprite inside `parent`, usually a [`StackEntity`].
pub fn attach_sprite(
    world: &mut World,
    parent: Entity,
    sprite: Sprite,
) -> Result<Entity, SpriteError> {
    check_sprite(world, &sprite)?;
    let entity = world.spawn((sprite, ChildOf(parent))).id();
    world.flush();
    Ok(entity)
}

fn spawn_container_under(
    world: &mut World,
    parent: Option<Entity>,
    base: Sprite,
    scale: f32,
    resize_target: Option<Entity>,
) -> Result<Entity, SpriteError> {
    check_sprite(world, &base)?;
    let mut container = world.spawn(StackContainer::new(scale));
    if let Some(target) = resize_target {
        container.insert(ResizeTo::new(target));
    }
    if let Some(parent) = parent {
        container.insert(ChildOf(parent));
    }
    let container = container.id();
    world.spawn((base, StackBase, ChildOf(container)));
    world.flush();
    Ok(container)
}

/// Spawn a root stack container around `base`.
///
/// With a `resize_target`, the whole composition follows that entity's box.
pub fn spawn_container(
    world: &mut World,
    base: Sprite,
    scale: f32,
    resize_target: Option<Entity>,
) -> Result<Entity, SpriteError> {
    spawn_container_under(world, None, base, scale, resize_target)
}

/// Spawn a container nested inside a stack entity.
pub fn attach_container(
    world: &mut World,
    stack_entity: Entity,
    base: Sprite,
    scale: f32,
    resize_target: Option<Entity>,
) -> Result<Entity, SpriteError> {
    if world.get::<StackEntity>(stack_entity).is_none() {
        return Err(SpriteError::MissingFrameContext {
            entity: stack_entity,
        });
    }
    spawn_container_under(world, Some(stack_entity), base, scale, resize_target)
}

/// Spawn a positioned layer at `(x, y)` base pixels inside `container`.
pub fn spawn_stack_entity(
    world: &mut World,
    container: Entity,
    x: f32,
    y: f32,
) -> Result<Entity, SpriteError> {
    if world.get::<StackContainer>(container).is_none() {
        return Err(SpriteError::MissingFrameContext { entity: container });
    }
    let entity = world
        .spawn((StackEntity::new(x, y), ChildOf(container)))
        .id();
    world.flush();
    Ok(entity)
}

/// A world, its schedule and the loader thread bundled together.
///
/// Dropping the stage stops the loader thread.
pub struct Stage {
    pub world: World,
    pub schedule: Schedule,
}

impl Stage {
    pub fn new(config: StageConfig, source: Box<dyn ImageSource>) -> Self {
        let mut world = World::new();
        setup_stage(&mut world, config, source);
        Self {
            world,
            schedule: stage_schedule(),
        }
    }

    pub fn declare(
        &mut self,
        source: &str,
        options: SheetOptions,
    ) -> Result<(SpriteSheetHandle, SheetControls), SpriteError> {
        declare_spritesheet(&mut self.world, source, options)
    }

    pub fn spawn_sprite(&mut self, sprite: Sprite) -> Result<Entity, SpriteError> {
        spawn_sprite(&mut self.world, sprite)
    }

    pub fn attach_sprite(&mut self, parent: Entity, sprite: Sprite) -> Result<Entity, SpriteError> {
        attach_sprite(&mut self.world, parent, sprite)
    }

    pub fn spawn_container(
        &mut self,
        base: Sprite,
        scale: f32,
        resize_target: Option<Entity>,
    ) -> Result<Entity, SpriteError> {
        spawn_container(&mut self.world, base, scale, resize_target)
    }

    pub fn attach_container(
        &mut self,
        stack_entity: Entity,
        base: Sprite,
        scale: f32,
        resize_target: Option<Entity>,
    ) -> Result<Entity, SpriteError> {
        attach_container(&mut self.world, stack_entity, base, scale, resize_target)
    }

    pub fn spawn_stack_entity(
        &mut self,
        container: Entity,
        x: f32,
        y: f32,
    ) -> Result<Entity, SpriteError> {
        spawn_stack_entity(&mut self.world, container, x, y)
    }

    /// Spawn an entity standing for a host element whose box is measured.
    pub fn spawn_box(&mut self, width: f32, height: f32) -> Entity {
        let entity = self.world.spawn_empty().id();
        self.resize(entity, width, height);
        entity
    }

    /// Spawn a box the size of the configured viewport.
    pub fn spawn_viewport(&mut self) -> Entity {
        let (width, height) = self
            .world
            .get_resource::<StageConfig>()
            .map_or((0, 0), |c| (c.viewport_width, c.viewport_height));
        self.spawn_box(width as f32, height as f32)
    }

    /// Report a new box size for `entity`.
    pub fn resize(&mut self, entity: Entity, width: f32, height: f32) {
        self.world.trigger(BoxResizedEvent {
            entity,
            width,
            height,
        });
        self.world.flush();
    }

    /// Report that `entity` entered the viewport.
    pub fn reveal(&mut self, entity: Entity) {
        self.world.trigger(BecameVisibleEvent { entity });
        self.world.flush();
    }

    pub fn tick(&mut self, dt: f32) {
        tick_stage(&mut self.world, &mut self.schedule, dt);
    }

    pub fn draw_list(&mut self) -> Vec<DrawItem> {
        collect_draw_list(&mut self.world)
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        shutdown_stage(&mut self.world);
    }
}
