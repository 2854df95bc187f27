//! Registry of declared sprite sheets.
//!
//! Use [`declare_spritesheet`] to declare a sheet. Declaration assigns a
//! fresh [`SheetId`], so declaring the same image twice yields two
//! independent sheets with their own load lifecycle and modifiers.
use bevy_ecs::prelude::*;
use log::info;
use rustc_hash::FxHashMap;

use crate::error::SpriteError;
use crate::resources::loader::{LoaderHandle, SpriteLoaderBridge};
use crate::resources::spritesheet::{
    LoadingStrategy, SheetControls, SheetId, SheetOptions, SpriteSheet, SpriteSheetHandle,
};

#[derive(Resource, Default)]
pub struct SpriteSheetStore {
    pub sheets: FxHashMap<SheetId, SpriteSheet>,
    next_id: u32,
}

impl SpriteSheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SheetId) -> Option<&SpriteSheet> {
        self.sheets.get(&id)
    }

    pub fn sheet(&self, id: SheetId) -> Result<&SpriteSheet, SpriteError> {
        self.get(id)
            .ok_or_else(|| SpriteError::UnknownSheet(id.to_string()))
    }

    /// Validate and register a sheet, starting its fetch for eager strategies.
    pub fn declare(
        &mut self,
        source: &str,
        options: SheetOptions,
        loader: LoaderHandle,
    ) -> Result<(SpriteSheetHandle, SheetControls), SpriteError> {
        options.validate()?;
        let id = SheetId(self.next_id);
        self.next_id += 1;

        let strategy = options.loading_strategy;
        let sheet = SpriteSheet::new(id, source, options, loader);
        match strategy {
            LoadingStrategy::Immediate => {
                sheet.controls().start_fetch(false);
            }
            LoadingStrategy::Preload => {
                sheet.controls().start_fetch(true);
            }
            LoadingStrategy::Lazy | LoadingStrategy::Delayed => {}
        }
        info!("Declared {} from {} ({:?})", id, source, strategy);

        let pair = (sheet.handle().clone(), sheet.controls().clone());
        self.sheets.insert(id, sheet);
        Ok(pair)
    }
}

/// Declare a sheet in `world`.
///
/// Requires the [`SpriteLoaderBridge`] and [`SpriteSheetStore`] resources,
/// both inserted by [`setup_stage`](crate::stage::setup_stage).
pub fn declare_spritesheet(
    world: &mut World,
    source: &str,
    options: SheetOptions,
) -> Result<(SpriteSheetHandle, SheetControls), SpriteError> {
    let loader = world
        .get_resource::<SpriteLoaderBridge>()
        .map(|bridge| bridge.loader.clone())
        .ok_or_else(|| SpriteError::Config("sprite loader is not running".to_string()))?;
    world
        .get_resource_or_insert_with(SpriteSheetStore::default)
        .declare(source, options, loader)
}
