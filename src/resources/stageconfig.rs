//! Stage configuration resource.
//!
//! Loaded from an INI file. Every value is optional; missing keys keep
//! their defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [assets]
//! root = ./assets
//!
//! [sprites]
//! tile_height = 100
//! tile_width = 100
//! frame_time = 0.15
//! loading = load
//!
//! [viewport]
//! width = 1280
//! height = 720
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};

use crate::error::SpriteError;
use crate::resources::loader::FileImageSource;
use crate::resources::spritesheet::{
    DEFAULT_FRAME_TIME, DEFAULT_TILE_SIZE, LoadingStrategy, SheetOptions, TileSize,
};

const DEFAULT_ASSET_ROOT: &str = "./assets";
const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;
const DEFAULT_CONFIG_PATH: &str = "./stage.ini";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct StageConfig {
    /// Directory sheet locators are resolved against.
    pub asset_root: PathBuf,
    pub tile_size: TileSize,
    pub frame_time: f32,
    pub loading: LoadingStrategy,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub config_path: PathBuf,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StageConfig {
    pub fn new() -> Self {
        Self {
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            tile_size: DEFAULT_TILE_SIZE,
            frame_time: DEFAULT_FRAME_TIME,
            loading: LoadingStrategy::default(),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values. Unparseable values are
    /// skipped with a warning.
    pub fn load_from_file(&mut self) -> Result<(), SpriteError> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| SpriteError::Config(format!("Failed to load config file: {}", e)))?;

        // [assets] section
        if let Some(root) = config.get("assets", "root") {
            self.asset_root = PathBuf::from(root);
        }

        // [sprites] section
        if let Some(height) = config.getuint("sprites", "tile_height").ok().flatten() {
            self.tile_size.height = height as u32;
        }
        if let Some(width) = config.getuint("sprites", "tile_width").ok().flatten() {
            self.tile_size.width = width as u32;
        }
        if let Some(frame_time) = config.getfloat("sprites", "frame_time").ok().flatten() {
            self.frame_time = frame_time as f32;
        }
        if let Some(loading) = config.get("sprites", "loading") {
            match loading.parse() {
                Ok(strategy) => self.loading = strategy,
                Err(e) => warn!("Ignoring [sprites] loading: {}", e),
            }
        }

        // [viewport] section
        if let Some(width) = config.getuint("viewport", "width").ok().flatten() {
            self.viewport_width = width as u32;
        }
        if let Some(height) = config.getuint("viewport", "height").ok().flatten() {
            self.viewport_height = height as u32;
        }

        info!(
            "Loaded config: assets={:?}, tile={}x{}, frame_time={}, loading={:?}, viewport={}x{}",
            self.asset_root,
            self.tile_size.width,
            self.tile_size.height,
            self.frame_time,
            self.loading,
            self.viewport_width,
            self.viewport_height
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), SpriteError> {
        let mut config = Ini::new();

        config.set(
            "assets",
            "root",
            Some(self.asset_root.to_string_lossy().into_owned()),
        );

        config.set("sprites", "tile_height", Some(self.tile_size.height.to_string()));
        config.set("sprites", "tile_width", Some(self.tile_size.width.to_string()));
        config.set("sprites", "frame_time", Some(self.frame_time.to_string()));
        let loading = match self.loading {
            LoadingStrategy::Immediate => "immediate",
            LoadingStrategy::Preload => "preload",
            LoadingStrategy::Lazy => "lazy",
            LoadingStrategy::Delayed => "delayed",
        };
        config.set("sprites", "loading", Some(loading.to_string()));

        config.set("viewport", "width", Some(self.viewport_width.to_string()));
        config.set("viewport", "height", Some(self.viewport_height.to_string()));

        config.write(&self.config_path)?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Sheet options carrying the configured defaults and the default structure.
    pub fn sheet_defaults(&self) -> SheetOptions {
        SheetOptions::new()
            .with_tile_size(self.tile_size.height, self.tile_size.width)
            .with_frame_time(self.frame_time)
            .with_loading(self.loading)
    }

    pub fn image_source(&self) -> FileImageSource {
        FileImageSource::new(self.asset_root.clone())
    }
}
