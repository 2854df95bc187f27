//! ECS resources made available to systems.
//!
//! Overview
//! - `loader` – bridge and channels for the sprite loader thread, image sources
//! - `modifier` – pixel transforms and per-sheet derived image caches
//! - `spritesheet` – sheet declarations, options and load lifecycle
//! - `spritesheetstore` – registry of declared sheets
//! - `stageconfig` – INI-backed defaults
//! - `worldtime` – stage clock and delta
pub mod loader;
pub mod modifier;
pub mod spritesheet;
pub mod spritesheetstore;
pub mod stageconfig;
pub mod worldtime;
