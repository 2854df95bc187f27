//! Engine systems.
//!
//! Submodules overview
//! - [`animation`] – advance sprite playback from the stage clock
//! - [`loader`] – the loader thread and its bridge systems
//! - [`render`] – flatten views into a host draw list
//! - [`report`] – log-once bookkeeping for broken entities
//! - [`resize`] – record box sizes and recompute responsive scales
//! - [`stack`] – lay out stacked compositions
//! - [`time`] – advance the stage clock
//! - [`view`] – resolve what each sprite shows
//! - [`visibility`] – viewport entry and lazy fetch start

pub mod animation;
pub mod loader;
pub mod render;
pub mod report;
pub mod resize;
pub mod stack;
pub mod time;
pub mod view;
pub mod visibility;
