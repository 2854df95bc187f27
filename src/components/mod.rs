//! ECS components for sprite entities.
//!
//! Submodules overview:
//! - [`playback`] – per-sprite animation cursor
//! - [`resizeto`] – measured boxes and responsive scaling
//! - [`scalable`] – scale composition shared by sprites and containers
//! - [`sprite`] – the sprite instance bound to a sheet state
//! - [`stack`] – stacked compositions of a base sprite and positioned layers
//! - [`view`] – resolved presentation consumed by the host surface
//! - [`visibility`] – viewport entry tracking for lazy sheets

pub mod playback;
pub mod resizeto;
pub mod scalable;
pub mod sprite;
pub mod stack;
pub mod view;
pub mod visibility;
