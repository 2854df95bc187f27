//! Event types exchanged across systems and with the host surface.
//!
//! Submodules:
//! - [`animation`] – one-shot animation completion
//! - [`layout`] – box measurements and viewport entry reported by the host
//! - [`modifier`] – modifier results published by the loader thread
//! - [`spritesheet`] – sheet load success and failure
pub mod animation;
pub mod layout;
pub mod modifier;
pub mod spritesheet;
