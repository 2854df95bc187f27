//! Error types shared by the sprite engine.
//!
//! Two families exist:
//! - [`ResourceLoadError`] describes why a sprite sheet image could not be
//!   fetched or decoded. It is cloneable because every pending
//!   [`LoadTicket`](crate::resources::spritesheet::LoadTicket) of a sheet
//!   receives its own copy of the same outcome.
//! - [`SpriteError`] covers configuration-shape failures (unknown states,
//!   entities outside a container, invalid sheet options) plus the I/O and
//!   parsing errors of the ambient layers.
//!
//! Transient conditions (sheet still loading, modifier not produced yet) are
//! never errors; they resolve to fallback or empty views.

use bevy_ecs::prelude::Entity;
use thiserror::Error;

/// Failure while fetching or decoding a sprite sheet image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceLoadError {
    /// The image source could not deliver the bytes.
    #[error("Failed to load image: {locator}: {reason}")]
    Fetch { locator: String, reason: String },
    /// The bytes were delivered but are not a decodable image.
    #[error("Failed to decode image: {locator}: {reason}")]
    Decode { locator: String, reason: String },
    /// The image decoded to zero width or height.
    #[error("Image has no intrinsic size: {locator}")]
    EmptyImage { locator: String },
    /// The loader worker is not running anymore.
    #[error("Sprite loader stopped before {locator} finished loading")]
    WorkerGone { locator: String },
}

/// Engine-level error.
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error(transparent)]
    ResourceLoad(#[from] ResourceLoadError),
    /// A sprite referenced a state that is not part of the sheet structure.
    #[error("Unknown sprite state '{state}' for sheet '{sheet}'")]
    UnknownState { state: String, sheet: String },
    /// A sprite referenced a sheet that was never declared.
    #[error("Unknown sprite sheet '{0}'")]
    UnknownSheet(String),
    /// A stack entity was placed under something that is not a stack container.
    #[error("{entity:?} is not a stack container")]
    MissingFrameContext { entity: Entity },
    #[error("Invalid sheet options: {0}")]
    InvalidOptions(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
