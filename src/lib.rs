//! Spritestage library.
//!
//! A headless sprite-sheet animation engine built on `bevy_ecs`: sheet
//! declarations with deferred loading, pixel-transform modifiers, animated
//! sprite views and stacked compositions. Hosts paint the resolved
//! [`SpriteView`](components::view::SpriteView)s or the flattened
//! [`DrawItem`](systems::render::DrawItem) list.

pub mod components;
pub mod error;
pub mod events;
pub mod resources;
pub mod stage;
pub mod systems;

/// Common imports for hosts.
pub mod prelude {
    pub use crate::components::resizeto::{LayoutBox, ResizeTo};
    pub use crate::components::scalable::Scalable;
    pub use crate::components::sprite::{Fallback, Sprite};
    pub use crate::components::stack::{StackBase, StackContainer, StackEntity};
    pub use crate::components::view::{ImageRef, SpriteContent, SpriteFrame, SpriteView};
    pub use crate::error::{ResourceLoadError, SpriteError};
    pub use crate::resources::loader::{FileImageSource, ImageSource, MemoryImageSource};
    pub use crate::resources::modifier::{Channel, FillChannel, PixelTransform, ThresholdRecolor};
    pub use crate::resources::spritesheet::{
        LoadState, LoadTicket, LoadingStrategy, SheetControls, SheetId, SheetOptions,
        SpriteSheetHandle, StateConfig, TileSize,
    };
    pub use crate::resources::stageconfig::StageConfig;
    pub use crate::stage::Stage;
    pub use crate::systems::render::DrawItem;
}
