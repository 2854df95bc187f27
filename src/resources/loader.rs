//! ECS resources that bridge the main thread with the sprite loader thread.
//!
//! Use [`setup_sprite_loader`] once during initialization to spawn the loader
//! thread and insert the [`SpriteLoaderBridge`] and `Messages<LoaderMessage>`
//! resources. Call [`shutdown_sprite_loader`] during teardown to stop the
//! thread.
//!
//! Image bytes come from an [`ImageSource`]. [`FileImageSource`] reads from
//! an asset directory, [`MemoryImageSource`] serves registered byte buffers
//! and counts fetches.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use image::RgbaImage;
use rustc_hash::FxHashMap;

use crate::error::ResourceLoadError;
use crate::resources::modifier::{ModifierPipeline, PixelTransform};
use crate::resources::spritesheet::{SharedLifecycle, SheetId};
use crate::systems::loader::sprite_loader_thread;

/// Where sheet image bytes come from.
pub trait ImageSource: Send + Sync {
    /// Fetch the raw (encoded) bytes behind `locator`.
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, String>;
}

impl<T: ImageSource + ?Sized> ImageSource for Arc<T> {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, String> {
        (**self).fetch(locator)
    }
}

/// Reads sheet images relative to an asset root.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    root: PathBuf,
}

impl FileImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageSource for FileImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, String> {
        let path = self.root.join(locator);
        std::fs::read(&path).map_err(|e| format!("{}: {}", path.display(), e))
    }
}

/// In-memory image source. Counts every fetch per locator.
#[derive(Default)]
pub struct MemoryImageSource {
    images: Mutex<FxHashMap<String, Vec<u8>>>,
    fetches: Mutex<FxHashMap<String, usize>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, locator: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(locator, bytes);
        self
    }

    pub fn insert(&self, locator: impl Into<String>, bytes: Vec<u8>) {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locator.into(), bytes);
    }

    pub fn fetch_count(&self, locator: &str) -> usize {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locator)
            .copied()
            .unwrap_or(0)
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, String> {
        *self
            .fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(locator.to_string())
            .or_insert(0) += 1;
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locator)
            .cloned()
            .ok_or_else(|| "no such image".to_string())
    }
}

/// Fetch and decode a sheet image, then settle its lifecycle.
pub struct FetchJob {
    pub sheet: SheetId,
    pub locator: String,
    pub lifecycle: SharedLifecycle,
    pub pipeline: Arc<ModifierPipeline>,
}

/// Run a pixel transform over an already decoded sheet.
pub struct ModifierJob {
    pub sheet: SheetId,
    pub id: String,
    pub transform: Arc<dyn PixelTransform>,
    pub base: Arc<RgbaImage>,
    pub pipeline: Arc<ModifierPipeline>,
}

/// Commands consumed by the loader thread.
pub enum LoaderCmd {
    Fetch(FetchJob),
    ApplyModifier(ModifierJob),
    Shutdown,
}

/// Notifications emitted by the loader thread.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum LoaderMessage {
    SheetLoaded {
        sheet: SheetId,
    },
    SheetLoadFailed {
        sheet: SheetId,
        error: ResourceLoadError,
    },
    ModifierPublished {
        sheet: SheetId,
        id: String,
        version: u64,
    },
}

/// Sending half of the loader lanes. Cloned into every [`SheetControls`](crate::resources::spritesheet::SheetControls).
#[derive(Clone)]
pub struct LoaderHandle {
    tx_cmd: Sender<LoaderCmd>,
    tx_priority: Sender<LoaderCmd>,
}

impl LoaderHandle {
    /// Queue a command. Returns `false` when the loader thread is gone.
    pub fn submit(&self, cmd: LoaderCmd, priority: bool) -> bool {
        self.try_submit(cmd, priority).is_ok()
    }

    /// Queue a command, handing it back when the loader thread is gone.
    pub fn try_submit(&self, cmd: LoaderCmd, priority: bool) -> Result<(), LoaderCmd> {
        let lane = if priority {
            &self.tx_priority
        } else {
            &self.tx_cmd
        };
        lane.send(cmd).map_err(|e| e.0)
    }
}

/// Shared bridge between the ECS world and the loader thread.
#[derive(Resource)]
pub struct SpriteLoaderBridge {
    pub loader: LoaderHandle,
    /// Receiver for [`LoaderMessage`] (loader thread -> ECS).
    pub rx_msg: Receiver<LoaderMessage>,
    /// Join handle for the loader thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the loader thread and register bridge resources.
pub fn setup_sprite_loader(world: &mut World, source: Box<dyn ImageSource>) {
    let (tx_cmd, rx_cmd) = unbounded::<LoaderCmd>();
    let (tx_priority, rx_priority) = unbounded::<LoaderCmd>();
    let (tx_msg, rx_msg) = unbounded::<LoaderMessage>();

    let handle =
        std::thread::spawn(move || sprite_loader_thread(rx_priority, rx_cmd, tx_msg, source));

    world.insert_resource(SpriteLoaderBridge {
        loader: LoaderHandle {
            tx_cmd,
            tx_priority,
        },
        rx_msg,
        handle,
    });
    world.insert_resource(Messages::<LoaderMessage>::default());
}

/// Request shutdown of the loader thread and join it.
///
/// Loads still in flight resolve their tickets with
/// [`ResourceLoadError::WorkerGone`].
pub fn shutdown_sprite_loader(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<SpriteLoaderBridge>() {
        let _ = bridge.loader.tx_priority.send(LoaderCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_counts_fetches() {
        let source = MemoryImageSource::new().with_image("a.png", vec![1, 2, 3]);
        assert_eq!(source.fetch("a.png"), Ok(vec![1, 2, 3]));
        assert!(source.fetch("b.png").is_err());
        assert_eq!(source.fetch_count("a.png"), 1);
        assert_eq!(source.fetch_count("b.png"), 1);
        assert_eq!(source.fetch_count("c.png"), 0);
    }

    #[test]
    fn file_source_reports_missing_path() {
        let source = FileImageSource::new("/definitely/not/here");
        let err = source.fetch("sheet.png").unwrap_err();
        assert!(err.contains("sheet.png"));
    }

    #[test]
    fn submit_fails_once_receiver_is_dropped() {
        let (tx_cmd, rx_cmd) = unbounded();
        let (tx_priority, _rx_priority) = unbounded();
        let handle = LoaderHandle {
            tx_cmd,
            tx_priority,
        };
        drop(rx_cmd);
        assert!(!handle.submit(LoaderCmd::Shutdown, false));
        assert!(handle.submit(LoaderCmd::Shutdown, true));
    }
}
