//! Sprite sheet declarations.
//!
//! A sprite sheet is declared once per image asset together with a
//! [`SheetOptions`] structure map describing its named states. Declaring
//! yields two halves:
//!
//! - [`SpriteSheetHandle`] – the render handle used to build validated
//!   [`Sprite`] components for that sheet.
//! - [`SheetControls`] – the imperative side: [`SheetControls::load`] and
//!   [`SheetControls::modifier`].
//!
//! The load lifecycle (`unloaded -> loading -> loaded | error`) lives in a
//! [`SheetLifecycle`] shared between the controls, the ECS store and the
//! loader worker. It is the only piece of sheet state written from outside
//! the main thread.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "tile_size": [32, 32],
//!   "frame_time": 0.25,
//!   "loading": "lazy",
//!   "structure": {
//!     "main": { "type": "animated-cycle", "layer": 0, "length": 4 },
//!     "wave": { "type": "animated-instance", "layer": 1, "length": 6, "transition_to": "main" },
//!     "tile": { "type": "tile", "layer": 0, "depth": 4 }
//!   }
//! }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use image::RgbaImage;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::sprite::Sprite;
use crate::error::{ResourceLoadError, SpriteError};
use crate::resources::loader::{FetchJob, LoaderCmd, LoaderHandle, ModifierJob};
use crate::resources::modifier::{ModifierPipeline, PixelTransform};

/// Default tile size, `[height, width]` in pixels.
pub const DEFAULT_TILE_SIZE: TileSize = TileSize {
    height: 100,
    width: 100,
};
/// Default seconds per frame for cyclic animations.
pub const DEFAULT_FRAME_TIME: f32 = 0.15;
/// State used when a sprite does not name one.
pub const DEFAULT_STATE: &str = "main";
const DEFAULT_TILE_DEPTH: u32 = 5;

/// Identifier assigned to every declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetId(pub u32);

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet-{}", self.0)
    }
}

/// Size of a single frame, shared by all states of a sheet.
///
/// Serialized as `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct TileSize {
    pub height: u32,
    pub width: u32,
}

impl TileSize {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }
}

impl From<[u32; 2]> for TileSize {
    fn from([height, width]: [u32; 2]) -> Self {
        Self { height, width }
    }
}

impl From<TileSize> for [u32; 2] {
    fn from(size: TileSize) -> Self {
        [size.height, size.width]
    }
}

/// Display rule for one named state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StateConfig {
    /// A single static frame picked by the sprite's `tile`.
    Tile { layer: u32, depth: u32 },
    /// Loops frames `0..length` forever.
    AnimatedCycle {
        layer: u32,
        length: u32,
        #[serde(default)]
        rate: Option<f32>,
    },
    /// Plays frames `0..length` once, then the sprite switches to `transition_to`.
    AnimatedInstance {
        layer: u32,
        length: u32,
        transition_to: String,
        #[serde(default)]
        rate: Option<f32>,
    },
}

impl StateConfig {
    pub fn tile(layer: u32, depth: u32) -> Self {
        StateConfig::Tile { layer, depth }
    }

    pub fn cycle(layer: u32, length: u32) -> Self {
        StateConfig::AnimatedCycle {
            layer,
            length,
            rate: None,
        }
    }

    pub fn instance(layer: u32, length: u32, transition_to: impl Into<String>) -> Self {
        StateConfig::AnimatedInstance {
            layer,
            length,
            transition_to: transition_to.into(),
            rate: None,
        }
    }

    /// Attach a per-state playback multiplier. Ignored for static tiles.
    pub fn with_rate(mut self, new_rate: f32) -> Self {
        match &mut self {
            StateConfig::Tile { .. } => {}
            StateConfig::AnimatedCycle { rate, .. } | StateConfig::AnimatedInstance { rate, .. } => {
                *rate = Some(new_rate)
            }
        }
        self
    }

    /// Row of the sheet holding this state's frames.
    pub fn layer(&self) -> u32 {
        match self {
            StateConfig::Tile { layer, .. }
            | StateConfig::AnimatedCycle { layer, .. }
            | StateConfig::AnimatedInstance { layer, .. } => *layer,
        }
    }

    /// Number of animation frames; static tiles count as one.
    pub fn length(&self) -> u32 {
        match self {
            StateConfig::Tile { .. } => 1,
            StateConfig::AnimatedCycle { length, .. }
            | StateConfig::AnimatedInstance { length, .. } => *length,
        }
    }

    /// Per-state playback multiplier, `1.0` when unset.
    pub fn rate(&self) -> f32 {
        match self {
            StateConfig::Tile { .. } => 1.0,
            StateConfig::AnimatedCycle { rate, .. }
            | StateConfig::AnimatedInstance { rate, .. } => rate.unwrap_or(1.0),
        }
    }

    pub fn is_animated(&self) -> bool {
        !matches!(self, StateConfig::Tile { .. })
    }

    pub fn transition_to(&self) -> Option<&str> {
        match self {
            StateConfig::AnimatedInstance { transition_to, .. } => Some(transition_to),
            _ => None,
        }
    }
}

/// When the image payload of a sheet is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingStrategy {
    /// Fetch and decode right at declaration.
    #[default]
    #[serde(alias = "load")]
    Immediate,
    /// Like `Immediate`, through the loader's priority lane.
    Preload,
    /// Fetch when the first sprite of the sheet becomes visible.
    Lazy,
    /// Fetch only when [`SheetControls::load`] is called.
    Delayed,
}

impl FromStr for LoadingStrategy {
    type Err = SpriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" | "load" => Ok(LoadingStrategy::Immediate),
            "preload" => Ok(LoadingStrategy::Preload),
            "lazy" => Ok(LoadingStrategy::Lazy),
            "delayed" => Ok(LoadingStrategy::Delayed),
            other => Err(SpriteError::Config(format!(
                "unknown loading strategy '{other}'"
            ))),
        }
    }
}

/// Load lifecycle of a sheet. `Loaded` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Error,
}

/// Declaration options of a sprite sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    pub tile_size: TileSize,
    pub frame_time: f32,
    pub structure: FxHashMap<String, StateConfig>,
    #[serde(alias = "loading")]
    pub loading_strategy: LoadingStrategy,
}

impl Default for SheetOptions {
    fn default() -> Self {
        let mut structure = FxHashMap::default();
        structure.insert(
            DEFAULT_STATE.to_string(),
            StateConfig::tile(0, DEFAULT_TILE_DEPTH),
        );
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            frame_time: DEFAULT_FRAME_TIME,
            structure,
            loading_strategy: LoadingStrategy::default(),
        }
    }
}

impl SheetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile_size(mut self, height: u32, width: u32) -> Self {
        self.tile_size = TileSize::new(height, width);
        self
    }

    pub fn with_frame_time(mut self, frame_time: f32) -> Self {
        self.frame_time = frame_time;
        self
    }

    pub fn with_loading(mut self, strategy: LoadingStrategy) -> Self {
        self.loading_strategy = strategy;
        self
    }

    /// Replace the whole structure map, dropping the default `main` tile.
    pub fn with_structure<I, K>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = (K, StateConfig)>,
        K: Into<String>,
    {
        self.structure = states.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    /// Add or replace a single state.
    pub fn with_state(mut self, name: impl Into<String>, config: StateConfig) -> Self {
        self.structure.insert(name.into(), config);
        self
    }

    pub fn state(&self, name: &str) -> Option<&StateConfig> {
        self.structure.get(name)
    }

    /// Check the options for shapes the renderer cannot honor.
    pub fn validate(&self) -> Result<(), SpriteError> {
        if self.tile_size.width == 0 || self.tile_size.height == 0 {
            return Err(SpriteError::InvalidOptions(format!(
                "tile size must be non-zero, got [{}, {}]",
                self.tile_size.height, self.tile_size.width
            )));
        }
        if !(self.frame_time.is_finite() && self.frame_time > 0.0) {
            return Err(SpriteError::InvalidOptions(format!(
                "frame time must be positive, got {}",
                self.frame_time
            )));
        }
        if self.structure.is_empty() {
            return Err(SpriteError::InvalidOptions(
                "structure has no states".to_string(),
            ));
        }
        for (name, config) in &self.structure {
            if config.is_animated() && config.length() == 0 {
                return Err(SpriteError::InvalidOptions(format!(
                    "state '{name}' has zero frames"
                )));
            }
            if let Some(next) = config.transition_to()
                && !self.structure.contains_key(next)
            {
                return Err(SpriteError::UnknownState {
                    state: next.to_string(),
                    sheet: format!("transition of '{name}'"),
                });
            }
        }
        Ok(())
    }

    /// Load sheet options from a JSON file and validate them.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, SpriteError> {
        let content = std::fs::read_to_string(path)?;
        let options: SheetOptions = serde_json::from_str(&content)?;
        options.validate()?;
        Ok(options)
    }
}

/// Outcome delivered to every [`LoadTicket`].
pub type LoadOutcome = Result<(), ResourceLoadError>;

/// A modifier registered before its sheet finished loading.
pub(crate) struct PendingModifier {
    pub id: String,
    pub transform: Arc<dyn PixelTransform>,
}

/// Mutable load state of one sheet.
#[derive(Default)]
pub struct SheetLifecycle {
    state: LoadState,
    image: Option<Arc<RgbaImage>>,
    failure: Option<ResourceLoadError>,
    waiters: Vec<Sender<LoadOutcome>>,
    pending_modifiers: Vec<PendingModifier>,
    fetches: u32,
}

impl SheetLifecycle {
    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.image.as_ref()
    }

    /// How many fetches were issued for this sheet. Never more than one.
    pub fn fetch_count(&self) -> u32 {
        self.fetches
    }

    /// Move `Unloaded -> Loading`. Returns `true` when the caller must issue the fetch.
    pub(crate) fn begin_fetch(&mut self) -> bool {
        if self.state != LoadState::Unloaded {
            return false;
        }
        self.state = LoadState::Loading;
        self.fetches += 1;
        true
    }

    /// Issue a ticket that resolves with this sheet's load outcome.
    pub(crate) fn ticket(&mut self, locator: &str) -> LoadTicket {
        match self.state {
            LoadState::Loaded => LoadTicket::ready(locator, Ok(())),
            LoadState::Error => {
                let error = self
                    .failure
                    .clone()
                    .unwrap_or_else(|| ResourceLoadError::WorkerGone {
                        locator: locator.to_string(),
                    });
                LoadTicket::ready(locator, Err(error))
            }
            LoadState::Unloaded | LoadState::Loading => {
                let (tx, rx) = bounded(1);
                self.waiters.push(tx);
                LoadTicket::pending(locator, rx)
            }
        }
    }

    /// Record the terminal outcome and wake every waiter.
    ///
    /// Returns the modifiers queued while loading; they are dropped when the
    /// load failed.
    pub(crate) fn finish(
        &mut self,
        outcome: Result<Arc<RgbaImage>, ResourceLoadError>,
    ) -> Vec<PendingModifier> {
        let result: LoadOutcome = match outcome {
            Ok(image) => {
                self.state = LoadState::Loaded;
                self.image = Some(image);
                Ok(())
            }
            Err(error) => {
                self.state = LoadState::Error;
                self.failure = Some(error.clone());
                Err(error)
            }
        };
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
        let pending = std::mem::take(&mut self.pending_modifiers);
        if result.is_ok() {
            pending
        } else {
            if !pending.is_empty() {
                warn!("Discarding {} modifier(s) of a failed sheet", pending.len());
            }
            Vec::new()
        }
    }
}

/// Shared handle to a [`SheetLifecycle`].
#[derive(Clone, Default)]
pub struct SharedLifecycle(Arc<Mutex<SheetLifecycle>>);

impl SharedLifecycle {
    pub fn lock(&self) -> MutexGuard<'_, SheetLifecycle> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One-shot completion handle returned by [`SheetControls::load`].
pub struct LoadTicket {
    locator: String,
    rx: Option<Receiver<LoadOutcome>>,
    resolved: Option<LoadOutcome>,
}

impl LoadTicket {
    fn ready(locator: &str, outcome: LoadOutcome) -> Self {
        Self {
            locator: locator.to_string(),
            rx: None,
            resolved: Some(outcome),
        }
    }

    fn pending(locator: &str, rx: Receiver<LoadOutcome>) -> Self {
        Self {
            locator: locator.to_string(),
            rx: Some(rx),
            resolved: None,
        }
    }

    fn gone(&self) -> LoadOutcome {
        Err(ResourceLoadError::WorkerGone {
            locator: self.locator.clone(),
        })
    }

    /// Non-blocking check. `None` while the load is still in flight.
    pub fn try_result(&mut self) -> Option<LoadOutcome> {
        if self.resolved.is_none()
            && let Some(rx) = &self.rx
        {
            match rx.try_recv() {
                Ok(outcome) => self.resolved = Some(outcome),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => self.resolved = Some(self.gone()),
            }
        }
        self.resolved.clone()
    }

    /// Block until the load finishes.
    pub fn wait(&mut self) -> LoadOutcome {
        if self.resolved.is_none()
            && let Some(rx) = &self.rx
        {
            let outcome = rx.recv().unwrap_or_else(|_| self.gone());
            self.resolved = Some(outcome);
        }
        self.resolved.clone().unwrap_or_else(|| self.gone())
    }

    /// Block for at most `timeout`. `None` when the load is still in flight.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        if self.resolved.is_none()
            && let Some(rx) = &self.rx
        {
            match rx.recv_timeout(timeout) {
                Ok(outcome) => self.resolved = Some(outcome),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => self.resolved = Some(self.gone()),
            }
        }
        self.resolved.clone()
    }
}

/// Render handle of a declared sheet. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SpriteSheetHandle {
    id: SheetId,
    source: Arc<str>,
    options: Arc<SheetOptions>,
}

impl SpriteSheetHandle {
    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &SheetOptions {
        &self.options
    }

    pub fn tile_size(&self) -> TileSize {
        self.options.tile_size
    }

    /// Build a sprite showing `state`. Fails fast on states the sheet does not define.
    pub fn sprite(&self, state: &str) -> Result<Sprite, SpriteError> {
        self.state(state)?;
        Ok(Sprite::new(self.id, state))
    }

    pub fn state(&self, state: &str) -> Result<&StateConfig, SpriteError> {
        self.options
            .state(state)
            .ok_or_else(|| SpriteError::UnknownState {
                state: state.to_string(),
                sheet: self.source.to_string(),
            })
    }
}

/// Imperative side of a declared sheet. Cheap to clone and usable from any thread.
#[derive(Clone)]
pub struct SheetControls {
    id: SheetId,
    source: Arc<str>,
    strategy: LoadingStrategy,
    lifecycle: SharedLifecycle,
    pipeline: Arc<ModifierPipeline>,
    loader: LoaderHandle,
}

impl SheetControls {
    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn load_state(&self) -> LoadState {
        self.lifecycle.lock().state()
    }

    pub fn pipeline(&self) -> &Arc<ModifierPipeline> {
        &self.pipeline
    }

    /// Wait for the image to be decoded.
    ///
    /// Resolves at once when the sheet is already loaded (or failed). For
    /// `Delayed` sheets this call is what starts the fetch. Concurrent calls
    /// share the outcome of the single in-flight fetch.
    pub fn load(&self) -> LoadTicket {
        let (ticket, must_fetch) = {
            let mut lifecycle = self.lifecycle.lock();
            let ticket = lifecycle.ticket(&self.source);
            let must_fetch =
                self.strategy == LoadingStrategy::Delayed && lifecycle.begin_fetch();
            (ticket, must_fetch)
        };
        if must_fetch {
            self.dispatch_fetch(false);
        }
        ticket
    }

    /// Register a pixel transform under `id` and start it.
    ///
    /// Safe to call before the sheet is loaded: the transform is queued and
    /// runs once decoding completes.
    pub fn modifier(&self, id: impl Into<String>, transform: impl PixelTransform + 'static) {
        let id = id.into();
        let transform: Arc<dyn PixelTransform> = Arc::new(transform);
        let base = {
            let mut lifecycle = self.lifecycle.lock();
            match lifecycle.state {
                LoadState::Loaded => lifecycle.image.clone(),
                LoadState::Error => {
                    warn!(
                        "Modifier '{}' ignored: {} failed to load",
                        id, self.source
                    );
                    return;
                }
                LoadState::Unloaded | LoadState::Loading => {
                    debug!("Modifier '{}' queued until {} loads", id, self.source);
                    lifecycle
                        .pending_modifiers
                        .push(PendingModifier { id, transform });
                    return;
                }
            }
        };
        if let Some(base) = base {
            let job = ModifierJob {
                sheet: self.id,
                id,
                transform,
                base,
                pipeline: self.pipeline.clone(),
            };
            if let Err(job) = self.loader.try_submit(LoaderCmd::ApplyModifier(job), false) {
                // Loader is gone: render on the caller's thread.
                if let LoaderCmd::ApplyModifier(job) = job
                    && let Err(e) = job.pipeline.render(&job.id, &job.base, job.transform.as_ref())
                {
                    warn!("Modifier '{}' on {} failed: {}", job.id, self.source, e);
                }
            }
        }
    }

    /// Start the fetch if nothing started it yet. Returns `true` when this call issued it.
    pub(crate) fn start_fetch(&self, priority: bool) -> bool {
        let must_fetch = self.lifecycle.lock().begin_fetch();
        if must_fetch {
            self.dispatch_fetch(priority);
        }
        must_fetch
    }

    fn dispatch_fetch(&self, priority: bool) {
        let job = FetchJob {
            sheet: self.id,
            locator: self.source.to_string(),
            lifecycle: self.lifecycle.clone(),
            pipeline: self.pipeline.clone(),
        };
        if !self.loader.submit(LoaderCmd::Fetch(job), priority) {
            self.lifecycle
                .lock()
                .finish(Err(ResourceLoadError::WorkerGone {
                    locator: self.source.to_string(),
                }));
        }
    }
}

/// A declared sheet as stored in [`SpriteSheetStore`](crate::resources::spritesheetstore::SpriteSheetStore).
pub struct SpriteSheet {
    handle: SpriteSheetHandle,
    controls: SheetControls,
}

impl SpriteSheet {
    pub(crate) fn new(
        id: SheetId,
        source: impl Into<Arc<str>>,
        options: SheetOptions,
        loader: LoaderHandle,
    ) -> Self {
        let source = source.into();
        let handle = SpriteSheetHandle {
            id,
            source: source.clone(),
            options: Arc::new(options),
        };
        let controls = SheetControls {
            id,
            source,
            strategy: handle.options.loading_strategy,
            lifecycle: SharedLifecycle::default(),
            pipeline: Arc::new(ModifierPipeline::new(id)),
            loader,
        };
        Self { handle, controls }
    }

    pub fn id(&self) -> SheetId {
        self.handle.id
    }

    pub fn source(&self) -> &str {
        &self.handle.source
    }

    pub fn source_arc(&self) -> Arc<str> {
        self.handle.source.clone()
    }

    pub fn options(&self) -> &SheetOptions {
        &self.handle.options
    }

    pub fn handle(&self) -> &SpriteSheetHandle {
        &self.handle
    }

    pub fn controls(&self) -> &SheetControls {
        &self.controls
    }

    pub fn pipeline(&self) -> &Arc<ModifierPipeline> {
        &self.controls.pipeline
    }

    pub fn load_state(&self) -> LoadState {
        self.controls.load_state()
    }

    pub fn fetch_count(&self) -> u32 {
        self.controls.lifecycle.lock().fetch_count()
    }

    /// Decoded base image, once loaded.
    pub fn image(&self) -> Option<Arc<RgbaImage>> {
        self.controls.lifecycle.lock().image().cloned()
    }

    pub fn state(&self, state: &str) -> Result<&StateConfig, SpriteError> {
        self.handle.state(state)
    }
}
