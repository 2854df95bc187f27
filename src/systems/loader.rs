//! Sprite loader thread and the systems that bridge it with the ECS world.
//!
//! - [`sprite_loader_thread`] runs on its own OS thread. It fetches and
//!   decodes sheet images and runs modifier transforms, so neither blocks a
//!   frame.
//! - [`poll_loader_messages`] drains the thread's receiver into
//!   `Messages<LoaderMessage>` each frame.
//! - [`update_loader_messages`] advances the message queue.
//! - [`dispatch_loader_events`] turns messages into observer events.
//!
//! The priority lane is always drained before the regular lane, which is how
//! `Preload` sheets jump ahead of `Immediate` ones.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, select};
use image::RgbaImage;
use log::{error, info, warn};

use crate::error::ResourceLoadError;
use crate::events::modifier::ModifierPublishedEvent;
use crate::events::spritesheet::{SpriteSheetLoadFailedEvent, SpriteSheetLoadedEvent};
use crate::resources::loader::{
    FetchJob, ImageSource, LoaderCmd, LoaderMessage, ModifierJob, SpriteLoaderBridge,
};

/// Decode encoded bytes into RGBA pixels.
pub fn decode_sheet(locator: &str, bytes: &[u8]) -> Result<RgbaImage, ResourceLoadError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ResourceLoadError::Decode {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(ResourceLoadError::EmptyImage {
            locator: locator.to_string(),
        });
    }
    Ok(image)
}

fn next_command(rx_priority: &Receiver<LoaderCmd>, rx_cmd: &Receiver<LoaderCmd>) -> Option<LoaderCmd> {
    if let Ok(cmd) = rx_priority.try_recv() {
        return Some(cmd);
    }
    select! {
        recv(rx_priority) -> cmd => cmd.ok(),
        recv(rx_cmd) -> cmd => cmd.ok(),
    }
}

/// Entry point of the loader thread.
///
/// Blocks until it receives [`LoaderCmd::Shutdown`] or every sender is gone.
/// Fetches still queued at that point are settled as
/// [`ResourceLoadError::WorkerGone`] so no ticket waits forever. Queued
/// modifier jobs are run to completion.
pub fn sprite_loader_thread(
    rx_priority: Receiver<LoaderCmd>,
    rx_cmd: Receiver<LoaderCmd>,
    tx_msg: Sender<LoaderMessage>,
    source: Box<dyn ImageSource>,
) {
    info!(
        "Sprite loader thread starting (id={:?})",
        std::thread::current().id()
    );

    while let Some(cmd) = next_command(&rx_priority, &rx_cmd) {
        match cmd {
            LoaderCmd::Fetch(job) => run_fetch(job, source.as_ref(), &tx_msg),
            LoaderCmd::ApplyModifier(job) => run_modifier(job, &tx_msg),
            LoaderCmd::Shutdown => break,
        }
    }

    // Modifiers already have their base image, so they still run.
    for cmd in rx_priority.try_iter().chain(rx_cmd.try_iter()) {
        match cmd {
            LoaderCmd::Fetch(job) => {
                let gone = ResourceLoadError::WorkerGone {
                    locator: job.locator.clone(),
                };
                job.lifecycle.lock().finish(Err(gone));
            }
            LoaderCmd::ApplyModifier(job) => run_modifier(job, &tx_msg),
            LoaderCmd::Shutdown => {}
        }
    }

    info!("Sprite loader thread exiting");
}

fn run_fetch(job: FetchJob, source: &dyn ImageSource, tx_msg: &Sender<LoaderMessage>) {
    let outcome = source
        .fetch(&job.locator)
        .map_err(|reason| ResourceLoadError::Fetch {
            locator: job.locator.clone(),
            reason,
        })
        .and_then(|bytes| decode_sheet(&job.locator, &bytes))
        .map(Arc::new);

    match outcome {
        Ok(image) => {
            info!(
                "Loaded sprite sheet {} ({}x{})",
                job.locator,
                image.width(),
                image.height()
            );
            let pending = job.lifecycle.lock().finish(Ok(image.clone()));
            let _ = tx_msg.send(LoaderMessage::SheetLoaded { sheet: job.sheet });
            for modifier in pending {
                run_modifier(
                    ModifierJob {
                        sheet: job.sheet,
                        id: modifier.id,
                        transform: modifier.transform,
                        base: image.clone(),
                        pipeline: job.pipeline.clone(),
                    },
                    tx_msg,
                );
            }
        }
        Err(err) => {
            error!("{}", err);
            job.lifecycle.lock().finish(Err(err.clone()));
            let _ = tx_msg.send(LoaderMessage::SheetLoadFailed {
                sheet: job.sheet,
                error: err,
            });
        }
    }
}

fn run_modifier(job: ModifierJob, tx_msg: &Sender<LoaderMessage>) {
    match job
        .pipeline
        .render(&job.id, &job.base, job.transform.as_ref())
    {
        Ok(version) => {
            let _ = tx_msg.send(LoaderMessage::ModifierPublished {
                sheet: job.sheet,
                id: job.id,
                version,
            });
        }
        Err(err) => warn!("Modifier '{}' on {} failed: {}", job.id, job.sheet, err),
    }
}

/// Drain pending loader notifications into `Messages<LoaderMessage>`.
pub fn poll_loader_messages(
    bridge: Res<SpriteLoaderBridge>,
    mut writer: MessageWriter<LoaderMessage>,
) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the ECS message queue for [`LoaderMessage`].
pub fn update_loader_messages(mut messages: ResMut<Messages<LoaderMessage>>) {
    messages.update();
}

/// Trigger the observer event matching each loader notification.
pub fn dispatch_loader_events(mut reader: MessageReader<LoaderMessage>, mut commands: Commands) {
    for message in reader.read() {
        match message {
            LoaderMessage::SheetLoaded { sheet } => {
                commands.trigger(SpriteSheetLoadedEvent { sheet: *sheet });
            }
            LoaderMessage::SheetLoadFailed { sheet, error } => {
                commands.trigger(SpriteSheetLoadFailedEvent {
                    sheet: *sheet,
                    error: error.clone(),
                });
            }
            LoaderMessage::ModifierPublished { sheet, id, version } => {
                commands.trigger(ModifierPublishedEvent {
                    sheet: *sheet,
                    id: id.clone(),
                    version: *version,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::modifier::encode_png;
    use image::Rgba;

    #[test]
    fn decode_sheet_reads_png() {
        let bytes = encode_png(&RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]))).unwrap();
        let image = decode_sheet("a.png", &bytes).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
    }

    #[test]
    fn decode_sheet_rejects_garbage() {
        let err = decode_sheet("a.png", b"not an image").unwrap_err();
        assert!(matches!(err, ResourceLoadError::Decode { .. }));
        assert!(err.to_string().contains("a.png"));
    }
}
