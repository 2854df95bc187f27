//! Derived images produced by pixel transforms.
//!
//! Every sheet owns a [`ModifierPipeline`]. A modifier is a named
//! [`PixelTransform`] applied to a copy of the decoded base image; the
//! result is PNG encoded and published under a stable locator with a
//! monotonically increasing version. Re-registering the same id replaces the
//! previous result and bumps the version, so renderers can tell a fresh
//! image from a stale one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use log::debug;
use rustc_hash::FxHashMap;

use crate::error::SpriteError;
use crate::resources::spritesheet::SheetId;

/// In-place transform over the RGBA pixels of a sheet.
pub trait PixelTransform: Send + Sync {
    fn apply(&self, image: &mut RgbaImage);
}

impl<F> PixelTransform for F
where
    F: Fn(&mut RgbaImage) + Send + Sync,
{
    fn apply(&self, image: &mut RgbaImage) {
        self(image)
    }
}

/// Color channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Threshold {
    Above(u8),
    Below(u8),
}

/// Replaces the RGB of every pixel matching all channel thresholds. Alpha is kept.
///
/// ```
/// use spritestage::resources::modifier::{Channel, ThresholdRecolor};
///
/// // Retint saturated purple into a muted green.
/// let recolor = ThresholdRecolor::new([60, 80, 70])
///     .above(Channel::Red, 110)
///     .above(Channel::Blue, 200)
///     .below(Channel::Green, 100);
/// # let _ = recolor;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdRecolor {
    rules: Vec<(Channel, Threshold)>,
    replacement: [u8; 3],
}

impl ThresholdRecolor {
    pub fn new(replacement: [u8; 3]) -> Self {
        Self {
            rules: Vec::new(),
            replacement,
        }
    }

    /// Match pixels whose `channel` is strictly greater than `value`.
    pub fn above(mut self, channel: Channel, value: u8) -> Self {
        self.rules.push((channel, Threshold::Above(value)));
        self
    }

    /// Match pixels whose `channel` is strictly lower than `value`.
    pub fn below(mut self, channel: Channel, value: u8) -> Self {
        self.rules.push((channel, Threshold::Below(value)));
        self
    }

    fn matches(&self, pixel: &[u8; 4]) -> bool {
        self.rules.iter().all(|(channel, threshold)| {
            let v = pixel[channel.index()];
            match threshold {
                Threshold::Above(t) => v > *t,
                Threshold::Below(t) => v < *t,
            }
        })
    }
}

impl PixelTransform for ThresholdRecolor {
    fn apply(&self, image: &mut RgbaImage) {
        for pixel in image.pixels_mut() {
            if self.matches(&pixel.0) {
                pixel.0[..3].copy_from_slice(&self.replacement);
            }
        }
    }
}

/// Sets one channel of every pixel to a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillChannel {
    pub channel: Channel,
    pub value: u8,
}

impl FillChannel {
    pub fn new(channel: Channel, value: u8) -> Self {
        Self { channel, value }
    }
}

impl PixelTransform for FillChannel {
    fn apply(&self, image: &mut RgbaImage) {
        let index = self.channel.index();
        for pixel in image.pixels_mut() {
            pixel.0[index] = self.value;
        }
    }
}

/// A published modifier result.
#[derive(Debug, Clone)]
pub struct DerivedImage {
    /// Stable reference, `blob:<sheet>/<modifier>/<version>`.
    pub locator: Arc<str>,
    pub pixels: Arc<RgbaImage>,
    /// PNG encoding of `pixels`.
    pub encoded: Arc<[u8]>,
    pub version: u64,
}

#[derive(Default)]
struct ModifierCache {
    entries: FxHashMap<String, DerivedImage>,
    next_version: u64,
}

/// Per-sheet cache of modifier results.
pub struct ModifierPipeline {
    sheet: SheetId,
    cache: Mutex<ModifierCache>,
}

impl ModifierPipeline {
    pub fn new(sheet: SheetId) -> Self {
        Self {
            sheet,
            cache: Mutex::new(ModifierCache::default()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, ModifierCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sheet(&self) -> SheetId {
        self.sheet
    }

    /// Latest result published under `id`.
    pub fn get(&self, id: &str) -> Option<DerivedImage> {
        self.cache().entries.get(id).cloned()
    }

    pub fn version(&self, id: &str) -> Option<u64> {
        self.cache().entries.get(id).map(|entry| entry.version)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cache().entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Run `transform` on a copy of `base`, encode it and publish it under `id`.
    ///
    /// The base image is never touched. Returns the new version.
    pub fn render(
        &self,
        id: &str,
        base: &RgbaImage,
        transform: &dyn PixelTransform,
    ) -> Result<u64, SpriteError> {
        let mut pixels = base.clone();
        transform.apply(&mut pixels);
        let encoded = encode_png(&pixels)?;

        let mut cache = self.cache();
        cache.next_version += 1;
        let version = cache.next_version;
        let derived = DerivedImage {
            locator: format!("blob:{}/{}/{}", self.sheet, id, version).into(),
            pixels: Arc::new(pixels),
            encoded: encoded.into(),
            version,
        };
        debug!("Published modifier {} as {}", id, derived.locator);
        cache.entries.insert(id.to_string(), derived);
        Ok(version)
    }
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, SpriteError> {
    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn purple_and_grey() -> RgbaImage {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([150, 40, 230, 200]));
        image.put_pixel(1, 0, Rgba([120, 120, 120, 255]));
        image
    }

    fn demo_recolor() -> ThresholdRecolor {
        ThresholdRecolor::new([60, 80, 70])
            .above(Channel::Red, 110)
            .above(Channel::Blue, 200)
            .below(Channel::Green, 100)
    }

    #[test]
    fn recolor_only_touches_matching_pixels() {
        let mut image = purple_and_grey();
        demo_recolor().apply(&mut image);
        assert_eq!(image.get_pixel(0, 0), &Rgba([60, 80, 70, 200]));
        assert_eq!(image.get_pixel(1, 0), &Rgba([120, 120, 120, 255]));
    }

    #[test]
    fn thresholds_are_strict() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([110, 0, 0, 255]));
        ThresholdRecolor::new([1, 2, 3])
            .above(Channel::Red, 110)
            .apply(&mut image);
        assert_eq!(image.get_pixel(0, 0), &Rgba([110, 0, 0, 255]));
    }

    #[test]
    fn fill_channel_sets_every_pixel() {
        let mut image = purple_and_grey();
        FillChannel::new(Channel::Alpha, 0).apply(&mut image);
        assert!(image.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn closures_are_transforms() {
        let mut image = purple_and_grey();
        let invert = |img: &mut RgbaImage| {
            for p in img.pixels_mut() {
                p.0[0] = 255 - p.0[0];
            }
        };
        invert.apply(&mut image);
        assert_eq!(image.get_pixel(1, 0).0[0], 135);
    }

    #[test]
    fn render_keeps_base_and_bumps_version() {
        let pipeline = ModifierPipeline::new(SheetId(3));
        let base = purple_and_grey();

        let first = pipeline.render("green", &base, &demo_recolor()).unwrap();
        let second = pipeline.render("green", &base, &demo_recolor()).unwrap();

        assert!(second > first);
        assert_eq!(base.get_pixel(0, 0), &Rgba([150, 40, 230, 200]));
        let derived = pipeline.get("green").unwrap();
        assert_eq!(derived.version, second);
        assert_eq!(&*derived.locator, format!("blob:sheet-3/green/{second}"));
        assert_eq!(derived.pixels.get_pixel(0, 0), &Rgba([60, 80, 70, 200]));
        assert!(pipeline.get("other").is_none());
    }

    #[test]
    fn encoded_result_decodes_to_same_pixels() {
        let pipeline = ModifierPipeline::new(SheetId(0));
        pipeline
            .render("fill", &purple_and_grey(), &FillChannel::new(Channel::Red, 9))
            .unwrap();
        let derived = pipeline.get("fill").unwrap();
        let decoded = image::load_from_memory(&derived.encoded).unwrap().to_rgba8();
        assert_eq!(decoded, *derived.pixels);
    }
}
