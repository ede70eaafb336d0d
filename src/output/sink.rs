use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::{
    assets::codec::{ImageCodec, ImageRsCodec},
    foundation::error::PixfxResult,
};

/// A flattened image on its way to the writer.
#[derive(Debug, Clone)]
pub struct OutputJob {
    /// Resolved output path.
    pub output: PathBuf,
    /// Flattened RGBA8 pixels.
    pub image: RgbaImage,
}

/// Sink contract for persisting finished images.
///
/// The writer thread calls `write` once per finished image, one at a time.
pub trait ImageSink: Send {
    /// Persist one finished image.
    fn write(&mut self, image: RgbaImage, output: &Path) -> PixfxResult<()>;
}

/// Sink that encodes through an [`ImageCodec`] and writes to disk.
#[derive(Debug, Default)]
pub struct FileSink<C = ImageRsCodec> {
    codec: C,
}

impl<C: ImageCodec> FileSink<C> {
    /// Create a file sink around `codec`.
    pub fn new(codec: C) -> Self {
        Self { codec }
    }
}

impl<C: ImageCodec> ImageSink for FileSink<C> {
    fn write(&mut self, image: RgbaImage, output: &Path) -> PixfxResult<()> {
        self.codec.encode(&image, output)
    }
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySink {
    images: Vec<(PathBuf, RgbaImage)>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Images in the order the writer delivered them.
    pub fn images(&self) -> &[(PathBuf, RgbaImage)] {
        &self.images
    }

    /// Look up the image written for `output`, if any.
    pub fn get(&self, output: &Path) -> Option<&RgbaImage> {
        self.images
            .iter()
            .find(|(p, _)| p == output)
            .map(|(_, img)| img)
    }
}

impl ImageSink for InMemorySink {
    fn write(&mut self, image: RgbaImage, output: &Path) -> PixfxResult<()> {
        self.images.push((output.to_path_buf(), image));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/sink.rs"]
mod tests;
