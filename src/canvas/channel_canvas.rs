use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, OnceLock},
};

use image::{GrayImage, RgbaImage};

use crate::{
    canvas::flatten::flatten,
    foundation::{
        core::Channel,
        error::{PixfxError, PixfxResult},
    },
};

/// Shared per-image state that all of an image's work units coordinate through.
///
/// The canvas owns its synchronization and only exposes accessors:
///
/// - the source image is decoded at most once ([`ChannelCanvas::get_or_init_source`]); the four
///   channel planes are allocated in the same step
/// - each channel plane sits behind its own lock, so different channels are written in parallel
/// - the remaining-units counter sits behind its own lock; the post-decrement value is read under
///   that lock, so exactly one caller sees it reach zero
#[derive(Debug)]
pub struct ChannelCanvas {
    input: PathBuf,
    layers: OnceLock<Result<Layers, String>>,
    remaining: Mutex<usize>,
}

#[derive(Debug)]
struct Layers {
    source: RgbaImage,
    planes: [Mutex<Plane>; 4],
}

#[derive(Debug)]
struct Plane {
    /// Ordinal of the effect that produced `pixels`, `None` while untouched.
    ordinal: Option<usize>,
    pixels: GrayImage,
}

impl ChannelCanvas {
    /// Create a canvas for `input` expecting `units` work units.
    pub fn new(input: impl Into<PathBuf>, units: usize) -> Self {
        Self {
            input: input.into(),
            layers: OnceLock::new(),
            remaining: Mutex::new(units),
        }
    }

    /// Source path this canvas decodes from.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Decode the source on first touch and return it.
    ///
    /// Concurrent first callers block until the single initializer finishes.
    ///
    /// - `Ok(Some(img))`: source available
    /// - `Err(e)`: this call ran the decode and it failed; the caller reports it
    /// - `Ok(None)`: an earlier call already failed; the caller's unit is a no-op
    pub fn get_or_init_source<F>(&self, decode: F) -> PixfxResult<Option<&RgbaImage>>
    where
        F: FnOnce(&Path) -> PixfxResult<RgbaImage>,
    {
        let mut first_failure = None;
        let layers = self.layers.get_or_init(|| match decode(&self.input) {
            Ok(source) => Ok(Layers::allocate(source)),
            Err(e) => {
                let msg = e.to_string();
                first_failure = Some(e);
                Err(msg)
            }
        });
        if let Some(e) = first_failure {
            return Err(e);
        }
        Ok(layers.as_ref().ok().map(|l| &l.source))
    }

    /// Return `true` once a decode attempt has failed for this image.
    pub fn source_failed(&self) -> bool {
        matches!(self.layers.get(), Some(Err(_)))
    }

    /// Commit a rendered plane into `channel` under that channel's lock.
    ///
    /// When several effects target the same channel, the plane from the highest `ordinal` wins,
    /// independent of the order commits arrive in. Returns `false` when the commit was superseded.
    pub fn write_channel_plane(
        &self,
        channel: Channel,
        ordinal: usize,
        pixels: GrayImage,
    ) -> PixfxResult<bool> {
        let layers = self.ready_layers()?;
        if pixels.dimensions() != layers.source.dimensions() {
            return Err(PixfxError::validation(format!(
                "plane {}x{} does not match source {}x{}",
                pixels.width(),
                pixels.height(),
                layers.source.width(),
                layers.source.height()
            )));
        }

        let mut plane = lock(&layers.planes[channel.index()])?;
        if plane.ordinal.is_some_and(|current| current > ordinal) {
            return Ok(false);
        }
        plane.ordinal = Some(ordinal);
        plane.pixels = pixels;
        Ok(true)
    }

    /// Decrement the remaining-units counter; `true` means this call completed the image.
    pub fn decrement_and_check_done(&self) -> PixfxResult<bool> {
        let mut remaining = self
            .remaining
            .lock()
            .map_err(|_| PixfxError::pipeline("counter lock poisoned"))?;
        if *remaining == 0 {
            return Err(PixfxError::pipeline(format!(
                "remaining-units counter underflow for '{}'",
                self.input.display()
            )));
        }
        *remaining -= 1;
        Ok(*remaining == 0)
    }

    /// Current counter value.
    pub fn remaining(&self) -> PixfxResult<usize> {
        self.remaining
            .lock()
            .map(|n| *n)
            .map_err(|_| PixfxError::pipeline("counter lock poisoned"))
    }

    /// Combine the four channel planes into one RGBA image.
    ///
    /// Only meaningful after [`ChannelCanvas::decrement_and_check_done`] returned `true`.
    pub fn flatten(&self) -> PixfxResult<RgbaImage> {
        let layers = self.ready_layers()?;
        let [r, g, b, a] = &layers.planes;
        let (r, g, b, a) = (lock(r)?, lock(g)?, lock(b)?, lock(a)?);
        flatten([&r.pixels, &g.pixels, &b.pixels, &a.pixels])
    }

    fn ready_layers(&self) -> PixfxResult<&Layers> {
        match self.layers.get() {
            Some(Ok(layers)) => Ok(layers),
            Some(Err(msg)) => Err(PixfxError::pipeline(format!(
                "source for '{}' is unavailable: {msg}",
                self.input.display()
            ))),
            None => Err(PixfxError::pipeline(format!(
                "source for '{}' was never initialized",
                self.input.display()
            ))),
        }
    }
}

impl Layers {
    fn allocate(source: RgbaImage) -> Self {
        let (w, h) = source.dimensions();
        let plane = || {
            Mutex::new(Plane {
                ordinal: None,
                pixels: GrayImage::new(w, h),
            })
        };
        Self {
            planes: [plane(), plane(), plane(), plane()],
            source,
        }
    }
}

fn lock(plane: &Mutex<Plane>) -> PixfxResult<MutexGuard<'_, Plane>> {
    plane
        .lock()
        .map_err(|_| PixfxError::pipeline("channel lock poisoned"))
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/channel_canvas.rs"]
mod tests;
