use std::{
    fs::File,
    io::{BufWriter, Cursor, Write as _},
    path::Path,
};

use image::{ImageFormat, RgbaImage};

use crate::foundation::error::{PixfxError, PixfxResult};

/// Image container boundary.
///
/// Sources handed to the pipeline hold alpha-premultiplied RGBA8 (see [`premultiply_alpha`]);
/// the kernels and the grayscale average operate on those premultiplied components.
pub trait ImageCodec: Send + Sync {
    /// Read and decode the image at `path`.
    ///
    /// Fails with [`PixfxError::NotFound`] when the file cannot be opened and
    /// [`PixfxError::Decode`] when its contents are not a supported image.
    fn decode(&self, path: &Path) -> PixfxResult<RgbaImage>;

    /// Encode `image` and persist it at `path`.
    ///
    /// Fails with [`PixfxError::Create`] or [`PixfxError::Encode`].
    fn encode(&self, image: &RgbaImage, path: &Path) -> PixfxResult<()>;
}

/// Default codec backed by the `image` crate.
///
/// The output format is inferred from the file extension and falls back to PNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageRsCodec;

impl ImageCodec for ImageRsCodec {
    fn decode(&self, path: &Path) -> PixfxResult<RgbaImage> {
        let bytes = std::fs::read(path).map_err(|source| PixfxError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mut image =
            decode_rgba8(&bytes).map_err(|e| PixfxError::decode(path, e.to_string()))?;
        premultiply_alpha(&mut image);
        Ok(image)
    }

    fn encode(&self, image: &RgbaImage, path: &Path) -> PixfxResult<()> {
        ensure_parent_dir(path)?;
        let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
        let file = File::create(path).map_err(|source| PixfxError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        let mut w = BufWriter::new(file);
        image
            .write_to(&mut w, format)
            .map_err(|e| PixfxError::encode(path, e.to_string()))?;
        w.flush()
            .map_err(|e| PixfxError::encode(path, e.to_string()))?;
        Ok(())
    }
}

/// Decode any format the `image` crate understands into RGBA8.
pub fn decode_rgba8(bytes: &[u8]) -> image::ImageResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Scale R, G and B by alpha in place, rounding like a 16-bit premultiply narrowed to 8 bits.
///
/// Each 8-bit component is widened to 16 bits (`c * 257`), multiplied by the widened alpha,
/// divided by `0xffff` and narrowed with `>> 8`. Opaque pixels are unchanged; fully transparent
/// pixels become black.
pub fn premultiply_alpha(image: &mut RgbaImage) {
    for px in image.pixels_mut() {
        let a = u32::from(px.0[3]) * 257;
        for c in &mut px.0[..3] {
            *c = ((u32::from(*c) * 257 * a / 0xffff) >> 8) as u8;
        }
    }
}

/// Encode `image` as PNG into memory.
pub fn encode_png(image: &RgbaImage) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> PixfxResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| PixfxError::Create {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/codec.rs"]
mod tests;
