use image::{GrayImage, Rgba, RgbaImage};

use crate::foundation::error::{PixfxError, PixfxResult};

/// Combine four single-channel planes (R, G, B, A order) into one RGBA image.
///
/// Each plane contributes exactly one component; all four must share dimensions.
pub fn flatten(planes: [&GrayImage; 4]) -> PixfxResult<RgbaImage> {
    let (w, h) = planes[0].dimensions();
    if planes.iter().any(|p| p.dimensions() != (w, h)) {
        return Err(PixfxError::validation(
            "flatten expects four planes with identical dimensions",
        ));
    }
    let [r, g, b, a] = planes;
    Ok(RgbaImage::from_fn(w, h, |x, y| {
        Rgba([
            r.get_pixel(x, y).0[0],
            g.get_pixel(x, y).0[0],
            b.get_pixel(x, y).0[0],
            a.get_pixel(x, y).0[0],
        ])
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/flatten.rs"]
mod tests;
