//! Pure per-channel effect kernels.
//!
//! Neighborhoods are 9 samples in row-major 3x3 order centered on the target pixel. Samples that
//! fall outside the image are `0` (zero padding); this boundary policy is part of the output
//! format and must not change to mirroring or clamping.

use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::foundation::core::{Channel, Effect};

const EDGE: [i32; 9] = [-1, -1, -1, -1, 8, -1, -1, -1, -1];
const SHARPEN: [i32; 9] = [0, -1, 0, -1, 5, -1, 0, -1, 0];

/// Alpha value written by every effect.
///
/// Source alpha is discarded: effects never carry transparency through. Kept for output
/// compatibility even though it flattens translucent inputs to opaque.
pub const OPAQUE: u8 = 255;

/// Apply `effect` to a 3x3 neighborhood and return the new center sample.
///
/// Grayscale does not look at neighbors (see [`grayscale_average`]); it passes the center through.
pub fn apply(effect: Effect, neighborhood: &[u8; 9]) -> u8 {
    match effect {
        Effect::Blur => {
            let sum: u32 = neighborhood.iter().map(|&v| u32::from(v)).sum();
            (sum / 9).min(255) as u8
        }
        Effect::Edge => convolve(&EDGE, neighborhood),
        Effect::Sharpen => convolve(&SHARPEN, neighborhood),
        Effect::Grayscale => neighborhood[4],
    }
}

fn convolve(kernel: &[i32; 9], neighborhood: &[u8; 9]) -> u8 {
    // Both kernels are symmetric, so no flip is needed.
    let acc: i32 = kernel
        .iter()
        .zip(neighborhood)
        .map(|(&k, &v)| k * i32::from(v))
        .sum();
    acc.clamp(0, 255) as u8
}

/// Integer mean of the R, G, B components of one pixel.
pub fn grayscale_average(px: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = px.0;
    ((u16::from(r) + u16::from(g) + u16::from(b)) / 3) as u8
}

/// Read one channel of `source` at a signed coordinate; out-of-bounds reads yield `0`.
pub fn sample(source: &RgbaImage, channel: Channel, x: i64, y: i64) -> u8 {
    let (w, h) = source.dimensions();
    if x < 0 || y < 0 || x >= i64::from(w) || y >= i64::from(h) {
        return 0;
    }
    source.get_pixel(x as u32, y as u32).0[channel.index()]
}

/// Gather the zero-padded 3x3 neighborhood of `(x, y)` for one channel.
pub fn neighborhood(source: &RgbaImage, channel: Channel, x: u32, y: u32) -> [u8; 9] {
    let mut out = [0u8; 9];
    let (cx, cy) = (i64::from(x), i64::from(y));
    let mut k = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            out[k] = sample(source, channel, cx + dx, cy + dy);
            k += 1;
        }
    }
    out
}

/// Run `effect` for `channel` over every pixel of `source` and return the resulting plane.
pub fn render_plane(source: &RgbaImage, effect: Effect, channel: Channel) -> GrayImage {
    let (w, h) = source.dimensions();
    if channel == Channel::A {
        return GrayImage::from_pixel(w, h, Luma([OPAQUE]));
    }
    match effect {
        Effect::Grayscale => {
            GrayImage::from_fn(w, h, |x, y| Luma([grayscale_average(source.get_pixel(x, y))]))
        }
        _ => GrayImage::from_fn(w, h, |x, y| {
            Luma([apply(effect, &neighborhood(source, channel, x, y))])
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/kernel.rs"]
mod tests;
