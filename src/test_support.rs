// Synthetic frames and glyphs shared by the test suites
use crate::device::Frame;
use image::{Rgb, RgbImage};

/// Deterministic per-pixel noise
pub fn noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut h = x.wrapping_mul(374_761_393)
        ^ y.wrapping_mul(668_265_263)
        ^ seed.wrapping_mul(2_246_822_519);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h ^ (h >> 16)) as u8
}

/// Side length of every test glyph
pub const GLYPH: u32 = 16;

/// A sparse 16x16 pattern of coloured 2x2 cells on black, distinct per seed
pub fn glyph(seed: u32) -> RgbImage {
    let mut image = RgbImage::new(GLYPH, GLYPH);
    for cy in 0..GLYPH / 2 {
        for cx in 0..GLYPH / 2 {
            if noise(cx, cy, seed) % 3 != 0 {
                continue;
            }
            let color = Rgb([
                128 + noise(cx, cy, seed + 1) / 2,
                128 + noise(cx, cy, seed + 2) / 2,
                128 + noise(cx, cy, seed + 3) / 2,
            ]);
            for dy in 0..2 {
                for dx in 0..2 {
                    image.put_pixel(cx * 2 + dx, cy * 2 + dy, color);
                }
            }
        }
    }
    image
}

/// Black canvas
pub fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::new(width, height)
}

/// Copy `patch` onto `canvas` with its top-left corner at (x, y)
pub fn paste(canvas: &mut RgbImage, patch: &RgbImage, x: u32, y: u32) {
    image::imageops::replace(canvas, patch, x as i64, y as i64);
}

/// Frame with the given glyphs pasted at the given top-left corners
pub fn scene(width: u32, height: u32, items: &[(&RgbImage, u32, u32)]) -> Frame {
    let mut canvas = blank(width, height);
    for (patch, x, y) in items {
        paste(&mut canvas, patch, *x, *y);
    }
    Frame::new(canvas, None)
}
