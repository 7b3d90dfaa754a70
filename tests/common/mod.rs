// Synthetic imagery shared by the integration tests.
//
// The canvas is blocky random noise: every block has its own intensity, so the
// corners where blocks meet are FAST corners and their neighbourhoods are unique,
// which keeps BRIEF descriptors unambiguous between frames.

#![allow(dead_code)]

use image::{imageops, GrayImage, Luma};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const BLOCK: u32 = 6;

/// Blocky noise canvas of the given size.
pub fn noise_canvas(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cols = (width + BLOCK - 1) / BLOCK;
    let rows = (height + BLOCK - 1) / BLOCK;
    let cells: Vec<u8> = (0..cols * rows).map(|_| rng.gen()).collect();
    GrayImage::from_fn(width, height, |x, y| {
        Luma([cells[((y / BLOCK) * cols + x / BLOCK) as usize]])
    })
}

/// `frames` views of size `width x height` onto one canvas. The window moves by
/// `(dx, dy)` per frame, so ground content moves by `(-dx, -dy)` pixels in the image.
pub fn moving_window_sequence(
    frames: u32,
    width: u32,
    height: u32,
    (dx, dy): (u32, u32),
    seed: u64,
) -> Vec<GrayImage> {
    let margin = 8;
    let canvas = noise_canvas(
        width + dx * frames + 2 * margin,
        height + dy * frames + 2 * margin,
        seed,
    );
    (0..frames)
        .map(|k| imageops::crop_imm(&canvas, margin + k * dx, margin + k * dy, width, height).to_image())
        .collect()
}
