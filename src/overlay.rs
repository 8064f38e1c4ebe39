//! # Overlay Loading
//!
//! Decodes a bitmap into the sparse pixel list the diff engine consumes.
//! Every decoded pixel is quantized against the palette; fully transparent
//! pixels and pixels that quantize to a designated "transparent" palette
//! color are omitted. Decoding can sub-sample the source on a fixed stride
//! and translate by an origin offset.
//!
//! Scan order is row-major, so the pixel list comes out in the order the
//! source image stores it. An explicit, seedable shuffle is applied
//! afterwards for visual variety; a fixed seed makes the permutation
//! deterministic for tests.

use image::DynamicImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::canvas::Pixel;
use crate::error::{WardenError, WardenResult};
use crate::palette::Quantizer;

/// Sub-sampling pattern: keep source coordinates `init, init + step,
/// init + 2*step, ...` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stride {
    pub init: u32,
    pub step: u32,
}

/// Decode-time options for turning a bitmap into canvas pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Translation applied to every decoded coordinate.
    pub offset: (i32, i32),
    /// Optional sub-sampling; `None` keeps every pixel.
    pub stride: Option<Stride>,
    /// Palette index treated as transparent after quantization.
    pub transparent_color: Option<u8>,
}

/// Decode `image` into a sparse pixel list, quantized against the palette.
pub fn decode_pixels(
    image: &DynamicImage,
    options: &DecodeOptions,
    quantizer: &Quantizer,
) -> WardenResult<Vec<Pixel>> {
    if matches!(options.stride, Some(Stride { step: 0, .. })) {
        return Err(WardenError::config("stride.step", "must be greater than 0"));
    }

    let rgba = image.to_rgba8();
    let mut pixels = Vec::new();
    let keep = |coord: u32| match options.stride {
        Some(Stride { init, step }) => coord >= init && (coord - init) % step == 0,
        None => true,
    };

    for y in 0..rgba.height() {
        if !keep(y) {
            continue;
        }
        for x in 0..rgba.width() {
            if !keep(x) {
                continue;
            }
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            if a == 0 {
                continue;
            }
            let color = quantizer.nearest([r, g, b]);
            if options.transparent_color == Some(color) {
                continue;
            }
            pixels.push(Pixel {
                x: options.offset.0 + x as i32,
                y: options.offset.1 + y as i32,
                color,
            });
        }
    }
    Ok(pixels)
}

/// Decode raw bytes (PNG or any format the `image` crate recognizes).
pub fn decode_bytes(
    bytes: &[u8],
    options: &DecodeOptions,
    quantizer: &Quantizer,
) -> WardenResult<Vec<Pixel>> {
    let image =
        image::load_from_memory(bytes).map_err(|e| WardenError::decode(e.to_string()))?;
    decode_pixels(&image, options, quantizer)
}

/// Shuffle the pixel list in place with a seeded generator.
///
/// Pure in the sense that the permutation is a function of (input, seed),
/// so tests can fix the seed or skip the call entirely.
pub fn shuffle_pixels(pixels: &mut [Pixel], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    pixels.shuffle(&mut rng);
}
