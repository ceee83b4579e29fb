// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image kernel primitives for floor plan processing
//!
//! All transforms read their input and write a fresh output buffer; no
//! function reads and writes the same buffer during computation.

use image::{GrayImage, Luma};

/// Apply Gaussian blur for noise reduction
///
/// Builds a `(2·radius+1)²` kernel with `σ = radius/2`, normalized to sum 1,
/// and convolves with edge-replicated (clamped) boundary handling. A radius
/// of 0 is an identity copy.
pub fn gaussian_blur(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }

    let width = image.width();
    let height = image.height();
    let size = (2 * radius + 1) as usize;
    let sigma = radius as f64 / 2.0;
    let r = radius as i64;

    // Normalized Gaussian kernel
    let mut kernel = vec![0.0f64; size * size];
    let mut sum = 0.0;
    for dy in -r..=r {
        for dx in -r..=r {
            let value = (-((dx * dx + dy * dy) as f64) / (2.0 * sigma * sigma)).exp();
            kernel[((dy + r) as usize) * size + (dx + r) as usize] = value;
            sum += value;
        }
    }
    for value in &mut kernel {
        *value /= sum;
    }

    let mut output = GrayImage::new(width, height);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut acc = 0.0;
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = (x + dx).clamp(0, width as i64 - 1) as u32;
                    let sy = (y + dy).clamp(0, height as i64 - 1) as u32;
                    let weight = kernel[((dy + r) as usize) * size + (dx + r) as usize];
                    acc += image.get_pixel(sx, sy).0[0] as f64 * weight;
                }
            }
            output.put_pixel(x as u32, y as u32, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }

    output
}

/// Sobel Gx/Gy kernels (3x3), row-major
const SOBEL_GX: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
const SOBEL_GY: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

/// Sobel gradient magnitude
///
/// Outputs `clamp(0, 255, sqrt(gx² + gy²))` per pixel. The 1-pixel image
/// border is left unprocessed at 0.
pub fn sobel_gradient(image: &GrayImage) -> GrayImage {
    let width = image.width();
    let height = image.height();
    let mut output = GrayImage::new(width, height);

    if width < 3 || height < 3 {
        return output;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx = 0i32;
            let mut gy = 0i32;
            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let value = image.get_pixel(x + kx - 1, y + ky - 1).0[0] as i32;
                    gx += value * SOBEL_GX[(ky * 3 + kx) as usize];
                    gy += value * SOBEL_GY[(ky * 3 + kx) as usize];
                }
            }
            let magnitude = ((gx * gx + gy * gy) as f64).sqrt().clamp(0.0, 255.0);
            output.put_pixel(x, y, Luma([magnitude as u8]));
        }
    }

    output
}

/// Simple threshold - pixels at or above become white, below become black
pub fn binarize(image: &GrayImage, threshold_value: u8) -> GrayImage {
    let mut output = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel.0[0] >= threshold_value { 255 } else { 0 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Adopt a one-byte-per-pixel intensity array as a grayscale image
///
/// Returns `None` when the buffer length does not match `width * height`.
pub fn gray_from_raw(data: Vec<u8>, width: u32, height: u32) -> Option<GrayImage> {
    GrayImage::from_raw(width, height, data)
}
