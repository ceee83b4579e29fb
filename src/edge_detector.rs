// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simplified Canny edge detection
//!
//! Pipeline: Gaussian blur → Sobel gradient → double threshold with
//! 8-connected hysteresis linking. There is deliberately no non-maximum
//! suppression: gradient ridges may come out several pixels wide, and the
//! downstream Hough tolerances assume that.

use crate::image_ops::{gaussian_blur, sobel_gradient};
use crate::types::ExtractionConfig;
use image::{GrayImage, Luma};
use tracing::debug;

const BLUR_RADIUS: u32 = 1;

/// Detect edges in a grayscale floor plan image
///
/// Returns a binary (0/255) edge map with the same dimensions as the input.
/// Pixels below `low_threshold` are dropped; pixels above `high_threshold`
/// become strong edges; pixels in between are kept only when an 8-connected
/// neighbor is a strong edge.
pub fn detect_edges(image: &GrayImage, config: &ExtractionConfig) -> GrayImage {
    let blurred = gaussian_blur(image, BLUR_RADIUS);
    let gradient = sobel_gradient(&blurred);

    let width = gradient.width();
    let height = gradient.height();

    // First pass: mark strong edges
    let mut strong = vec![false; (width * height) as usize];
    for (x, y, pixel) in gradient.enumerate_pixels() {
        if pixel.0[0] as f64 > config.high_threshold {
            strong[(y * width + x) as usize] = true;
        }
    }

    // Second pass: keep strong edges, promote weak pixels next to one
    let mut edges = GrayImage::new(width, height);
    let mut edge_count = 0usize;
    for (x, y, pixel) in gradient.enumerate_pixels() {
        let magnitude = pixel.0[0] as f64;
        if magnitude < config.low_threshold {
            continue;
        }

        let is_edge = if strong[(y * width + x) as usize] {
            true
        } else {
            has_strong_neighbor(&strong, x, y, width, height)
        };

        if is_edge {
            edges.put_pixel(x, y, Luma([255]));
            edge_count += 1;
        }
    }

    debug!(edge_count, width, height, "edge detection complete");

    edges
}

/// Check the 8-connected neighborhood for a strong edge
fn has_strong_neighbor(strong: &[bool], x: u32, y: u32, width: u32, height: u32) -> bool {
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || nx >= width as i64 || ny < 0 || ny >= height as i64 {
                continue;
            }
            if strong[(ny as u32 * width + nx as u32) as usize] {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_with_step() -> GrayImage {
        let mut img = GrayImage::new(30, 30);
        for y in 0..30 {
            for x in 15..30 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img
    }

    #[test]
    fn test_detects_step_edge() {
        let img = image_with_step();
        let edges = detect_edges(&img, &ExtractionConfig::default());

        // Edge pixels appear around the step, flat areas stay empty
        let step_column: u32 = (13..18).map(|x| edges.get_pixel(x, 15).0[0] as u32).sum();
        assert!(step_column > 0, "expected edge response at the step");
        assert_eq!(edges.get_pixel(3, 15).0[0], 0);
        assert_eq!(edges.get_pixel(27, 15).0[0], 0);
    }

    #[test]
    fn test_output_is_binary() {
        let img = image_with_step();
        let edges = detect_edges(&img, &ExtractionConfig::default());

        for pixel in edges.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }

    #[test]
    fn test_low_threshold_drops_weak_gradients() {
        let mut img = GrayImage::new(20, 20);
        // Shallow ramp: neighboring intensities differ by 2, gradient stays weak
        for y in 0..20 {
            for x in 0..20 {
                img.put_pixel(x, y, Luma([(x * 2) as u8]));
            }
        }

        let edges = detect_edges(&img, &ExtractionConfig::default());

        for pixel in edges.pixels() {
            assert_eq!(pixel.0[0], 0);
        }
    }

    #[test]
    fn test_edge_detection_is_deterministic() {
        // Two independent copies of the same input yield bit-identical output
        let a = image_with_step();
        let b = image_with_step();
        let config = ExtractionConfig::default();

        let edges_a = detect_edges(&a, &config);
        let edges_b = detect_edges(&b, &config);

        assert_eq!(edges_a.as_raw(), edges_b.as_raw());
    }
}
