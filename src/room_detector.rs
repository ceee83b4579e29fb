// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room extraction via connected-component flood fill
//!
//! Background (0-valued) pixels are grouped into 4-connected regions with a
//! breadth-first fill; regions below the configured minimum area are dropped.
//! The boundary polygon is the region's bounding-box rectangle — an
//! axis-aligned approximation, not a traced contour.

use crate::types::{next_room_id, ExtractionConfig, PixelRect, Point2D, Region, Room};
use image::GrayImage;
use std::collections::VecDeque;
use tracing::debug;

/// Extract background regions from a binary plan image
///
/// Scans in row-major order; every unvisited 0-valued pixel seeds a new
/// 4-connected region. Regions smaller than `min_room_area` are discarded but
/// their pixels stay marked visited so they are not rescanned.
pub fn extract_regions(binary: &GrayImage, config: &ExtractionConfig) -> Vec<Region> {
    let width = binary.width();
    let height = binary.height();
    let mut visited = vec![false; (width as usize) * (height as usize)];
    let mut regions = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let idx = (y as usize) * (width as usize) + x as usize;
            if visited[idx] {
                continue;
            }
            if binary.get_pixel(x, y).0[0] != 0 {
                visited[idx] = true;
                continue;
            }

            let region = flood_fill(binary, x, y, &mut visited);
            if region.area >= config.min_room_area {
                regions.push(region);
            }
        }
    }

    debug!(regions = regions.len(), "region extraction complete");

    regions
}

/// Breadth-first 4-connected fill from a seed pixel
fn flood_fill(binary: &GrayImage, start_x: u32, start_y: u32, visited: &mut [bool]) -> Region {
    let width = binary.width();
    let height = binary.height();

    let mut pixels = Vec::new();
    let mut bbox = PixelRect::at(start_x, start_y);
    let mut queue = VecDeque::new();

    queue.push_back((start_x, start_y));
    visited[(start_y as usize) * (width as usize) + start_x as usize] = true;

    while let Some((x, y)) = queue.pop_front() {
        pixels.push((x, y));
        bbox.include(x, y);

        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if nx >= width || ny >= height {
                continue;
            }
            let idx = (ny as usize) * (width as usize) + nx as usize;
            if !visited[idx] && binary.get_pixel(nx, ny).0[0] == 0 {
                visited[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    let area = pixels.len();
    Region {
        id: next_room_id(),
        pixels,
        bbox,
        area,
    }
}

/// Promote regions to rooms
///
/// The polygon is the four corners of the region's bounding box; the centroid
/// is the arithmetic mean of all member pixel coordinates.
pub fn regions_to_rooms(regions: Vec<Region>) -> Vec<Room> {
    regions.into_iter().map(region_to_room).collect()
}

fn region_to_room(region: Region) -> Room {
    let count = region.pixels.len() as f64;
    let (sum_x, sum_y) = region
        .pixels
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
    let centroid = Point2D::new(sum_x / count, sum_y / count);

    let bbox = region.bbox;
    let polygon = vec![
        Point2D::new(bbox.min_x as f64, bbox.min_y as f64),
        Point2D::new(bbox.max_x as f64, bbox.min_y as f64),
        Point2D::new(bbox.max_x as f64, bbox.max_y as f64),
        Point2D::new(bbox.min_x as f64, bbox.max_y as f64),
    ];

    Room {
        id: region.id,
        polygon,
        centroid,
        area: region.area as f64,
        bbox,
    }
}
