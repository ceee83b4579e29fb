// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line detection and merging
//!
//! A standard Hough transform votes every edge pixel into a flat row-major
//! accumulator (`angle * num_dists + dist`). Peaks become infinite lines that
//! are clipped against the image boundary; near-orthogonal candidates are then
//! greedily merged into walls.

use crate::types::{ExtractionConfig, LineCandidate, Point2D, Wall};
use image::GrayImage;
use std::f64::consts::PI;
use tracing::debug;

const NUM_ANGLES: usize = 180;

/// Detect line candidates in a binary edge map
///
/// Peaks are accumulator cells at or above `hough_threshold` that are local
/// maxima in their 3×3 angle/distance neighborhood; a strictly greater
/// neighbor disqualifies a cell, equal neighbors do not. Candidates are
/// returned sorted by votes descending, ties in accumulator scan order.
pub fn detect_lines(edges: &GrayImage, config: &ExtractionConfig) -> Vec<LineCandidate> {
    let width = edges.width();
    let height = edges.height();

    let diagonal = ((width * width + height * height) as f64).sqrt();
    let num_dists = (2.0 * diagonal).ceil() as usize;

    // Precompute sin/cos tables, one entry per degree
    let mut cos_table = [0.0f64; NUM_ANGLES];
    let mut sin_table = [0.0f64; NUM_ANGLES];
    for (i, (c, s)) in cos_table.iter_mut().zip(sin_table.iter_mut()).enumerate() {
        let theta = i as f64 * PI / 180.0;
        *c = theta.cos();
        *s = theta.sin();
    }

    // Vote every edge pixel into the flat accumulator
    let mut accumulator = vec![0u32; NUM_ANGLES * num_dists];
    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        for angle in 0..NUM_ANGLES {
            let dist = x as f64 * cos_table[angle] + y as f64 * sin_table[angle];
            let dist_idx = (dist + diagonal).round() as usize;
            if dist_idx < num_dists {
                accumulator[angle * num_dists + dist_idx] += 1;
            }
        }
    }

    // Collect peaks in scan order
    let mut peaks: Vec<(usize, usize, u32)> = Vec::new();
    for angle in 0..NUM_ANGLES {
        for dist_idx in 0..num_dists {
            let votes = accumulator[angle * num_dists + dist_idx];
            if votes < config.hough_threshold {
                continue;
            }
            if is_local_maximum(&accumulator, num_dists, angle, dist_idx, votes) {
                peaks.push((angle, dist_idx, votes));
            }
        }
    }

    // Votes descending; stable sort keeps scan order for ties
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    let mut candidates = Vec::new();
    for (angle, dist_idx, votes) in peaks {
        let rho = dist_idx as f64 - diagonal;
        if let Some((start, end)) =
            clip_to_image(cos_table[angle], sin_table[angle], rho, width, height)
        {
            let candidate = LineCandidate {
                start,
                end,
                votes,
                angle_deg: angle as f64,
                dist: rho,
            };
            if candidate.length() >= config.min_line_length {
                candidates.push(candidate);
            }
        }
    }

    debug!(candidates = candidates.len(), "hough line detection complete");

    candidates
}

/// Strict 3×3 local-maximum test; ties are retained
fn is_local_maximum(
    accumulator: &[u32],
    num_dists: usize,
    angle: usize,
    dist_idx: usize,
    votes: u32,
) -> bool {
    for da in -1i64..=1 {
        for dd in -1i64..=1 {
            if da == 0 && dd == 0 {
                continue;
            }
            let na = angle as i64 + da;
            let nd = dist_idx as i64 + dd;
            if na < 0 || na >= NUM_ANGLES as i64 || nd < 0 || nd >= num_dists as i64 {
                continue;
            }
            if accumulator[na as usize * num_dists + nd as usize] > votes {
                return false;
            }
        }
    }
    true
}

/// Clip the infinite line `x·cosθ + y·sinθ = ρ` to the image rectangle
///
/// Intersections with the four boundary edges are deduplicated within 1 px;
/// at least two distinct points are required, otherwise the line is discarded.
fn clip_to_image(
    cos_t: f64,
    sin_t: f64,
    rho: f64,
    width: u32,
    height: u32,
) -> Option<(Point2D, Point2D)> {
    let w = width as f64 - 1.0;
    let h = height as f64 - 1.0;
    let mut points: Vec<Point2D> = Vec::with_capacity(4);

    let push_distinct = |p: Point2D, points: &mut Vec<Point2D>| {
        if points.iter().all(|q| q.distance_to(&p) >= 1.0) {
            points.push(p);
        }
    };

    if sin_t.abs() > 1e-9 {
        // Left edge x = 0
        let y = rho / sin_t;
        if (0.0..=h).contains(&y) {
            push_distinct(Point2D::new(0.0, y), &mut points);
        }
        // Right edge x = w
        let y = (rho - w * cos_t) / sin_t;
        if (0.0..=h).contains(&y) {
            push_distinct(Point2D::new(w, y), &mut points);
        }
    }
    if cos_t.abs() > 1e-9 {
        // Top edge y = 0
        let x = rho / cos_t;
        if (0.0..=w).contains(&x) {
            push_distinct(Point2D::new(x, 0.0), &mut points);
        }
        // Bottom edge y = h
        let x = (rho - h * sin_t) / cos_t;
        if (0.0..=w).contains(&x) {
            push_distinct(Point2D::new(x, h), &mut points);
        }
    }

    if points.len() >= 2 {
        Some((points[0], points[1]))
    } else {
        None
    }
}

/// Merge near-duplicate orthogonal line candidates into walls
///
/// Candidates are first filtered to near-horizontal/near-vertical (angle
/// within `angle_threshold_deg` of 0, 90, or 180). Remaining lines are
/// greedily grouped: a seed absorbs every unused line whose angle differs by
/// less than `merge_angle_threshold_deg` and whose midpoint lies within
/// `distance_threshold` of the seed's midpoint. Groups are collapsed by a
/// vote-weighted endpoint average.
pub fn merge_lines(lines: &[LineCandidate], config: &ExtractionConfig) -> Vec<Wall> {
    let orthogonal: Vec<&LineCandidate> = lines
        .iter()
        .filter(|line| is_near_orthogonal(line.angle_deg, config.angle_threshold_deg))
        .collect();

    let mut walls = Vec::new();
    let mut used = vec![false; orthogonal.len()];

    for i in 0..orthogonal.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let seed = orthogonal[i];
        let mut group = vec![seed];

        for (j, candidate) in orthogonal.iter().enumerate() {
            if used[j] {
                continue;
            }
            let angle_diff = (seed.angle_deg - candidate.angle_deg).abs();
            // Midpoint distance is an approximation of line-to-line distance,
            // not a perpendicular measure
            let midpoint_dist = seed.midpoint().distance_to(&candidate.midpoint());
            if angle_diff < config.merge_angle_threshold_deg
                && midpoint_dist < config.distance_threshold
            {
                used[j] = true;
                group.push(candidate);
            }
        }

        walls.push(merge_group(&group));
    }

    debug!(
        input = lines.len(),
        orthogonal = orthogonal.len(),
        walls = walls.len(),
        "line merging complete"
    );

    walls
}

/// Angle (degrees, normalized to [0, 180)) close to 0, 90, or 180
fn is_near_orthogonal(angle_deg: f64, threshold_deg: f64) -> bool {
    let angle = angle_deg.rem_euclid(180.0);
    angle < threshold_deg || (angle - 90.0).abs() < threshold_deg || angle > 180.0 - threshold_deg
}

/// Vote-weighted average of a candidate group
fn merge_group(group: &[&LineCandidate]) -> Wall {
    let total: f64 = group.iter().map(|line| line.votes.max(1) as f64).sum();

    let mut start = Point2D::new(0.0, 0.0);
    let mut end = Point2D::new(0.0, 0.0);
    let mut angle = 0.0;
    let mut votes = 0u32;

    for line in group {
        let weight = line.votes.max(1) as f64 / total;
        start.x += line.start.x * weight;
        start.y += line.start.y * weight;
        end.x += line.end.x * weight;
        end.y += line.end.y * weight;
        angle += line.angle_deg * weight;
        votes += line.votes.max(1);
    }

    Wall {
        start,
        end,
        angle_deg: angle,
        votes,
    }
}

/// Distance from a point to a line segment
///
/// Projects the point onto the segment, clamping the parametric position to
/// `[0, 1]`, and measures to the projection.
pub fn point_to_segment_distance(point: &Point2D, start: &Point2D, end: &Point2D) -> f64 {
    let ab = end.to_nalgebra() - start.to_nalgebra();
    let ap = point.to_nalgebra() - start.to_nalgebra();
    let length_sq = ab.norm_squared();

    if length_sq < 1e-10 {
        return point.distance_to(start);
    }

    let t = (ap.dot(&ab) / length_sq).clamp(0.0, 1.0);
    let projection = start.to_nalgebra() + ab * t;
    (point.to_nalgebra() - projection).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn candidate(x1: f64, y1: f64, x2: f64, y2: f64, votes: u32, angle_deg: f64) -> LineCandidate {
        LineCandidate {
            start: Point2D::new(x1, y1),
            end: Point2D::new(x2, y2),
            votes,
            angle_deg,
            dist: 0.0,
        }
    }

    #[test]
    fn test_hough_finds_horizontal_line() {
        let mut edges = GrayImage::new(200, 200);
        for x in 20..180 {
            edges.put_pixel(x, 50, Luma([255]));
        }

        let lines = detect_lines(&edges, &ExtractionConfig::default());

        assert!(!lines.is_empty(), "expected at least one candidate");
        // The strongest candidate is the horizontal line at y = 50
        let best = &lines[0];
        assert_relative_eq!(best.angle_deg, 90.0);
        assert_relative_eq!(best.start.y, 50.0, epsilon = 1.5);
        assert_relative_eq!(best.end.y, 50.0, epsilon = 1.5);
        assert!(best.votes >= 150);
    }

    #[test]
    fn test_hough_finds_vertical_line() {
        let mut edges = GrayImage::new(200, 200);
        for y in 10..190 {
            edges.put_pixel(120, y, Luma([255]));
        }

        let lines = detect_lines(&edges, &ExtractionConfig::default());

        assert!(!lines.is_empty());
        let best = &lines[0];
        assert_relative_eq!(best.angle_deg, 0.0);
        assert_relative_eq!(best.start.x, 120.0, epsilon = 1.5);
    }

    #[test]
    fn test_hough_candidates_sorted_by_votes() {
        let mut edges = GrayImage::new(200, 200);
        for x in 20..180 {
            edges.put_pixel(x, 50, Luma([255]));
        }
        for x in 60..180 {
            edges.put_pixel(x, 120, Luma([255]));
        }

        let lines = detect_lines(&edges, &ExtractionConfig::default());

        for pair in lines.windows(2) {
            assert!(pair[0].votes >= pair[1].votes);
        }
    }

    #[test]
    fn test_local_maximum_retains_tied_neighbors() {
        // Two adjacent cells with equal votes: neither disqualifies the other
        let num_dists = 7;
        let mut accumulator = vec![0u32; NUM_ANGLES * num_dists];
        accumulator[90 * num_dists + 3] = 120;
        accumulator[90 * num_dists + 4] = 120;

        assert!(is_local_maximum(&accumulator, num_dists, 90, 3, 120));
        assert!(is_local_maximum(&accumulator, num_dists, 90, 4, 120));
    }

    #[test]
    fn test_local_maximum_rejects_stronger_neighbor() {
        let num_dists = 7;
        let mut accumulator = vec![0u32; NUM_ANGLES * num_dists];
        accumulator[90 * num_dists + 3] = 120;
        accumulator[90 * num_dists + 4] = 121;

        assert!(!is_local_maximum(&accumulator, num_dists, 90, 3, 120));
        assert!(is_local_maximum(&accumulator, num_dists, 90, 4, 121));
    }

    #[test]
    fn test_equal_vote_lines_both_emitted() {
        // Two rows with identical pixel counts vote equally; the tie drops
        // neither candidate
        let mut edges = GrayImage::new(200, 200);
        for x in 20..180 {
            edges.put_pixel(x, 50, Luma([255]));
            edges.put_pixel(x, 120, Luma([255]));
        }

        let lines = detect_lines(&edges, &ExtractionConfig::default());

        let horizontals: Vec<_> = lines.iter().filter(|l| l.angle_deg == 90.0).collect();
        assert!(horizontals.iter().any(|l| (l.start.y - 50.0).abs() < 1.5));
        assert!(horizontals.iter().any(|l| (l.start.y - 120.0).abs() < 1.5));
    }

    #[test]
    fn test_hough_empty_image_yields_nothing() {
        let edges = GrayImage::new(100, 100);
        let lines = detect_lines(&edges, &ExtractionConfig::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_clip_horizontal_line() {
        // θ = 90°: the line y = 40
        let clipped = clip_to_image(0.0, 1.0, 40.0, 200, 100).unwrap();
        assert_relative_eq!(clipped.0.y, 40.0);
        assert_relative_eq!(clipped.1.y, 40.0);
        assert_relative_eq!((clipped.0.x - clipped.1.x).abs(), 199.0);
    }

    #[test]
    fn test_clip_line_outside_image_is_discarded() {
        // y = 500 on a 100-px-tall image
        assert!(clip_to_image(0.0, 1.0, 500.0, 200, 100).is_none());
    }

    #[test]
    fn test_clip_diagonal_dedups_corner_intersections() {
        // The line x + y = 99 on a 100×100 image exits exactly through two
        // corners, so all four edge tests hit; dedup collapses them to two
        // points
        let c = std::f64::consts::FRAC_1_SQRT_2;
        let (a, b) = clip_to_image(c, c, 99.0 * c, 100, 100).unwrap();

        assert_relative_eq!(a.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(a.y, 99.0, epsilon = 1e-9);
        assert_relative_eq!(b.x, 99.0, epsilon = 1e-9);
        assert_relative_eq!(b.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(a.distance_to(&b), 99.0 * std::f64::consts::SQRT_2, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_corner_grazing_line_is_discarded() {
        // The line x + y = 0 touches the image only at the origin; after
        // dedup a single point remains and no segment is produced
        let c = std::f64::consts::FRAC_1_SQRT_2;
        assert!(clip_to_image(c, c, 0.0, 100, 100).is_none());
    }

    #[test]
    fn test_merge_groups_near_duplicates() {
        let lines = vec![
            candidate(0.0, 50.0, 100.0, 50.0, 30, 90.0),
            candidate(0.0, 52.0, 100.0, 52.0, 10, 90.0),
        ];

        let walls = merge_lines(&lines, &ExtractionConfig::default());

        assert_eq!(walls.len(), 1);
        // Vote-weighted: (50*30 + 52*10) / 40 = 50.5
        assert_relative_eq!(walls[0].start.y, 50.5);
        assert_relative_eq!(walls[0].end.y, 50.5);
        assert_eq!(walls[0].votes, 40);
    }

    #[test]
    fn test_merge_filters_diagonal_lines() {
        let lines = vec![
            candidate(0.0, 50.0, 100.0, 50.0, 20, 90.0),
            candidate(0.0, 0.0, 100.0, 100.0, 50, 45.0),
        ];

        let walls = merge_lines(&lines, &ExtractionConfig::default());

        assert_eq!(walls.len(), 1);
        assert_relative_eq!(walls[0].angle_deg, 90.0);
    }

    #[test]
    fn test_merge_keeps_distant_parallels_separate() {
        let lines = vec![
            candidate(0.0, 50.0, 100.0, 50.0, 20, 90.0),
            candidate(0.0, 150.0, 100.0, 150.0, 20, 90.0),
        ];

        let walls = merge_lines(&lines, &ExtractionConfig::default());

        assert_eq!(walls.len(), 2);
    }

    #[test]
    fn test_single_candidate_passes_through() {
        let lines = vec![candidate(10.0, 0.0, 10.0, 80.0, 25, 0.0)];
        let walls = merge_lines(&lines, &ExtractionConfig::default());

        assert_eq!(walls.len(), 1);
        assert_relative_eq!(walls[0].start.x, 10.0);
        assert_relative_eq!(walls[0].end.y, 80.0);
        assert_eq!(walls[0].votes, 25);
    }

    #[test]
    fn test_point_to_segment_distance_perpendicular() {
        let dist = point_to_segment_distance(
            &Point2D::new(5.0, 5.0),
            &Point2D::new(0.0, 0.0),
            &Point2D::new(10.0, 0.0),
        );
        assert_relative_eq!(dist, 5.0);
    }

    #[test]
    fn test_point_to_segment_distance_clamps_to_endpoint() {
        // Beyond the segment end: distance is to the endpoint, not the
        // infinite line
        let dist = point_to_segment_distance(
            &Point2D::new(14.0, 3.0),
            &Point2D::new(0.0, 0.0),
            &Point2D::new(10.0, 0.0),
        );
        assert_relative_eq!(dist, 5.0);
    }

    #[test]
    fn test_point_to_segment_distance_degenerate_segment() {
        let p = Point2D::new(3.0, 4.0);
        let a = Point2D::new(0.0, 0.0);
        assert_relative_eq!(point_to_segment_distance(&p, &a, &a), 5.0);
    }

    #[test]
    fn test_is_near_orthogonal() {
        assert!(is_near_orthogonal(2.0, 5.0));
        assert!(is_near_orthogonal(91.0, 5.0));
        assert!(is_near_orthogonal(178.0, 5.0));
        assert!(!is_near_orthogonal(45.0, 5.0));
        assert!(!is_near_orthogonal(30.0, 5.0));
    }
}
