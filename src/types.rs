// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for floor plan extraction

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A 2D point (simplified for serialization)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: &Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned bounding box of a recognized text token, in pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Euclidean distance between the centers of two boxes
    pub fn center_distance(&self, other: &BBox) -> f64 {
        self.center().distance_to(&other.center())
    }
}

/// Pixel-coordinate bounds of a flood-filled region
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixelRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelRect {
    pub fn at(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// A Hough-derived line segment with its accumulator parameters
///
/// Candidates are emitted sorted by `votes` descending; ties keep
/// accumulator scan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineCandidate {
    pub start: Point2D,
    pub end: Point2D,
    /// Accumulator vote count of the originating peak
    pub votes: u32,
    /// Polar angle of the line normal, degrees in [0, 180)
    pub angle_deg: f64,
    /// Signed distance from the origin along the normal, pixels
    pub dist: f64,
}

impl LineCandidate {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point2D {
        Point2D::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }
}

/// A wall segment, merged from one or more near-duplicate line candidates
///
/// Endpoints are the vote-weighted mean of the group; the individual
/// candidates' vote identities are not preserved beyond the sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub start: Point2D,
    pub end: Point2D,
    /// Mean polar angle of the merged group, degrees in [0, 180)
    pub angle_deg: f64,
    /// Summed votes of the merged candidates
    pub votes: u32,
}

impl Wall {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point2D {
        Point2D::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }
}

/// A connected background-pixel blob surviving area filtering
///
/// Immutable once emitted by the region extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    /// Member pixel coordinates in discovery order
    pub pixels: Vec<(u32, u32)>,
    pub bbox: PixelRect,
    /// Pixel count
    pub area: usize,
}

/// A region promoted to a polygon-bearing room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: u64,
    /// Ordered boundary vertices. Currently the four bounding-box corners:
    /// an axis-aligned approximation, not a traced contour.
    pub polygon: Vec<Point2D>,
    /// Arithmetic mean of all member pixel coordinates
    pub centroid: Point2D,
    /// Area in square pixels (member pixel count)
    pub area: f64,
    pub bbox: PixelRect,
}

static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique room identifier
pub fn next_room_id() -> u64 {
    NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed)
}

/// Classification tag of a recognized text token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    Dimension,
    RoomName,
    Area,
    Unknown,
}

/// A unit of recognized text supplied by the external recognizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
    /// Recognizer confidence in [0, 100]
    pub confidence: f64,
    pub bbox: BBox,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl TextToken {
    /// Adopt a recognizer response serialized as a JSON token array
    pub fn vec_from_json(json: &str) -> serde_json::Result<Vec<TextToken>> {
        serde_json::from_str(json)
    }
}

/// One accepted dimension-to-wall match, built during calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Raw token text the length was parsed from
    pub dimension_text: String,
    /// Parsed real-world length, centimeters
    pub length_cm: f64,
    /// Length of the matched wall, pixels
    pub length_px: f64,
    pub pixels_per_cm: f64,
    /// Recognizer confidence of the source token
    pub confidence: f64,
    /// The matched wall
    pub wall: Wall,
    /// Token-center to wall distance, pixels
    pub distance: f64,
}

/// Why a calibration attempt was rejected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationErrorKind {
    InsufficientData,
    InconsistentScale,
}

impl CalibrationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationErrorKind::InsufficientData => "insufficient_data",
            CalibrationErrorKind::InconsistentScale => "inconsistent_scale",
        }
    }
}

/// Result of the pixels-per-centimeter calibration
///
/// When `success` is false, `pixels_per_cm` is `None` and coordinates must be
/// treated as uncalibrated pixels; `avg_pixels_per_cm` and `cv` may still be
/// populated for caller diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    pub success: bool,
    /// Accepted conversion ratio; only present on success
    pub pixels_per_cm: Option<f64>,
    pub measurements: Vec<Measurement>,
    /// Population coefficient of variation of the measured ratios
    pub cv: Option<f64>,
    /// Unweighted mean of measurement confidences
    pub confidence: Option<f64>,
    /// Confidence-weighted mean ratio, reported even on rejection
    pub avg_pixels_per_cm: Option<f64>,
    pub error: Option<String>,
    pub error_kind: Option<CalibrationErrorKind>,
}

/// Where a room's name came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
    Ocr,
    Default,
}

/// A room plus its assigned name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRoom {
    #[serde(flatten)]
    pub room: Room,
    pub name: String,
    /// Confidence of the name token, or 0 for the default name
    pub name_confidence: f64,
    pub name_source: NameSource,
}

/// Complete extraction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedPlan {
    pub walls: Vec<Wall>,
    pub rooms: Vec<NamedRoom>,
    pub calibration: Calibration,
    pub image_width: u32,
    pub image_height: u32,
}

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Edge detector: gradient magnitudes below this are dropped. Default: 50
    pub low_threshold: f64,
    /// Edge detector: gradient magnitudes above this are strong edges.
    /// Default: 100
    pub high_threshold: f64,
    /// Hough accumulator vote threshold for a peak. Default: 100
    pub hough_threshold: u32,
    /// Minimum clipped segment length to keep (pixels). Default: 50
    pub min_line_length: f64,
    /// Merger prefilter: maximum deviation from 0/90/180 degrees for a line
    /// to count as orthogonal. Default: 5
    pub angle_threshold_deg: f64,
    /// Merger grouping: maximum angle difference between group members
    /// (degrees). Default: 2
    pub merge_angle_threshold_deg: f64,
    /// Merger grouping: maximum midpoint-to-midpoint distance between group
    /// members (pixels). Default: 15
    pub distance_threshold: f64,
    /// Minimum region area to become a room (square pixels). Default: 500
    pub min_room_area: usize,
    /// Calibrator: maximum token-center to wall distance (pixels).
    /// Default: 100
    pub calibration_max_distance: f64,
    /// Calibrator: minimum accepted measurements. Default: 2
    pub min_measurements: usize,
    /// Calibrator: maximum coefficient of variation to accept the scale.
    /// Default: 0.05
    pub max_cv: f64,
    /// Namer: maximum centroid-to-token distance (pixels). Default: 200
    pub naming_max_distance: f64,
    /// Namer: minimum token confidence. Default: 60
    pub naming_min_confidence: f64,
    /// Namer: fallback name for rooms without a matched token.
    /// Default: "Raum"
    pub default_room_name: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 100.0,
            hough_threshold: 100,
            min_line_length: 50.0,
            angle_threshold_deg: 5.0,
            merge_angle_threshold_deg: 2.0,
            distance_threshold: 15.0,
            min_room_area: 500,
            calibration_max_distance: 100.0,
            min_measurements: 2,
            max_cv: 0.05,
            naming_max_distance: 200.0,
            naming_min_confidence: 60.0,
            default_room_name: "Raum".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_center_distance_is_euclidean() {
        // Centers at (5, 5) and (8, 9): a 3-4-5 triangle
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(3.0, 4.0, 10.0, 10.0);

        assert_relative_eq!(a.center_distance(&b), 5.0);
    }

    #[test]
    fn test_bbox_center() {
        let bbox = BBox::new(10.0, 20.0, 4.0, 6.0);
        let c = bbox.center();
        assert_relative_eq!(c.x, 12.0);
        assert_relative_eq!(c.y, 23.0);
    }

    #[test]
    fn test_room_ids_are_unique() {
        let a = next_room_id();
        let b = next_room_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_json_roundtrip() {
        let json = r#"[
            {
                "text": "3.80",
                "confidence": 92.5,
                "bbox": { "x": 10.0, "y": 20.0, "width": 40.0, "height": 12.0 },
                "type": "dimension"
            },
            {
                "text": "KÜCHE",
                "confidence": 88.0,
                "bbox": { "x": 100.0, "y": 80.0, "width": 60.0, "height": 14.0 },
                "type": "roomName"
            }
        ]"#;

        let tokens = TextToken::vec_from_json(json).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Dimension);
        assert_eq!(tokens[1].kind, TokenKind::RoomName);
        assert_eq!(tokens[1].text, "KÜCHE");
    }

    #[test]
    fn test_pixel_rect_include() {
        let mut rect = PixelRect::at(5, 5);
        rect.include(2, 8);
        rect.include(9, 3);

        assert_eq!(rect.min_x, 2);
        assert_eq!(rect.max_x, 9);
        assert_eq!(rect.min_y, 3);
        assert_eq!(rect.max_y, 8);
        assert_eq!(rect.width(), 8);
        assert_eq!(rect.height(), 6);
    }
}
