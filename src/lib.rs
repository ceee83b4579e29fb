// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor plan vectorization from scanned raster images
//!
//! This crate turns a binarized floor plan scan into structured vector data:
//! 1. Wall detection (simplified Canny edges → Hough lines → merging)
//! 2. Room extraction (flood-filled background regions with bbox polygons)
//! 3. Auto-calibration (dimension annotations → pixels per centimeter, with a
//!    statistical acceptance test)
//! 4. Room naming (recognized name tokens matched to room centroids)
//!
//! Text recognition itself is an external collaborator: the pipeline consumes
//! its [`TextToken`] output, or drives it through the [`TextRecognizer`] seam.
//!
//! # Usage
//!
//! ```rust,ignore
//! use floorplan_vision::{extract_floor_plan, ExtractionConfig, TextToken};
//!
//! // `binary` is a GrayImage with ink at 255 and background at 0
//! let tokens: Vec<TextToken> = recognizer_output;
//! let plan = extract_floor_plan(&binary, &tokens, &ExtractionConfig::default())?;
//!
//! println!("{} walls, {} rooms", plan.walls.len(), plan.rooms.len());
//! if let Some(ppc) = plan.calibration.pixels_per_cm {
//!     println!("scale: {ppc:.2} px/cm");
//! }
//! ```

pub mod calibrator;
pub mod edge_detector;
pub mod error;
pub mod image_ops;
pub mod line_ops;
pub mod room_detector;
pub mod room_namer;
pub mod text_parse;
pub mod types;

// Re-export commonly used types and functions
pub use calibrator::{calibrate, coefficient_of_variation, weighted_average};
pub use edge_detector::detect_edges;
pub use error::{Error, Result};
pub use image_ops::gray_from_raw;
pub use line_ops::{detect_lines, merge_lines, point_to_segment_distance};
pub use room_detector::{extract_regions, regions_to_rooms};
pub use room_namer::assign_names;
pub use text_parse::{parse_area, parse_dimension};
pub use types::{
    Calibration, CalibrationErrorKind, ExtractedPlan, ExtractionConfig, LineCandidate, Measurement,
    NameSource, NamedRoom, Region, Room, TextToken, TokenKind, Wall,
};

use image::GrayImage;
use std::fmt;
use tracing::info;

/// Pipeline phases, in execution order
///
/// Owned by the orchestrating application; exposed here so progress reporting
/// and error context can speak the same vocabulary as the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    Preprocessing,
    Ocr,
    Walls,
    Calibration,
    Rooms,
    Naming,
    Converting,
    Complete,
}

impl ExtractionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionPhase::Preprocessing => "preprocessing",
            ExtractionPhase::Ocr => "ocr",
            ExtractionPhase::Walls => "walls",
            ExtractionPhase::Calibration => "calibration",
            ExtractionPhase::Rooms => "rooms",
            ExtractionPhase::Naming => "naming",
            ExtractionPhase::Converting => "converting",
            ExtractionPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for ExtractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External text-recognition collaborator
///
/// Implementations own their worker resources and must release them even when
/// recognition fails; the pipeline wraps their failure message and aborts.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &GrayImage) -> std::result::Result<Vec<TextToken>, String>;
}

/// Run the full extraction pipeline on a binarized plan image
///
/// `image` carries ink at 255 and background at 0. Zero detected walls or
/// zero detected rooms abort with a fatal error; a rejected calibration does
/// not — the returned plan then stays in pixel units and the
/// [`Calibration`] carries the diagnostics.
pub fn extract_floor_plan(
    image: &GrayImage,
    tokens: &[TextToken],
    config: &ExtractionConfig,
) -> Result<ExtractedPlan> {
    info!(phase = %ExtractionPhase::Walls, "detecting walls");
    let edges = detect_edges(image, config);
    let candidates = detect_lines(&edges, config);
    let walls = merge_lines(&candidates, config);
    if walls.is_empty() {
        return Err(Error::NoWallsDetected);
    }

    info!(phase = %ExtractionPhase::Calibration, walls = walls.len(), "calibrating scale");
    let calibration = calibrate(&walls, tokens, config);

    info!(phase = %ExtractionPhase::Rooms, "extracting rooms");
    let regions = extract_regions(image, config);
    let rooms = regions_to_rooms(regions);
    if rooms.is_empty() {
        return Err(Error::NoRoomsDetected);
    }

    info!(phase = %ExtractionPhase::Naming, rooms = rooms.len(), "assigning room names");
    let rooms = assign_names(rooms, tokens, config);

    info!(phase = %ExtractionPhase::Complete, "extraction complete");
    Ok(ExtractedPlan {
        walls,
        rooms,
        calibration,
        image_width: image.width(),
        image_height: image.height(),
    })
}

/// Run text recognition, then the extraction pipeline
///
/// Recognizer failures are wrapped as [`Error::TextRecognition`] and
/// propagated; no retries happen here.
pub fn extract_with_recognizer(
    image: &GrayImage,
    recognizer: &mut dyn TextRecognizer,
    config: &ExtractionConfig,
) -> Result<ExtractedPlan> {
    info!(phase = %ExtractionPhase::Ocr, "running text recognition");
    let tokens = recognizer.recognize(image).map_err(Error::TextRecognition)?;
    extract_floor_plan(image, &tokens, config)
}
