// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Automatic pixel-to-centimeter calibration
//!
//! Recognized dimension annotations are matched to their nearest wall; each
//! match yields a pixels-per-centimeter ratio. The set of ratios is accepted
//! only when it is statistically consistent (coefficient of variation below
//! the configured bound), otherwise the plan stays in pixel units.

use crate::line_ops::point_to_segment_distance;
use crate::text_parse::parse_dimension;
use crate::types::{
    Calibration, CalibrationErrorKind, ExtractionConfig, Measurement, TextToken, TokenKind, Wall,
};
use tracing::{debug, info};

/// Minimum recognizer confidence for a dimension token to participate
const MIN_DIMENSION_CONFIDENCE: f64 = 60.0;

/// Plausible scale range; anything outside is a mismatch artifact
const MIN_PIXELS_PER_CM: f64 = 0.5;
const MAX_PIXELS_PER_CM: f64 = 20.0;

/// Derive the pixels-per-centimeter scale from dimension tokens and walls
pub fn calibrate(walls: &[Wall], tokens: &[TextToken], config: &ExtractionConfig) -> Calibration {
    let mut measurements = Vec::new();

    for token in tokens {
        if token.kind != TokenKind::Dimension || token.confidence < MIN_DIMENSION_CONFIDENCE {
            continue;
        }
        let Some(length_cm) = parse_dimension(&token.text) else {
            continue;
        };

        let center = token.bbox.center();
        let Some((wall, distance)) = nearest_wall(walls, &center) else {
            continue;
        };
        if distance > config.calibration_max_distance {
            debug!(text = %token.text, distance, "dimension token too far from any wall");
            continue;
        }

        let length_px = wall.length();
        let pixels_per_cm = length_px / length_cm;
        if !(MIN_PIXELS_PER_CM..=MAX_PIXELS_PER_CM).contains(&pixels_per_cm) {
            debug!(text = %token.text, pixels_per_cm, "implausible scale, skipping");
            continue;
        }

        measurements.push(Measurement {
            dimension_text: token.text.clone(),
            length_cm,
            length_px,
            pixels_per_cm,
            confidence: token.confidence,
            wall: wall.clone(),
            distance,
        });
    }

    let ratios: Vec<f64> = measurements.iter().map(|m| m.pixels_per_cm).collect();
    let weights: Vec<f64> = measurements.iter().map(|m| m.confidence).collect();
    let avg = if ratios.is_empty() {
        None
    } else {
        Some(weighted_average(&ratios, &weights))
    };
    let cv = coefficient_of_variation(&ratios);

    if measurements.len() < config.min_measurements {
        info!(
            found = measurements.len(),
            required = config.min_measurements,
            "calibration rejected: insufficient measurements"
        );
        return Calibration {
            success: false,
            pixels_per_cm: None,
            measurements,
            cv: Some(cv),
            confidence: None,
            avg_pixels_per_cm: avg,
            error: Some("Not enough usable dimension annotations".to_string()),
            error_kind: Some(CalibrationErrorKind::InsufficientData),
        };
    }

    if cv > config.max_cv {
        info!(cv, max_cv = config.max_cv, "calibration rejected: inconsistent scale");
        return Calibration {
            success: false,
            pixels_per_cm: None,
            measurements,
            cv: Some(cv),
            confidence: None,
            avg_pixels_per_cm: avg,
            error: Some("Measured scales disagree beyond the accepted variation".to_string()),
            error_kind: Some(CalibrationErrorKind::InconsistentScale),
        };
    }

    let confidence =
        measurements.iter().map(|m| m.confidence).sum::<f64>() / measurements.len() as f64;

    info!(
        pixels_per_cm = avg.unwrap_or_default(),
        cv,
        measurements = measurements.len(),
        "calibration accepted"
    );

    Calibration {
        success: true,
        pixels_per_cm: avg,
        measurements,
        cv: Some(cv),
        confidence: Some(confidence),
        avg_pixels_per_cm: avg,
        error: None,
        error_kind: None,
    }
}

/// The wall nearest to a point, with its clamped point-to-segment distance
fn nearest_wall<'a>(walls: &'a [Wall], point: &crate::types::Point2D) -> Option<(&'a Wall, f64)> {
    let mut best: Option<(&Wall, f64)> = None;
    for wall in walls {
        let distance = point_to_segment_distance(point, &wall.start, &wall.end);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((wall, distance)),
        }
    }
    best
}

/// `Σ(value·weight) / Σ(weight)`; 0 when the weights sum to 0
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    values
        .iter()
        .zip(weights)
        .map(|(value, weight)| value * weight)
        .sum::<f64>()
        / total
}

/// Population standard deviation divided by mean; 0 for an empty set
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / mean
}
