// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dimension and area text parsing
//!
//! Recognized text from architectural plans mixes German decimal commas,
//! meter annotations, superscript exponents ("2.96⁵") and wall-thickness
//! notation ("12/30"). Everything is converted to centimeters.

use regex::Regex;
use std::sync::OnceLock;

/// Plausible dimension range, centimeters
const MIN_DIMENSION_CM: f64 = 10.0;
const MAX_DIMENSION_CM: f64 = 2000.0;

/// Superscript digit glyphs that annotate dimensions (e.g. ceiling heights)
const SUPERSCRIPTS: &[char] = &['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

fn thickness_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").unwrap())
}

fn dimension_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:[.,](\d+)\s*m?)?$").unwrap())
}

fn area_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:[.,]\d+)?)\s*m(?:²|2)$").unwrap())
}

/// Parse a dimension annotation into centimeters
///
/// `"3.80"` → 380, `"2,96"` → 296, `"2.96⁵"` → 296, `"12/30"` → 12 (the inner
/// wall-thickness value). A decimal part of exactly one digit is read as
/// tenths of a meter; plain integers are already centimeters and take no
/// meter suffix. Returns `None` when no pattern matches or the value falls
/// outside `[10, 2000]` cm.
pub fn parse_dimension(text: &str) -> Option<f64> {
    let text = text.trim().trim_end_matches(SUPERSCRIPTS).trim();
    if text.is_empty() {
        return None;
    }

    // Wall-thickness notation "NN/MM": the first (inner) value, in cm
    if let Some(captures) = thickness_pattern().captures(text) {
        let cm: f64 = captures[1].parse().ok()?;
        return plausible(cm);
    }

    let captures = dimension_pattern().captures(text)?;
    let whole: f64 = captures[1].parse().ok()?;

    let cm = match captures.get(2) {
        Some(decimal) => {
            // One decimal digit means tenths of a meter; otherwise the
            // decimal part is already centimeters
            let scale = if decimal.as_str().len() == 1 { 10.0 } else { 1.0 };
            let fraction: f64 = decimal.as_str().parse().ok()?;
            whole * 100.0 + fraction * scale
        }
        None => whole,
    };

    plausible(cm)
}

fn plausible(cm: f64) -> Option<f64> {
    if (MIN_DIMENSION_CM..=MAX_DIMENSION_CM).contains(&cm) {
        Some(cm)
    } else {
        None
    }
}

/// Parse an area annotation ("19.26 m²" or "19.26 m2") into square meters
pub fn parse_area(text: &str) -> Option<f64> {
    let captures = area_pattern().captures(text.trim())?;
    captures[1].replace(',', ".").parse().ok()
}
