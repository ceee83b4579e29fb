// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room naming from recognized text
//!
//! Greedy nearest-match assignment: rooms claim name tokens in room order,
//! each token text can be claimed once (global, case-sensitive). Rooms left
//! without a candidate get the configured default name.

use crate::types::{ExtractionConfig, NameSource, NamedRoom, Room, TextToken, TokenKind};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use tracing::debug;

/// Candidates closer together than this are ranked by confidence instead of
/// distance
const DISTANCE_TIE_PX: f64 = 20.0;

/// Assign recognized room names to rooms
pub fn assign_names(
    rooms: Vec<Room>,
    tokens: &[TextToken],
    config: &ExtractionConfig,
) -> Vec<NamedRoom> {
    let eligible: Vec<&TextToken> = tokens
        .iter()
        .filter(|token| {
            token.kind == TokenKind::RoomName && token.confidence >= config.naming_min_confidence
        })
        .collect();

    // Claimed token texts, threaded through the pass instead of ambient state
    let mut used: FxHashSet<&str> = FxHashSet::default();
    let mut named = Vec::with_capacity(rooms.len());

    for room in rooms {
        let candidates = eligible
            .iter()
            .filter(|token| !used.contains(token.text.as_str()))
            .map(|token| (*token, room.centroid.distance_to(&token.bbox.center())))
            .filter(|(_, distance)| *distance <= config.naming_max_distance);

        // Nearest candidate wins; near-equal distances prefer confidence
        let best = candidates.fold(None::<(&TextToken, f64)>, |best, (token, distance)| {
            match best {
                None => Some((token, distance)),
                Some((best_token, best_distance)) => {
                    let preferred = if (distance - best_distance).abs() < DISTANCE_TIE_PX {
                        token
                            .confidence
                            .partial_cmp(&best_token.confidence)
                            .unwrap_or(Ordering::Equal)
                            == Ordering::Greater
                    } else {
                        distance < best_distance
                    };
                    if preferred {
                        Some((token, distance))
                    } else {
                        Some((best_token, best_distance))
                    }
                }
            }
        });

        match best {
            Some((token, distance)) => {
                used.insert(token.text.as_str());
                debug!(room = room.id, name = %token.text, distance, "room named from token");
                named.push(NamedRoom {
                    room,
                    name: format_name(&token.text),
                    name_confidence: token.confidence,
                    name_source: NameSource::Ocr,
                });
            }
            None => {
                named.push(NamedRoom {
                    room,
                    name: config.default_room_name.clone(),
                    name_confidence: 0.0,
                    name_source: NameSource::Default,
                });
            }
        }
    }

    named
}

/// Normalize shouting OCR output
///
/// Entirely upper-case names become capitalized ("KÜCHE" → "Küche");
/// mixed-case text passes through unchanged.
fn format_name(text: &str) -> String {
    let has_letters = text.chars().any(|c| c.is_alphabetic());
    let all_upper = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .all(|c| c.is_uppercase());
    if !has_letters || !all_upper {
        return text.to_string();
    }

    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
