// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the extraction pipeline

use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal extraction errors
///
/// Calibration rejections are not errors; they are carried as data in
/// [`crate::types::Calibration`] and the pipeline continues in pixel units.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No walls detected in the floor plan image")]
    NoWallsDetected,

    #[error("No rooms detected in the floor plan image")]
    NoRoomsDetected,

    #[error("Text recognition failed: {0}")]
    TextRecognition(String),
}

impl Error {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::NoWallsDetected => "no_walls_detected",
            Error::NoRoomsDetected => "no_rooms_detected",
            Error::TextRecognition(_) => "text_recognition_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::NoWallsDetected.code(), "no_walls_detected");
        assert_eq!(Error::NoRoomsDetected.code(), "no_rooms_detected");
        assert_eq!(
            Error::TextRecognition("worker died".into()).code(),
            "text_recognition_failed"
        );
    }

    #[test]
    fn test_text_recognition_message_is_prefixed() {
        let err = Error::TextRecognition("timeout".into());
        assert_eq!(err.to_string(), "Text recognition failed: timeout");
    }
}
