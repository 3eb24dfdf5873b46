// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for the capture flow.
//
// Every technical error (and every scan outcome that needs the user's
// attention) is mapped to plain English with a clear suggestion. The severity
// drives how a capture UI presents it.

use crate::error::FlatscanError;
use crate::types::DetectionStatus;

/// Severity of a problem from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth trying again as-is (I/O hiccup).
    Transient,
    /// The user should do something: retake the photo, adjust the corners.
    ActionRequired,
    /// Retrying will not help: unreadable file, broken configuration.
    Permanent,
}

/// A human-readable message with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the host may simply run the same request again.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `FlatscanError` into a `HumanError`.
pub fn humanize_error(err: &FlatscanError) -> HumanError {
    match err {
        FlatscanError::InvalidGeometry(_) => HumanError {
            message: "The selected page outline is too small or folded over.".into(),
            suggestion: "Drag the corners so they sit on the four corners of the page.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlatscanError::InvalidCorners(_) => HumanError {
            message: "Some corners are outside the photo.".into(),
            suggestion: "Move every corner back inside the picture and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlatscanError::Primitive(_) | FlatscanError::ImageError(_) => HumanError {
            message: "We couldn't read this photo.".into(),
            suggestion: "Take the photo again, or pick a JPEG or PNG picture.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FlatscanError::InvalidConfig(_) | FlatscanError::Serialization(_) => HumanError {
            message: "The scanner settings are not valid.".into(),
            suggestion: "Reset the scanner settings to their defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FlatscanError::Io(io) => match io.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The photo could not be found.".into(),
                suggestion: "Check that the file still exists and choose it again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "We aren't allowed to open or save this file.".into(),
                suggestion: "Allow access to your photos, or save somewhere else.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Something went wrong while reading or saving the file.".into(),
                suggestion: "Try again in a moment.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },
    }
}

/// Describe a scan outcome that needs attention, or `None` when the page was
/// flattened.
pub fn humanize_status(status: &DetectionStatus) -> Option<HumanError> {
    match status {
        DetectionStatus::Found { .. } | DetectionStatus::Manual { .. } => None,
        DetectionStatus::NotFound => Some(HumanError {
            message: "We couldn't find the edges of the page.".into(),
            suggestion: "Place the page on a darker surface and make sure all four corners are in the photo.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }),
        DetectionStatus::DegenerateCorners { .. } => Some(HumanError {
            message: "We found the page but couldn't tell which way up it is.".into(),
            suggestion: "Hold the phone straight above the page, or set the corners by hand.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }),
    }
}
