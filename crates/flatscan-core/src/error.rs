// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flatscan.
//
// "No document found" and "corners could not be ordered" are normal scan
// outcomes and are reported through `DetectionStatus`, never through this enum.

use thiserror::Error;

/// Top-level error type for all Flatscan operations.
#[derive(Debug, Error)]
pub enum FlatscanError {
    // -- Geometry errors --
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid corners: {0}")]
    InvalidCorners(String),

    // -- Image processing --
    #[error("image processing primitive failed: {0}")]
    Primitive(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration --
    #[error("invalid scan configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlatscanError>;
