// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatscan-document — Page detection and perspective rectification.
//
// Finds the outline of a sheet of paper in a photograph, orders its corners
// and warps the sheet flat. Decoding and encoding image files is left to the
// host.

pub mod geometry;
pub mod overlay;
pub mod scan;
pub mod scanner;

// Re-export the primary structs so callers can use `flatscan_document::DocumentScanner` etc.
pub use overlay::draw_outline;
pub use scan::{CornerCanonicalizer, PerspectiveRectifier, RectangleSearch};
pub use scanner::{DocumentScanner, ScanOutcome, StageTimings};
