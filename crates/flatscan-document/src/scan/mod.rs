// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline stages — binarization passes, candidate extraction,
// rectangle search, corner canonicalisation and perspective rectification.

pub mod binarize;
pub mod candidate;
pub mod corners;
pub mod rectify;
pub mod search;

pub use binarize::{BinarizationPass, WorkingImage};
pub use candidate::CandidateExtractor;
pub use corners::CornerCanonicalizer;
pub use rectify::PerspectiveRectifier;
pub use search::{BestBucket, RectangleSearch, SearchHit};
