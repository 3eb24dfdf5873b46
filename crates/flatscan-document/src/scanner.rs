// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document scanner — ties search, corner canonicalisation and rectification
// together for one photograph, in automatic or manual capture mode.

use std::time::{Duration, Instant};

use flatscan_core::error::Result;
use flatscan_core::{CaptureMode, DetectionStatus, Quadrilateral, ScanConfig};
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::scan::{CornerCanonicalizer, PerspectiveRectifier, RectangleSearch};

/// Wall-clock time spent in each stage of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    /// Rectangle search and corner ordering. Zero in manual mode.
    pub search: Duration,
    /// Perspective warp. Zero when nothing was rectified.
    pub rectify: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.search + self.rectify
    }
}

/// Result of [`DocumentScanner::scan`].
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The rectified page, or the untouched source when no corners were
    /// usable.
    pub image: DynamicImage,
    pub status: DetectionStatus,
    pub timings: StageTimings,
}

impl ScanOutcome {
    /// Whether `image` is a rectified page rather than the source photograph.
    pub fn is_rectified(&self) -> bool {
        self.status.corners().is_some()
    }
}

/// Detects and flattens a document in a photograph.
///
/// Holds only configuration; every call works on its own buffers, so one
/// scanner can serve several threads.
#[derive(Debug, Clone)]
pub struct DocumentScanner {
    search: RectangleSearch,
    canonicalizer: CornerCanonicalizer,
    rectifier: PerspectiveRectifier,
}

impl DocumentScanner {
    /// Build a scanner, rejecting an invalid configuration.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let canonicalizer = CornerCanonicalizer::new(config.corner_margin);
        Ok(Self {
            search: RectangleSearch::new(config),
            canonicalizer,
            rectifier: PerspectiveRectifier::new(),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        self.search.config()
    }

    /// Locate the page in `image` and order its corners.
    ///
    /// Corners are in the original image's coordinate space; the outward
    /// margin may push them a few pixels past the image edge.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionStatus> {
        let Some(hit) = self.search.find(image)? else {
            warn!("No document outline; the whole image will be used");
            return Ok(DetectionStatus::NotFound);
        };

        match self.canonicalizer.canonicalize(&hit.polygon) {
            Some(corners) => {
                info!(?corners, "Document corners found");
                Ok(DetectionStatus::Found { corners })
            }
            None => {
                warn!(
                    vertices = hit.polygon.len(),
                    "Outline corners could not be ordered; the whole image will be used"
                );
                Ok(DetectionStatus::DegenerateCorners {
                    polygon: hit.polygon,
                })
            }
        }
    }

    /// Run the full pipeline on one photograph.
    ///
    /// Automatic mode searches for the page; manual mode takes the caller's
    /// corners as already ordered TL, TR, BR, BL and only rectifies. When no
    /// usable corners come out of the search the source image is handed back
    /// unchanged.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn scan(&self, image: DynamicImage, mode: CaptureMode) -> Result<ScanOutcome> {
        let mut timings = StageTimings::default();

        let status = match mode {
            CaptureMode::Automatic => {
                let started = Instant::now();
                let status = self.detect(&image)?;
                timings.search = started.elapsed();
                status
            }
            CaptureMode::Manual(corners) => DetectionStatus::Manual { corners },
        };

        let Some(corners) = status.corners() else {
            info!(
                search_ms = timings.search.as_millis(),
                "Scan finished without rectification"
            );
            return Ok(ScanOutcome {
                image,
                status,
                timings,
            });
        };

        let started = Instant::now();
        let rectified = self.rectify(&image, corners)?;
        timings.rectify = started.elapsed();

        info!(
            out_w = rectified.width(),
            out_h = rectified.height(),
            search_ms = timings.search.as_millis(),
            rectify_ms = timings.rectify.as_millis(),
            "Scan finished"
        );
        Ok(ScanOutcome {
            image: rectified,
            status,
            timings,
        })
    }

    /// Rectify `image` under already-canonical corners.
    pub fn rectify(&self, image: &DynamicImage, corners: &Quadrilateral) -> Result<DynamicImage> {
        self.rectifier.rectify(image, corners)
    }
}
