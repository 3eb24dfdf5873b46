// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectangle search — run every binarization pass over a downscaled copy,
// bucket the surviving candidates by vertex count and pick the best one.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use flatscan_core::error::Result;
use flatscan_core::{Candidate, Polygon, ScanConfig};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use super::binarize::{BinarizationPass, WorkingImage};
use super::candidate::CandidateExtractor;
use crate::geometry::scale_polygon;

/// Bucket order: true quadrilaterals first, then progressively rounder shapes.
pub const VERTEX_PREFERENCE: [usize; 7] = [4, 5, 6, 7, 8, 9, 10];

/// The winning polygon of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Winning polygon, in original-image coordinates.
    pub polygon: Polygon,
    /// The candidate as found, in working-copy coordinates.
    pub candidate: Candidate,
    /// Downscale ratio that maps original coordinates to working ones.
    pub ratio: f64,
}

/// The first non-empty vertex-count bucket in preference order.
#[derive(Debug, Clone, PartialEq)]
pub enum BestBucket {
    NotFound,
    Found {
        vertex_count: usize,
        candidates: Vec<Candidate>,
    },
}

impl BestBucket {
    /// Group candidates by vertex count and keep the preferred bucket.
    /// Candidates keep their pass order inside a bucket.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let mut buckets: BTreeMap<usize, Vec<Candidate>> = BTreeMap::new();
        for candidate in candidates {
            buckets
                .entry(candidate.vertex_count())
                .or_default()
                .push(candidate);
        }

        VERTEX_PREFERENCE
            .iter()
            .find_map(|count| {
                buckets
                    .remove(count)
                    .map(|candidates| Self::Found {
                        vertex_count: *count,
                        candidates,
                    })
            })
            .unwrap_or(Self::NotFound)
    }

    /// The largest candidate of the bucket, see [`select_largest`].
    pub fn into_best(self) -> Option<Candidate> {
        match self {
            Self::NotFound => None,
            Self::Found { candidates, .. } => select_largest(candidates),
        }
    }
}

/// Orders candidates by descending absolute area, compared as
/// `ceil(|b.area| - |a.area|)`.
///
/// Areas less than one pixel² apart in the "wrong" direction compare equal,
/// so the relation is not a strict total order and must not be fed to
/// `slice::sort_by`.
pub fn area_descending(a: &Candidate, b: &Candidate) -> Ordering {
    let diff = (b.area.abs() - a.area.abs()).ceil();
    diff.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

/// The candidate a stable descending-area ordering would put first: a later
/// candidate only displaces the current best when it sorts strictly before it.
pub fn select_largest(candidates: Vec<Candidate>) -> Option<Candidate> {
    let mut iter = candidates.into_iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if area_descending(&candidate, &best) == Ordering::Less {
            best = candidate;
        }
    }
    Some(best)
}

/// Multi-pass search for the page outline.
#[derive(Debug, Clone)]
pub struct RectangleSearch {
    config: ScanConfig,
}

impl RectangleSearch {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Find the most plausible page polygon in `image`.
    ///
    /// Returns `Ok(None)` when no pass produced an acceptable candidate; the
    /// caller should then treat the whole image as the page. Errors only when
    /// the image cannot be processed at all.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn find(&self, image: &DynamicImage) -> Result<Option<SearchHit>> {
        let working = WorkingImage::prepare(image, &self.config)?;
        let candidates = self.collect_candidates(&working);
        info!(candidates = candidates.len(), "Binarization passes complete");

        let bucket = BestBucket::from_candidates(candidates);
        if let BestBucket::Found {
            vertex_count,
            candidates,
        } = &bucket
        {
            debug!(vertex_count, bucket_size = candidates.len(), "Bucket selected");
        }

        let Some(candidate) = bucket.into_best() else {
            warn!("No page outline found in any pass");
            return Ok(None);
        };

        let polygon = scale_polygon(&candidate.polygon, 1.0 / working.ratio);
        info!(
            vertices = polygon.len(),
            pass_index = candidate.pass_index,
            area = candidate.area.abs(),
            "Page outline found"
        );
        Ok(Some(SearchHit {
            polygon,
            candidate,
            ratio: working.ratio,
        }))
    }

    /// Run every binarization pass over the working copy and collect at most
    /// one candidate per pass, in pass order.
    pub fn collect_candidates(&self, working: &WorkingImage) -> Vec<Candidate> {
        let extractor = CandidateExtractor::from_config(&self.config);
        let source_area = working.area();

        BinarizationPass::sequence(&self.config)
            .into_iter()
            .enumerate()
            .filter_map(|(pass_index, pass)| {
                let binary = pass.apply(&working.gray, &self.config);
                let candidate = extractor.extract(&binary, source_area, pass_index);
                debug!(pass_index, ?pass, found = candidate.is_some(), "Pass finished");
                candidate
            })
            .collect()
    }
}
