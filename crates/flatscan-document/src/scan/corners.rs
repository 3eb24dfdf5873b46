// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner canonicalisation — order a found polygon's corners as
// top-left, top-right, bottom-right, bottom-left and push them outwards a
// little, since real page corners are rounded and detected short.

use std::cmp::Ordering;

use flatscan_core::{Point, Polygon, Quadrilateral};
use tracing::{debug, warn};

use crate::geometry::centroid;

/// Default outward shift, in pixels of the image the corners live in.
pub const DEFAULT_CORNER_MARGIN: f64 = 10.0;

/// Orders points by ascending x, compared as `ceil(a.x - b.x)`.
///
/// `a` only sorts after `b` when it lies at least a fraction of a pixel to
/// its right; when `a` is up to one pixel left of `b` they compare equal.
/// Not a strict total order.
pub fn x_ascending(a: &Point, b: &Point) -> Ordering {
    let diff = (a.x - b.x).ceil();
    diff.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

/// Stable insertion sort driven by [`x_ascending`]; an element moves left
/// only past neighbours it compares strictly less than.
fn sort_by_x(points: &mut [Point]) {
    for i in 1..points.len() {
        let mut j = i;
        while j > 0 && x_ascending(&points[j], &points[j - 1]) == Ordering::Less {
            points.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Orders corners and applies the outward margin.
#[derive(Debug, Clone, Copy)]
pub struct CornerCanonicalizer {
    margin: f64,
}

impl Default for CornerCanonicalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CORNER_MARGIN)
    }
}

impl CornerCanonicalizer {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    /// Canonicalise the corners of `polygon`, or `None` when they cannot be
    /// split into at least two points above and two at-or-below the centroid.
    pub fn canonicalize(&self, polygon: &Polygon) -> Option<Quadrilateral> {
        self.order(polygon).map(|quad| self.expand(&quad))
    }

    /// Order the corners as TL, TR, BR, BL without any margin.
    ///
    /// Points strictly above the centroid form the top group, all others the
    /// bottom group; each group is sorted left to right. With more than two
    /// points in a group the outermost two are used.
    pub fn order(&self, polygon: &Polygon) -> Option<Quadrilateral> {
        let center = centroid(polygon.points())?;
        let (mut top, mut bottom): (Vec<Point>, Vec<Point>) =
            polygon.points().iter().copied().partition(|p| p.y < center.y);

        if top.len() < 2 || bottom.len() < 2 {
            warn!(
                top = top.len(),
                bottom = bottom.len(),
                "Cannot split corners into top and bottom pairs"
            );
            return None;
        }

        sort_by_x(&mut top);
        sort_by_x(&mut bottom);

        let top_left = top[0];
        let top_right = top[top.len() - 1];
        let bottom_left = bottom[0];
        let bottom_right = bottom[bottom.len() - 1];

        debug!(
            ?top_left,
            ?top_right,
            ?bottom_right,
            ?bottom_left,
            "Corners ordered"
        );
        Some(Quadrilateral::new([
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        ]))
    }

    /// Push each corner of an ordered quadrilateral outwards by the margin.
    pub fn expand(&self, quad: &Quadrilateral) -> Quadrilateral {
        let m = self.margin;
        Quadrilateral::new([
            quad.top_left().offset(-m, -m),
            quad.top_right().offset(m, -m),
            quad.bottom_right().offset(m, m),
            quad.bottom_left().offset(-m, m),
        ])
    }
}
