// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Flatscan document pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{FlatscanError, Result};

/// A point in some image's coordinate space.
///
/// The type does not record *which* space (downscaled working copy or the
/// original photograph); callers convert explicitly by scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// A new point shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// An ordered, closed sequence of vertices. Winding is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A polygon with exactly four corners.
///
/// After canonicalisation the order is always
/// `[top_left, top_right, bottom_right, bottom_left]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    corners: [Point; 4],
}

impl Quadrilateral {
    /// Build a quadrilateral from corners given in TL, TR, BR, BL order.
    pub const fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    pub fn top_left(&self) -> Point {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.corners[3]
    }

    /// Build corners from fractions of the image width and height.
    ///
    /// Used by hosts that let the user drag corners on a preview shown at a
    /// different scale than the photograph. Fractions must lie in `[0, 1]`.
    pub fn from_fractions(fractions: [(f64, f64); 4], width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FlatscanError::InvalidCorners(format!(
                "cannot place corners on a {}x{} image",
                width, height
            )));
        }
        let mut corners = [Point::new(0.0, 0.0); 4];
        for (slot, (fx, fy)) in corners.iter_mut().zip(fractions) {
            if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
                return Err(FlatscanError::InvalidCorners(format!(
                    "corner fraction ({}, {}) outside [0, 1]",
                    fx, fy
                )));
            }
            *slot = Point::new(fx * width as f64, fy * height as f64);
        }
        Ok(Self { corners })
    }

    /// Express the corners as fractions of `width` x `height`.
    ///
    /// Coordinates at or below zero are pinned to one pixel first so that an
    /// overlay never places a handle exactly on the image border.
    pub fn to_fractions(&self, width: u32, height: u32) -> [(f64, f64); 4] {
        let (w, h) = (width.max(1) as f64, height.max(1) as f64);
        self.corners.map(|p| {
            let x = if p.x <= 0.0 { 1.0 } else { p.x };
            let y = if p.y <= 0.0 { 1.0 } else { p.y };
            (x / w, y / h)
        })
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners.to_vec())
    }
}

impl TryFrom<Polygon> for Quadrilateral {
    type Error = FlatscanError;

    fn try_from(polygon: Polygon) -> Result<Self> {
        let count = polygon.len();
        let corners: [Point; 4] = polygon.into_points().try_into().map_err(|_| {
            FlatscanError::InvalidCorners(format!("expected 4 corners, got {}", count))
        })?;
        Ok(Self { corners })
    }
}

/// A simplified contour that survived extraction for one binarization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Simplified polygon in the downscaled working space.
    pub polygon: Polygon,
    /// Signed area in pixels²; the sign encodes winding.
    pub area: f64,
    /// Index of the binarization pass that produced it (0 = edge pass).
    pub pass_index: usize,
}

impl Candidate {
    pub fn vertex_count(&self) -> usize {
        self.polygon.len()
    }
}

/// Fraction of the image area a candidate's area must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub lower_ratio: f64,
    pub upper_ratio: f64,
}

impl AreaBounds {
    pub const fn new(lower_ratio: f64, upper_ratio: f64) -> Self {
        Self {
            lower_ratio,
            upper_ratio,
        }
    }

    /// Both bounds inclusive; `area` is compared by magnitude.
    pub fn contains(&self, area: f64, image_area: f64) -> bool {
        let area = area.abs();
        area >= self.lower_ratio * image_area && area <= self.upper_ratio * image_area
    }
}

impl Default for AreaBounds {
    fn default() -> Self {
        Self::new(0.1, 0.85)
    }
}

/// How the document corners are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Search the image for the page outline.
    Automatic,
    /// The caller already knows the corners, in TL, TR, BR, BL order.
    Manual(Quadrilateral),
}

/// What a scan found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionStatus {
    /// Canonical corners in original-image coordinates.
    Found { corners: Quadrilateral },
    /// Corners were supplied by the caller.
    Manual { corners: Quadrilateral },
    /// No pass produced a polygon with an acceptable vertex count and area.
    NotFound,
    /// A polygon was found but its corners could not be split into two
    /// top and two bottom points. Carries the raw polygon.
    DegenerateCorners { polygon: Polygon },
}

impl DetectionStatus {
    /// Corners used for rectification, if any.
    pub fn corners(&self) -> Option<&Quadrilateral> {
        match self {
            Self::Found { corners } | Self::Manual { corners } => Some(corners),
            Self::NotFound | Self::DegenerateCorners { .. } => None,
        }
    }
}
