// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate extraction — from one binary map, take the largest contour,
// simplify it to a polygon and keep it if its vertex count and area are
// plausible for a page.

use std::ops::RangeInclusive;

use flatscan_core::{AreaBounds, Candidate, Polygon, ScanConfig};
use image::{GrayImage, Luma};
use imageproc::contours::{Contour, find_contours};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point as PixelPoint;
use tracing::debug;

use crate::geometry::{from_pixel_points, pixel_signed_area, signed_area};

/// Vertex counts a simplified contour may have to count as a page outline.
pub const ACCEPTED_VERTEX_COUNTS: RangeInclusive<usize> = 4..=10;

/// Picks at most one candidate polygon per binary map.
#[derive(Debug, Clone, Copy)]
pub struct CandidateExtractor {
    bounds: AreaBounds,
    epsilon_ratio: f64,
}

impl CandidateExtractor {
    pub fn new(bounds: AreaBounds, epsilon_ratio: f64) -> Self {
        Self {
            bounds,
            epsilon_ratio,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.area_bounds, config.approx_epsilon_ratio)
    }

    /// Extract the candidate for one binarization pass.
    ///
    /// The map's outermost pixel ring is treated as background, so
    /// foreground touching the image edge is outlined one pixel inside it
    /// and covers almost the whole image.
    ///
    /// Returns `None` when the map has no contour, or when the simplified
    /// largest contour has the wrong vertex count or area. Never fails.
    pub fn extract(
        &self,
        binary: &GrayImage,
        source_area: f64,
        pass_index: usize,
    ) -> Option<Candidate> {
        let mut framed = binary.clone();
        clear_frame(&mut framed);
        let contours = find_contours::<i32>(&framed);
        let largest = largest_contour(&contours)?;

        let perimeter = arc_length(&largest.points, true);
        if perimeter.is_nan() || perimeter <= 0.0 {
            debug!(pass_index, "Largest contour is a single point");
            return None;
        }

        let simplified = simplify_closed(&largest.points, perimeter * self.epsilon_ratio);
        debug!(
            pass_index,
            contours = contours.len(),
            contour_len = largest.points.len(),
            vertices = simplified.len(),
            "Largest contour simplified"
        );

        self.accept(from_pixel_points(&simplified), source_area, pass_index)
    }

    /// Keep `polygon` only if its vertex count is accepted and its area lies
    /// within the bounds relative to `source_area`.
    pub fn accept(
        &self,
        polygon: Polygon,
        source_area: f64,
        pass_index: usize,
    ) -> Option<Candidate> {
        if !ACCEPTED_VERTEX_COUNTS.contains(&polygon.len()) {
            return None;
        }
        let area = signed_area(polygon.points());
        if !self.bounds.contains(area, source_area) {
            debug!(
                pass_index,
                area = area.abs(),
                source_area,
                "Candidate area outside bounds"
            );
            return None;
        }
        debug!(pass_index, vertices = polygon.len(), area = area.abs(), "Candidate accepted");
        Some(Candidate {
            polygon,
            area,
            pass_index,
        })
    }
}

/// Set the one-pixel border of `binary` to background.
pub fn clear_frame(binary: &mut GrayImage) {
    let (width, height) = binary.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    for x in 0..width {
        binary.put_pixel(x, 0, Luma([0u8]));
        binary.put_pixel(x, height - 1, Luma([0u8]));
    }
    for y in 0..height {
        binary.put_pixel(0, y, Luma([0u8]));
        binary.put_pixel(width - 1, y, Luma([0u8]));
    }
}

/// The contour with the largest absolute area; on ties the earliest wins.
pub fn largest_contour(contours: &[Contour<i32>]) -> Option<&Contour<i32>> {
    let mut best: Option<(&Contour<i32>, f64)> = None;
    for contour in contours {
        let area = pixel_signed_area(&contour.points).abs();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best.map(|(contour, _)| contour)
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The contour is cut at two mutually far-apart points (both lie on the
/// outline's extremes, so they are kept as vertices) and each open half is
/// simplified on its own. The result has no repeated closing vertex.
pub fn simplify_closed(points: &[PixelPoint<i32>], epsilon: f64) -> Vec<PixelPoint<i32>> {
    if points.len() < 3 || epsilon.is_nan() || epsilon <= 0.0 {
        return points.to_vec();
    }

    let anchor = farthest_from(points, points[0]);
    let opposite = farthest_from(points, points[anchor]);
    if points[anchor] == points[opposite] {
        return vec![points[anchor]];
    }

    let n = points.len();
    let rotated: Vec<PixelPoint<i32>> = (0..=n).map(|k| points[(anchor + k) % n]).collect();
    let split = (opposite + n - anchor) % n;

    let mut simplified = approximate_polygon_dp(&rotated[..=split], epsilon, false);
    let second = approximate_polygon_dp(&rotated[split..], epsilon, false);
    simplified.pop();
    simplified.extend_from_slice(&second[..second.len() - 1]);
    simplified
}

fn farthest_from(points: &[PixelPoint<i32>], origin: PixelPoint<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = i64::from(p.x - origin.x);
        let dy = i64::from(p.y - origin.y);
        let dist = dx * dx + dy * dy;
        if dist > best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
