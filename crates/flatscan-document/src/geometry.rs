// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Point and polygon helpers shared by the search and rectification stages:
// scaling between the working copy and the original photograph, conversion
// to and from imageproc's integer pixel points, distances and areas.

use flatscan_core::{Point, Polygon, Quadrilateral};
use imageproc::point::Point as PixelPoint;

/// Scale every vertex of `polygon` by `factor` about the origin.
///
/// Used to move a polygon between the downscaled search space and the
/// original image space; a new polygon is returned.
pub fn scale_polygon(polygon: &Polygon, factor: f64) -> Polygon {
    Polygon::new(
        polygon
            .points()
            .iter()
            .map(|p| Point::new(p.x * factor, p.y * factor))
            .collect(),
    )
}

/// Convert integer contour points into a floating-point polygon.
pub fn from_pixel_points(points: &[PixelPoint<i32>]) -> Polygon {
    Polygon::new(
        points
            .iter()
            .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
            .collect(),
    )
}

/// Convert a polygon to integer pixel points, rounding to the nearest pixel.
pub fn to_pixel_points(polygon: &Polygon) -> Vec<PixelPoint<i32>> {
    polygon
        .points()
        .iter()
        .map(|p| PixelPoint::new(p.x.round() as i32, p.y.round() as i32))
        .collect()
}

/// Euclidean distance between two points.
pub fn distance(a: &Point, b: &Point) -> f64 {
    a.distance_to(b)
}

/// Signed area of a closed polygon (shoelace formula).
///
/// Positive when the vertices run clockwise in image coordinates (y down),
/// negative when they run counter-clockwise. Fewer than three vertices give 0.
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice_area / 2.0
}

/// Signed area of integer contour points, same convention as [`signed_area`].
pub fn pixel_signed_area(points: &[PixelPoint<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut twice_area: i64 = 0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += i64::from(points[i].x) * i64::from(points[j].y)
            - i64::from(points[j].x) * i64::from(points[i].y);
    }
    twice_area as f64 / 2.0
}

/// Arithmetic mean of the points, or `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Corners as the `(f32, f32)` control points imageproc's projection wants.
pub fn control_points(quad: &Quadrilateral) -> [(f32, f32); 4] {
    quad.corners().map(|p| (p.x as f32, p.y as f32))
}
