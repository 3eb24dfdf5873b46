// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outline overlay — draw the detected page outline onto a copy of the source
// photograph so a user can check the corners before accepting the scan.

use flatscan_core::{Point, Quadrilateral};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;
use tracing::debug;

/// Default outline colour (opaque green).
pub const OUTLINE_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Thinnest outline that still draws as a filled band.
const MIN_THICKNESS: u32 = 2;

/// Draw the four edges of `quad` onto an RGBA copy of `image`.
///
/// Edges are filled bands `thickness` pixels wide (at least 2) with round
/// joints at the corners. Parts of the outline outside the image are clipped.
pub fn draw_outline(
    image: &DynamicImage,
    quad: &Quadrilateral,
    color: Rgba<u8>,
    thickness: u32,
) -> RgbaImage {
    let mut canvas = image.to_rgba8();
    let half = f64::from(thickness.max(MIN_THICKNESS)) / 2.0;
    let corners = quad.corners();

    for (i, start) in corners.iter().enumerate() {
        let end = &corners[(i + 1) % corners.len()];
        if let Some(band) = segment_band(start, end, half) {
            draw_polygon_mut(&mut canvas, &band, color);
        }
    }
    let radius = half.round() as i32;
    for corner in corners {
        let center = pixel(corner);
        draw_filled_circle_mut(&mut canvas, (center.x, center.y), radius, color);
    }

    debug!(?corners, thickness, "Outline drawn");
    canvas
}

/// The rectangle of half-width `half` around the segment, or `None` for a
/// zero-length segment.
fn segment_band(start: &Point, end: &Point, half: f64) -> Option<[PixelPoint<i32>; 4]> {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let length = dx.hypot(dy);
    if !length.is_finite() || length < 1e-3 {
        return None;
    }
    let (nx, ny) = (-dy / length * half, dx / length * half);
    Some([
        pixel(&start.offset(nx, ny)),
        pixel(&end.offset(nx, ny)),
        pixel(&end.offset(-nx, -ny)),
        pixel(&start.offset(-nx, -ny)),
    ])
}

fn pixel(point: &Point) -> PixelPoint<i32> {
    PixelPoint::new(point.x.round() as i32, point.y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn square() -> Quadrilateral {
        Quadrilateral::new([
            Point::new(20.0, 20.0),
            Point::new(180.0, 20.0),
            Point::new(180.0, 180.0),
            Point::new(20.0, 180.0),
        ])
    }

    #[test]
    fn outline_covers_edges_but_not_interior() {
        let source = DynamicImage::ImageLuma8(GrayImage::new(200, 200));
        let red = Rgba([255, 0, 0, 255]);
        let out = draw_outline(&source, &square(), red, 4);

        assert_eq!((out.width(), out.height()), (200, 200));
        assert_eq!(*out.get_pixel(100, 20), red);
        assert_eq!(*out.get_pixel(180, 100), red);
        assert_eq!(*out.get_pixel(20, 20), red);
        assert_eq!(*out.get_pixel(100, 100), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(5, 5), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn source_image_is_not_modified() {
        let source = DynamicImage::ImageLuma8(GrayImage::new(200, 200));
        let _ = draw_outline(&source, &square(), OUTLINE_COLOR, 3);
        assert!(source.to_luma8().pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn corners_outside_the_image_are_clipped() {
        let source = DynamicImage::ImageLuma8(GrayImage::new(50, 50));
        let quad = Quadrilateral::new([
            Point::new(-10.0, -10.0),
            Point::new(60.0, -10.0),
            Point::new(60.0, 60.0),
            Point::new(-10.0, 60.0),
        ]);
        let out = draw_outline(&source, &quad, OUTLINE_COLOR, 2);
        assert_eq!(*out.get_pixel(25, 25), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn collapsed_quad_draws_a_dot() {
        let source = DynamicImage::ImageLuma8(GrayImage::new(40, 40));
        let quad = Quadrilateral::new([Point::new(20.0, 20.0); 4]);
        let out = draw_outline(&source, &quad, OUTLINE_COLOR, 2);
        assert_eq!(*out.get_pixel(20, 20), OUTLINE_COLOR);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn zero_length_segment_has_no_band() {
        let p = Point::new(3.0, 4.0);
        assert!(segment_band(&p, &p, 1.0).is_none());
        assert!(segment_band(&p, &Point::new(13.0, 4.0), 1.0).is_some());
    }
}
