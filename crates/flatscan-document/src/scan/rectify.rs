// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — size the output from the quadrilateral's edge
// lengths and warp the original photograph onto a flat rectangle.

use flatscan_core::Quadrilateral;
use flatscan_core::error::{FlatscanError, Result};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{info, instrument, warn};

use crate::geometry::{control_points, distance};

/// Largest output buffer a rectification may allocate (1 GiB).
pub const MAX_OUTPUT_BYTES: u64 = 1 << 30;

/// Output size of a rectified quadrilateral, before rounding to pixels.
///
/// Width is the mean of the top and bottom edges, height the mean of the
/// right and left edges. Corners must be in TL, TR, BR, BL order.
pub fn destination_size(quad: &Quadrilateral) -> (f64, f64) {
    let [tl, tr, br, bl] = quad.corners();
    let top = distance(tl, tr);
    let right = distance(tr, br);
    let bottom = distance(br, bl);
    let left = distance(bl, tl);
    ((top + bottom) / 2.0, (right + left) / 2.0)
}

/// Warps the region under a canonical quadrilateral onto an upright canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveRectifier;

impl PerspectiveRectifier {
    pub fn new() -> Self {
        Self
    }

    /// Rectify `quad` out of `image`.
    ///
    /// The output keeps the 8-bit luma, RGB or RGBA layout of the input;
    /// other layouts come back as RGBA8. Pixels that map outside the source
    /// are black.
    ///
    /// # Errors
    ///
    /// [`FlatscanError::InvalidGeometry`] when a corner is not finite, when the
    /// output would be zero pixels wide or tall, or when the four corners do
    /// not define a projective transform (three or more collinear). Also when
    /// the output buffer would exceed [`MAX_OUTPUT_BYTES`].
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn rectify(&self, image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage> {
        if !quad.corners().iter().all(|p| p.is_finite()) {
            return Err(FlatscanError::InvalidGeometry(format!(
                "corners are not finite: {:?}",
                quad.corners()
            )));
        }

        let (width, height) = destination_size(quad);
        let out_w = width.round() as u32;
        let out_h = height.round() as u32;
        if out_w == 0 || out_h == 0 {
            warn!(width, height, "Quadrilateral collapses to an empty rectangle");
            return Err(FlatscanError::InvalidGeometry(format!(
                "destination rectangle is {}x{} pixels",
                out_w, out_h
            )));
        }

        let channels = match image {
            DynamicImage::ImageLuma8(_) => 1,
            DynamicImage::ImageRgb8(_) => 3,
            _ => 4,
        };
        let bytes = u64::from(out_w)
            .checked_mul(u64::from(out_h))
            .and_then(|pixels| pixels.checked_mul(channels));
        if !bytes.is_some_and(|bytes| bytes <= MAX_OUTPUT_BYTES) {
            warn!(width, height, "Rectified page would be too large");
            return Err(FlatscanError::InvalidGeometry(format!(
                "destination rectangle {:.0}x{:.0} exceeds the {} byte output limit",
                width, height, MAX_OUTPUT_BYTES
            )));
        }

        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),
            (out_w as f32, 0.0),
            (out_w as f32, out_h as f32),
            (0.0, out_h as f32),
        ];
        let projection = Projection::from_control_points(control_points(quad), dest)
            .ok_or_else(|| {
                FlatscanError::InvalidGeometry(format!(
                    "no projective transform for corners {:?}",
                    quad.corners()
                ))
            })?;

        let rectified = match image {
            DynamicImage::ImageLuma8(src) => {
                let mut out = GrayImage::new(out_w, out_h);
                warp_into(src, &projection, Interpolation::Bilinear, Luma([0]), &mut out);
                DynamicImage::ImageLuma8(out)
            }
            DynamicImage::ImageRgb8(src) => {
                let mut out = RgbImage::new(out_w, out_h);
                warp_into(src, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
                DynamicImage::ImageRgb8(out)
            }
            DynamicImage::ImageRgba8(src) => {
                let mut out = RgbaImage::new(out_w, out_h);
                let black = Rgba([0, 0, 0, 255]);
                warp_into(src, &projection, Interpolation::Bilinear, black, &mut out);
                DynamicImage::ImageRgba8(out)
            }
            other => {
                let src = other.to_rgba8();
                let mut out = RgbaImage::new(out_w, out_h);
                let black = Rgba([0, 0, 0, 255]);
                warp_into(&src, &projection, Interpolation::Bilinear, black, &mut out);
                DynamicImage::ImageRgba8(out)
            }
        };

        info!(out_w, out_h, "Perspective rectified");
        Ok(rectified)
    }
}
