// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Working-copy preparation and binarization passes — downscale, median blur,
// Canny + dilation, and adaptive thresholding at several block sizes.

use flatscan_core::error::{FlatscanError, Result};
use flatscan_core::{AdaptiveMethod, ScanConfig};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::morphology::dilate;
use tracing::{debug, instrument};

/// Grayscale, downscaled and blurred copy of the photograph that every
/// binarization pass reads from.
#[derive(Debug, Clone)]
pub struct WorkingImage {
    /// Blurred grayscale pixels.
    pub gray: GrayImage,
    /// `downscale_target / max(original width, original height)`.
    ///
    /// Multiply original coordinates by this to get working coordinates, and
    /// divide to go back.
    pub ratio: f64,
}

impl WorkingImage {
    /// Downscale `image` so its longer side equals `downscale_target`, convert
    /// to grayscale and apply the median blur once.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn prepare(image: &DynamicImage, config: &ScanConfig) -> Result<Self> {
        let (orig_w, orig_h) = (image.width(), image.height());
        if orig_w == 0 || orig_h == 0 {
            return Err(FlatscanError::Primitive(format!(
                "cannot search a {}x{} image",
                orig_w, orig_h
            )));
        }

        let ratio = f64::from(config.downscale_target) / f64::from(orig_w.max(orig_h));
        let work_w = ((f64::from(orig_w) * ratio).round() as u32).max(1);
        let work_h = ((f64::from(orig_h) * ratio).round() as u32).max(1);

        let gray = image.to_luma8();
        let downscaled = image::imageops::resize(&gray, work_w, work_h, FilterType::Triangle);
        let blurred = median_filter(&downscaled, config.median_radius, config.median_radius);

        debug!(work_w, work_h, ratio, "Working copy prepared");
        Ok(Self {
            gray: blurred,
            ratio,
        })
    }

    /// Total pixel area of the working copy.
    pub fn area(&self) -> f64 {
        f64::from(self.gray.width()) * f64::from(self.gray.height())
    }
}

/// One way of turning the blurred grayscale copy into a binary map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarizationPass {
    /// Canny edges, dilated to close gaps between segments. Catches pages
    /// with gradient shading.
    EdgeDetection,
    /// Local-mean thresholding over a `block_size` x `block_size` window.
    AdaptiveThreshold { block_size: u32 },
}

impl BinarizationPass {
    /// The fixed pass order: the edge pass first, then one adaptive pass per
    /// configured block size.
    pub fn sequence(config: &ScanConfig) -> Vec<Self> {
        std::iter::once(Self::EdgeDetection)
            .chain(
                config
                    .adaptive_block_sizes
                    .iter()
                    .map(|&block_size| Self::AdaptiveThreshold { block_size }),
            )
            .collect()
    }

    /// Produce the binary map for this pass. Foreground pixels are 255.
    pub fn apply(&self, gray: &GrayImage, config: &ScanConfig) -> GrayImage {
        match *self {
            Self::EdgeDetection => {
                let edges = canny(gray, config.canny_low, config.canny_high);
                if config.dilate_radius == 0 {
                    edges
                } else {
                    dilate(&edges, Norm::LInf, config.dilate_radius)
                }
            }
            Self::AdaptiveThreshold { block_size } => adaptive_threshold(
                gray,
                block_size,
                config.adaptive_offset,
                config.adaptive_method,
            ),
        }
    }
}

/// Binarize with a per-pixel threshold of `local_mean - offset`.
///
/// Pixels strictly brighter than their threshold become 255, others 0. The
/// local mean is taken over a `block_size` window centred on the pixel, either
/// Gaussian-weighted or as a plain box mean.
pub fn adaptive_threshold(
    gray: &GrayImage,
    block_size: u32,
    offset: f32,
    method: AdaptiveMethod,
) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);

    match method {
        AdaptiveMethod::Gaussian => {
            let local_mean = gaussian_blur_f32(gray, gaussian_sigma(block_size));
            for (x, y, pixel) in gray.enumerate_pixels() {
                let threshold = f32::from(local_mean.get_pixel(x, y).0[0]) - offset;
                output.put_pixel(x, y, binary(f32::from(pixel.0[0]) > threshold));
            }
        }
        AdaptiveMethod::Mean => {
            let integral = compute_integral_image(gray);
            let radius = block_size / 2;
            for (x, y, pixel) in gray.enumerate_pixels() {
                let local_mean = region_mean(&integral, width, height, x, y, radius);
                let threshold = local_mean - f64::from(offset);
                output.put_pixel(x, y, binary(f64::from(pixel.0[0]) > threshold));
            }
        }
    }

    output
}

fn binary(foreground: bool) -> Luma<u8> {
    if foreground { Luma([255u8]) } else { Luma([0u8]) }
}

/// Sigma of the Gaussian window matching a given block size
/// (`0.3 * ((block - 1) / 2 - 1) + 0.8`).
fn gaussian_sigma(block_size: u32) -> f32 {
    let half = (block_size.max(3) as f32 - 1.0) * 0.5;
    0.3 * (half - 1.0) + 0.8
}

// -- Integral image helpers ---------------------------------------------------

/// Summed-area table with a zero-padded first row and column.
///
/// `integral[y * (width+1) + x]` is the sum of all pixels in `[0, x) x [0, y)`.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += u64::from(gray.get_pixel(x, y).0[0]);
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value of the square of `radius` around `(cx, cy)`, clamped to
/// the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bright_square(size: u32, lo: u32, hi: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(size, size, Luma([20u8]));
        for y in lo..hi {
            for x in lo..hi {
                img.put_pixel(x, y, Luma([230u8]));
            }
        }
        img
    }

    #[test]
    fn pass_sequence_starts_with_edges() {
        let passes = BinarizationPass::sequence(&ScanConfig::default());
        assert_eq!(passes.len(), 7);
        assert_eq!(passes[0], BinarizationPass::EdgeDetection);
        assert_eq!(
            passes[1..],
            [35, 37, 39, 41, 43, 45].map(|block_size| BinarizationPass::AdaptiveThreshold {
                block_size
            })
        );
    }

    #[test]
    fn prepare_downscales_longer_side_to_target() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(1000, 1400, Luma([90u8])));
        let working = WorkingImage::prepare(&img, &ScanConfig::default()).unwrap();
        assert_eq!(working.gray.height(), 600);
        assert_eq!(working.gray.width(), 429);
        assert!((working.ratio - 600.0 / 1400.0).abs() < 1e-12);
    }

    #[test]
    fn prepare_rejects_empty_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 10));
        let err = WorkingImage::prepare(&img, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, FlatscanError::Primitive(_)));
    }

    #[test]
    fn uniform_image_thresholds_to_all_foreground() {
        let gray = GrayImage::from_pixel(64, 64, Luma([120u8]));
        for method in [AdaptiveMethod::Gaussian, AdaptiveMethod::Mean] {
            let out = adaptive_threshold(&gray, 35, 9.0, method);
            assert!(out.pixels().all(|p| p.0[0] == 255), "{:?}", method);
        }
    }

    #[test]
    fn dark_side_of_an_edge_becomes_background() {
        let gray = bright_square(80, 20, 60);
        for method in [AdaptiveMethod::Gaussian, AdaptiveMethod::Mean] {
            let out = adaptive_threshold(&gray, 15, 9.0, method);
            // Just outside the bright square the local mean is pulled up.
            assert_eq!(out.get_pixel(18, 40).0[0], 0, "{:?}", method);
            // Far away from any edge the background is uniform.
            assert_eq!(out.get_pixel(2, 2).0[0], 255, "{:?}", method);
            assert_eq!(out.get_pixel(40, 40).0[0], 255, "{:?}", method);
        }
    }

    #[test]
    fn edge_pass_marks_square_outline() {
        let gray = bright_square(80, 20, 60);
        let out = BinarizationPass::EdgeDetection.apply(&gray, &ScanConfig::default());
        assert!(out.pixels().any(|p| p.0[0] == 255));
        assert_eq!(out.get_pixel(40, 40).0[0], 0);
        assert_eq!(out.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn region_mean_covers_clamped_window() {
        let gray = GrayImage::from_fn(4, 4, |x, _| Luma([(x * 10) as u8]));
        let integral = compute_integral_image(&gray);
        let mean = region_mean(&integral, 4, 4, 0, 0, 1);
        assert!((mean - 5.0).abs() < 1e-9);
    }

    #[test]
    fn gaussian_sigma_grows_with_block() {
        assert!((gaussian_sigma(3) - 0.8).abs() < 1e-6);
        assert!(gaussian_sigma(45) > gaussian_sigma(35));
    }
}
