// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the flatscan-document crate: the multi-pass
// rectangle search and the perspective warp, on a synthetic photo of a
// white sheet on a dark table.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

use flatscan_core::{Point, Quadrilateral, ScanConfig};
use flatscan_document::{PerspectiveRectifier, RectangleSearch};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const SHEET: [(i32, i32); 4] = [(300, 420), (2700, 360), (2760, 3900), (240, 3960)];

/// A 3024x4032 photo (a common phone sensor size) of a slightly skewed sheet.
fn photo() -> DynamicImage {
    let corners = SHEET.map(|(x, y)| PixelPoint::new(x, y));
    let mut img = RgbImage::from_pixel(3024, 4032, Rgb([55, 50, 45]));
    draw_polygon_mut(&mut img, &corners, Rgb([240, 238, 230]));
    DynamicImage::ImageRgb8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Benchmark the seven binarization passes plus bucket selection.
///
/// The downscale to 600px dominates memory traffic; the passes dominate CPU.
fn bench_rectangle_search(c: &mut Criterion) {
    let image = photo();
    let search = RectangleSearch::new(ScanConfig::default());

    c.bench_function("rectangle_search (3024x4032)", |b| {
        b.iter(|| {
            let hit = search.find(black_box(&image));
            black_box(hit.ok());
        });
    });
}

/// Benchmark the full-resolution warp of the sheet.
fn bench_rectify(c: &mut Criterion) {
    let image = photo();
    let quad = Quadrilateral::new(SHEET.map(|(x, y)| Point::new(f64::from(x), f64::from(y))));
    let rectifier = PerspectiveRectifier::new();

    c.bench_function("rectify (2460x3540 output)", |b| {
        b.iter(|| {
            let out = rectifier.rectify(black_box(&image), black_box(&quad));
            black_box(out.ok());
        });
    });
}

criterion_group!(benches, bench_rectangle_search, bench_rectify);
criterion_main!(benches);
