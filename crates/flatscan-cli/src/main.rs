// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatscan — scan a photographed page from the command line.
//
// Decodes the photo, finds and flattens the page, writes the result and
// optionally an outline preview and a JSON report.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use flatscan_core::error::{FlatscanError, Result};
use flatscan_core::human_errors::{humanize_error, humanize_status};
use flatscan_core::{AdaptiveMethod, CaptureMode, DetectionStatus, Quadrilateral, ScanConfig};
use flatscan_document::overlay::OUTLINE_COLOR;
use flatscan_document::scan::binarize::adaptive_threshold;
use flatscan_document::{DocumentScanner, draw_outline};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use tracing::{info, warn};

/// Outline thickness in the preview image.
const OVERLAY_THICKNESS: u32 = 6;

/// Window and offset of the black-and-white output threshold.
const BILEVEL_BLOCK_SIZE: u32 = 41;
const BILEVEL_OFFSET: f32 = 9.0;

#[derive(Debug, Parser)]
#[command(name = "flatscan")]
#[command(about = "Find a page in a photo and flatten it")]
#[command(version)]
struct Cli {
    /// Photo of the document (any format the image crate decodes).
    input: PathBuf,

    /// Where to write the flattened page; the format follows the extension.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON file with scanner settings. Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip detection and use these corners, as fractions of the photo's
    /// width and height in TL TR BR BL order, e.g. "0.1,0.1 0.9,0.1 0.9,0.9 0.1,0.9".
    #[arg(long, value_parser = parse_manual_corners)]
    manual: Option<ManualCorners>,

    /// Also write the photo with the page outline drawn on it.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write the page as black and white instead of keeping its colours.
    #[arg(long)]
    bilevel: bool,

    /// Print a JSON report on stdout.
    #[arg(long)]
    json: bool,
}

/// Corner fractions given with `--manual`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ManualCorners([(f64, f64); 4]);

fn parse_manual_corners(raw: &str) -> std::result::Result<ManualCorners, String> {
    let pairs: Vec<&str> = raw.split_whitespace().collect();
    if pairs.len() != 4 {
        return Err(format!("expected 4 corners, got {}", pairs.len()));
    }

    let mut corners = [(0.0, 0.0); 4];
    for (slot, pair) in corners.iter_mut().zip(pairs) {
        let (x, y) = pair
            .split_once(',')
            .ok_or_else(|| format!("corner '{}' is not of the form x,y", pair))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("bad coordinate '{}' in '{}': {}", v, pair, e))
        };
        *slot = (parse(x)?, parse(y)?);
    }
    Ok(ManualCorners(corners))
}

/// What `--json` prints.
#[derive(Debug, Serialize)]
struct Report {
    status: &'static str,
    /// Corners as fractions of the source photo, TL TR BR BL.
    corners: Option<[(f64, f64); 4]>,
    width: u32,
    height: u32,
    search_ms: f64,
    rectify_ms: f64,
}

fn status_label(status: &DetectionStatus) -> &'static str {
    match status {
        DetectionStatus::Found { .. } => "found",
        DetectionStatus::Manual { .. } => "manual",
        DetectionStatus::NotFound => "not_found",
        DetectionStatus::DegenerateCorners { .. } => "degenerate_corners",
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(err) => return fail(&FlatscanError::from(err)),
                }
            } else {
                println!(
                    "{}: {} ({}x{})",
                    report.status,
                    cli.output.display(),
                    report.width,
                    report.height
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => fail(&err),
    }
}

fn fail(err: &FlatscanError) -> ExitCode {
    let human = humanize_error(err);
    eprintln!("error: {}", human.message);
    eprintln!("  {}", human.suggestion);
    eprintln!("  ({err})");
    ExitCode::FAILURE
}

/// Scan `cli.input` and write every requested output.
fn run(cli: &Cli) -> Result<Report> {
    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    let scanner = DocumentScanner::new(config)?;

    let source = open_image(&cli.input)?;
    let (width, height) = (source.width(), source.height());
    info!(path = %cli.input.display(), width, height, "Photo loaded");

    let mode = match cli.manual {
        Some(ManualCorners(fractions)) => {
            CaptureMode::Manual(Quadrilateral::from_fractions(fractions, width, height)?)
        }
        None => CaptureMode::Automatic,
    };

    let preview_source = cli.overlay.as_ref().map(|_| source.clone());
    let outcome = scanner.scan(source, mode)?;
    if let Some(human) = humanize_status(&outcome.status) {
        warn!(suggestion = %human.suggestion, "{}", human.message);
    }

    if let (Some(path), Some(photo)) = (&cli.overlay, preview_source) {
        match outcome.status.corners() {
            Some(corners) => {
                let preview = draw_outline(&photo, corners, OUTLINE_COLOR, OVERLAY_THICKNESS);
                save_image(&DynamicImage::ImageRgba8(preview), path)?;
            }
            None => warn!(path = %path.display(), "No outline to draw; preview not written"),
        }
    }

    if cli.bilevel {
        save_image(&bilevel(&outcome.image), &cli.output)?;
    } else {
        save_image(&outcome.image, &cli.output)?;
    }

    Ok(Report {
        status: status_label(&outcome.status),
        corners: outcome
            .status
            .corners()
            .map(|corners| corners.to_fractions(width, height)),
        width: outcome.image.width(),
        height: outcome.image.height(),
        search_ms: outcome.timings.search.as_secs_f64() * 1000.0,
        rectify_ms: outcome.timings.rectify.as_secs_f64() * 1000.0,
    })
}

/// Threshold `page` against its local mean so paper turns white and ink black.
fn bilevel(page: &DynamicImage) -> DynamicImage {
    let gray = page.to_luma8();
    DynamicImage::ImageLuma8(adaptive_threshold(
        &gray,
        BILEVEL_BLOCK_SIZE,
        BILEVEL_OFFSET,
        AdaptiveMethod::Gaussian,
    ))
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|err| match err {
        image::ImageError::IoError(io) => FlatscanError::Io(io),
        other => FlatscanError::ImageError(format!(
            "failed to open {}: {}",
            path.display(),
            other
        )),
    })
}

/// Save `image` in the format implied by `path`, dropping alpha for formats
/// that cannot store it.
fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|err| {
        FlatscanError::ImageError(format!("unknown output format for {}: {}", path.display(), err))
    })?;

    let written = match format {
        ImageFormat::Jpeg if image.color().has_alpha() => {
            DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(path, format)
        }
        _ => image.save_with_format(path, format),
    };
    written.map_err(|err| match err {
        image::ImageError::IoError(io) => FlatscanError::Io(io),
        other => FlatscanError::ImageError(format!(
            "failed to write {}: {}",
            path.display(),
            other
        )),
    })?;
    info!(path = %path.display(), "Image written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_page(dir: &Path) -> PathBuf {
        let mut img = GrayImage::new(500, 700);
        for y in 75..650 {
            for x in 50..460 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        let path = dir.join("page.png");
        img.save(&path).unwrap();
        path
    }

    fn cli(input: PathBuf, output: PathBuf) -> Cli {
        Cli {
            input,
            output,
            config: None,
            manual: None,
            overlay: None,
            bilevel: false,
            json: false,
        }
    }

    #[test]
    fn parses_manual_corners() {
        let corners = parse_manual_corners("0.1,0.2 0.9,0.2  0.9,0.8 0.1,0.8").unwrap();
        assert_eq!(corners.0[0], (0.1, 0.2));
        assert_eq!(corners.0[3], (0.1, 0.8));

        assert!(parse_manual_corners("0.1,0.2 0.9,0.2 0.9,0.8").is_err());
        assert!(parse_manual_corners("0.1;0.2 0.9,0.2 0.9,0.8 0.1,0.8").is_err());
        assert!(parse_manual_corners("a,0.2 0.9,0.2 0.9,0.8 0.1,0.8").is_err());
    }

    #[test]
    fn automatic_scan_writes_flattened_page() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_page(dir.path());
        let output = dir.path().join("flat.png");
        let mut args = cli(input, output.clone());
        args.overlay = Some(dir.path().join("preview.jpg"));

        let report = run(&args).unwrap();
        assert_eq!(report.status, "found");
        assert!(report.corners.is_some());

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (report.width, report.height));
        assert!(dir.path().join("preview.jpg").exists());
    }

    #[test]
    fn manual_scan_uses_given_fractions() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_page(dir.path());
        let mut args = cli(input, dir.path().join("flat.jpg"));
        args.manual = Some(ManualCorners([(0.1, 0.1), (0.9, 0.1), (0.9, 0.9), (0.1, 0.9)]));

        let report = run(&args).unwrap();
        assert_eq!(report.status, "manual");
        assert_eq!((report.width, report.height), (400, 560));
        assert_eq!(report.search_ms, 0.0);
    }

    #[test]
    fn bilevel_output_is_pure_black_and_white() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_page(dir.path());
        let output = dir.path().join("flat.png");
        let mut args = cli(input, output.clone());
        args.bilevel = true;

        let report = run(&args).unwrap();
        assert_eq!(report.status, "found");

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (report.width, report.height));
        let gray = written.to_luma8();
        assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        let (cx, cy) = (gray.width() / 2, gray.height() / 2);
        assert_eq!(gray.get_pixel(cx, cy).0[0], 255);
    }

    #[test]
    fn bilevel_keeps_ink_dark_on_white_paper() {
        let mut page = GrayImage::from_pixel(120, 80, Luma([230u8]));
        for y in 36..44 {
            for x in 20..100 {
                page.put_pixel(x, y, Luma([30u8]));
            }
        }
        let out = bilevel(&DynamicImage::ImageLuma8(page)).to_luma8();
        assert_eq!(out.get_pixel(60, 40).0[0], 0);
        assert_eq!(out.get_pixel(60, 10).0[0], 255);
    }

    #[test]
    fn blank_photo_is_copied_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("blank.png");
        GrayImage::from_pixel(320, 240, Luma([180u8]))
            .save(&input)
            .unwrap();
        let output = dir.path().join("out.png");

        let report = run(&cli(input, output.clone())).unwrap();
        assert_eq!(report.status, "not_found");
        assert!(report.corners.is_none());
        assert_eq!((report.width, report.height), (320, 240));
        assert!(output.exists());
    }

    #[test]
    fn missing_input_is_an_io_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&cli(dir.path().join("nope.png"), dir.path().join("out.png"))).unwrap_err();
        match err {
            FlatscanError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn config_file_is_applied_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_page(dir.path());
        let config = dir.path().join("scan.json");
        std::fs::write(&config, r#"{ "downscale_target": 0 }"#).unwrap();

        let mut args = cli(input, dir.path().join("out.png"));
        args.config = Some(config);
        let err = run(&args).unwrap_err();
        assert!(matches!(err, FlatscanError::InvalidConfig(_)));
    }

    #[test]
    fn out_of_range_fractions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_page(dir.path());
        let mut args = cli(input, dir.path().join("out.png"));
        args.manual = Some(ManualCorners([(0.1, 0.1), (1.5, 0.1), (0.9, 0.9), (0.1, 0.9)]));
        let err = run(&args).unwrap_err();
        assert!(matches!(err, FlatscanError::InvalidCorners(_)));
    }

    #[test]
    fn report_serializes_corners_as_pairs() {
        let report = Report {
            status: "found",
            corners: Some([(0.1, 0.2), (0.9, 0.2), (0.9, 0.8), (0.1, 0.8)]),
            width: 10,
            height: 20,
            search_ms: 1.5,
            rectify_ms: 0.5,
        };
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["corners"][1][0], 0.9);
        assert_eq!(json["height"], 20);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
