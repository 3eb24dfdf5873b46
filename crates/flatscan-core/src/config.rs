// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlatscanError, Result};
use crate::types::AreaBounds;

/// How the local threshold of an adaptive binarization pass is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveMethod {
    /// Gaussian-weighted neighbourhood mean.
    #[default]
    Gaussian,
    /// Plain box mean over the block.
    Mean,
}

/// Tunables for document detection and rectification.
///
/// Every field has a default, so a JSON file only needs to name the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Accepted candidate area as a fraction of the (downscaled) image area.
    pub area_bounds: AreaBounds,
    /// Longer side of the working copy used for the search, in pixels.
    pub downscale_target: u32,
    /// Median blur radius; 5 gives an 11x11 window.
    pub median_radius: u32,
    /// Canny hysteresis thresholds for the edge pass.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Dilation radius applied to the Canny output (1 = 3x3).
    pub dilate_radius: u8,
    /// Block sizes of the adaptive-threshold passes, in pass order.
    pub adaptive_block_sizes: Vec<u32>,
    /// Constant subtracted from the local mean.
    pub adaptive_offset: f32,
    pub adaptive_method: AdaptiveMethod,
    /// Simplification tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Outward shift applied to each canonical corner.
    pub corner_margin: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            area_bounds: AreaBounds::default(),
            downscale_target: 600,
            median_radius: 5,
            canny_low: 20.0,
            canny_high: 100.0,
            dilate_radius: 1,
            adaptive_block_sizes: vec![35, 37, 39, 41, 43, 45],
            adaptive_offset: 9.0,
            adaptive_method: AdaptiveMethod::Gaussian,
            approx_epsilon_ratio: 0.02,
            corner_margin: 10.0,
        }
    }
}

impl ScanConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let AreaBounds {
            lower_ratio,
            upper_ratio,
        } = self.area_bounds;
        if !(0.0..=1.0).contains(&lower_ratio) || !(0.0..=1.0).contains(&upper_ratio) {
            return Err(FlatscanError::InvalidConfig(format!(
                "area bounds ({}, {}) must lie in [0, 1]",
                lower_ratio, upper_ratio
            )));
        }
        if lower_ratio > upper_ratio {
            return Err(FlatscanError::InvalidConfig(format!(
                "lower area ratio {} exceeds upper ratio {}",
                lower_ratio, upper_ratio
            )));
        }
        if self.downscale_target == 0 {
            return Err(FlatscanError::InvalidConfig(
                "downscale target must be positive".into(),
            ));
        }
        if self.adaptive_block_sizes.is_empty() {
            return Err(FlatscanError::InvalidConfig(
                "at least one adaptive block size is required".into(),
            ));
        }
        if let Some(bad) = self
            .adaptive_block_sizes
            .iter()
            .find(|&&size| size < 3 || size % 2 == 0)
        {
            return Err(FlatscanError::InvalidConfig(format!(
                "adaptive block size {} must be odd and at least 3",
                bad
            )));
        }
        if self.canny_low.is_nan()
            || self.canny_high.is_nan()
            || self.canny_low < 0.0
            || self.canny_low > self.canny_high
        {
            return Err(FlatscanError::InvalidConfig(format!(
                "canny thresholds ({}, {}) must satisfy 0 <= low <= high",
                self.canny_low, self.canny_high
            )));
        }
        if !self.adaptive_offset.is_finite() {
            return Err(FlatscanError::InvalidConfig(format!(
                "adaptive offset {} must be a finite number",
                self.adaptive_offset
            )));
        }
        if self.approx_epsilon_ratio.is_nan() || self.approx_epsilon_ratio <= 0.0 {
            return Err(FlatscanError::InvalidConfig(format!(
                "simplification ratio {} must be positive",
                self.approx_epsilon_ratio
            )));
        }
        if self.corner_margin.is_nan() || self.corner_margin < 0.0 {
            return Err(FlatscanError::InvalidConfig(format!(
                "corner margin {} must not be negative",
                self.corner_margin
            )));
        }
        Ok(())
    }
}
