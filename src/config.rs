//! YAML run configuration.
//!
//! Validation of patch-grid and coverage settings is fatal and happens before
//! any image is processed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub input_folder: PathBuf,
    pub panel_file: PathBuf,
    pub id_mapping_file: PathBuf,
    #[serde(default)]
    pub background_stains: Vec<String>,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    pub tissue_mask: TissueMaskConfig,
    pub patch_extraction: PatchExtractionConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PreprocessingConfig {
    #[serde(default)]
    pub toggles: PreprocessToggles,
    #[serde(default)]
    pub min_tissue_threshold: f64,
    #[serde(default)]
    pub hot_pixel: HotPixelConfig,
    #[serde(default)]
    pub striping: StripingConfig,
    #[serde(default)]
    pub denoising: DenoisingConfig,
    #[serde(default)]
    pub background_subtraction: BackgroundSubtractionConfig,
    #[serde(default)]
    pub winsorization: WinsorizationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessToggles {
    #[serde(default = "default_true")]
    pub apply_hot_pixel_removal: bool,
    #[serde(default = "default_true")]
    pub apply_striping_removal: bool,
    #[serde(default = "default_true")]
    pub apply_denoising: bool,
    #[serde(default = "default_true")]
    pub apply_background_subtraction: bool,
    #[serde(default = "default_true")]
    pub apply_winsorization: bool,
    #[serde(default = "default_true")]
    pub apply_min_max_scaling: bool,
}

impl Default for PreprocessToggles {
    fn default() -> Self {
        Self {
            apply_hot_pixel_removal: true,
            apply_striping_removal: true,
            apply_denoising: true,
            apply_background_subtraction: true,
            apply_winsorization: true,
            apply_min_max_scaling: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotPixelConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_z_score")]
    pub z_score_threshold: f32,
}

impl Default for HotPixelConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            z_score_threshold: default_z_score(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripingConfig {
    #[serde(default = "default_stripe_direction")]
    pub direction: StripeDirection,
    #[serde(default = "default_stripe_size")]
    pub size: usize,
}

impl Default for StripingConfig {
    fn default() -> Self {
        Self {
            direction: default_stripe_direction(),
            size: default_stripe_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripeDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DenoisingConfig {
    #[serde(default = "default_cofactor")]
    pub cofactor: f32,
}

impl Default for DenoisingConfig {
    fn default() -> Self {
        Self {
            cofactor: default_cofactor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackgroundSubtractionConfig {
    #[serde(default = "default_bg_percentile")]
    pub percentile: f64,
}

impl Default for BackgroundSubtractionConfig {
    fn default() -> Self {
        Self {
            percentile: default_bg_percentile(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WinsorizationConfig {
    #[serde(default = "default_winsor_limits")]
    pub limits: [f64; 2],
}

impl Default for WinsorizationConfig {
    fn default() -> Self {
        Self {
            limits: default_winsor_limits(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TissueMaskConfig {
    pub mask_folder: PathBuf,
    pub metadata_folder: PathBuf,
    #[serde(default)]
    pub mask_generation_markers: Vec<String>,
    #[serde(default = "default_object_threshold")]
    pub small_object_threshold: usize,
    #[serde(default = "default_hole_threshold")]
    pub small_hole_threshold: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchExtractionConfig {
    pub patch_folder: PathBuf,
    pub patch_size: [usize; 2],
    #[serde(default = "default_stride")]
    pub stride: f64,
    #[serde(default)]
    pub min_tissue_coverage: f64,
}

fn default_true() -> bool {
    true
}

fn default_window_size() -> usize {
    3
}

fn default_z_score() -> f32 {
    5.0
}

fn default_stripe_direction() -> StripeDirection {
    StripeDirection::Column
}

fn default_stripe_size() -> usize {
    5
}

fn default_cofactor() -> f32 {
    5.0
}

fn default_bg_percentile() -> f64 {
    1.0
}

fn default_winsor_limits() -> [f64; 2] {
    [0.0, 0.01]
}

fn default_object_threshold() -> usize {
    64
}

fn default_hole_threshold() -> usize {
    64
}

fn default_stride() -> f64 {
    1.0
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Fails fast on misconfiguration that would otherwise surface mid-cohort.
    pub fn validate(&self) -> Result<()> {
        if !self.input_folder.exists() {
            bail!("input folder {} does not exist", self.input_folder.display());
        }
        if !self.panel_file.exists() {
            bail!("panel file {} does not exist", self.panel_file.display());
        }
        let [ph, pw] = self.patch_extraction.patch_size;
        if ph == 0 || pw == 0 {
            return Err(
                CoreError::InvalidGrid(format!("patch size {}x{} must be positive", ph, pw)).into(),
            );
        }
        let stride = self.patch_extraction.stride;
        if !stride.is_finite() || stride <= 0.0 {
            return Err(CoreError::InvalidGrid(format!(
                "stride fraction {} must be a positive finite number",
                stride
            ))
            .into());
        }
        let coverage = self.patch_extraction.min_tissue_coverage;
        if !(0.0..=1.0).contains(&coverage) {
            bail!("min_tissue_coverage {} must lie in [0, 1]", coverage);
        }
        if !self.preprocessing.min_tissue_threshold.is_finite() {
            bail!("min_tissue_threshold must be finite");
        }
        let limits = self.preprocessing.winsorization.limits;
        if limits[0] < 0.0 || limits[1] < 0.0 || limits[0] + limits[1] >= 1.0 {
            bail!("winsorization limits {:?} must be non-negative and sum below 1", limits);
        }
        Ok(())
    }
}
