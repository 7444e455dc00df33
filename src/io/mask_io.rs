//! Tissue mask persistence as single-channel 8-bit rasters.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::GrayImage;

use crate::image::TissueMask;

pub fn mask_path(mask_folder: &Path, wsi_id: &str) -> PathBuf {
    mask_folder.join(format!("{wsi_id}_mask.png"))
}

pub fn save_mask(mask: &TissueMask, path: &Path) -> Result<()> {
    let pixels: Vec<u8> = mask
        .as_slice()
        .iter()
        .map(|&v| if v { 255u8 } else { 0u8 })
        .collect();
    let raster = GrayImage::from_raw(mask.width() as u32, mask.height() as u32, pixels)
        .context("mask buffer does not match its dimensions")?;
    raster
        .save(path)
        .with_context(|| format!("failed to write mask {}", path.display()))?;
    Ok(())
}

pub fn load_mask(path: &Path) -> Result<TissueMask> {
    let raster = image::open(path)
        .with_context(|| format!("failed to read mask {}", path.display()))?
        .to_luma8();
    let (width, height) = (raster.width() as usize, raster.height() as usize);
    let data = raster.into_raw().into_iter().map(|v| v > 0).collect();
    TissueMask::new(height, width, data)
}
