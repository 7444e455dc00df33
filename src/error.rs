use std::path::PathBuf;

use thiserror::Error;

/// Structured failure kinds for the mask/patch core.
///
/// Pipeline stages convert these into `anyhow` errors at the image-processing
/// boundary; configuration-level variants are raised before any image is
/// touched.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("degenerate intensity signal for {wsi_id}: {reason}")]
    DegenerateSignal { wsi_id: String, reason: String },

    #[error(
        "mask shape {mask_height}x{mask_width} does not match image \
         {image_height}x{image_width} for {wsi_id}"
    )]
    DimensionMismatch {
        wsi_id: String,
        mask_height: usize,
        mask_width: usize,
        image_height: usize,
        image_width: usize,
    },

    #[error("no tissue mask found for {wsi_id} at {path}")]
    MissingMask { wsi_id: String, path: PathBuf },

    #[error("invalid patch grid: {0}")]
    InvalidGrid(String),
}
