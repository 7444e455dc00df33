//! Per-image scalar summary of the thresholding and cleaning result.

use serde::Serialize;

use crate::image::TissueMask;
use crate::mask::clean::CleanParams;
use crate::mask::threshold::ThresholdMethod;

#[derive(Debug, Clone, Serialize)]
pub struct MaskMetadata {
    pub wsi_id: String,
    pub method: String,
    pub threshold: f64,
    pub min_threshold: f64,
    /// Foreground fraction of the cleaned mask, in [0, 1].
    pub coverage: f64,
    pub raw_area_px: u64,
    pub clean_area_px: u64,
    pub image_area_px: u64,
    pub removed_object_area_px: u64,
    pub filled_hole_area_px: u64,
    pub remove_small_objects: bool,
    pub small_object_threshold: usize,
    pub fill_small_holes: bool,
    pub small_hole_threshold: usize,
}

/// Derives the metadata record for one image. Pure; called once per image.
pub fn record(
    wsi_id: &str,
    raw_mask: &TissueMask,
    clean_mask: &TissueMask,
    method: ThresholdMethod,
    threshold: f64,
    min_threshold: f64,
    params: &CleanParams,
) -> MaskMetadata {
    let image_area_px = clean_mask.total_count();
    let raw_area_px = raw_mask.foreground_count();
    let clean_area_px = clean_mask.foreground_count();

    let mut removed_object_area_px = 0u64;
    let mut filled_hole_area_px = 0u64;
    for (&before, &after) in raw_mask.as_slice().iter().zip(clean_mask.as_slice()) {
        if before && !after {
            removed_object_area_px += 1;
        }
        if after && !before {
            filled_hole_area_px += 1;
        }
    }

    MaskMetadata {
        wsi_id: wsi_id.to_string(),
        method: method.name().to_string(),
        threshold,
        min_threshold,
        coverage: clean_area_px as f64 / image_area_px as f64,
        raw_area_px,
        clean_area_px,
        image_area_px,
        removed_object_area_px,
        filled_hole_area_px,
        remove_small_objects: params.remove_small_objects,
        small_object_threshold: params.small_object_threshold,
        fill_small_holes: params.fill_small_holes,
        small_hole_threshold: params.small_hole_threshold,
    }
}
