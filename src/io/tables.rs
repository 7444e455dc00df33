//! Cohort-level tabular outputs: mask metadata, patch manifest, per-image
//! statistics, and the cohort statistics record.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::manifest::{CohortStatistics, ManifestEntry, WsiStatistics};
use crate::mask::MaskMetadata;

pub fn write_mask_metadata_csv(path: &Path, rows: &[MaskMetadata]) -> Result<()> {
    let mut w = create(path)?;
    writeln!(
        w,
        "wsi_id,method,threshold,min_threshold,coverage,raw_area_px,clean_area_px,\
         image_area_px,removed_object_area_px,filled_hole_area_px,remove_small_objects,\
         small_object_threshold,fill_small_holes,small_hole_threshold"
    )?;
    for m in rows {
        writeln!(
            w,
            "{},{},{:.6},{:.6},{:.6},{},{},{},{},{},{},{},{},{}",
            m.wsi_id,
            m.method,
            m.threshold,
            m.min_threshold,
            m.coverage,
            m.raw_area_px,
            m.clean_area_px,
            m.image_area_px,
            m.removed_object_area_px,
            m.filled_hole_area_px,
            m.remove_small_objects,
            m.small_object_threshold,
            m.fill_small_holes,
            m.small_hole_threshold
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_manifest_csv(path: &Path, rows: &[ManifestEntry]) -> Result<()> {
    let mut w = create(path)?;
    writeln!(
        w,
        "patch_id,wsi_id,patch_index,y,x,channels,height,width,coverage"
    )?;
    for e in rows {
        writeln!(
            w,
            "{},{},{},{},{},{},{},{},{:.6}",
            e.patch_id, e.wsi_id, e.patch_index, e.y, e.x, e.channels, e.height, e.width, e.coverage
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_wsi_statistics_csv(path: &Path, rows: &[WsiStatistics]) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "wsi_id,attempted_patches,valid_patches")?;
    for s in rows {
        writeln!(w, "{},{},{}", s.wsi_id, s.attempted_patches, s.valid_patches)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_cohort_statistics_json(path: &Path, stats: &CohortStatistics) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), stats)?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
