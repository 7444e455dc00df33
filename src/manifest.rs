//! Cohort bookkeeping: per-patch manifest rows, per-image statistics, and
//! cohort totals.
//!
//! Per-image work produces a private [`ImageBundle`]; a single owner merges
//! bundles in processing order so manifest rows stay grouped by image and
//! ordered by patch index, regardless of how the per-image map ran.

use std::collections::HashSet;

use anyhow::{bail, Result};
use serde::Serialize;

/// One persisted row per accepted patch.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub patch_id: String,
    pub wsi_id: String,
    pub patch_index: usize,
    pub y: usize,
    pub x: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub coverage: f64,
}

/// Exactly one per processed image, including images that failed mid-stage;
/// counts then reflect the work completed before the failure.
#[derive(Debug, Clone, Serialize)]
pub struct WsiStatistics {
    pub wsi_id: String,
    pub attempted_patches: u64,
    pub valid_patches: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CohortStatistics {
    pub total_attempted_patches: u64,
    pub total_valid_patches: u64,
}

/// Private result of one image's patch extraction.
#[derive(Debug, Clone)]
pub struct ImageBundle {
    pub wsi_id: String,
    pub entries: Vec<ManifestEntry>,
    pub attempted_patches: u64,
    pub valid_patches: u64,
}

impl ImageBundle {
    pub fn new(wsi_id: &str) -> Self {
        Self {
            wsi_id: wsi_id.to_string(),
            entries: Vec::new(),
            attempted_patches: 0,
            valid_patches: 0,
        }
    }
}

/// Sole owner of the growing manifest and statistics collections for a run.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: Vec<ManifestEntry>,
    statistics: Vec<WsiStatistics>,
    seen_patch_ids: HashSet<String>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one image's bundle into the shared collections. Rejects patch
    /// ids that were already recorded; ids are deterministic, so a duplicate
    /// means the same image was merged twice.
    pub fn merge(&mut self, bundle: ImageBundle) -> Result<()> {
        for entry in &bundle.entries {
            if !self.seen_patch_ids.insert(entry.patch_id.clone()) {
                bail!("duplicate patch id {} in manifest", entry.patch_id);
            }
        }
        self.entries.extend(bundle.entries);
        self.statistics.push(WsiStatistics {
            wsi_id: bundle.wsi_id,
            attempted_patches: bundle.attempted_patches,
            valid_patches: bundle.valid_patches,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn statistics(&self) -> &[WsiStatistics] {
        &self.statistics
    }

    /// Cohort totals, recomputed as the exact sum of the per-image rows.
    pub fn cohort(&self) -> CohortStatistics {
        let mut totals = CohortStatistics::default();
        for s in &self.statistics {
            totals.total_attempted_patches += s.attempted_patches;
            totals.total_valid_patches += s.valid_patches;
        }
        totals
    }
}
