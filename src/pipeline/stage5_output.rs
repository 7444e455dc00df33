//! Persists the cohort-level tables produced by the earlier stages.

use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::tables;
use crate::pipeline::Stage;

pub struct Stage5Output;

impl Stage5Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Output {
    fn name(&self) -> &'static str {
        "stage5_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.save_metadata && !ctx.mask_metadata.is_empty() {
            let path = ctx.output.mask_metadata_folder.join("mask_metadata.csv");
            tables::write_mask_metadata_csv(&path, &ctx.mask_metadata)?;
            info!(rows = ctx.mask_metadata.len(), path = %path.display(), "mask metadata written");
        }

        if !ctx.manifest.statistics().is_empty() {
            let manifest_path = ctx.output.patch_metadata_folder.join("manifest.csv");
            tables::write_manifest_csv(&manifest_path, ctx.manifest.entries())?;

            let stats_path = ctx.output.patch_metadata_folder.join("wsi_statistics.csv");
            tables::write_wsi_statistics_csv(&stats_path, ctx.manifest.statistics())?;

            let cohort = ctx.manifest.cohort();
            let cohort_path = ctx
                .output
                .patch_metadata_folder
                .join("cohort_statistics.json");
            tables::write_cohort_statistics_json(&cohort_path, &cohort)?;

            info!(
                patches = ctx.manifest.entries().len(),
                images = ctx.manifest.statistics().len(),
                attempted = cohort.total_attempted_patches,
                valid = cohort.total_valid_patches,
                "patch tables written"
            );
            ctx.cohort = Some(cohort);
        }
        Ok(())
    }
}
