//! Per-image tissue mask generation: composite, threshold, clean, persist.
//!
//! Images are mapped in parallel; each worker owns its in-flight image and
//! mask. Results are folded back into the context by this stage alone, in
//! cohort order. A failing image becomes a warning, not a cohort abort.

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::ctx::Ctx;
use crate::io::id_map::IdEntry;
use crate::io::{mask_io, stack};
use crate::mask::{clean, metadata, CleanParams, MaskMetadata, ThresholdMethod};
use crate::pipeline::Stage;
use crate::preprocess::{self, PreprocessStep};

pub struct Stage3Masks;

impl Stage3Masks {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Masks {
    fn name(&self) -> &'static str {
        "stage3_masks"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let results: Vec<(String, Result<MaskMetadata>)> = {
            let mapping = ctx
                .id_mapping
                .as_ref()
                .context("id mapping missing, run discovery first")?;
            let panel = ctx
                .panel
                .as_ref()
                .context("panel missing, load it first")?;
            let acquisition_tags = panel.acquisition_tags();
            let retained = panel.retained_indices().to_vec();

            let steps: Vec<Box<dyn PreprocessStep>> = if ctx.preprocess {
                preprocess::build_steps(&ctx.config.preprocessing)
            } else {
                Vec::new()
            };
            let params = ctx.clean_params();
            let method = ctx.threshold_method;
            let config = &ctx.config;
            let mask_tags = &ctx.mask_tags;
            let mask_folder = ctx.output.mask_folder.clone();

            let worker = |entry: &IdEntry| -> (String, Result<MaskMetadata>) {
                let result = generate_one(
                    entry,
                    config,
                    &acquisition_tags,
                    &retained,
                    mask_tags,
                    &steps,
                    method,
                    &params,
                    &mask_folder,
                );
                (entry.wsi_id.clone(), result)
            };

            if ctx.threads > 0 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(ctx.threads)
                    .build()
                    .context("failed to build thread pool")?;
                pool.install(|| mapping.entries().par_iter().map(worker).collect())
            } else {
                mapping.entries().par_iter().map(worker).collect()
            }
        };

        for (wsi_id, result) in results {
            match result {
                Ok(meta) => {
                    info!(
                        wsi_id = wsi_id.as_str(),
                        threshold = meta.threshold,
                        coverage = meta.coverage,
                        "mask generated"
                    );
                    ctx.mask_metadata.push(meta);
                }
                Err(err) => {
                    warn!(wsi_id = wsi_id.as_str(), error = %err, "mask generation failed");
                    ctx.warnings
                        .push(format!("mask generation failed for {}: {:#}", wsi_id, err));
                }
            }
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn generate_one(
    entry: &IdEntry,
    config: &Config,
    acquisition_tags: &[String],
    retained: &[usize],
    mask_tags: &[String],
    steps: &[Box<dyn PreprocessStep>],
    method: ThresholdMethod,
    params: &CleanParams,
    mask_folder: &std::path::Path,
) -> Result<MaskMetadata> {
    let image = stack::read_stack(&entry.path, acquisition_tags)?;
    let image = if retained.len() == image.n_channels() {
        image
    } else {
        image.take_channels(retained)?
    };
    let mut selected = if mask_tags.is_empty() {
        image
    } else {
        image.select(mask_tags)?
    };
    preprocess::apply_all(steps, &mut selected);

    let composite = selected.composite_median();
    let (raw_mask, threshold) = method.compute_mask(
        &composite,
        &entry.wsi_id,
        config.preprocessing.min_tissue_threshold,
    )?;
    let clean_mask = clean(&raw_mask, params);

    mask_io::save_mask(&clean_mask, &mask_io::mask_path(mask_folder, &entry.wsi_id))?;

    Ok(metadata::record(
        &entry.wsi_id,
        &raw_mask,
        &clean_mask,
        method,
        threshold,
        config.preprocessing.min_tissue_threshold,
        params,
    ))
}
