//! Coverage-filtered patch extraction over the cohort.
//!
//! Images are mapped in parallel; each worker enumerates its grid, screens
//! candidates against the tissue mask and writes accepted blocks into the
//! patch store. Every worker returns a bundle even on failure, so the
//! per-image statistics row reflects the work completed before the error.
//! Bundles are folded into the manifest sequentially, in cohort order.

use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::ctx::Ctx;
use crate::error::CoreError;
use crate::io::id_map::IdEntry;
use crate::io::{mask_io, stack};
use crate::manifest::{ImageBundle, ManifestEntry};
use crate::patch::filter;
use crate::patch::sampler::PatchGrid;
use crate::patch::store::PatchStore;
use crate::patch::{self, PatchSize};
use crate::pipeline::Stage;
use crate::preprocess::{self, PreprocessStep};

pub struct Stage4Patches;

impl Stage4Patches {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Patches {
    fn name(&self) -> &'static str {
        "stage4_patches"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let results: Vec<(ImageBundle, Option<anyhow::Error>)> = {
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
            let store = PatchStore::create(&ctx.output.patch_folder)?;
            let config = &ctx.config;
            let mask_folder = ctx.output.mask_folder.clone();

            let worker = |entry: &IdEntry| {
                extract_one(
                    entry,
                    config,
                    &acquisition_tags,
                    &retained,
                    &steps,
                    &store,
                    &mask_folder,
                )
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

        for (bundle, error) in results {
            let wsi_id = bundle.wsi_id.clone();
            info!(
                wsi_id = wsi_id.as_str(),
                attempted = bundle.attempted_patches,
                valid = bundle.valid_patches,
                "patches extracted"
            );
            ctx.manifest.merge(bundle)?;
            if let Some(err) = error {
                warn!(wsi_id = wsi_id.as_str(), error = %err, "patch extraction failed");
                ctx.warnings
                    .push(format!("patch extraction failed for {}: {:#}", wsi_id, err));
            }
        }
        Ok(())
    }
}

/// Extracts patches for one image. The bundle is returned alongside any
/// error: counts cover everything enumerated and written up to the failure.
#[allow(clippy::too_many_arguments)]
fn extract_one(
    entry: &IdEntry,
    config: &Config,
    acquisition_tags: &[String],
    retained: &[usize],
    steps: &[Box<dyn PreprocessStep>],
    store: &PatchStore,
    mask_folder: &Path,
) -> (ImageBundle, Option<anyhow::Error>) {
    let mut bundle = ImageBundle::new(&entry.wsi_id);
    let error = extract_into(
        entry,
        config,
        acquisition_tags,
        retained,
        steps,
        store,
        mask_folder,
        &mut bundle,
    )
    .err();
    (bundle, error)
}

#[allow(clippy::too_many_arguments)]
fn extract_into(
    entry: &IdEntry,
    config: &Config,
    acquisition_tags: &[String],
    retained: &[usize],
    steps: &[Box<dyn PreprocessStep>],
    store: &PatchStore,
    mask_folder: &Path,
    bundle: &mut ImageBundle,
) -> Result<()> {
    let mask_path = mask_io::mask_path(mask_folder, &entry.wsi_id);
    if !mask_path.exists() {
        return Err(CoreError::MissingMask {
            wsi_id: entry.wsi_id.clone(),
            path: mask_path,
        }
        .into());
    }
    let mask = mask_io::load_mask(&mask_path)?;

    let image = stack::read_stack(&entry.path, acquisition_tags)?;
    let mut image = if retained.len() == image.n_channels() {
        image
    } else {
        image.take_channels(retained)?
    };
    preprocess::apply_all(steps, &mut image);

    if mask.height() != image.height() || mask.width() != image.width() {
        return Err(CoreError::DimensionMismatch {
            wsi_id: entry.wsi_id.clone(),
            mask_height: mask.height(),
            mask_width: mask.width(),
            image_height: image.height(),
            image_width: image.width(),
        }
        .into());
    }

    let size = PatchSize {
        height: config.patch_extraction.patch_size[0],
        width: config.patch_extraction.patch_size[1],
    };
    let grid = PatchGrid::new(
        image.height(),
        image.width(),
        size,
        config.patch_extraction.stride,
    )?;

    for candidate in grid.iter() {
        bundle.attempted_patches += 1;
        let (keep, coverage) = filter::accept(
            &mask,
            &candidate,
            size,
            config.patch_extraction.min_tissue_coverage,
        );
        if !keep {
            continue;
        }
        let pixels = patch::extract_pixel_block(&image, &candidate, size);
        let mask_block = patch::extract_mask_block(&mask, &candidate, size);
        let patch_id = store.write(&entry.wsi_id, &candidate, &pixels, &mask_block)?;
        bundle.entries.push(ManifestEntry {
            patch_id,
            wsi_id: entry.wsi_id.clone(),
            patch_index: candidate.index,
            y: candidate.y,
            x: candidate.x,
            channels: pixels.channels,
            height: size.height,
            width: size.width,
            coverage,
        });
        bundle.valid_patches += 1;
    }
    Ok(())
}
