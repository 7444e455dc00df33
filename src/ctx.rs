//! Shared run context threaded through the pipeline stages.

use std::path::PathBuf;

use crate::config::Config;
use crate::io::id_map::IdMapping;
use crate::manifest::{CohortStatistics, ManifestBuilder};
use crate::mask::{CleanParams, MaskMetadata, ThresholdMethod};
use crate::panel::Panel;

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub mask_folder: PathBuf,
    pub mask_metadata_folder: PathBuf,
    pub patch_folder: PathBuf,
    pub patch_metadata_folder: PathBuf,
    pub id_mapping_file: PathBuf,
}

pub struct Ctx {
    pub config: Config,
    pub threshold_method: ThresholdMethod,
    pub remove_small_objects: bool,
    pub fill_small_holes: bool,
    pub preprocess: bool,
    pub save_metadata: bool,
    pub threads: usize,

    pub id_mapping: Option<IdMapping>,
    pub panel: Option<Panel>,
    /// Canonical tags of the channels feeding the composite signal.
    pub mask_tags: Vec<String>,

    pub mask_metadata: Vec<MaskMetadata>,
    pub manifest: ManifestBuilder,
    pub cohort: Option<CohortStatistics>,

    /// Non-fatal per-image failures, surfaced at the end of the run.
    pub warnings: Vec<String>,

    pub output: OutputPaths,
}

impl Ctx {
    pub fn new(config: Config, threshold_method: ThresholdMethod) -> Self {
        let output = OutputPaths {
            mask_folder: config.tissue_mask.mask_folder.clone(),
            mask_metadata_folder: config.tissue_mask.metadata_folder.clone(),
            patch_folder: config.patch_extraction.patch_folder.clone(),
            patch_metadata_folder: config.patch_extraction.patch_folder.join("metadata"),
            id_mapping_file: config.id_mapping_file.clone(),
        };
        Self {
            config,
            threshold_method,
            remove_small_objects: true,
            fill_small_holes: true,
            preprocess: true,
            save_metadata: true,
            threads: 0,
            id_mapping: None,
            panel: None,
            mask_tags: Vec::new(),
            mask_metadata: Vec::new(),
            manifest: ManifestBuilder::new(),
            cohort: None,
            warnings: Vec::new(),
            output,
        }
    }

    pub fn clean_params(&self) -> CleanParams {
        CleanParams {
            remove_small_objects: self.remove_small_objects,
            small_object_threshold: self.config.tissue_mask.small_object_threshold,
            fill_small_holes: self.fill_small_holes,
            small_hole_threshold: self.config.tissue_mask.small_hole_threshold,
        }
    }
}
