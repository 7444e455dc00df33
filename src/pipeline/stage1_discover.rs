use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;
use walkdir::WalkDir;

use crate::ctx::Ctx;
use crate::io::id_map::IdMapping;
use crate::pipeline::Stage;

pub struct Stage1Discover;

impl Stage1Discover {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Discover {
    fn name(&self) -> &'static str {
        "stage1_discover"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&ctx.config.input_folder)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let ext = entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_ascii_lowercase());
            if matches!(ext.as_deref(), Some("tiff") | Some("tif")) {
                paths.push(entry.path().to_path_buf());
            }
        }
        if paths.is_empty() {
            bail!(
                "no TIFF images found in {}",
                ctx.config.input_folder.display()
            );
        }

        let mapping = IdMapping::build(&paths);
        mapping.write_csv(&ctx.output.id_mapping_file)?;
        info!(
            n_images = mapping.len(),
            id_mapping = %ctx.output.id_mapping_file.display(),
            "cohort discovered"
        );
        ctx.id_mapping = Some(mapping);
        Ok(())
    }
}
