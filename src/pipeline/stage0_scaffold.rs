use anyhow::Result;
use std::fs;
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;

pub struct Stage0Scaffold;

impl Stage0Scaffold {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Scaffold {
    fn name(&self) -> &'static str {
        "stage0_scaffold"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        fs::create_dir_all(&ctx.output.mask_folder)?;
        fs::create_dir_all(&ctx.output.mask_metadata_folder)?;
        fs::create_dir_all(&ctx.output.patch_folder)?;
        fs::create_dir_all(&ctx.output.patch_metadata_folder)?;
        if let Some(parent) = ctx.output.id_mapping_file.parent() {
            fs::create_dir_all(parent)?;
        }
        info!(
            mask_folder = %ctx.output.mask_folder.display(),
            patch_folder = %ctx.output.patch_folder.display(),
            "output_dirs_ready"
        );
        Ok(())
    }
}
