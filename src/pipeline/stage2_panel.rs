use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::panel::Panel;
use crate::pipeline::Stage;

pub struct Stage2Panel;

impl Stage2Panel {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Panel {
    fn name(&self) -> &'static str {
        "stage2_panel"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let panel = Panel::load(&ctx.config.panel_file, &ctx.config.background_stains)?;
        let (tags, missing) =
            panel.mask_subset(&ctx.config.tissue_mask.mask_generation_markers);
        for marker in &missing {
            let message = format!("mask generation marker {} not found in panel", marker);
            warn!(marker = marker.as_str(), "marker missing from panel");
            ctx.warnings.push(message);
        }
        info!(
            n_rows = panel.rows().len(),
            n_channels = panel.retained_indices().len(),
            n_mask_channels = tags.len(),
            "panel loaded"
        );
        ctx.mask_tags = tags;
        ctx.panel = Some(panel);
        Ok(())
    }
}
