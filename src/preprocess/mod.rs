//! Optional per-channel preprocessing, built once from configuration as an
//! explicit ordered list of steps.

pub mod filters;
pub mod steps;

use tracing::debug;

use crate::config::PreprocessingConfig;
use crate::image::ChannelImage;
use steps::{
    ArcsinhDenoise, BackgroundSubtraction, HotPixelRemoval, MinMaxScale, StripeRemoval, Winsorize,
};

/// A single preprocessing step applied in place to every channel.
pub trait PreprocessStep: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, image: &mut ChannelImage);
}

/// Builds the enabled steps in their fixed application order.
pub fn build_steps(cfg: &PreprocessingConfig) -> Vec<Box<dyn PreprocessStep>> {
    let mut steps: Vec<Box<dyn PreprocessStep>> = Vec::new();
    if cfg.toggles.apply_hot_pixel_removal {
        steps.push(Box::new(HotPixelRemoval {
            window_size: cfg.hot_pixel.window_size,
            z_score_threshold: cfg.hot_pixel.z_score_threshold,
        }));
    }
    if cfg.toggles.apply_striping_removal {
        steps.push(Box::new(StripeRemoval {
            direction: cfg.striping.direction,
            size: cfg.striping.size,
        }));
    }
    if cfg.toggles.apply_denoising {
        steps.push(Box::new(ArcsinhDenoise {
            cofactor: cfg.denoising.cofactor,
        }));
    }
    if cfg.toggles.apply_background_subtraction {
        steps.push(Box::new(BackgroundSubtraction {
            percentile: cfg.background_subtraction.percentile,
        }));
    }
    if cfg.toggles.apply_winsorization {
        steps.push(Box::new(Winsorize {
            lower: cfg.winsorization.limits[0],
            upper: cfg.winsorization.limits[1],
        }));
    }
    if cfg.toggles.apply_min_max_scaling {
        steps.push(Box::new(MinMaxScale));
    }
    steps
}

pub fn apply_all(steps: &[Box<dyn PreprocessStep>], image: &mut ChannelImage) {
    for step in steps {
        debug!(step = step.name(), "preprocess step");
        step.apply(image);
    }
}
