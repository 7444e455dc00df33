//! The concrete preprocessing steps, in their fixed pipeline order.

use crate::config::StripeDirection;
use crate::image::ChannelImage;
use crate::preprocess::filters::{binary_erosion_8, median_filter, percentile};
use crate::preprocess::PreprocessStep;

/// Replaces isolated hot pixels with the local median. A pixel qualifies when
/// its deviation from the local median exceeds `z_score_threshold` local MADs
/// and none of its 8 neighbors also qualify; clustered outliers may be real
/// structure at IMC resolution and are left alone.
pub struct HotPixelRemoval {
    pub window_size: usize,
    pub z_score_threshold: f32,
}

impl PreprocessStep for HotPixelRemoval {
    fn name(&self) -> &'static str {
        "hot_pixel_removal"
    }

    fn apply(&self, image: &mut ChannelImage) {
        let (height, width) = (image.height(), image.width());
        let w = self.window_size.max(1);
        for c in 0..image.n_channels() {
            let plane = image.channel(c).to_vec();
            let local_median = median_filter(&plane, height, width, w, w);
            let deviation: Vec<f32> = plane
                .iter()
                .zip(&local_median)
                .map(|(v, m)| (v - m).abs())
                .collect();
            let mut local_mad = median_filter(&deviation, height, width, w, w);
            for m in &mut local_mad {
                if *m == 0.0 {
                    *m = 1e-6;
                }
            }
            let hot: Vec<bool> = plane
                .iter()
                .zip(&local_median)
                .zip(&local_mad)
                .map(|((v, m), mad)| ((v - m) / mad).abs() > self.z_score_threshold)
                .collect();
            let eroded = binary_erosion_8(&hot, height, width);
            let out = image.channel_mut(c);
            for i in 0..out.len() {
                if hot[i] && !eroded[i] {
                    out[i] = local_median[i];
                }
            }
        }
    }
}

/// Directional median filter that suppresses row or column striping.
pub struct StripeRemoval {
    pub direction: StripeDirection,
    pub size: usize,
}

impl PreprocessStep for StripeRemoval {
    fn name(&self) -> &'static str {
        "striping_removal"
    }

    fn apply(&self, image: &mut ChannelImage) {
        let (height, width) = (image.height(), image.width());
        let (wy, wx) = match self.direction {
            StripeDirection::Row => (1, self.size.max(1)),
            StripeDirection::Column => (self.size.max(1), 1),
        };
        for c in 0..image.n_channels() {
            let filtered = median_filter(image.channel(c), height, width, wy, wx);
            image.channel_mut(c).copy_from_slice(&filtered);
        }
    }
}

/// Variance-stabilizing arcsinh transform, per channel.
pub struct ArcsinhDenoise {
    pub cofactor: f32,
}

impl PreprocessStep for ArcsinhDenoise {
    fn name(&self) -> &'static str {
        "denoising"
    }

    fn apply(&self, image: &mut ChannelImage) {
        let cofactor = if self.cofactor != 0.0 { self.cofactor } else { 1.0 };
        for c in 0..image.n_channels() {
            for v in image.channel_mut(c) {
                *v = (*v / cofactor).asinh();
            }
        }
    }
}

/// Subtracts a per-channel percentile background estimate, clamped at zero.
pub struct BackgroundSubtraction {
    pub percentile: f64,
}

impl PreprocessStep for BackgroundSubtraction {
    fn name(&self) -> &'static str {
        "background_subtraction"
    }

    fn apply(&self, image: &mut ChannelImage) {
        for c in 0..image.n_channels() {
            let level = percentile(image.channel(c), self.percentile);
            for v in image.channel_mut(c) {
                *v = (*v - level).max(0.0);
            }
        }
    }
}

/// Clips each channel at its lower/upper quantiles.
pub struct Winsorize {
    pub lower: f64,
    pub upper: f64,
}

impl PreprocessStep for Winsorize {
    fn name(&self) -> &'static str {
        "winsorization"
    }

    fn apply(&self, image: &mut ChannelImage) {
        for c in 0..image.n_channels() {
            let lo = percentile(image.channel(c), self.lower * 100.0);
            let hi = percentile(image.channel(c), (1.0 - self.upper) * 100.0);
            for v in image.channel_mut(c) {
                *v = v.clamp(lo, hi);
            }
        }
    }
}

/// Min-max scales each channel to [0, 1]; a flat channel maps to zero.
pub struct MinMaxScale;

impl PreprocessStep for MinMaxScale {
    fn name(&self) -> &'static str {
        "min_max_scaling"
    }

    fn apply(&self, image: &mut ChannelImage) {
        for c in 0..image.n_channels() {
            let plane = image.channel(c);
            let mut lo = f32::INFINITY;
            let mut hi = f32::NEG_INFINITY;
            for &v in plane {
                lo = lo.min(v);
                hi = hi.max(v);
            }
            let range = hi - lo;
            for v in image.channel_mut(c) {
                *v = if range > 0.0 { (*v - lo) / range } else { 0.0 };
            }
        }
    }
}
