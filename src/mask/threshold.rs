//! Dynamic tissue thresholding: Otsu's method and a two-component Gaussian
//! mixture fit by expectation-maximization.

use crate::error::CoreError;
use crate::image::{Composite, TissueMask};

const HISTOGRAM_BINS: usize = 256;
const EM_MAX_ITERATIONS: usize = 100;
const EM_TOLERANCE: f64 = 1e-6;
const SIGMA_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    Otsu,
    Gmm,
}

impl ThresholdMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ThresholdMethod::Otsu => "otsu",
            ThresholdMethod::Gmm => "gmm",
        }
    }

    /// Computes the binary tissue mask and the threshold that produced it.
    ///
    /// The threshold is floored at `min_tissue_threshold` so a near-empty
    /// acquisition never classifies every pixel as tissue. A pixel is
    /// foreground iff its intensity is strictly above the threshold.
    pub fn compute_mask(
        &self,
        composite: &Composite,
        wsi_id: &str,
        min_tissue_threshold: f64,
    ) -> Result<(TissueMask, f64), CoreError> {
        let threshold = match self {
            ThresholdMethod::Otsu => otsu_threshold(composite),
            ThresholdMethod::Gmm => gmm_threshold(composite, wsi_id)?,
        };
        let threshold = threshold.max(min_tissue_threshold);
        Ok((apply_threshold(composite, threshold), threshold))
    }
}

/// Binarizes the composite: foreground iff intensity > threshold.
pub fn apply_threshold(composite: &Composite, threshold: f64) -> TissueMask {
    let mut mask = TissueMask::filled(composite.height, composite.width, false);
    for y in 0..composite.height {
        for x in 0..composite.width {
            if composite.data[y * composite.width + x] as f64 > threshold {
                mask.set(y, x, true);
            }
        }
    }
    mask
}

/// Otsu's method over 256 equal-width bins of the composite's value range.
///
/// Values are floored into their bin and the returned threshold is the
/// boundary between the best split's low bin and its neighbor, so the same
/// binning model is used for assignment and reconstruction. Ties in
/// between-class variance break toward the smallest split. A flat field
/// returns the single value itself, which binarizes to an all-background
/// mask; that is a valid result, not an error.
pub fn otsu_threshold(composite: &Composite) -> f64 {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in &composite.data {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(hi > lo) {
        return lo as f64;
    }

    let range = (hi - lo) as f64;
    let mut histogram = [0u64; HISTOGRAM_BINS];
    for &v in &composite.data {
        let unit = ((v - lo) as f64 / range).clamp(0.0, 1.0);
        let bin = ((unit * HISTOGRAM_BINS as f64) as usize).min(HISTOGRAM_BINS - 1);
        histogram[bin] += 1;
    }

    let total = composite.data.len() as f64;
    let mut weighted_sum = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        weighted_sum += i as f64 * count as f64;
    }

    let mut sum_below = 0.0;
    let mut weight_below = 0.0;
    let mut best_variance = f64::NEG_INFINITY;
    let mut best_bin = 0usize;

    for (i, &count) in histogram.iter().enumerate() {
        weight_below += count as f64;
        if weight_below == 0.0 {
            continue;
        }
        let weight_above = total - weight_below;
        if weight_above == 0.0 {
            break;
        }
        sum_below += i as f64 * count as f64;
        let mean_below = sum_below / weight_below;
        let mean_above = (weighted_sum - sum_below) / weight_above;
        let variance = weight_below * weight_above * (mean_below - mean_above).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_bin = i;
        }
    }

    let bin_width = range / HISTOGRAM_BINS as f64;
    lo as f64 + (best_bin as f64 + 1.0) * bin_width
}

/// Threshold from a two-component univariate Gaussian mixture.
///
/// EM runs from a deterministic initialization (component means at the 25th
/// and 75th percentile, shared variance, equal weights) until the
/// log-likelihood gain drops below tolerance. The threshold is the
/// weighted-density crossing between the low- and high-mean components,
/// constrained to lie between the two means.
pub fn gmm_threshold(composite: &Composite, wsi_id: &str) -> Result<f64, CoreError> {
    let n = composite.data.len();
    let pixels: Vec<f64> = composite.data.iter().map(|&v| v as f64).collect();
    let mean = pixels.iter().sum::<f64>() / n as f64;
    let variance = pixels.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    if variance <= f64::EPSILON {
        return Err(CoreError::DegenerateSignal {
            wsi_id: wsi_id.to_string(),
            reason: "zero-variance composite, mixture fit cannot separate components".to_string(),
        });
    }

    let mut sorted = pixels.clone();
    sorted.sort_by(f64::total_cmp);
    let sd = variance.sqrt();
    let mut m0 = sorted[(n - 1) / 4];
    let mut m1 = sorted[(n - 1) * 3 / 4];
    if m1 - m0 <= f64::EPSILON {
        m0 = mean - sd;
        m1 = mean + sd;
    }
    let mut s0 = sd.max(SIGMA_FLOOR);
    let mut s1 = sd.max(SIGMA_FLOOR);
    let mut w0 = 0.5;
    let mut w1 = 0.5;

    let mut prev_log_likelihood = f64::NEG_INFINITY;
    let mut resp0 = vec![0.0f64; n];

    for _ in 0..EM_MAX_ITERATIONS {
        // E step
        let mut log_likelihood = 0.0;
        for (i, &x) in pixels.iter().enumerate() {
            let p0 = w0 * normal_pdf(x, m0, s0);
            let p1 = w1 * normal_pdf(x, m1, s1);
            let total = (p0 + p1).max(f64::MIN_POSITIVE);
            resp0[i] = p0 / total;
            log_likelihood += total.ln();
        }

        // M step
        let n0: f64 = resp0.iter().sum();
        let n1 = n as f64 - n0;
        if n0 <= f64::EPSILON || n1 <= f64::EPSILON {
            break;
        }
        m0 = pixels
            .iter()
            .zip(&resp0)
            .map(|(x, r)| r * x)
            .sum::<f64>()
            / n0;
        m1 = pixels
            .iter()
            .zip(&resp0)
            .map(|(x, r)| (1.0 - r) * x)
            .sum::<f64>()
            / n1;
        s0 = (pixels
            .iter()
            .zip(&resp0)
            .map(|(x, r)| r * (x - m0).powi(2))
            .sum::<f64>()
            / n0)
            .sqrt()
            .max(SIGMA_FLOOR);
        s1 = (pixels
            .iter()
            .zip(&resp0)
            .map(|(x, r)| (1.0 - r) * (x - m1).powi(2))
            .sum::<f64>()
            / n1)
            .sqrt()
            .max(SIGMA_FLOOR);
        w0 = n0 / n as f64;
        w1 = n1 / n as f64;

        if (log_likelihood - prev_log_likelihood).abs() < EM_TOLERANCE {
            break;
        }
        prev_log_likelihood = log_likelihood;
    }

    // Order components by mean before locating the decision boundary.
    let (m_lo, s_lo, w_lo, m_hi, s_hi, w_hi) = if m0 <= m1 {
        (m0, s0, w0, m1, s1, w1)
    } else {
        (m1, s1, w1, m0, s0, w0)
    };
    Ok(gaussian_intersection(m_lo, s_lo, w_lo, m_hi, s_hi, w_hi))
}

fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let z = (x - mean) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * std::f64::consts::PI).sqrt())
}

/// Intensity at which the two weighted component densities are equal,
/// constrained to the open interval between the means; the midpoint is the
/// fallback when no real crossing lies there.
fn gaussian_intersection(m0: f64, s0: f64, w0: f64, m1: f64, s1: f64, w1: f64) -> f64 {
    let midpoint = (m0 + m1) / 2.0;
    if (s0 - s1).abs() < 1e-12 {
        return midpoint;
    }
    let a = s0 * s0 - s1 * s1;
    let b = 2.0 * (m0 * s1 * s1 - m1 * s0 * s0);
    let c = m1 * m1 * s0 * s0 - m0 * m0 * s1 * s1
        + 2.0 * s0 * s0 * s1 * s1 * ((s1 * w0) / (s0 * w1)).ln();
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return midpoint;
    }
    let x1 = (-b + disc.sqrt()) / (2.0 * a);
    let x2 = (-b - disc.sqrt()) / (2.0 * a);
    if m0 < x1 && x1 < m1 {
        x1
    } else if m0 < x2 && x2 < m1 {
        x2
    } else {
        midpoint
    }
}
