//! Low-level 2-D filter primitives shared by the preprocessing steps.

/// Median filter with a `wy` x `wx` window and nearest-border padding.
pub fn median_filter(plane: &[f32], height: usize, width: usize, wy: usize, wx: usize) -> Vec<f32> {
    let ry = (wy / 2) as isize;
    let rx = (wx / 2) as isize;
    let mut out = vec![0.0f32; plane.len()];
    let mut window = Vec::with_capacity(wy * wx);
    for y in 0..height as isize {
        for x in 0..width as isize {
            window.clear();
            for dy in -ry..=ry {
                let sy = (y + dy).clamp(0, height as isize - 1) as usize;
                for dx in -rx..=rx {
                    let sx = (x + dx).clamp(0, width as isize - 1) as usize;
                    window.push(plane[sy * width + sx]);
                }
            }
            window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            out[y as usize * width + x as usize] = window[window.len() / 2];
        }
    }
    out
}

/// Binary erosion with a full 3x3 structuring element. A pixel survives only
/// when it and all its 8 neighbors are set; border pixels never survive.
pub fn binary_erosion_8(mask: &[bool], height: usize, width: usize) -> Vec<bool> {
    let mut out = vec![false; mask.len()];
    if height < 3 || width < 3 {
        return out;
    }
    for y in 1..height - 1 {
        'pixel: for x in 1..width - 1 {
            for dy in 0..3 {
                for dx in 0..3 {
                    if !mask[(y + dy - 1) * width + (x + dx - 1)] {
                        continue 'pixel;
                    }
                }
            }
            out[y * width + x] = true;
        }
    }
    out
}

/// Percentile of a sample via the nearest-rank rule, `p` in [0, 100].
pub fn percentile(values: &[f32], p: f64) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
