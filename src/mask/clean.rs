//! Binary mask cleanup: small-object removal followed by small-hole filling.
//!
//! The order is fixed. Removing an object can enclose new background regions,
//! which the hole-filling pass is then allowed to close. Both passes are
//! idempotent for a fixed configuration.

use crate::image::TissueMask;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanParams {
    pub remove_small_objects: bool,
    pub small_object_threshold: usize,
    pub fill_small_holes: bool,
    pub small_hole_threshold: usize,
}

pub fn clean(mask: &TissueMask, params: &CleanParams) -> TissueMask {
    let mut out = mask.clone();
    if params.remove_small_objects {
        remove_small_objects(&mut out, params.small_object_threshold);
    }
    if params.fill_small_holes {
        fill_small_holes(&mut out, params.small_hole_threshold);
    }
    out
}

/// Reclassifies 8-connected foreground components smaller than `threshold`
/// pixels to background.
fn remove_small_objects(mask: &mut TissueMask, threshold: usize) {
    let (height, width) = (mask.height(), mask.width());
    let labeling = label_components(mask.as_slice(), height, width, true);
    for y in 0..height {
        for x in 0..width {
            let label = labeling.labels[y * width + x];
            if label != 0 && labeling.sizes[label as usize - 1] < threshold as u64 {
                mask.set(y, x, false);
            }
        }
    }
}

/// Reclassifies fully enclosed 8-connected background components smaller than
/// `threshold` pixels to foreground. Components touching the image border are
/// open to the outside and never filled.
fn fill_small_holes(mask: &mut TissueMask, threshold: usize) {
    let (height, width) = (mask.height(), mask.width());
    let labeling = label_components(mask.as_slice(), height, width, false);

    let n_labels = labeling.sizes.len();
    let mut touches_border = vec![false; n_labels];
    for x in 0..width {
        for y in [0, height - 1] {
            let label = labeling.labels[y * width + x];
            if label != 0 {
                touches_border[label as usize - 1] = true;
            }
        }
    }
    for y in 0..height {
        for x in [0, width - 1] {
            let label = labeling.labels[y * width + x];
            if label != 0 {
                touches_border[label as usize - 1] = true;
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            let label = labeling.labels[y * width + x];
            if label != 0 {
                let idx = label as usize - 1;
                if !touches_border[idx] && labeling.sizes[idx] < threshold as u64 {
                    mask.set(y, x, true);
                }
            }
        }
    }
}

pub struct Labeling {
    /// Per-pixel component label; 0 marks pixels not matching the target value.
    pub labels: Vec<u32>,
    /// Pixel count per component, indexed by `label - 1`.
    pub sizes: Vec<u64>,
}

/// Two-pass 8-connected component labeling over pixels equal to `target`,
/// with union-find label resolution.
pub fn label_components(data: &[bool], height: usize, width: usize, target: bool) -> Labeling {
    let mut provisional = vec![0u32; data.len()];
    let mut parents: Vec<u32> = vec![0]; // parents[0] reserved for "no label"
    let mut next_label = 1u32;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if data[idx] != target {
                continue;
            }
            // Neighbors already visited in raster order: W, NW, N, NE.
            let mut neighbor_labels = [0u32; 4];
            let mut n = 0;
            if x > 0 && data[idx - 1] == target {
                neighbor_labels[n] = provisional[idx - 1];
                n += 1;
            }
            if y > 0 {
                let up = idx - width;
                if x > 0 && data[up - 1] == target {
                    neighbor_labels[n] = provisional[up - 1];
                    n += 1;
                }
                if data[up] == target {
                    neighbor_labels[n] = provisional[up];
                    n += 1;
                }
                if x + 1 < width && data[up + 1] == target {
                    neighbor_labels[n] = provisional[up + 1];
                    n += 1;
                }
            }

            if n == 0 {
                parents.push(next_label);
                provisional[idx] = next_label;
                next_label += 1;
            } else {
                let mut min_label = neighbor_labels[0];
                for &l in &neighbor_labels[1..n] {
                    min_label = min_label.min(l);
                }
                provisional[idx] = min_label;
                for &l in &neighbor_labels[..n] {
                    union(&mut parents, min_label, l);
                }
            }
        }
    }

    // Resolve roots and compact to consecutive labels.
    let mut compact = vec![0u32; parents.len()];
    let mut sizes: Vec<u64> = Vec::new();
    let mut labels = vec![0u32; data.len()];
    for (idx, &p) in provisional.iter().enumerate() {
        if p == 0 {
            continue;
        }
        let root = find(&mut parents, p);
        if compact[root as usize] == 0 {
            sizes.push(0);
            compact[root as usize] = sizes.len() as u32;
        }
        let label = compact[root as usize];
        labels[idx] = label;
        sizes[label as usize - 1] += 1;
    }

    Labeling { labels, sizes }
}

fn find(parents: &mut [u32], label: u32) -> u32 {
    let mut current = label;
    while parents[current as usize] != current {
        // Path compression: point at the grandparent while walking up.
        parents[current as usize] = parents[parents[current as usize] as usize];
        current = parents[current as usize];
    }
    current
}

fn union(parents: &mut [u32], a: u32, b: u32) {
    let root_a = find(parents, a);
    let root_b = find(parents, b);
    if root_a != root_b {
        let (lo, hi) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        parents[hi as usize] = lo;
    }
}
