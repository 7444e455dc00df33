//! Tissue-coverage screening of candidate patches.

use crate::image::TissueMask;
use crate::patch::{PatchCandidate, PatchSize};

/// Fraction of foreground pixels inside the candidate's block of the mask.
pub fn coverage(mask: &TissueMask, candidate: &PatchCandidate, size: PatchSize) -> f64 {
    let mut foreground = 0u64;
    for y in candidate.y..candidate.y + size.height {
        for x in candidate.x..candidate.x + size.width {
            if mask.get(y, x) {
                foreground += 1;
            }
        }
    }
    foreground as f64 / size.area() as f64
}

/// The boundary is inclusive: a patch exactly at the minimum is accepted.
pub fn accept(
    mask: &TissueMask,
    candidate: &PatchCandidate,
    size: PatchSize,
    min_tissue_coverage: f64,
) -> (bool, f64) {
    let fraction = coverage(mask, candidate, size);
    (fraction >= min_tissue_coverage, fraction)
}
