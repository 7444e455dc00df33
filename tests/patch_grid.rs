use imc_patchkit::error::CoreError;
use imc_patchkit::image::TissueMask;
use imc_patchkit::patch::filter::{accept, coverage};
use imc_patchkit::patch::sampler::PatchGrid;
use imc_patchkit::patch::{PatchCandidate, PatchSize};

const SIZE_10: PatchSize = PatchSize {
    height: 10,
    width: 10,
};

#[test]
fn full_stride_tiles_without_overlap() {
    let grid = PatchGrid::new(20, 20, SIZE_10, 1.0).unwrap();
    assert_eq!(grid.step(), (10, 10));
    let candidates: Vec<PatchCandidate> = grid.iter().collect();
    let positions: Vec<(usize, usize)> = candidates.iter().map(|c| (c.y, c.x)).collect();
    assert_eq!(positions, vec![(0, 0), (0, 10), (10, 0), (10, 10)]);
    let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn half_stride_overlaps() {
    let grid = PatchGrid::new(20, 20, SIZE_10, 0.5).unwrap();
    assert_eq!(grid.iter().count(), 9);
}

#[test]
fn boundary_crossing_positions_are_never_emitted() {
    // 25x25 with stride 10: positions 20 would cross the edge.
    let grid = PatchGrid::new(25, 25, SIZE_10, 1.0).unwrap();
    for c in grid.iter() {
        assert!(c.y + 10 <= 25 && c.x + 10 <= 25, "candidate {:?}", c);
    }
    assert_eq!(grid.iter().count(), 4);
}

#[test]
fn oversized_patch_yields_empty_grid() {
    let grid = PatchGrid::new(8, 8, SIZE_10, 1.0).unwrap();
    assert_eq!(grid.iter().count(), 0);

    let tall = PatchGrid::new(8, 100, SIZE_10, 1.0).unwrap();
    assert_eq!(tall.iter().count(), 0);
    let narrow = PatchGrid::new(100, 8, SIZE_10, 1.0).unwrap();
    assert_eq!(narrow.iter().count(), 0);
}

#[test]
fn tiny_stride_is_floored_to_one_pixel() {
    let size = PatchSize {
        height: 3,
        width: 3,
    };
    let grid = PatchGrid::new(5, 5, size, 0.01).unwrap();
    assert_eq!(grid.step(), (1, 1));
    assert_eq!(grid.iter().count(), 9);
}

#[test]
fn invalid_grid_settings_are_rejected() {
    let zero = PatchSize {
        height: 0,
        width: 10,
    };
    assert!(matches!(
        PatchGrid::new(20, 20, zero, 1.0),
        Err(CoreError::InvalidGrid(_))
    ));
    assert!(matches!(
        PatchGrid::new(20, 20, SIZE_10, 0.0),
        Err(CoreError::InvalidGrid(_))
    ));
    assert!(matches!(
        PatchGrid::new(20, 20, SIZE_10, f64::NAN),
        Err(CoreError::InvalidGrid(_))
    ));
}

#[test]
fn coverage_counts_foreground_fraction() {
    // Top half of a 10x10 mask is tissue.
    let mut mask = TissueMask::filled(10, 10, false);
    for y in 0..5 {
        for x in 0..10 {
            mask.set(y, x, true);
        }
    }
    let candidate = PatchCandidate { y: 0, x: 0, index: 0 };
    assert_eq!(coverage(&mask, &candidate, SIZE_10), 0.5);
}

#[test]
fn acceptance_boundary_is_inclusive() {
    let mut mask = TissueMask::filled(10, 10, false);
    for y in 0..5 {
        for x in 0..10 {
            mask.set(y, x, true);
        }
    }
    let candidate = PatchCandidate { y: 0, x: 0, index: 0 };
    let (keep, fraction) = accept(&mask, &candidate, SIZE_10, 0.5);
    assert!(keep);
    assert_eq!(fraction, 0.5);
    let (keep, _) = accept(&mask, &candidate, SIZE_10, 0.51);
    assert!(!keep);
}

#[test]
fn empty_and_full_masks_bound_coverage() {
    let candidate = PatchCandidate { y: 0, x: 0, index: 0 };
    let empty = TissueMask::filled(10, 10, false);
    assert_eq!(coverage(&empty, &candidate, SIZE_10), 0.0);
    let full = TissueMask::filled(10, 10, true);
    assert_eq!(coverage(&full, &candidate, SIZE_10), 1.0);
    assert!(accept(&full, &candidate, SIZE_10, 1.0).0);
}
