use imc_patchkit::image::TissueMask;
use imc_patchkit::mask::{clean, CleanParams};

fn params(object_threshold: usize, hole_threshold: usize) -> CleanParams {
    CleanParams {
        remove_small_objects: true,
        small_object_threshold: object_threshold,
        fill_small_holes: true,
        small_hole_threshold: hole_threshold,
    }
}

fn block_mask() -> TissueMask {
    // 10x10: a 5x5 block at (2, 2) plus an isolated 2-pixel object at (8, 8).
    let mut mask = TissueMask::filled(10, 10, false);
    for y in 2..7 {
        for x in 2..7 {
            mask.set(y, x, true);
        }
    }
    mask.set(8, 8, true);
    mask.set(8, 9, true);
    mask
}

#[test]
fn removes_objects_below_threshold() {
    let cleaned = clean(&block_mask(), &params(4, 0));
    assert_eq!(cleaned.foreground_count(), 25);
    assert!(!cleaned.get(8, 8));
    assert!(!cleaned.get(8, 9));
    assert!(cleaned.get(2, 2));
}

#[test]
fn keeps_objects_at_or_above_threshold() {
    // The 2-pixel object meets the threshold exactly and survives.
    let cleaned = clean(&block_mask(), &params(2, 0));
    assert_eq!(cleaned.foreground_count(), 27);
}

#[test]
fn fills_enclosed_holes_below_threshold() {
    let mut mask = block_mask();
    mask.set(4, 4, false);
    let cleaned = clean(&mask, &params(4, 4));
    assert!(cleaned.get(4, 4));
    assert_eq!(cleaned.foreground_count(), 25);
}

#[test]
fn never_fills_border_connected_background() {
    // The big outer background component touches the border and stays open
    // no matter how large the hole threshold is.
    let cleaned = clean(&block_mask(), &params(0, 10_000));
    assert!(!cleaned.get(0, 0));
    assert!(!cleaned.get(9, 0));
    assert_eq!(cleaned.foreground_count(), 27);
}

#[test]
fn diagonal_pixels_form_one_component() {
    // 8-connectivity: a diagonal chain of 3 pixels is one object of size 3.
    let mut mask = TissueMask::filled(6, 6, false);
    mask.set(1, 1, true);
    mask.set(2, 2, true);
    mask.set(3, 3, true);
    assert_eq!(clean(&mask, &params(3, 0)).foreground_count(), 3);
    assert_eq!(clean(&mask, &params(4, 0)).foreground_count(), 0);
}

#[test]
fn cleaning_is_idempotent() {
    let mut mask = block_mask();
    mask.set(4, 4, false);
    let p = params(4, 4);
    let once = clean(&mask, &p);
    let twice = clean(&once, &p);
    assert_eq!(once, twice);
}

#[test]
fn disabled_passes_leave_the_mask_untouched() {
    let mask = block_mask();
    let p = CleanParams {
        remove_small_objects: false,
        small_object_threshold: 100,
        fill_small_holes: false,
        small_hole_threshold: 100,
    };
    assert_eq!(clean(&mask, &p), mask);
}
