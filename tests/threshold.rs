use imc_patchkit::error::CoreError;
use imc_patchkit::image::Composite;
use imc_patchkit::mask::threshold::{gmm_threshold, otsu_threshold};
use imc_patchkit::mask::ThresholdMethod;

fn square_composite(background: f32, foreground: f32) -> Composite {
    // 100x100 field with a 30x30 bright square at (20, 20).
    let mut data = vec![background; 100 * 100];
    for y in 20..50 {
        for x in 20..50 {
            data[y * 100 + x] = foreground;
        }
    }
    Composite::new(100, 100, data).unwrap()
}

#[test]
fn otsu_separates_bright_square() {
    let composite = square_composite(10.0, 200.0);
    let threshold = otsu_threshold(&composite);
    assert!(threshold > 10.0, "threshold {} not above background", threshold);
    assert!(threshold < 200.0, "threshold {} not below foreground", threshold);

    let (mask, _) = ThresholdMethod::Otsu
        .compute_mask(&composite, "wsi_0", 0.0)
        .unwrap();
    assert_eq!(mask.foreground_count(), 30 * 30);
    assert!(mask.get(20, 20));
    assert!(!mask.get(0, 0));
}

#[test]
fn otsu_threshold_lies_on_a_bin_boundary() {
    // Range 0..256 makes the 256 bins exactly one unit wide: background in
    // bin 0, foreground in bin 255, and the smallest tied split puts the
    // threshold at the upper edge of bin 0.
    let mut data = vec![0.0f32; 100];
    for v in data.iter_mut().skip(50) {
        *v = 256.0;
    }
    let composite = Composite::new(10, 10, data).unwrap();
    assert_eq!(otsu_threshold(&composite), 1.0);

    let (mask, _) = ThresholdMethod::Otsu
        .compute_mask(&composite, "wsi_0", 0.0)
        .unwrap();
    assert_eq!(mask.foreground_count(), 50);
}

#[test]
fn otsu_flat_field_is_all_background() {
    let composite = Composite::new(10, 10, vec![3.5; 100]).unwrap();
    let threshold = otsu_threshold(&composite);
    assert_eq!(threshold, 3.5);

    let (mask, _) = ThresholdMethod::Otsu
        .compute_mask(&composite, "wsi_0", 0.0)
        .unwrap();
    assert_eq!(mask.foreground_count(), 0);
}

#[test]
fn minimum_threshold_floors_the_computed_one() {
    let composite = square_composite(10.0, 200.0);
    let (_, unfloored) = ThresholdMethod::Otsu
        .compute_mask(&composite, "wsi_0", 0.0)
        .unwrap();
    let (mask, floored) = ThresholdMethod::Otsu
        .compute_mask(&composite, "wsi_0", 500.0)
        .unwrap();
    assert!(unfloored < 500.0);
    assert_eq!(floored, 500.0);
    assert_eq!(mask.foreground_count(), 0);
}

#[test]
fn gmm_separates_bimodal_field() {
    let mut data = vec![0.0f32; 100];
    for v in data.iter_mut().skip(50) {
        *v = 10.0;
    }
    let composite = Composite::new(10, 10, data).unwrap();
    let threshold = gmm_threshold(&composite, "wsi_0").unwrap();
    assert!(threshold > 0.0 && threshold < 10.0, "threshold {}", threshold);

    let (mask, _) = ThresholdMethod::Gmm
        .compute_mask(&composite, "wsi_0", 0.0)
        .unwrap();
    assert_eq!(mask.foreground_count(), 50);
}

#[test]
fn gmm_rejects_zero_variance_signal() {
    let composite = Composite::new(10, 10, vec![7.0; 100]).unwrap();
    let err = gmm_threshold(&composite, "wsi_3").unwrap_err();
    match err {
        CoreError::DegenerateSignal { wsi_id, .. } => assert_eq!(wsi_id, "wsi_3"),
        other => panic!("unexpected error {:?}", other),
    }
}
