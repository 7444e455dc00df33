use imc_patchkit::image::TissueMask;
use imc_patchkit::io::mask_io::{load_mask, mask_path, save_mask};
use tempfile::TempDir;

#[test]
fn mask_paths_follow_the_naming_scheme() {
    let path = mask_path(std::path::Path::new("/out/masks"), "wsi_4");
    assert_eq!(path, std::path::PathBuf::from("/out/masks/wsi_4_mask.png"));
}

#[test]
fn saved_masks_load_back_identically() {
    let dir = TempDir::new().unwrap();
    let mut mask = TissueMask::filled(12, 9, false);
    for y in 3..8 {
        for x in 2..7 {
            mask.set(y, x, true);
        }
    }
    let path = mask_path(dir.path(), "wsi_0");
    save_mask(&mask, &path).unwrap();

    let loaded = load_mask(&path).unwrap();
    assert_eq!(loaded.height(), 12);
    assert_eq!(loaded.width(), 9);
    assert_eq!(loaded, mask);
}

#[test]
fn loading_a_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(load_mask(&dir.path().join("absent.png")).is_err());
}
