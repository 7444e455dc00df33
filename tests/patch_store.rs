use imc_patchkit::patch::store::PatchStore;
use imc_patchkit::patch::{MaskBlock, PatchCandidate, PixelBlock};
use tempfile::TempDir;
use walkdir::WalkDir;

fn sample_blocks() -> (PixelBlock, MaskBlock) {
    let pixels = PixelBlock {
        channels: 2,
        height: 3,
        width: 4,
        data: (0..24).map(|v| v as f32 * 0.5).collect(),
    };
    let mask = MaskBlock {
        height: 3,
        width: 4,
        data: vec![1, 0, 1, 0, 0, 1, 0, 1, 1, 1, 0, 0],
    };
    (pixels, mask)
}

#[test]
fn patch_ids_are_deterministic() {
    let candidate = PatchCandidate { y: 30, x: 40, index: 7 };
    assert_eq!(
        PatchStore::patch_id("wsi_2", &candidate),
        "wsi_2_y30_x40_patch_7"
    );
}

#[test]
fn write_then_read_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = PatchStore::create(dir.path()).unwrap();
    let (pixels, mask) = sample_blocks();
    let candidate = PatchCandidate { y: 0, x: 10, index: 1 };

    let patch_id = store.write("wsi_0", &candidate, &pixels, &mask).unwrap();
    assert_eq!(patch_id, "wsi_0_y0_x10_patch_1");

    assert_eq!(store.read_pixels("wsi_0", &patch_id).unwrap(), pixels);
    assert_eq!(store.read_mask("wsi_0", &patch_id).unwrap(), mask);
}

#[test]
fn store_layout_groups_by_image() {
    let dir = TempDir::new().unwrap();
    let store = PatchStore::create(dir.path()).unwrap();
    let (pixels, mask) = sample_blocks();
    let candidate = PatchCandidate { y: 0, x: 0, index: 0 };
    let patch_id = store.write("wsi_5", &candidate, &pixels, &mask).unwrap();

    assert!(dir
        .path()
        .join("patches")
        .join("wsi_5")
        .join(format!("{patch_id}.bin"))
        .exists());
    assert!(dir
        .path()
        .join("masks")
        .join("wsi_5")
        .join(format!("{patch_id}.bin"))
        .exists());
    assert!(dir.path().join("attributes.json").exists());
}

#[test]
fn no_temp_files_remain_after_writes() {
    let dir = TempDir::new().unwrap();
    let store = PatchStore::create(dir.path()).unwrap();
    let (pixels, mask) = sample_blocks();
    for i in 0..5 {
        let candidate = PatchCandidate { y: i * 10, x: 0, index: i };
        store.write("wsi_0", &candidate, &pixels, &mask).unwrap();
    }
    for entry in WalkDir::new(dir.path()).into_iter().filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        assert!(!name.ends_with(".tmp"), "leftover temp file {}", name);
    }
}

#[test]
fn rewriting_a_key_overwrites_in_place() {
    let dir = TempDir::new().unwrap();
    let store = PatchStore::create(dir.path()).unwrap();
    let (pixels, mask) = sample_blocks();
    let candidate = PatchCandidate { y: 0, x: 0, index: 0 };

    store.write("wsi_0", &candidate, &pixels, &mask).unwrap();
    let mut updated = pixels.clone();
    updated.data[0] = 99.0;
    let patch_id = store.write("wsi_0", &candidate, &updated, &mask).unwrap();

    let read = store.read_pixels("wsi_0", &patch_id).unwrap();
    assert_eq!(read.data[0], 99.0);
}

#[test]
fn recreating_a_store_drops_the_previous_runs_chunks() {
    let dir = TempDir::new().unwrap();
    let store = PatchStore::create(dir.path()).unwrap();
    let (pixels, mask) = sample_blocks();
    // First run: a fine grid with two patches.
    let first = store
        .write("wsi_0", &PatchCandidate { y: 0, x: 0, index: 0 }, &pixels, &mask)
        .unwrap();
    let second = store
        .write("wsi_0", &PatchCandidate { y: 0, x: 5, index: 1 }, &pixels, &mask)
        .unwrap();

    // Second run: a coarser grid that only produces the first position.
    let store = PatchStore::create(dir.path()).unwrap();
    let kept = store
        .write("wsi_0", &PatchCandidate { y: 0, x: 0, index: 0 }, &pixels, &mask)
        .unwrap();
    assert_eq!(kept, first);

    assert!(store.read_pixels("wsi_0", &kept).is_ok());
    assert!(store.read_pixels("wsi_0", &second).is_err());
    assert!(!dir
        .path()
        .join("patches")
        .join("wsi_0")
        .join(format!("{second}.bin"))
        .exists());
    assert!(!dir
        .path()
        .join("masks")
        .join("wsi_0")
        .join(format!("{second}.bin"))
        .exists());
    assert!(dir.path().join("attributes.json").exists());
}

#[test]
fn open_requires_an_existing_store() {
    let dir = TempDir::new().unwrap();
    assert!(PatchStore::open(dir.path()).is_err());
    PatchStore::create(dir.path()).unwrap();
    assert!(PatchStore::open(dir.path()).is_ok());
}

#[test]
fn read_rejects_wrong_chunk_kind() {
    let dir = TempDir::new().unwrap();
    let store = PatchStore::create(dir.path()).unwrap();
    let (pixels, mask) = sample_blocks();
    let candidate = PatchCandidate { y: 0, x: 0, index: 0 };
    let patch_id = store.write("wsi_0", &candidate, &pixels, &mask).unwrap();

    // A mask chunk is not a valid pixel chunk: dtype and rank both differ.
    let mask_chunk = dir
        .path()
        .join("masks")
        .join("wsi_0")
        .join(format!("{patch_id}.bin"));
    let pixel_chunk = dir
        .path()
        .join("patches")
        .join("wsi_0")
        .join(format!("{patch_id}.bin"));
    std::fs::copy(&mask_chunk, &pixel_chunk).unwrap();
    assert!(store.read_pixels("wsi_0", &patch_id).is_err());
}
