//! Chunked, keyed on-disk store for accepted patches.
//!
//! Layout under the store root:
//!
//! ```text
//! patches/<wsi_id>/<patch_id>.bin   C x H x W  f32 pixel block
//! masks/<wsi_id>/<patch_id>.bin     H x W      u8  mask block
//! attributes.json                   store-level format description
//! ```
//!
//! Chunks are self-describing (magic, dtype, dims header, little-endian
//! payload) and written via a temp file + rename so a crash mid-write never
//! leaves a readable half-chunk under a valid key. Patch ids are a pure
//! function of (wsi id, coordinate, index). Creating a store starts from
//! empty groups, so a run's contents always match its manifest.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::patch::{MaskBlock, PatchCandidate, PixelBlock};

const CHUNK_MAGIC: &[u8; 4] = b"IPK1";
const DTYPE_F32: u8 = 0;
const DTYPE_U8: u8 = 1;

const PATCH_GROUP: &str = "patches";
const MASK_GROUP: &str = "masks";

#[derive(Debug, Clone)]
pub struct PatchStore {
    root: PathBuf,
}

#[derive(Debug, Serialize)]
struct StoreAttributes {
    format: &'static str,
    version: u32,
    pixel_dtype: &'static str,
    pixel_layout: &'static str,
    mask_dtype: &'static str,
    mask_layout: &'static str,
}

impl PatchStore {
    /// Creates a fresh store rooted at `root`. Both group directories are
    /// cleared first, so a re-run with a different grid never leaves chunks
    /// from the previous run readable under stale keys. Sibling files under
    /// `root` (for example a metadata directory) are left alone.
    pub fn create(root: &Path) -> Result<Self> {
        for group in [PATCH_GROUP, MASK_GROUP] {
            let dir = root.join(group);
            if dir.exists() {
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("failed to clear {}", dir.display()))?;
            }
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let attributes = StoreAttributes {
            format: "imc-patchkit-chunks",
            version: 1,
            pixel_dtype: "f32",
            pixel_layout: "channel,y,x",
            mask_dtype: "u8",
            mask_layout: "y,x",
        };
        let file = File::create(root.join("attributes.json"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &attributes)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn open(root: &Path) -> Result<Self> {
        if !root.join("attributes.json").exists() {
            bail!("{} is not a patch store", root.display());
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic, collision-free patch identifier.
    pub fn patch_id(wsi_id: &str, candidate: &PatchCandidate) -> String {
        format!(
            "{}_y{}_x{}_patch_{}",
            wsi_id, candidate.y, candidate.x, candidate.index
        )
    }

    /// Writes the pixel and mask blocks under a shared key and returns the
    /// patch id. Each chunk write is atomic.
    pub fn write(
        &self,
        wsi_id: &str,
        candidate: &PatchCandidate,
        pixels: &PixelBlock,
        mask: &MaskBlock,
    ) -> Result<String> {
        let patch_id = Self::patch_id(wsi_id, candidate);

        let pixel_dir = self.root.join(PATCH_GROUP).join(wsi_id);
        let mask_dir = self.root.join(MASK_GROUP).join(wsi_id);
        fs::create_dir_all(&pixel_dir)?;
        fs::create_dir_all(&mask_dir)?;

        let pixel_bytes: Vec<u8> = pixels.data.iter().flat_map(|v| v.to_le_bytes()).collect();
        write_chunk(
            &pixel_dir.join(format!("{patch_id}.bin")),
            DTYPE_F32,
            &[pixels.channels, pixels.height, pixels.width],
            &pixel_bytes,
        )?;
        write_chunk(
            &mask_dir.join(format!("{patch_id}.bin")),
            DTYPE_U8,
            &[mask.height, mask.width],
            &mask.data,
        )?;
        Ok(patch_id)
    }

    pub fn read_pixels(&self, wsi_id: &str, patch_id: &str) -> Result<PixelBlock> {
        let path = self
            .root
            .join(PATCH_GROUP)
            .join(wsi_id)
            .join(format!("{patch_id}.bin"));
        let (dims, payload) = read_chunk(&path, DTYPE_F32, 3)?;
        let data = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect::<Vec<f32>>();
        if data.len() != dims[0] * dims[1] * dims[2] {
            bail!("chunk payload does not match dims in {}", path.display());
        }
        Ok(PixelBlock {
            channels: dims[0],
            height: dims[1],
            width: dims[2],
            data,
        })
    }

    pub fn read_mask(&self, wsi_id: &str, patch_id: &str) -> Result<MaskBlock> {
        let path = self
            .root
            .join(MASK_GROUP)
            .join(wsi_id)
            .join(format!("{patch_id}.bin"));
        let (dims, payload) = read_chunk(&path, DTYPE_U8, 2)?;
        if payload.len() != dims[0] * dims[1] {
            bail!("chunk payload does not match dims in {}", path.display());
        }
        Ok(MaskBlock {
            height: dims[0],
            width: dims[1],
            data: payload,
        })
    }
}

fn write_chunk(path: &Path, dtype: u8, dims: &[usize], payload: &[u8]) -> Result<()> {
    let tmp = path.with_extension("bin.tmp");
    {
        let file = File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        let mut w = BufWriter::new(file);
        w.write_all(CHUNK_MAGIC)?;
        w.write_all(&[dtype])?;
        w.write_all(&[dims.len() as u8])?;
        for &d in dims {
            w.write_all(&(d as u32).to_le_bytes())?;
        }
        w.write_all(payload)?;
        w.flush()?;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to finalize chunk {}", path.display()))?;
    Ok(())
}

fn read_chunk(path: &Path, expected_dtype: u8, expected_rank: usize) -> Result<(Vec<usize>, Vec<u8>)> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open chunk {}", path.display()))?;
    let mut header = [0u8; 6];
    file.read_exact(&mut header)?;
    if &header[..4] != CHUNK_MAGIC {
        bail!("{} is not a patch chunk", path.display());
    }
    if header[4] != expected_dtype {
        bail!("unexpected dtype {} in {}", header[4], path.display());
    }
    let rank = header[5] as usize;
    if rank != expected_rank {
        bail!("unexpected rank {} in {}", rank, path.display());
    }
    let mut dims = Vec::with_capacity(rank);
    for _ in 0..rank {
        let mut buf = [0u8; 4];
        file.read_exact(&mut buf)?;
        dims.push(u32::from_le_bytes(buf) as usize);
    }
    let mut payload = Vec::new();
    file.read_to_end(&mut payload)?;
    Ok((dims, payload))
}
