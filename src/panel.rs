//! IMC stain panel: metal tag to marker mapping, loaded once per cohort.
//!
//! Panel rows are index-matched one-to-one with the pages of an acquisition
//! TIFF, so every CSV row is kept in file order. Background stains and
//! duplicate metal tags are only excluded from the retained channel set;
//! their pages are still decoded and dropped from the image afterwards.

use std::path::Path;

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct PanelRow {
    pub metal_tag: String,
    pub marker: String,
    pub canonical_tag: String,
    pub background: bool,
}

/// Immutable marker panel. Used to pair TIFF pages with channel tags and to
/// decide which channels survive ingestion and feed the composite signal.
#[derive(Debug, Clone)]
pub struct Panel {
    rows: Vec<PanelRow>,
    retained: Vec<usize>,
}

impl Panel {
    /// Loads a CSV panel with a `Metal`/`MetalTag` column and a
    /// `Target`/`Marker` column. Every row is kept; rows whose marker is a
    /// background stain, and rows repeating an earlier metal tag, are marked
    /// out of the retained channel set.
    pub fn load(path: &Path, background_stains: &[String]) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read panel {}", path.display()))?;
        let mut lines = contents.lines();
        let header = match lines.next() {
            Some(h) => h,
            None => bail!("panel {} is empty", path.display()),
        };
        let columns: Vec<&str> = header.split(',').map(|c| c.trim()).collect();
        let metal_col = columns
            .iter()
            .position(|c| *c == "Metal" || *c == "MetalTag")
            .with_context(|| format!("panel {} has no Metal/MetalTag column", path.display()))?;
        let marker_col = columns
            .iter()
            .position(|c| *c == "Target" || *c == "Marker")
            .with_context(|| format!("panel {} has no Target/Marker column", path.display()))?;

        let mut rows: Vec<PanelRow> = Vec::new();
        for (lineno, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();
            if fields.len() <= metal_col.max(marker_col) {
                bail!("panel {} line {} is truncated", path.display(), lineno + 2);
            }
            let metal_tag = fields[metal_col].to_string();
            let marker = fields[marker_col].to_string();
            let background = background_stains.iter().any(|s| s == &marker);
            let canonical_tag = canonicalize_metal_tag(&metal_tag);
            rows.push(PanelRow {
                metal_tag,
                marker,
                canonical_tag,
                background,
            });
        }

        let mut retained: Vec<usize> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if row.background {
                continue;
            }
            if retained
                .iter()
                .any(|&r| rows[r].canonical_tag == row.canonical_tag)
            {
                continue;
            }
            retained.push(i);
        }
        if retained.is_empty() {
            bail!("panel {} contains no usable rows", path.display());
        }
        Ok(Self { rows, retained })
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    /// One canonical tag per panel row, in file order; index-matched with the
    /// pages of an acquisition TIFF.
    pub fn acquisition_tags(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.canonical_tag.clone()).collect()
    }

    /// Row indices of the channels kept after ingestion: background stains
    /// dropped, duplicate metal tags collapsed to their first occurrence.
    pub fn retained_indices(&self) -> &[usize] {
        &self.retained
    }

    /// Canonical tags of the retained channels, in file order.
    pub fn canonical_tags(&self) -> Vec<String> {
        self.retained
            .iter()
            .map(|&i| self.rows[i].canonical_tag.clone())
            .collect()
    }

    /// Canonical tags of the retained channels selected for mask generation.
    /// An empty marker list selects all retained channels. Unknown markers
    /// are reported so the caller can surface a warning.
    pub fn mask_subset(&self, markers: &[String]) -> (Vec<String>, Vec<String>) {
        if markers.is_empty() {
            return (self.canonical_tags(), Vec::new());
        }
        let mut tags = Vec::new();
        let mut missing = Vec::new();
        for marker in markers {
            match self
                .retained
                .iter()
                .map(|&i| &self.rows[i])
                .find(|r| &r.marker == marker)
            {
                Some(row) => tags.push(row.canonical_tag.clone()),
                None => missing.push(marker.clone()),
            }
        }
        (tags, missing)
    }
}

/// Normalizes a metal tag to `<letters><digits>` form, e.g. "Ir 191" and
/// "191Ir" both map to "Ir191".
pub fn canonicalize_metal_tag(tag: &str) -> String {
    let letters: String = tag.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = tag.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{}{}", letters, digits)
}
