//! Mapping between internal WSI identifiers and source file paths.
//!
//! Input paths are sorted before assignment so identifiers are reproducible
//! across runs over the same cohort. Read-only once built.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct IdEntry {
    pub wsi_id: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct IdMapping {
    entries: Vec<IdEntry>,
}

impl IdMapping {
    pub fn build(paths: &[PathBuf]) -> Self {
        let mut sorted = paths.to_vec();
        sorted.sort();
        let entries = sorted
            .into_iter()
            .enumerate()
            .map(|(i, path)| IdEntry {
                wsi_id: format!("wsi_{i}"),
                path,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[IdEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path_for(&self, wsi_id: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.wsi_id == wsi_id)
            .map(|e| e.path.as_path())
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "wsi_id,file_path")?;
        for entry in &self.entries {
            writeln!(w, "{},{}", entry.wsi_id, entry.path.display())?;
        }
        w.flush()?;
        Ok(())
    }
}
