//! Sliding-window enumeration of candidate patch positions.

use crate::error::CoreError;
use crate::patch::{PatchCandidate, PatchSize};

/// A size/stride grid over one image.
///
/// Candidates are emitted row-major (y ascending, then x ascending) under
/// strict containment: a position whose block would cross the image boundary
/// is never generated, and therefore never counted as attempted. The grid is
/// cheap to build and restartable via [`PatchGrid::iter`].
#[derive(Debug, Clone, Copy)]
pub struct PatchGrid {
    image_height: usize,
    image_width: usize,
    size: PatchSize,
    step_y: usize,
    step_x: usize,
}

impl PatchGrid {
    pub fn new(
        image_height: usize,
        image_width: usize,
        size: PatchSize,
        stride_fraction: f64,
    ) -> Result<Self, CoreError> {
        if size.height == 0 || size.width == 0 {
            return Err(CoreError::InvalidGrid(format!(
                "patch size {}x{} must be positive",
                size.height, size.width
            )));
        }
        if !stride_fraction.is_finite() || stride_fraction <= 0.0 {
            return Err(CoreError::InvalidGrid(format!(
                "stride fraction {} must be a positive finite number",
                stride_fraction
            )));
        }
        let step_y = ((stride_fraction * size.height as f64).round() as usize).max(1);
        let step_x = ((stride_fraction * size.width as f64).round() as usize).max(1);
        Ok(Self {
            image_height,
            image_width,
            size,
            step_y,
            step_x,
        })
    }

    pub fn size(&self) -> PatchSize {
        self.size
    }

    pub fn step(&self) -> (usize, usize) {
        (self.step_y, self.step_x)
    }

    pub fn iter(&self) -> GridIter {
        GridIter {
            grid: *self,
            y: 0,
            x: 0,
            index: 0,
        }
    }
}

pub struct GridIter {
    grid: PatchGrid,
    y: usize,
    x: usize,
    index: usize,
}

impl Iterator for GridIter {
    type Item = PatchCandidate;

    fn next(&mut self) -> Option<PatchCandidate> {
        let g = &self.grid;
        // A patch larger than the image yields zero candidates; that is a
        // valid empty grid, not an error.
        if g.size.width > g.image_width || self.y + g.size.height > g.image_height {
            return None;
        }
        let candidate = PatchCandidate {
            y: self.y,
            x: self.x,
            index: self.index,
        };
        self.index += 1;
        self.x += g.step_x;
        if self.x + g.size.width > g.image_width {
            self.x = 0;
            self.y += g.step_y;
        }
        Some(candidate)
    }
}
