pub mod filter;
pub mod sampler;
pub mod store;

use crate::image::{ChannelImage, TissueMask};

/// A candidate top-left position produced by the sampling grid. Ephemeral;
/// only accepted candidates are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchCandidate {
    pub y: usize,
    pub x: usize,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSize {
    pub height: usize,
    pub width: usize,
}

impl PatchSize {
    pub fn area(&self) -> usize {
        self.height * self.width
    }
}

/// Channel-major pixel block cut out of a `ChannelImage`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBlock {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

/// Binary mask block stored as 0/1 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskBlock {
    pub height: usize,
    pub width: usize,
    pub data: Vec<u8>,
}

/// Cuts the candidate's pixel block out of the image. The grid guarantees
/// the block lies fully inside the image.
pub fn extract_pixel_block(
    image: &ChannelImage,
    candidate: &PatchCandidate,
    size: PatchSize,
) -> PixelBlock {
    let mut data = Vec::with_capacity(image.n_channels() * size.area());
    for c in 0..image.n_channels() {
        let plane = image.channel(c);
        for y in candidate.y..candidate.y + size.height {
            let row = y * image.width() + candidate.x;
            data.extend_from_slice(&plane[row..row + size.width]);
        }
    }
    PixelBlock {
        channels: image.n_channels(),
        height: size.height,
        width: size.width,
        data,
    }
}

pub fn extract_mask_block(
    mask: &TissueMask,
    candidate: &PatchCandidate,
    size: PatchSize,
) -> MaskBlock {
    let mut data = Vec::with_capacity(size.area());
    for y in candidate.y..candidate.y + size.height {
        for x in candidate.x..candidate.x + size.width {
            data.push(u8::from(mask.get(y, x)));
        }
    }
    MaskBlock {
        height: size.height,
        width: size.width,
        data,
    }
}
