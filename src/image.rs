//! In-memory pixel containers: channel stacks, composites, and binary masks.

use anyhow::{bail, Result};

/// An ordered stack of 2-D intensity planes, one per acquisition channel.
///
/// Planes are stored channel-major, each plane row-major. Every channel is
/// tagged by its canonical metal tag; channel order is stable for the
/// lifetime of the value.
#[derive(Debug, Clone)]
pub struct ChannelImage {
    tags: Vec<String>,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl ChannelImage {
    pub fn new(tags: Vec<String>, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if height == 0 || width == 0 || tags.is_empty() {
            bail!("channel image must have at least one channel and non-zero extent");
        }
        if data.len() != tags.len() * height * width {
            bail!(
                "channel image buffer length {} does not match {} channels of {}x{}",
                data.len(),
                tags.len(),
                height,
                width
            );
        }
        Ok(Self {
            tags,
            height,
            width,
            data,
        })
    }

    pub fn n_channels(&self) -> usize {
        self.tags.len()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn channel(&self, c: usize) -> &[f32] {
        let plane = self.height * self.width;
        &self.data[c * plane..(c + 1) * plane]
    }

    pub fn channel_mut(&mut self, c: usize) -> &mut [f32] {
        let plane = self.height * self.width;
        &mut self.data[c * plane..(c + 1) * plane]
    }

    /// Extracts the sub-stack whose tags appear in `tags`, preserving the
    /// stack's channel order. Returns an error when none match.
    pub fn select(&self, tags: &[String]) -> Result<ChannelImage> {
        let picked: Vec<usize> = self
            .tags
            .iter()
            .enumerate()
            .filter(|(_, t)| tags.contains(t))
            .map(|(i, _)| i)
            .collect();
        if picked.is_empty() {
            bail!("no channels match the requested tags");
        }
        let plane = self.height * self.width;
        let mut data = Vec::with_capacity(picked.len() * plane);
        let mut kept = Vec::with_capacity(picked.len());
        for &c in &picked {
            data.extend_from_slice(self.channel(c));
            kept.push(self.tags[c].clone());
        }
        ChannelImage::new(kept, self.height, self.width, data)
    }

    /// Extracts the channels at `indices`, in the given order. Used to drop
    /// background-stain and duplicate pages right after decoding.
    pub fn take_channels(&self, indices: &[usize]) -> Result<ChannelImage> {
        let plane = self.height * self.width;
        let mut data = Vec::with_capacity(indices.len() * plane);
        let mut kept = Vec::with_capacity(indices.len());
        for &c in indices {
            if c >= self.n_channels() {
                bail!(
                    "channel index {} out of range for {} channels",
                    c,
                    self.n_channels()
                );
            }
            data.extend_from_slice(self.channel(c));
            kept.push(self.tags[c].clone());
        }
        ChannelImage::new(kept, self.height, self.width, data)
    }

    /// Collapses the stack to a single-channel composite by taking the
    /// per-pixel median across channels.
    pub fn composite_median(&self) -> Composite {
        let plane = self.height * self.width;
        let n = self.n_channels();
        if n == 1 {
            return Composite {
                height: self.height,
                width: self.width,
                data: self.data[..plane].to_vec(),
            };
        }
        let mut out = Vec::with_capacity(plane);
        let mut column = vec![0.0f32; n];
        for p in 0..plane {
            for (c, slot) in column.iter_mut().enumerate() {
                *slot = self.data[c * plane + p];
            }
            out.push(median_in_place(&mut column));
        }
        Composite {
            height: self.height,
            width: self.width,
            data: out,
        }
    }
}

fn median_in_place(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// A single-channel intensity plane used as thresholding input.
#[derive(Debug, Clone)]
pub struct Composite {
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

impl Composite {
    pub fn new(height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != height * width {
            bail!(
                "composite buffer length {} does not match {}x{}",
                data.len(),
                height,
                width
            );
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }
}

/// A binary tissue/background mask with the same extent as its source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TissueMask {
    height: usize,
    width: usize,
    data: Vec<bool>,
}

impl TissueMask {
    pub fn new(height: usize, width: usize, data: Vec<bool>) -> Result<Self> {
        if data.len() != height * width {
            bail!(
                "mask buffer length {} does not match {}x{}",
                data.len(),
                height,
                width
            );
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn filled(height: usize, width: usize, value: bool) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, y: usize, x: usize) -> bool {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, y: usize, x: usize, value: bool) {
        self.data[y * self.width + x] = value;
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    pub fn foreground_count(&self) -> u64 {
        self.data.iter().filter(|&&v| v).count() as u64
    }

    pub fn total_count(&self) -> u64 {
        (self.height * self.width) as u64
    }
}
