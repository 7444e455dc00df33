//! Multi-channel TIFF stack ingestion.
//!
//! One grayscale page per channel, read in page order. The panel is assumed
//! one-to-one and index-matched with the pages, matching the acquisition
//! export convention.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tiff::decoder::{Decoder, DecodingResult, Limits};

use crate::image::ChannelImage;

pub fn read_stack(path: &Path, tags: &[String]) -> Result<ChannelImage> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1 << 30;
    limits.ifd_value_size = 1 << 30;
    limits.intermediate_buffer_size = 1 << 30;
    let mut decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("failed to read TIFF {}", path.display()))?
        .with_limits(limits);

    let (width, height) = decoder
        .dimensions()
        .with_context(|| format!("failed to read dimensions of {}", path.display()))?;
    let plane = (width as usize) * (height as usize);

    let mut data: Vec<f32> = Vec::with_capacity(tags.len() * plane);
    let mut channels = 0usize;
    loop {
        let (page_width, page_height) = decoder.dimensions()?;
        if page_width != width || page_height != height {
            bail!(
                "page {} of {} has extent {}x{}, expected {}x{}",
                channels,
                path.display(),
                page_height,
                page_width,
                height,
                width
            );
        }
        let page = decoder
            .read_image()
            .with_context(|| format!("failed to decode page {} of {}", channels, path.display()))?;
        append_page(&mut data, page, plane, channels, path)?;
        channels += 1;
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    if channels != tags.len() {
        bail!(
            "{} has {} pages but the panel describes {} channels",
            path.display(),
            channels,
            tags.len()
        );
    }
    ChannelImage::new(tags.to_vec(), height as usize, width as usize, data)
}

fn append_page(
    data: &mut Vec<f32>,
    page: DecodingResult,
    plane: usize,
    index: usize,
    path: &Path,
) -> Result<()> {
    let before = data.len();
    match page {
        DecodingResult::U8(buf) => data.extend(buf.iter().map(|&v| v as f32)),
        DecodingResult::U16(buf) => data.extend(buf.iter().map(|&v| v as f32)),
        DecodingResult::U32(buf) => data.extend(buf.iter().map(|&v| v as f32)),
        DecodingResult::F32(buf) => data.extend_from_slice(&buf),
        DecodingResult::F64(buf) => data.extend(buf.iter().map(|&v| v as f32)),
        _ => bail!(
            "unsupported TIFF sample format in page {} of {}",
            index,
            path.display()
        ),
    }
    if data.len() - before != plane {
        bail!(
            "page {} of {} is not single-channel grayscale",
            index,
            path.display()
        );
    }
    Ok(())
}
