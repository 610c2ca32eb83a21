use std::io::Cursor;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::Deserialize;

use crate::ico::{PngPayload, ICON_SIZE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Decodes `input` (format guessed from its contents), stretches it to
/// 256x256 and re-encodes it as an RGBA PNG.
pub fn prepare_png_payload(input: &[u8], filter: ResizeFilter) -> Result<PngPayload> {
    let img = image::load_from_memory(input).context("Failed to decode input image")?;
    tracing::debug!(
        "Decoded {}x{} image, resizing with {:?}",
        img.width(),
        img.height(),
        filter
    );

    let resized = img
        .resize_exact(ICON_SIZE, ICON_SIZE, filter.into())
        .to_rgba8();

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(resized)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode PNG")?;

    Ok(PngPayload::new(png)?)
}
