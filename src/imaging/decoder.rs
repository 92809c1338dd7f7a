//! Byte stream → [`PixelBuffer`].

use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::io::Cursor;

use super::buffer::{ColorMode, PixelBuffer};
use super::format::OutputFormat;
use crate::error::ImageError;

/// Decode image bytes, refusing anything whose header declares more than
/// `max_pixels` pixels.
///
/// Palette images come back as RGB or RGBA (the codec expands them), and
/// 16-bit or float inputs are reduced to 8 bits per channel.
pub fn decode(data: &[u8], max_pixels: u64) -> Result<PixelBuffer, ImageError> {
    let reader = open(data)?;
    let format = reader
        .format()
        .ok_or_else(|| ImageError::decode_failed("unrecognized image format"))?;

    let (width, height) = open(data)?
        .into_dimensions()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;
    if width as u64 * height as u64 > max_pixels {
        return Err(ImageError::too_large(width, height, max_pixels));
    }

    let image = reader
        .decode()
        .map_err(|e| ImageError::decode_failed(e.to_string()))?;

    let (width, height) = (image.width(), image.height());
    let (mode, pixels) = into_mode_and_samples(image);

    tracing::debug!(
        width = width,
        height = height,
        mode = %mode,
        format = ?format,
        "Decoded image"
    );

    Ok(PixelBuffer::new(width, height, mode, pixels)?
        .with_source_format(OutputFormat::from_image_format(format)))
}

fn open(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, ImageError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::decode_failed(e.to_string()))
}

fn into_mode_and_samples(image: DynamicImage) -> (ColorMode, Vec<u8>) {
    match image {
        DynamicImage::ImageLuma8(buf) => (ColorMode::Gray, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (ColorMode::GrayAlpha, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (ColorMode::Rgb, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (ColorMode::Rgba, buf.into_raw()),
        // Deeper sample types
        other => {
            let color = other.color();
            match (color.has_color(), color.has_alpha()) {
                (true, true) => (ColorMode::Rgba, other.to_rgba8().into_raw()),
                (true, false) => (ColorMode::Rgb, other.to_rgb8().into_raw()),
                (false, true) => (ColorMode::GrayAlpha, other.to_luma_alpha8().into_raw()),
                (false, false) => (ColorMode::Gray, other.to_luma8().into_raw()),
            }
        }
    }
}
