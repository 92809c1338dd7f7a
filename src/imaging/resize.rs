//! Proportional downscaling into a bounding box.

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use std::num::NonZeroU32;

use super::buffer::{ColorMode, PixelBuffer};
use super::normalize::normalize;
use crate::error::ImageError;

/// Size that fits `width`x`height` inside `max_width`x`max_height` keeping the
/// aspect ratio, or `None` when the image already fits (no upscaling).
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if max_width >= width && max_height >= height {
        return None;
    }

    let (w, h) = (width as u64, height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);

    let (new_w, new_h) = if max_w * h >= max_h * w {
        // Height is the binding constraint
        (w * max_h / h, max_h)
    } else {
        (max_w, h * max_w / w)
    };

    Some((new_w.max(1) as u32, new_h.max(1) as u32))
}

/// Downscale `buffer` to fit the bounds using Lanczos3.
///
/// Returns the buffer unchanged when it already fits. Alpha is premultiplied
/// around the convolution so transparent pixels do not bleed color.
pub fn resize(
    buffer: &PixelBuffer,
    max_width: u32,
    max_height: u32,
) -> Result<PixelBuffer, ImageError> {
    if max_width == 0 || max_height == 0 {
        return Err(ImageError::invalid_request(
            "max_width and max_height must be positive",
        ));
    }

    let Some((dst_w, dst_h)) = fit_within(buffer.width(), buffer.height(), max_width, max_height)
    else {
        return Ok(buffer.clone());
    };

    let src = match buffer.mode() {
        ColorMode::Indexed | ColorMode::GrayAlpha => normalize(buffer, ColorMode::Rgba)?,
        _ => buffer.clone(),
    };

    let resized = resample(&src, dst_w, dst_h)?;

    tracing::debug!(
        from = ?buffer.dimensions(),
        to = ?resized.dimensions(),
        "Resized image"
    );

    Ok(resized.with_source_format(buffer.source_format()))
}

fn resample(src: &PixelBuffer, target_w: u32, target_h: u32) -> Result<PixelBuffer, ImageError> {
    let mode = src.mode();
    let pixel_type = match mode {
        ColorMode::Gray => PixelType::U8,
        ColorMode::Rgb => PixelType::U8x3,
        ColorMode::Rgba => PixelType::U8x4,
        other => {
            return Err(ImageError::transform_failed(format!(
                "cannot resample {} pixels",
                other
            )))
        }
    };

    let src_width = NonZeroU32::new(src.width())
        .ok_or_else(|| ImageError::transform_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(src.height())
        .ok_or_else(|| ImageError::transform_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| ImageError::transform_failed("Target width is 0"))?;
    let dst_height = NonZeroU32::new(target_h)
        .ok_or_else(|| ImageError::transform_failed("Target height is 0"))?;

    let mut src_image = Image::from_vec_u8(src_width, src_height, src.data().to_vec(), pixel_type)
        .map_err(|e| {
            ImageError::transform_failed(format!("Failed to create source image: {:?}", e))
        })?;

    let mut dst_image = Image::new(dst_width, dst_height, pixel_type);
    let alpha = mode == ColorMode::Rgba;
    let mul_div = MulDiv::default();

    if alpha {
        mul_div
            .multiply_alpha_inplace(&mut src_image.view_mut())
            .map_err(|e| {
                ImageError::transform_failed(format!("Failed to premultiply alpha: {:?}", e))
            })?;
    }

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ImageError::transform_failed(format!("Resize operation failed: {:?}", e)))?;

    if alpha {
        mul_div
            .divide_alpha_inplace(&mut dst_image.view_mut())
            .map_err(|e| {
                ImageError::transform_failed(format!("Failed to restore alpha: {:?}", e))
            })?;
    }

    PixelBuffer::new(target_w, target_h, mode, dst_image.into_vec())
}
