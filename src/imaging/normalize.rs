//! Color-mode conversion between the layouts of [`ColorMode`].
//!
//! Dropping alpha composites onto opaque white; converting to luminance uses
//! the ITU-R 601 weights `(299 R + 587 G + 114 B) / 1000`.

use super::buffer::{ColorMode, PixelBuffer};
use crate::error::ImageError;

/// Convert `buffer` to `target`, returning a new buffer.
///
/// The source format tag is carried over. Conversion *to* `Indexed` would
/// need quantization and is rejected.
pub fn normalize(buffer: &PixelBuffer, target: ColorMode) -> Result<PixelBuffer, ImageError> {
    if buffer.mode() == target {
        return Ok(buffer.clone());
    }
    let push: fn([u8; 4], &mut Vec<u8>) = match target {
        ColorMode::Rgba => |px, out| out.extend_from_slice(&px),
        ColorMode::Rgb => |[r, g, b, a], out| {
            out.extend_from_slice(&[flatten(r, a), flatten(g, a), flatten(b, a)])
        },
        ColorMode::Gray => |[r, g, b, a], out| {
            out.push(luminance(flatten(r, a), flatten(g, a), flatten(b, a)))
        },
        ColorMode::GrayAlpha => |[r, g, b, a], out| out.extend_from_slice(&[luminance(r, g, b), a]),
        ColorMode::Indexed => {
            return Err(ImageError::transform_failed(format!(
                "cannot convert {} image to indexed color",
                buffer.mode()
            )))
        }
    };

    let count = buffer.pixel_count();
    let mut out = Vec::with_capacity(count * target.channels());
    for i in 0..count {
        push(buffer.rgba_at(i), &mut out);
    }

    Ok(
        PixelBuffer::new(buffer.width(), buffer.height(), target, out)?
            .with_source_format(buffer.source_format()),
    )
}

/// Composite one channel onto white: `c·a + 255·(1 − a)`, rounded to nearest.
#[inline]
pub fn flatten(c: u8, a: u8) -> u8 {
    if a == 255 {
        return c;
    }
    let (c, a) = (c as u32, a as u32);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::format::OutputFormat;

    fn rgba(pixels: &[[u8; 4]]) -> PixelBuffer {
        let data = pixels.iter().flatten().copied().collect();
        PixelBuffer::new(pixels.len() as u32, 1, ColorMode::Rgba, data).unwrap()
    }

    #[test]
    fn test_flatten_rule() {
        assert_eq!(flatten(0, 0), 255);
        assert_eq!(flatten(0, 255), 0);
        assert_eq!(flatten(100, 255), 100);
        // a = 128 leaves 255 − 128 of white
        assert_eq!(flatten(0, 128), 127);
        assert_eq!(flatten(200, 51), 244);
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 149);
        assert_eq!(luminance(0, 0, 255), 29);
    }

    #[test]
    fn test_transparent_becomes_white_rgb() {
        let src = rgba(&[[0, 0, 0, 0], [10, 20, 30, 255]]);
        let out = normalize(&src, ColorMode::Rgb).unwrap();
        assert_eq!(out.mode(), ColorMode::Rgb);
        assert_eq!(out.data(), &[255, 255, 255, 10, 20, 30]);
    }

    #[test]
    fn test_rgb_to_rgba_is_opaque() {
        let src = PixelBuffer::new(1, 1, ColorMode::Rgb, vec![1, 2, 3]).unwrap();
        let out = normalize(&src, ColorMode::Rgba).unwrap();
        assert_eq!(out.data(), &[1, 2, 3, 255]);
    }

    #[test]
    fn test_to_gray_flattens_first() {
        let src = rgba(&[[0, 0, 0, 0]]);
        let out = normalize(&src, ColorMode::Gray).unwrap();
        assert_eq!(out.data(), &[255]);
    }

    #[test]
    fn test_to_gray_alpha_keeps_alpha() {
        let src = rgba(&[[255, 0, 0, 10]]);
        let out = normalize(&src, ColorMode::GrayAlpha).unwrap();
        assert_eq!(out.data(), &[76, 10]);
    }

    #[test]
    fn test_indexed_expands_through_palette() {
        let src = PixelBuffer::indexed(2, 1, vec![1, 0], vec![[9, 8, 7, 255], [0, 0, 0, 0]])
            .unwrap();
        let out = normalize(&src, ColorMode::Rgb).unwrap();
        assert_eq!(out.data(), &[255, 255, 255, 9, 8, 7]);

        let out = normalize(&src, ColorMode::Rgba).unwrap();
        assert_eq!(out.data(), &[0, 0, 0, 0, 9, 8, 7, 255]);
    }

    #[test]
    fn test_to_indexed_is_rejected() {
        let src = rgba(&[[0, 0, 0, 255]]);
        let err = normalize(&src, ColorMode::Indexed).unwrap_err();
        assert!(matches!(err, ImageError::Transform { .. }));
    }

    #[test]
    fn test_same_mode_is_identity_and_input_untouched() {
        let src = rgba(&[[1, 2, 3, 4]])
            .with_source_format(Some(OutputFormat::WebP));
        let out = normalize(&src, ColorMode::Rgba).unwrap();
        assert_eq!(out, src);

        let gray = normalize(&src, ColorMode::Gray).unwrap();
        assert_eq!(gray.source_format(), Some(OutputFormat::WebP));
        assert_eq!(src.data(), &[1, 2, 3, 4]);
    }
}
