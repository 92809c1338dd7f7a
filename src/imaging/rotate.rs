//! Counter-clockwise rotation with an expanded canvas.
//!
//! Quarter turns are exact transpositions. Every other angle inverse-maps
//! each output pixel centre through the affine rotation about the image
//! centre and samples the nearest source pixel; anything that lands outside
//! the source is zero-filled. The expanded canvas is held to the same
//! pixel budget as decoding.

use super::buffer::{ColorMode, PixelBuffer};
use super::normalize::normalize;
use crate::error::ImageError;

/// Rotate `buffer` counter-clockwise by `angle_degrees`.
///
/// Fails with [`ImageError::ImageTooLarge`] when the expanded canvas would
/// exceed `max_pixels`. Quarter turns keep the pixel count and are never
/// rejected.
pub fn rotate(
    buffer: &PixelBuffer,
    angle_degrees: i64,
    max_pixels: u64,
) -> Result<PixelBuffer, ImageError> {
    let angle = angle_degrees.rem_euclid(360);
    if angle == 0 {
        return Ok(buffer.clone());
    }

    let src = match buffer.mode() {
        ColorMode::Indexed | ColorMode::GrayAlpha => normalize(buffer, ColorMode::Rgba)?,
        _ => buffer.clone(),
    };

    let rotated = match angle {
        90 => transpose(&src, QuarterTurn::Ccw90),
        180 => transpose(&src, QuarterTurn::Half),
        270 => transpose(&src, QuarterTurn::Cw90),
        _ => rotate_affine(&src, angle as f64, max_pixels),
    }?;

    tracing::debug!(
        angle = angle_degrees,
        from = ?buffer.dimensions(),
        to = ?rotated.dimensions(),
        "Rotated image"
    );

    Ok(rotated.with_source_format(buffer.source_format()))
}

#[derive(Debug, Clone, Copy)]
enum QuarterTurn {
    Ccw90,
    Half,
    Cw90,
}

fn transpose(src: &PixelBuffer, turn: QuarterTurn) -> Result<PixelBuffer, ImageError> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let channels = src.mode().channels();
    let (dst_w, dst_h) = match turn {
        QuarterTurn::Half => (w, h),
        QuarterTurn::Ccw90 | QuarterTurn::Cw90 => (h, w),
    };

    let data = src.data();
    let mut out = Vec::with_capacity(data.len());
    for y in 0..dst_h {
        for x in 0..dst_w {
            let (sx, sy) = match turn {
                QuarterTurn::Ccw90 => (w - 1 - y, x),
                QuarterTurn::Half => (w - 1 - x, h - 1 - y),
                QuarterTurn::Cw90 => (y, h - 1 - x),
            };
            let offset = (sy * w + sx) * channels;
            out.extend_from_slice(&data[offset..offset + channels]);
        }
    }

    PixelBuffer::new(dst_w as u32, dst_h as u32, src.mode(), out)
}

/// Inverse affine matrix `[a, b, c, d, e, f]` mapping output → source:
/// `x_src = a·x + b·y + c`, `y_src = d·x + e·y + f`.
type Affine = [f64; 6];

fn apply(m: &Affine, x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
}

/// Round to 15 decimals so exact angles produce exact trig values.
fn round15(v: f64) -> f64 {
    (v * 1e15).round() / 1e15
}

/// Expanded canvas size and the inverse mapping for a rotation by `degrees`.
fn rotation_geometry(width: u32, height: u32, degrees: f64) -> (u32, u32, Affine) {
    let (w, h) = (width as f64, height as f64);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let theta = -degrees.to_radians();

    let (cos, sin) = (round15(theta.cos()), round15(theta.sin()));
    let mut m: Affine = [cos, sin, 0.0, -sin, cos, 0.0];

    // Rotate about the centre
    let (c, f) = apply(&m, -cx, -cy);
    m[2] = c + cx;
    m[5] = f + cy;

    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| apply(&m, x, y));
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in corners {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let new_w = (max_x.ceil() - min_x.floor()) as u32;
    let new_h = (max_y.ceil() - min_y.floor()) as u32;

    // Recentre on the expanded canvas
    let (c, f) = apply(&m, -(new_w as f64 - w) / 2.0, -(new_h as f64 - h) / 2.0);
    m[2] = c;
    m[5] = f;

    (new_w.max(1), new_h.max(1), m)
}

fn rotate_affine(
    src: &PixelBuffer,
    degrees: f64,
    max_pixels: u64,
) -> Result<PixelBuffer, ImageError> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let (new_w, new_h, m) = rotation_geometry(src.width(), src.height(), degrees);
    if new_w as u64 * new_h as u64 > max_pixels {
        return Err(ImageError::too_large(new_w, new_h, max_pixels));
    }
    let channels = src.mode().channels();

    let len = new_w as usize * new_h as usize * channels;
    let mut out = vec![0u8; len];
    let data = src.data();

    for y in 0..new_h as usize {
        for x in 0..new_w as usize {
            let (sx, sy) = apply(&m, x as f64 + 0.5, y as f64 + 0.5);
            if sx < 0.0 || sy < 0.0 {
                continue;
            }
            let (sx, sy) = (sx as usize, sy as usize);
            if sx >= w || sy >= h {
                continue;
            }
            let from = (sy * w + sx) * channels;
            let to = (y * new_w as usize + x) * channels;
            out[to..to + channels].copy_from_slice(&data[from..from + channels]);
        }
    }

    PixelBuffer::new(new_w, new_h, src.mode(), out)
}
