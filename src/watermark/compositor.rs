//! Watermark compositor for blending an overlay onto an image.
//!
//! The overlay is the same size as the target and is applied with the
//! Porter-Duff "over" operator. Fully transparent overlay pixels leave the
//! target untouched bit for bit.

use image::{Rgba, RgbaImage};

/// Composite `overlay` over `target` in place.
///
/// Both images must have the same dimensions; any excess on either side is
/// ignored.
pub fn composite_over(target: &mut RgbaImage, overlay: &RgbaImage) {
    let width = target.width().min(overlay.width());
    let height = target.height().min(overlay.height());

    for y in 0..height {
        for x in 0..width {
            let fg = *overlay.get_pixel(x, y);
            if fg[3] == 0 {
                continue;
            }
            let bg = target.get_pixel_mut(x, y);
            *bg = blend_pixels(*bg, fg);
        }
    }
}

/// Blend two pixels using alpha compositing.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    // Porter-Duff "over" operator
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_opaque_foreground() {
        let bg = Rgba([0, 0, 255, 255]);
        let fg = Rgba([255, 0, 0, 255]);
        assert_eq!(blend_pixels(bg, fg), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_blend_semi_transparent_foreground() {
        let bg = Rgba([0, 0, 0, 255]);
        let fg = Rgba([255, 255, 255, 128]);
        let result = blend_pixels(bg, fg);
        // 255 · 128/255 = 128
        assert_eq!(result, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_blend_onto_transparent_background() {
        let bg = Rgba([0, 0, 0, 0]);
        let fg = Rgba([10, 20, 30, 100]);
        assert_eq!(blend_pixels(bg, fg), Rgba([10, 20, 30, 100]));
    }

    #[test]
    fn test_transparent_overlay_is_identity() {
        let original = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8, y as u8, 7, (x * y) as u8]));
        let mut target = original.clone();
        composite_over(&mut target, &RgbaImage::new(4, 4));
        assert_eq!(target, original);
    }

    #[test]
    fn test_composite_only_touches_overlay_pixels() {
        let mut target = RgbaImage::from_pixel(3, 1, Rgba([50, 50, 50, 255]));
        let mut overlay = RgbaImage::new(3, 1);
        overlay.put_pixel(1, 0, Rgba([255, 255, 255, 255]));

        composite_over(&mut target, &overlay);
        assert_eq!(*target.get_pixel(0, 0), Rgba([50, 50, 50, 255]));
        assert_eq!(*target.get_pixel(1, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*target.get_pixel(2, 0), Rgba([50, 50, 50, 255]));
    }
}
