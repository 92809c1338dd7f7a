//! Text watermarking.
//!
//! A watermark is drawn onto a transparent overlay the size of the image:
//! a black outline at half the requested alpha (the text offset by one pixel
//! in each of the eight directions), then the white text itself. The overlay
//! is composited over the RGBA source.
//!
//! ```text
//! alpha         = floor(opacity · 255)
//! outline alpha = alpha / 2
//! ```

pub mod compositor;
pub mod position;
pub mod text_renderer;

use image::{Rgba, RgbaImage};

use crate::constants::{DEFAULT_WATERMARK_FONT_SIZE, DEFAULT_WATERMARK_OPACITY, WATERMARK_MARGIN};
use crate::error::ImageError;
use crate::imaging::{normalize, ColorMode, PixelBuffer};

// Re-export main types for convenience
pub use compositor::composite_over;
pub use position::{
    calculate_position, ImageDimensions, PlacementPosition, WatermarkDimensions, WatermarkPosition,
};
pub use text_renderer::{FontError, TextBox, WatermarkFont};

const OUTLINE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Parameters of a text watermark.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub text: String,
    pub position: WatermarkPosition,
    /// Font size in pixels
    pub font_size: u32,
    /// 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,
}

impl WatermarkSpec {
    /// Spec with default position, font size and opacity.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position: WatermarkPosition::default(),
            font_size: DEFAULT_WATERMARK_FONT_SIZE,
            opacity: DEFAULT_WATERMARK_OPACITY,
        }
    }

    pub fn validate(&self) -> Result<(), ImageError> {
        if self.text.is_empty() {
            return Err(ImageError::invalid_request(
                "watermark_text must not be empty",
            ));
        }
        if self.font_size == 0 {
            return Err(ImageError::invalid_request(
                "font_size must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ImageError::invalid_request(format!(
                "opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }
        Ok(())
    }

    /// Alpha of the main text
    pub fn text_alpha(&self) -> u8 {
        (self.opacity.clamp(0.0, 1.0) * 255.0) as u8
    }

    /// Alpha of the outline
    pub fn outline_alpha(&self) -> u8 {
        self.text_alpha() / 2
    }
}

/// Draw the watermark for a `width`x`height` image onto a transparent overlay.
///
/// The margin offsets the text's line box from the image edges, not the
/// visible ink, so glyph bearings add a few pixels on top of it.
pub fn render_overlay(
    font: &WatermarkFont,
    width: u32,
    height: u32,
    spec: &WatermarkSpec,
) -> RgbaImage {
    let font_size = spec.font_size as f32;
    let text_box = font.measure(&spec.text, font_size);

    let origin = calculate_position(
        spec.position,
        &ImageDimensions { width, height },
        &WatermarkDimensions {
            width: text_box.width,
            height: text_box.height,
        },
        WATERMARK_MARGIN,
    );

    let mut overlay = RgbaImage::new(width, height);

    let outline = Rgba([0, 0, 0, spec.outline_alpha()]);
    for (dx, dy) in OUTLINE_OFFSETS {
        font.draw(
            &mut overlay,
            &spec.text,
            font_size,
            (origin.x + dx, origin.y + dy),
            outline,
        );
    }

    let fill = Rgba([255, 255, 255, spec.text_alpha()]);
    font.draw(&mut overlay, &spec.text, font_size, (origin.x, origin.y), fill);

    overlay
}

/// Watermark `buffer`, returning an RGBA buffer of the same size.
pub fn apply_watermark(
    buffer: &PixelBuffer,
    spec: &WatermarkSpec,
    font: &WatermarkFont,
) -> Result<PixelBuffer, ImageError> {
    spec.validate()?;

    let rgba = normalize(buffer, ColorMode::Rgba)?;
    let (width, height) = rgba.dimensions();
    let source_format = rgba.source_format();

    let mut target = RgbaImage::from_raw(width, height, rgba.into_data())
        .ok_or_else(|| ImageError::transform_failed("RGBA buffer size mismatch"))?;

    let overlay = render_overlay(font, width, height, spec);
    composite_over(&mut target, &overlay);

    tracing::debug!(
        width = width,
        height = height,
        position = %spec.position,
        font_size = spec.font_size,
        opacity = spec.opacity,
        "Applied watermark"
    );

    Ok(
        PixelBuffer::new(width, height, ColorMode::Rgba, target.into_raw())?
            .with_source_format(source_format),
    )
}
