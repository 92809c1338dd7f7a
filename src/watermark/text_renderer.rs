//! Text measurement and rasterization for watermarks.
//!
//! A single [`WatermarkFont`] is resolved at startup (the embedded DejaVu Sans
//! Mono, or a TrueType/OpenType file from configuration) and shared by every
//! request. Text is laid out on one line with kerning; the caret starts at
//! x = 0 and the baseline sits at the font's ascent, so the layout origin is
//! the top-left of the line box.

use ab_glyph::{point, Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Embedded font data (DejaVu Sans Mono, see `fonts/LICENSE`).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

const EMBEDDED_FONT_NAME: &str = "embedded:DejaVuSansMono";

/// Errors raised while loading the watermark font.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font data in {origin}")]
    Invalid { origin: String },
}

/// Ink bounding box of laid-out text, relative to the layout origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// The font used for every watermark.
#[derive(Clone)]
pub struct WatermarkFont {
    font: FontArc,
    origin: String,
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkFont")
            .field("origin", &self.origin)
            .finish()
    }
}

impl WatermarkFont {
    /// The font compiled into the binary.
    pub fn embedded() -> Result<Self, FontError> {
        let font = FontArc::try_from_slice(EMBEDDED_FONT_DATA).map_err(|_| FontError::Invalid {
            origin: EMBEDDED_FONT_NAME.to_string(),
        })?;
        Ok(Self {
            font,
            origin: EMBEDDED_FONT_NAME.to_string(),
        })
    }

    /// Load a TrueType/OpenType font from disk.
    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        let font = FontArc::try_from_vec(bytes).map_err(|_| FontError::Invalid {
            origin: origin.clone(),
        })?;
        Ok(Self { font, origin })
    }

    /// The configured font file if one is given, otherwise the embedded font.
    pub fn load(path: Option<&Path>) -> Result<Self, FontError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }

    /// Where the font came from, for logs.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Outline every visible glyph of `text` with the layout origin at `(x, y)`.
    fn layout(&self, text: &str, font_size: f32, x: f32, y: f32) -> Vec<OutlinedGlyph> {
        let scale = PxScale::from(font_size);
        let scaled_font = self.font.as_scaled(scale);
        let baseline_y = y + scaled_font.ascent();

        let mut glyphs = Vec::new();
        let mut cursor_x = x;
        let mut prev_glyph: Option<GlyphId> = None;

        for c in text.chars() {
            let glyph_id = scaled_font.glyph_id(c);

            if let Some(prev) = prev_glyph {
                cursor_x += scaled_font.kern(prev, glyph_id);
            }

            let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline_y));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                glyphs.push(outlined);
            }

            cursor_x += scaled_font.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }

        glyphs
    }

    /// Measure the ink bounding box of `text`.
    ///
    /// Whitespace-only text has no ink and yields an empty box.
    pub fn measure(&self, text: &str, font_size: f32) -> TextBox {
        let glyphs = self.layout(text, font_size, 0.0, 0.0);
        let mut bounds: Option<(f32, f32, f32, f32)> = None;

        for glyph in &glyphs {
            let b = glyph.px_bounds();
            bounds = Some(match bounds {
                None => (b.min.x, b.min.y, b.max.x, b.max.y),
                Some((x0, y0, x1, y1)) => (
                    x0.min(b.min.x),
                    y0.min(b.min.y),
                    x1.max(b.max.x),
                    y1.max(b.max.y),
                ),
            });
        }

        match bounds {
            Some((x0, y0, x1, y1)) => TextBox {
                left: x0.floor() as i32,
                top: y0.floor() as i32,
                width: (x1.ceil() - x0.floor()) as u32,
                height: (y1.ceil() - y0.floor()) as u32,
            },
            None => TextBox::default(),
        }
    }

    /// Draw `text` onto `canvas` with its layout origin at `origin`.
    ///
    /// Each touched pixel moves toward `ink` in every channel (alpha
    /// included) by the glyph's coverage, so full coverage writes `ink`
    /// exactly. Pixels outside the canvas are clipped.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: f32,
        origin: (i32, i32),
        ink: Rgba<u8>,
    ) {
        let canvas_width = canvas.width() as i32;
        let canvas_height = canvas.height() as i32;

        for outlined in self.layout(text, font_size, origin.0 as f32, origin.1 as f32) {
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;

                if x >= 0 && y >= 0 && x < canvas_width && y < canvas_height {
                    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                    *pixel = lerp_pixel(*pixel, ink, coverage);
                }
            });
        }
    }
}

/// Move `from` toward `to` by `t` (clamped to 0..=1) in every channel.
fn lerp_pixel(from: Rgba<u8>, to: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| -> u8 {
        let v = a as f32 + (b as f32 - a as f32) * t;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        lerp(from[0], to[0]),
        lerp(from[1], to[1]),
        lerp(from[2], to[2]),
        lerp(from[3], to[3]),
    ])
}
