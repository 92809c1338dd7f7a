//! Decoded raster representation shared by every pipeline stage.

use std::fmt;

use super::format::OutputFormat;
use crate::error::ImageError;

/// Channel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// One palette index per pixel; colors live in the buffer's RGBA palette
    Indexed,
    /// Luminance
    Gray,
    /// Luminance + alpha
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ColorMode {
    /// Bytes per pixel
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Indexed | ColorMode::Gray => 1,
            ColorMode::GrayAlpha => 2,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }

    /// Whether the mode stores an alpha channel per pixel
    pub fn has_alpha_channel(&self) -> bool {
        matches!(self, ColorMode::GrayAlpha | ColorMode::Rgba)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Indexed => "indexed",
            ColorMode::Gray => "gray",
            ColorMode::GrayAlpha => "gray-alpha",
            ColorMode::Rgb => "rgb",
            ColorMode::Rgba => "rgba",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded raster: dimensions, channel layout and 8-bit row-major samples.
///
/// Width and height are always non-zero and `data.len()` always equals
/// `width * height * mode.channels()`. Indexed buffers carry a palette and
/// every index points into it.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    mode: ColorMode,
    data: Vec<u8>,
    palette: Option<Vec<[u8; 4]>>,
    source_format: Option<OutputFormat>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("dimensions", &(self.width, self.height))
            .field("mode", &self.mode)
            .field("palette_len", &self.palette.as_ref().map(Vec::len))
            .field("source_format", &self.source_format)
            .finish()
    }
}

impl PixelBuffer {
    /// Create a direct-color buffer (any mode except `Indexed`).
    pub fn new(width: u32, height: u32, mode: ColorMode, data: Vec<u8>) -> Result<Self, ImageError> {
        if mode == ColorMode::Indexed {
            return Err(ImageError::internal(
                "indexed buffers must be created with a palette",
            ));
        }
        check_layout(width, height, mode, data.len())?;
        Ok(Self {
            width,
            height,
            mode,
            data,
            palette: None,
            source_format: None,
        })
    }

    /// Create an indexed buffer from palette indices and an RGBA palette.
    pub fn indexed(
        width: u32,
        height: u32,
        indices: Vec<u8>,
        palette: Vec<[u8; 4]>,
    ) -> Result<Self, ImageError> {
        check_layout(width, height, ColorMode::Indexed, indices.len())?;
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
            return Err(ImageError::internal(format!(
                "palette index {} out of range for palette of {} entries",
                bad,
                palette.len()
            )));
        }
        Ok(Self {
            width,
            height,
            mode: ColorMode::Indexed,
            data: indices,
            palette: Some(palette),
            source_format: None,
        })
    }

    /// Tag the buffer with the container format it was decoded from.
    pub fn with_source_format(mut self, format: Option<OutputFormat>) -> Self {
        self.source_format = format;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn palette(&self) -> Option<&[[u8; 4]]> {
        self.palette.as_deref()
    }

    pub fn source_format(&self) -> Option<OutputFormat> {
        self.source_format
    }

    /// True when any pixel may be non-opaque: an alpha channel, or a palette
    /// with translucent entries.
    pub fn has_transparency(&self) -> bool {
        match self.mode {
            ColorMode::Indexed => self
                .palette
                .as_ref()
                .map(|p| p.iter().any(|c| c[3] < 255))
                .unwrap_or(false),
            mode => mode.has_alpha_channel(),
        }
    }

    /// Pixel `i` (row-major) expanded to RGBA.
    pub fn rgba_at(&self, i: usize) -> [u8; 4] {
        let d = &self.data;
        match self.mode {
            ColorMode::Indexed => {
                let index = d[i] as usize;
                self.palette
                    .as_ref()
                    .and_then(|p| p.get(index).copied())
                    .unwrap_or([0, 0, 0, 0])
            }
            ColorMode::Gray => [d[i], d[i], d[i], 255],
            ColorMode::GrayAlpha => [d[2 * i], d[2 * i], d[2 * i], d[2 * i + 1]],
            ColorMode::Rgb => [d[3 * i], d[3 * i + 1], d[3 * i + 2], 255],
            ColorMode::Rgba => [d[4 * i], d[4 * i + 1], d[4 * i + 2], d[4 * i + 3]],
        }
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn check_layout(width: u32, height: u32, mode: ColorMode, len: usize) -> Result<(), ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::internal(format!(
            "pixel buffer dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    let expected = width as usize * height as usize * mode.channels();
    if len != expected {
        return Err(ImageError::internal(format!(
            "pixel data length {} does not match {}x{} {} ({} bytes)",
            len, width, height, mode, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        assert!(PixelBuffer::new(2, 2, ColorMode::Rgb, vec![0; 12]).is_ok());
        assert!(PixelBuffer::new(2, 2, ColorMode::Rgb, vec![0; 11]).is_err());
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        assert!(PixelBuffer::new(0, 2, ColorMode::Gray, vec![]).is_err());
        assert!(PixelBuffer::new(2, 0, ColorMode::Gray, vec![]).is_err());
    }

    #[test]
    fn test_new_rejects_indexed_without_palette() {
        assert!(PixelBuffer::new(1, 1, ColorMode::Indexed, vec![0]).is_err());
    }

    #[test]
    fn test_indexed_validates_palette_range() {
        let palette = vec![[255, 0, 0, 255], [0, 0, 255, 128]];
        assert!(PixelBuffer::indexed(2, 1, vec![0, 1], palette.clone()).is_ok());
        assert!(PixelBuffer::indexed(2, 1, vec![0, 2], palette).is_err());
    }

    #[test]
    fn test_rgba_at_expands_every_mode() {
        let gray = PixelBuffer::new(1, 1, ColorMode::Gray, vec![7]).unwrap();
        assert_eq!(gray.rgba_at(0), [7, 7, 7, 255]);

        let la = PixelBuffer::new(1, 1, ColorMode::GrayAlpha, vec![7, 9]).unwrap();
        assert_eq!(la.rgba_at(0), [7, 7, 7, 9]);

        let rgb = PixelBuffer::new(1, 1, ColorMode::Rgb, vec![1, 2, 3]).unwrap();
        assert_eq!(rgb.rgba_at(0), [1, 2, 3, 255]);

        let indexed = PixelBuffer::indexed(1, 1, vec![1], vec![[0; 4], [4, 5, 6, 7]]).unwrap();
        assert_eq!(indexed.rgba_at(0), [4, 5, 6, 7]);
    }

    #[test]
    fn test_has_transparency() {
        let rgb = PixelBuffer::new(1, 1, ColorMode::Rgb, vec![0; 3]).unwrap();
        assert!(!rgb.has_transparency());

        let rgba = PixelBuffer::new(1, 1, ColorMode::Rgba, vec![0; 4]).unwrap();
        assert!(rgba.has_transparency());

        let opaque = PixelBuffer::indexed(1, 1, vec![0], vec![[1, 2, 3, 255]]).unwrap();
        assert!(!opaque.has_transparency());

        let translucent = PixelBuffer::indexed(1, 1, vec![0], vec![[1, 2, 3, 0]]).unwrap();
        assert!(translucent.has_transparency());
    }

    #[test]
    fn test_source_format_tag() {
        let buf = PixelBuffer::new(1, 1, ColorMode::Gray, vec![0])
            .unwrap()
            .with_source_format(Some(OutputFormat::Png));
        assert_eq!(buf.source_format(), Some(OutputFormat::Png));
        assert_eq!(buf.dimensions(), (1, 1));
    }
}
