//! Image encoder abstraction
//!
//! One encoder per container format behind the [`ImageEncoder`] trait:
//! - each encoder declares the color modes it can write
//! - [`encode_as`] picks the mode a format needs and normalizes first
//! - JPEG quality is configurable, the other codecs are lossless

use image::codecs::bmp::BmpEncoder as ImageBmpEncoder;
use image::codecs::gif::GifEncoder as ImageGifEncoder;
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::codecs::png::PngEncoder as ImagePngEncoder;
use image::codecs::tiff::TiffEncoder as ImageTiffEncoder;
use image::codecs::webp::WebPEncoder as ImageWebPEncoder;
use image::{ColorType, ImageEncoder as _};
use std::io::Cursor;

use super::buffer::{ColorMode, PixelBuffer};
use super::format::OutputFormat;
use super::normalize::normalize;
use crate::constants::DEFAULT_JPEG_QUALITY;
use crate::error::ImageError;

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100, where 100 is best quality); JPEG only
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EncoderQuality {
    /// Create quality settings with specified quality level
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// The output format
    pub format: OutputFormat,
    /// Content-Type header value
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: OutputFormat) -> Self {
        let content_type = format.content_type();
        Self {
            data,
            format,
            content_type,
        }
    }
}

/// Trait for image encoders
///
/// Implementations write a [`PixelBuffer`] in one of the modes they accept
/// and fail with [`ImageError::Encode`] for any other mode.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Color modes this encoder can write without conversion
    fn accepted_modes(&self) -> &'static [ColorMode];

    /// Encode the buffer to the target format
    fn encode(
        &self,
        buffer: &PixelBuffer,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError>;

    fn accepts(&self, mode: ColorMode) -> bool {
        self.accepted_modes().contains(&mode)
    }

    /// Check if this encoder supports transparency
    fn supports_transparency(&self) -> bool {
        self.accepted_modes()
            .iter()
            .any(ColorMode::has_alpha_channel)
    }
}

/// Map an accepted mode to the `image` crate's color type, failing on a mismatch.
fn checked_color_type(
    encoder: &dyn ImageEncoder,
    buffer: &PixelBuffer,
) -> Result<ColorType, ImageError> {
    let format = encoder.format();
    if !encoder.accepts(buffer.mode()) {
        return Err(ImageError::encode_failed(
            format.as_str(),
            format!("cannot write {} pixels", buffer.mode()),
        ));
    }
    match buffer.mode() {
        ColorMode::Gray => Ok(ColorType::L8),
        ColorMode::GrayAlpha => Ok(ColorType::La8),
        ColorMode::Rgb => Ok(ColorType::Rgb8),
        ColorMode::Rgba => Ok(ColorType::Rgba8),
        ColorMode::Indexed => Err(ImageError::encode_failed(
            format.as_str(),
            "indexed pixels must be expanded before encoding",
        )),
    }
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn accepted_modes(&self) -> &'static [ColorMode] {
        &[ColorMode::Gray, ColorMode::Rgb]
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let color = checked_color_type(self, buffer)?;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, quality.quality);

        encoder
            .write_image(buffer.data(), buffer.width(), buffer.height(), color)
            .map_err(|e| ImageError::encode_failed("jpeg", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Jpeg))
    }
}

/// PNG encoder using the image crate
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn accepted_modes(&self) -> &'static [ColorMode] {
        &[
            ColorMode::Gray,
            ColorMode::GrayAlpha,
            ColorMode::Rgb,
            ColorMode::Rgba,
        ]
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let color = checked_color_type(self, buffer)?;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImagePngEncoder::new(&mut output);

        encoder
            .write_image(buffer.data(), buffer.width(), buffer.height(), color)
            .map_err(|e| ImageError::encode_failed("png", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Png))
    }
}

/// WebP encoder using the image crate
///
/// Note: The `image` crate only supports lossless WebP encoding.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn accepted_modes(&self) -> &'static [ColorMode] {
        &[ColorMode::Rgb, ColorMode::Rgba]
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let color = checked_color_type(self, buffer)?;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageWebPEncoder::new_lossless(&mut output);

        encoder
            .write_image(buffer.data(), buffer.width(), buffer.height(), color)
            .map_err(|e| ImageError::encode_failed("webp", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::WebP))
    }
}

/// BMP encoder using the image crate
pub struct BmpEncoder;

impl ImageEncoder for BmpEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Bmp
    }

    fn accepted_modes(&self) -> &'static [ColorMode] {
        &[ColorMode::Gray, ColorMode::Rgb]
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let color = checked_color_type(self, buffer)?;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageBmpEncoder::new(&mut output);

        encoder
            .write_image(buffer.data(), buffer.width(), buffer.height(), color)
            .map_err(|e| ImageError::encode_failed("bmp", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Bmp))
    }
}

/// TIFF encoder using the image crate
pub struct TiffEncoder;

impl ImageEncoder for TiffEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Tiff
    }

    fn accepted_modes(&self) -> &'static [ColorMode] {
        &[ColorMode::Gray, ColorMode::Rgb, ColorMode::Rgba]
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let color = checked_color_type(self, buffer)?;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageTiffEncoder::new(&mut output);

        encoder
            .write_image(buffer.data(), buffer.width(), buffer.height(), color)
            .map_err(|e| ImageError::encode_failed("tiff", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Tiff))
    }
}

/// GIF encoder using the image crate (single frame)
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn accepted_modes(&self) -> &'static [ColorMode] {
        &[ColorMode::Rgb, ColorMode::Rgba]
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, ImageError> {
        let color = checked_color_type(self, buffer)?;

        let mut output = Vec::new();
        {
            // The trailer is written when the encoder drops
            let mut encoder = ImageGifEncoder::new(&mut output);
            encoder
                .encode(buffer.data(), buffer.width(), buffer.height(), color)
                .map_err(|e| ImageError::encode_failed("gif", e.to_string()))?;
        }

        Ok(EncodedImage::new(output, OutputFormat::Gif))
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the specified output format
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
            OutputFormat::Bmp => Box::new(BmpEncoder),
            OutputFormat::Tiff => Box::new(TiffEncoder),
            OutputFormat::Gif => Box::new(GifEncoder),
        }
    }
}

/// Color mode `encoder` should receive for a buffer currently in `mode`.
///
/// Keeps the mode when accepted; otherwise RGBA if the format keeps alpha and
/// the source is transparent, else RGB (flattened onto white).
pub fn required_mode(encoder: &dyn ImageEncoder, buffer: &PixelBuffer) -> ColorMode {
    if encoder.accepts(buffer.mode()) {
        buffer.mode()
    } else if encoder.supports_transparency() && buffer.has_transparency() {
        ColorMode::Rgba
    } else {
        ColorMode::Rgb
    }
}

/// Normalize `buffer` to whatever `format` needs and encode it.
pub fn encode_as(
    buffer: &PixelBuffer,
    format: OutputFormat,
    quality: EncoderQuality,
) -> Result<EncodedImage, ImageError> {
    let encoder = EncoderFactory::create(format);
    let mode = required_mode(encoder.as_ref(), buffer);

    if mode == buffer.mode() {
        encoder.encode(buffer, quality)
    } else {
        encoder.encode(&normalize(buffer, mode)?, quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::decoder::decode;

    const MAX_PIXELS: u64 = 1 << 20;

    fn checker_rgba() -> PixelBuffer {
        let mut data = Vec::new();
        for i in 0..16u8 {
            if i % 2 == 0 {
                data.extend_from_slice(&[255, 0, 0, 255]);
            } else {
                data.extend_from_slice(&[0, 0, 255, 0]);
            }
        }
        PixelBuffer::new(4, 4, ColorMode::Rgba, data).unwrap()
    }

    #[test]
    fn test_encoder_quality_clamping() {
        assert_eq!(EncoderQuality::with_quality(0).quality, 1);
        assert_eq!(EncoderQuality::with_quality(150).quality, 100);
        assert_eq!(EncoderQuality::default().quality, 85);
    }

    #[test]
    fn test_factory_formats() {
        for format in [
            OutputFormat::Jpeg,
            OutputFormat::Png,
            OutputFormat::WebP,
            OutputFormat::Bmp,
            OutputFormat::Tiff,
            OutputFormat::Gif,
        ] {
            assert_eq!(EncoderFactory::create(format).format(), format);
        }
    }

    #[test]
    fn test_transparency_support() {
        assert!(!JpegEncoder.supports_transparency());
        assert!(!BmpEncoder.supports_transparency());
        assert!(PngEncoder.supports_transparency());
        assert!(WebPEncoder.supports_transparency());
        assert!(TiffEncoder.supports_transparency());
        assert!(GifEncoder.supports_transparency());
    }

    #[test]
    fn test_jpeg_rejects_rgba_directly() {
        let err = JpegEncoder
            .encode(&checker_rgba(), EncoderQuality::default())
            .unwrap_err();
        assert!(matches!(err, ImageError::Encode { ref format, .. } if format == "jpeg"));
    }

    #[test]
    fn test_required_mode_selection() {
        let rgba = checker_rgba();
        assert_eq!(required_mode(&JpegEncoder, &rgba), ColorMode::Rgb);
        assert_eq!(required_mode(&PngEncoder, &rgba), ColorMode::Rgba);

        let la = PixelBuffer::new(1, 1, ColorMode::GrayAlpha, vec![1, 2]).unwrap();
        assert_eq!(required_mode(&WebPEncoder, &la), ColorMode::Rgba);
        assert_eq!(required_mode(&TiffEncoder, &la), ColorMode::Rgba);
        assert_eq!(required_mode(&PngEncoder, &la), ColorMode::GrayAlpha);

        let gray = PixelBuffer::new(1, 1, ColorMode::Gray, vec![1]).unwrap();
        assert_eq!(required_mode(&GifEncoder, &gray), ColorMode::Rgb);
        assert_eq!(required_mode(&JpegEncoder, &gray), ColorMode::Gray);
    }

    #[test]
    fn test_encode_as_jpeg_flattens() {
        let encoded = encode_as(&checker_rgba(), OutputFormat::Jpeg, EncoderQuality::default())
            .unwrap();
        assert_eq!(encoded.format, OutputFormat::Jpeg);
        assert_eq!(encoded.content_type, "image/jpeg");
        assert_eq!(&encoded.data[0..2], &[0xFF, 0xD8]);

        let decoded = decode(&encoded.data, MAX_PIXELS).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn test_png_is_lossless() {
        let src = checker_rgba();
        let encoded = encode_as(&src, OutputFormat::Png, EncoderQuality::default()).unwrap();
        assert_eq!(encoded.format, OutputFormat::Png);
        assert_eq!(encoded.content_type, "image/png");
        assert_eq!(&encoded.data[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        let decoded = decode(&encoded.data, MAX_PIXELS).unwrap();
        assert_eq!(decoded.mode(), ColorMode::Rgba);
        assert_eq!(decoded.data(), src.data());
    }

    #[test]
    fn test_bmp_flattens_transparency_to_white() {
        let encoded = encode_as(&checker_rgba(), OutputFormat::Bmp, EncoderQuality::default())
            .unwrap();
        assert_eq!(&encoded.data[0..2], b"BM");

        let decoded = decode(&encoded.data, MAX_PIXELS).unwrap();
        assert_eq!(decoded.rgba_at(0), [255, 0, 0, 255]);
        assert_eq!(decoded.rgba_at(1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_webp_tiff_gif_produce_their_containers() {
        let src = checker_rgba();

        let webp = encode_as(&src, OutputFormat::WebP, EncoderQuality::default()).unwrap();
        assert_eq!(&webp.data[0..4], b"RIFF");
        assert_eq!(&webp.data[8..12], b"WEBP");

        let tiff = encode_as(&src, OutputFormat::Tiff, EncoderQuality::default()).unwrap();
        assert!(tiff.data.starts_with(b"II*\0") || tiff.data.starts_with(b"MM\0*"));

        let gif = encode_as(&src, OutputFormat::Gif, EncoderQuality::default()).unwrap();
        assert_eq!(&gif.data[0..3], b"GIF");
        assert_eq!(gif.data.last(), Some(&0x3B));
    }
}
