//! Transform engine
//!
//! Runs exactly one transform per request:
//!
//! 1. decode the fetched bytes (pixel budget checked from the header)
//! 2. apply the requested transform
//! 3. pick the output format and encode (mode normalization happens here)
//! 4. wrap the bytes in a [`TransformResult`]
//!
//! Everything here is synchronous and CPU-bound; callers run it on a
//! blocking thread.

pub mod envelope;

use std::sync::Arc;

use crate::config::ImageConfig;
use crate::error::ImageError;
use crate::imaging::{
    decode, encode_as, resize, rotate, EncoderQuality, OutputFormat, PixelBuffer, TargetFormat,
};
use crate::watermark::{apply_watermark, WatermarkFont, WatermarkSpec};

pub use envelope::TransformResult;

/// The one operation a request asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformRequest {
    FormatChange { target: TargetFormat },
    /// Counter-clockwise, any integer number of degrees
    Rotate { angle: i64 },
    Resize { max_width: u32, max_height: u32 },
    Watermark(WatermarkSpec),
}

impl TransformRequest {
    /// Check parameters that do not depend on the image.
    pub fn validate(&self) -> Result<(), ImageError> {
        match self {
            TransformRequest::Resize {
                max_width,
                max_height,
            } if *max_width == 0 || *max_height == 0 => Err(ImageError::invalid_request(format!(
                "max_width and max_height must be greater than 0, got {}x{}",
                max_width, max_height
            ))),
            TransformRequest::Watermark(spec) => spec.validate(),
            _ => Ok(()),
        }
    }

    /// Operation name for logs
    pub fn name(&self) -> &'static str {
        match self {
            TransformRequest::FormatChange { .. } => "format_change",
            TransformRequest::Rotate { .. } => "rotate",
            TransformRequest::Resize { .. } => "resize",
            TransformRequest::Watermark(_) => "watermark",
        }
    }

    /// Output container for a transformed buffer.
    ///
    /// Format change encodes to its target, watermark always to JPEG, and
    /// rotate/resize keep the detected source format (PNG when unknown).
    fn output_format(&self, buffer: &PixelBuffer) -> OutputFormat {
        match self {
            TransformRequest::FormatChange { target } => target.format(),
            TransformRequest::Watermark(_) => OutputFormat::Jpeg,
            TransformRequest::Rotate { .. } | TransformRequest::Resize { .. } => {
                buffer.source_format().unwrap_or(OutputFormat::Png)
            }
        }
    }

    fn success_message(&self, new_size: (u32, u32)) -> String {
        match self {
            TransformRequest::FormatChange { target } => {
                format!("Successfully converted image to {}", target.label())
            }
            TransformRequest::Rotate { angle } => {
                format!("Successfully rotated image by {} degrees", angle)
            }
            TransformRequest::Resize { .. } => {
                format!("Successfully resized image to {}x{}", new_size.0, new_size.1)
            }
            TransformRequest::Watermark(_) => "Successfully added watermark to image".to_string(),
        }
    }
}

/// Stateless pipeline shared by all requests.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    font: Arc<WatermarkFont>,
    quality: EncoderQuality,
    max_pixels: u64,
}

impl TransformEngine {
    pub fn new(font: Arc<WatermarkFont>, config: &ImageConfig) -> Self {
        Self {
            font,
            quality: EncoderQuality::with_quality(config.jpeg_quality),
            max_pixels: config.max_pixels,
        }
    }

    /// Decode `bytes`, apply `request` and encode the result.
    pub fn run(&self, bytes: &[u8], request: &TransformRequest) -> Result<TransformResult, ImageError> {
        request.validate()?;

        // 1. Decode
        let source = decode(bytes, self.max_pixels)?;
        let original_size = source.dimensions();

        // 2. Transform
        let transformed = match request {
            TransformRequest::FormatChange { .. } => source,
            TransformRequest::Rotate { angle } => rotate(&source, *angle, self.max_pixels)?,
            TransformRequest::Resize {
                max_width,
                max_height,
            } => resize(&source, *max_width, *max_height)?,
            TransformRequest::Watermark(spec) => apply_watermark(&source, spec, &self.font)?,
        };
        let new_size = transformed.dimensions();

        // 3. Encode
        let encoded = encode_as(&transformed, request.output_format(&transformed), self.quality)?;

        tracing::debug!(
            operation = request.name(),
            original_width = original_size.0,
            original_height = original_size.1,
            new_width = new_size.0,
            new_height = new_size.1,
            format = %encoded.format,
            content_type = encoded.content_type,
            encoded_bytes = encoded.data.len(),
            "Transform complete"
        );

        // 4. Envelope
        Ok(TransformResult::success(
            request.success_message(new_size),
            &encoded.data,
            original_size,
            new_size,
        ))
    }
}
