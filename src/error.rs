//! Image pipeline error types
//!
//! Every stage of the pipeline (fetch, decode, normalize, transform, encode)
//! reports one of these variants unmodified. The HTTP boundary maps them to a
//! status code and a user-facing message in exactly one place.

use std::fmt;

use crate::imaging::format::SUPPORTED_TARGET_FORMATS;

/// Errors that can occur while fetching or transforming an image
#[derive(Debug, Clone)]
pub enum ImageError {
    // === Input Errors ===
    /// Remote image could not be fetched (unreachable, timeout, non-2xx)
    Transport { message: String },
    /// Bytes are not a recognized image or are truncated/corrupt
    Decode { message: String },
    /// Header dimensions exceed the configured pixel budget
    ImageTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
    /// Requested target format is not in the supported set
    UnsupportedFormat { format: String },
    /// Request body or parameters failed validation
    InvalidRequest { message: String },

    // === Processing Errors ===
    /// Geometry or rendering failure inside a transform
    Transform { message: String },
    /// Color mode / format mismatch or codec failure at write time
    Encode { format: String, message: String },
    /// Worker failure outside the pipeline stages
    Internal { message: String },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Transport { message } => {
                write!(f, "Failed to download image: {}", message)
            }
            ImageError::Decode { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            ImageError::ImageTooLarge {
                width,
                height,
                max_pixels,
            } => {
                write!(
                    f,
                    "Image dimensions {}x{} ({} pixels) exceed limit of {} pixels",
                    width,
                    height,
                    *width as u64 * *height as u64,
                    max_pixels
                )
            }
            ImageError::UnsupportedFormat { format } => {
                write!(
                    f,
                    "Unsupported format: {}. Supported: {}",
                    format,
                    SUPPORTED_TARGET_FORMATS.join(", ")
                )
            }
            ImageError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            ImageError::Transform { message } => {
                write!(f, "Transform failed: {}", message)
            }
            ImageError::Encode { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            ImageError::Internal { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for ImageError {}

impl ImageError {
    /// Maps image errors to HTTP status codes
    ///
    /// Status mapping:
    /// - Transport, Decode, ImageTooLarge, UnsupportedFormat, InvalidRequest → 400
    /// - Transform, Encode, Internal → 500
    pub fn to_http_status(&self) -> u16 {
        match self {
            ImageError::Transport { .. }
            | ImageError::Decode { .. }
            | ImageError::ImageTooLarge { .. }
            | ImageError::UnsupportedFormat { .. }
            | ImageError::InvalidRequest { .. } => 400,

            ImageError::Transform { .. }
            | ImageError::Encode { .. }
            | ImageError::Internal { .. } => 500,
        }
    }

    /// Message placed in the failure envelope returned to the client.
    ///
    /// Client errors carry their own description; server errors are wrapped
    /// in a generic prefix that still includes the underlying text.
    pub fn user_message(&self) -> String {
        if self.to_http_status() >= 500 {
            format!("Internal server error: {}", self)
        } else {
            self.to_string()
        }
    }

    /// Short, stable name of the error kind for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ImageError::Transport { .. } => "transport",
            ImageError::Decode { .. } => "decode",
            ImageError::ImageTooLarge { .. } => "image_too_large",
            ImageError::UnsupportedFormat { .. } => "unsupported_format",
            ImageError::InvalidRequest { .. } => "invalid_request",
            ImageError::Transform { .. } => "transform",
            ImageError::Encode { .. } => "encode",
            ImageError::Internal { .. } => "internal",
        }
    }

    /// Helper constructors for common error patterns
    pub fn transport(message: impl Into<String>) -> Self {
        ImageError::Transport {
            message: message.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ImageError::Decode {
            message: message.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        ImageError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ImageError::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn transform_failed(message: impl Into<String>) -> Self {
        ImageError::Transform {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::Encode {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ImageError::Internal {
            message: message.into(),
        }
    }

    pub fn too_large(width: u32, height: u32, max_pixels: u64) -> Self {
        ImageError::ImageTooLarge {
            width,
            height,
            max_pixels,
        }
    }
}
