//! Raster pipeline stages
//!
//! Bytes come in through [`decoder`], move between channel layouts with
//! [`normalize`], are transformed by [`rotate`] or [`resize`] and leave through
//! [`encoder`]:
//!
//! ```text
//! bytes → decode → PixelBuffer → normalize → transform → encode → bytes
//! ```

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod format;
pub mod normalize;
pub mod resize;
pub mod rotate;

// Re-export commonly used types
pub use buffer::{ColorMode, PixelBuffer};
pub use decoder::decode;
pub use encoder::{encode_as, EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use format::{OutputFormat, TargetFormat, SUPPORTED_TARGET_FORMATS};
pub use normalize::normalize;
pub use resize::{fit_within, resize};
pub use rotate::rotate;
