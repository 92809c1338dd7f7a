//! Container formats understood by the pipeline and target-format parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::ImageError;

/// Spellings accepted for a format-change request, in the order reported to clients.
pub const SUPPORTED_TARGET_FORMATS: [&str; 6] = ["JPEG", "JPG", "PNG", "WEBP", "BMP", "TIFF"];

/// Image container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
    /// Only produced when a GIF source is preserved through rotate/resize
    Gif,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Gif => "image/gif",
        }
    }

    /// Map a format detected by the `image` crate; formats we cannot write map to `None`.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            image::ImageFormat::Tiff => Some(Self::Tiff),
            image::ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated format-change target.
///
/// Keeps the client's spelling (uppercased) so `JPG` is reported back as
/// `JPG` even though it encodes as JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFormat {
    format: OutputFormat,
    label: String,
}

impl TargetFormat {
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Uppercased spelling as requested
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl FromStr for TargetFormat {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.to_uppercase();
        let format = match label.as_str() {
            "JPEG" | "JPG" => OutputFormat::Jpeg,
            "PNG" => OutputFormat::Png,
            "WEBP" => OutputFormat::WebP,
            "BMP" => OutputFormat::Bmp,
            "TIFF" => OutputFormat::Tiff,
            _ => return Err(ImageError::unsupported_format(s)),
        };
        Ok(Self { format, label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_format_case_insensitive() {
        let target: TargetFormat = "webp".parse().unwrap();
        assert_eq!(target.format(), OutputFormat::WebP);
        assert_eq!(target.label(), "WEBP");

        let target: TargetFormat = "Jpg".parse().unwrap();
        assert_eq!(target.format(), OutputFormat::Jpeg);
        assert_eq!(target.label(), "JPG");
    }

    #[test]
    fn test_every_supported_spelling_parses() {
        for name in SUPPORTED_TARGET_FORMATS {
            assert!(name.parse::<TargetFormat>().is_ok(), "{} should parse", name);
        }
    }

    #[test]
    fn test_gif_is_not_a_target() {
        let err = "GIF".parse::<TargetFormat>().unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedFormat { ref format } if format == "GIF"));
    }

    #[test]
    fn test_unknown_target_keeps_raw_value() {
        let err = "heic".parse::<TargetFormat>().unwrap_err();
        assert!(err.to_string().starts_with("Unsupported format: heic."));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Tiff.content_type(), "image/tiff");
        assert_eq!(OutputFormat::Gif.as_str(), "gif");
    }

    #[test]
    fn test_from_image_format() {
        assert_eq!(
            OutputFormat::from_image_format(image::ImageFormat::Png),
            Some(OutputFormat::Png)
        );
        assert_eq!(
            OutputFormat::from_image_format(image::ImageFormat::Ico),
            None
        );
    }
}
