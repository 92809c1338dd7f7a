//! Request bodies of the transform endpoints.
//!
//! Each body converts into the image URL plus a validated
//! [`TransformRequest`], so bad parameters are rejected before anything is
//! downloaded.

use serde::Deserialize;

use crate::engine::TransformRequest;
use crate::error::ImageError;
use crate::imaging::TargetFormat;
use crate::watermark::{WatermarkPosition, WatermarkSpec};

/// Conversion into the pipeline's request type
pub trait IntoTransform {
    fn into_transform(self) -> Result<(String, TransformRequest), ImageError>;
}

/// `POST /change-image-format`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeFormatBody {
    pub image_url: String,
    pub format: String,
}

impl IntoTransform for ChangeFormatBody {
    fn into_transform(self) -> Result<(String, TransformRequest), ImageError> {
        let target: TargetFormat = self.format.parse()?;
        Ok((self.image_url, TransformRequest::FormatChange { target }))
    }
}

/// `POST /rotate-image`
#[derive(Debug, Clone, Deserialize)]
pub struct RotateBody {
    pub image_url: String,
    pub angle: i64,
}

impl IntoTransform for RotateBody {
    fn into_transform(self) -> Result<(String, TransformRequest), ImageError> {
        Ok((self.image_url, TransformRequest::Rotate { angle: self.angle }))
    }
}

/// `POST /resize-image`
#[derive(Debug, Clone, Deserialize)]
pub struct ResizeBody {
    pub image_url: String,
    pub max_width: u32,
    pub max_height: u32,
}

impl IntoTransform for ResizeBody {
    fn into_transform(self) -> Result<(String, TransformRequest), ImageError> {
        let request = TransformRequest::Resize {
            max_width: self.max_width,
            max_height: self.max_height,
        };
        request.validate()?;
        Ok((self.image_url, request))
    }
}

/// `POST /add-watermark`
#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkBody {
    pub image_url: String,
    pub watermark_text: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub opacity: Option<f32>,
}

impl IntoTransform for WatermarkBody {
    fn into_transform(self) -> Result<(String, TransformRequest), ImageError> {
        let mut spec = WatermarkSpec::new(self.watermark_text);
        if let Some(position) = self.position {
            spec.position = position
                .parse::<WatermarkPosition>()
                .map_err(ImageError::invalid_request)?;
        }
        if let Some(font_size) = self.font_size {
            spec.font_size = font_size;
        }
        if let Some(opacity) = self.opacity {
            spec.opacity = opacity;
        }
        spec.validate()?;
        Ok((self.image_url, TransformRequest::Watermark(spec)))
    }
}

/// Parse a JSON body, mapping serde errors to `InvalidRequest`.
pub fn parse_body<T>(body: &[u8]) -> Result<(String, TransformRequest), ImageError>
where
    T: IntoTransform + for<'de> Deserialize<'de>,
{
    let parsed: T =
        serde_json::from_slice(body).map_err(|e| ImageError::invalid_request(e.to_string()))?;
    parsed.into_transform()
}
