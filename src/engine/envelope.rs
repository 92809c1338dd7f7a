//! JSON response envelope.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// Outcome of one transform request as returned to the client.
///
/// `image_data`, `original_size` and `new_size` are present only on success
/// and omitted from the JSON otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<(u32, u32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_size: Option<(u32, u32)>,
}

impl TransformResult {
    /// Successful envelope carrying `encoded` as standard base64.
    pub fn success(
        message: impl Into<String>,
        encoded: &[u8],
        original_size: (u32, u32),
        new_size: (u32, u32),
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            image_data: Some(STANDARD.encode(encoded)),
            original_size: Some(original_size),
            new_size: Some(new_size),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            image_data: None,
            original_size: None,
            new_size: None,
        }
    }

    /// Failure envelope for `error`, using its client-facing message.
    pub fn from_error(error: &ImageError) -> Self {
        Self::failure(error.user_message())
    }

    /// Decode `image_data` back to bytes.
    pub fn decode_image_data(&self) -> Option<Vec<u8>> {
        self.image_data
            .as_deref()
            .and_then(|data| STANDARD.decode(data).ok())
    }
}
