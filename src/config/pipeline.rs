//! Configuration for the fetch → transform → encode pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DOWNLOAD_BYTES,
    DEFAULT_MAX_PIXELS,
};

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_max_download_bytes() -> usize {
    DEFAULT_MAX_DOWNLOAD_BYTES
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_max_pixels() -> u64 {
    DEFAULT_MAX_PIXELS
}

/// Remote image download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Largest accepted download in bytes (default: 50 MB)
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_download_bytes: default_max_download_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

/// Decode and encode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// JPEG output quality, 1-100 (default: 85)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Largest decodable image in pixels (default: 100 million)
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            max_pixels: default_max_pixels(),
        }
    }
}

/// Watermark font settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// TrueType/OpenType font file; the embedded font is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}
