// Constants module - centralized default values for configuration
//
// Defaults referenced by the config structs and the pipeline live here so the
// numbers in config files, docs and code stay in one place.

// =============================================================================
// Server defaults
// =============================================================================

/// Default bind address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default maximum request body size (1 MB); bodies only carry JSON parameters
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

// =============================================================================
// Fetch defaults
// =============================================================================

/// Default remote fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default maximum size of a downloaded image (50 MB)
pub const DEFAULT_MAX_DOWNLOAD_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// Image defaults
// =============================================================================

/// Default JPEG quality for re-encoding
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Default decode budget in pixels (image bomb protection)
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark font size in pixels
pub const DEFAULT_WATERMARK_FONT_SIZE: u32 = 36;

/// Default watermark opacity
pub const DEFAULT_WATERMARK_OPACITY: f32 = 0.7;

/// Distance between the watermark text box and the image edges
pub const WATERMARK_MARGIN: u32 = 20;
