//! Position calculation for watermark placement.
//!
//! Maps one of five anchor positions plus the image and text-box sizes to the
//! top-left offset of the text box. Offsets may be negative when the text is
//! larger than the image; drawing clips to the canvas.
//!
//! # Example
//!
//! ```
//! use tsubame::watermark::position::{calculate_position, ImageDimensions, WatermarkDimensions};
//! use tsubame::watermark::WatermarkPosition;
//!
//! let image = ImageDimensions { width: 800, height: 600 };
//! let text = WatermarkDimensions { width: 100, height: 50 };
//!
//! let pos = calculate_position(WatermarkPosition::BottomRight, &image, &text, 20);
//! assert_eq!((pos.x, pos.y), (680, 530)); // 800 - 100 - 20, 600 - 50 - 20
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anchor for the watermark text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl WatermarkPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatermarkPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            "center" => Ok(Self::Center),
            other => Err(format!(
                "unknown watermark position '{}', expected one of: top-left, top-right, bottom-left, bottom-right, center",
                other
            )),
        }
    }
}

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the text box to be placed.
#[derive(Debug, Clone, Copy)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// Where the watermark's top-left corner lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Calculate the top-left offset for a text box.
///
/// Centring uses floor division so oversize text shifts consistently up and
/// to the left.
pub fn calculate_position(
    position: WatermarkPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
    margin: u32,
) -> PlacementPosition {
    let img_w = image.width as i32;
    let img_h = image.height as i32;
    let wm_w = watermark.width as i32;
    let wm_h = watermark.height as i32;
    let m = margin as i32;

    match position {
        WatermarkPosition::TopLeft => PlacementPosition::new(m, m),
        WatermarkPosition::TopRight => PlacementPosition::new(img_w - wm_w - m, m),
        WatermarkPosition::BottomLeft => PlacementPosition::new(m, img_h - wm_h - m),
        WatermarkPosition::BottomRight => {
            PlacementPosition::new(img_w - wm_w - m, img_h - wm_h - m)
        }
        WatermarkPosition::Center => PlacementPosition::new(
            (img_w - wm_w).div_euclid(2),
            (img_h - wm_h).div_euclid(2),
        ),
    }
}
