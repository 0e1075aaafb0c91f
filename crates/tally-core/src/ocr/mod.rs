//! OCR collaborator boundary and token geometry.
//!
//! The OCR engine itself is external: anything that turns a page image into
//! [`Token`]s implements [`TokenSource`]. Everything downstream works on
//! [`Row`]s produced by [`group_rows`].

mod page;
mod rows;

#[cfg(feature = "native")]
mod pure_engine;

pub use page::{is_blank_page, mean_luma};
pub use rows::{group_rows, PageExtent, Row, DEFAULT_Y_TOLERANCE};

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Axis-aligned bounding box in page pixels.
///
/// Serialized as `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Same box with inverted corners swapped back into place.
    pub fn normalized(&self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Horizontal centre.
    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Length of the vertical overlap with another box (zero when disjoint).
    pub fn vertical_overlap(&self, other: &BBox) -> f32 {
        (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0)
    }

    /// Whether the horizontal spans of the two boxes intersect.
    pub fn overlaps_horizontally(&self, other: &BBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// A recognized text fragment with its page position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Recognized text content.
    pub text: String,

    /// Bounding box on the page.
    pub bbox: BBox,
}

impl Token {
    pub fn new(text: impl Into<String>, bbox: impl Into<BBox>) -> Self {
        Self {
            text: text.into(),
            bbox: bbox.into(),
        }
    }
}

/// An OCR engine: page image in, tokens out.
///
/// No reading order is assumed from implementations.
pub trait TokenSource {
    /// Recognize the tokens on one page.
    fn recognize(&self, page: &DynamicImage) -> Result<Vec<Token>, OcrError>;
}

impl<T: TokenSource + ?Sized> TokenSource for &T {
    fn recognize(&self, page: &DynamicImage) -> Result<Vec<Token>, OcrError> {
        (**self).recognize(page)
    }
}
