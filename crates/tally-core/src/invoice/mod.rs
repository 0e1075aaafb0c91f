//! Invoice field extraction module.
//!
//! Each known supplier layout is a [`SupplierLayout`] variant; its
//! [`LayoutRules`] locate header fields by anchor and cut line items out of
//! the table by column.

pub mod layout;
mod parser;
pub mod rules;

pub use layout::{Anchor, ColumnRange, LayoutRules, SupplierLayout};
pub use parser::{extract, HeaderScan, LayoutExtractor};

use crate::error::ExtractionError;
use crate::models::invoice::RawLineItem;
use crate::ocr::Row;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// The two capabilities every layout provides.
pub trait InvoiceLayout {
    /// Locate header fields by anchor text or fixed position.
    fn locate_header(&self, rows: &[Row]) -> Result<HeaderScan>;

    /// Segment line-item rows by column boundaries.
    fn segment_items(&self, rows: &[Row], scan: &HeaderScan) -> Vec<RawLineItem>;
}
