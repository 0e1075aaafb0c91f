//! Scanned PDF support: page images for OCR.

mod extractor;

pub use extractor::ScannedPdf;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
