//! Error types for the tally-core library.

use thiserror::Error;

/// Main error type for the tally library.
#[derive(Error, Debug)]
pub enum TallyError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Canonical dataset error.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Processing ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Approval refused while review flags are open.
    #[error("record has {0} open review flags")]
    NeedsReview(usize),
}

/// Errors related to reading page images out of scanned PDFs.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised by the OCR collaborator.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to invoice field extraction.
///
/// Only hard failures live here; a field that cannot be parsed cleanly is
/// reported as a [`ReviewFlag`](crate::models::invoice::ReviewFlag) on the
/// record instead.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No rows, or none of the layout's anchors could be located.
    #[error("document unreadable: {0}")]
    DocumentUnreadable(String),

    /// The caller supplied a supplier id with no known layout.
    #[error("unknown supplier layout: {0}")]
    UnknownSupplier(String),

    /// The document was already approved and recorded in the ledger.
    #[error("document already processed: {0}")]
    AlreadyProcessed(String),
}

/// Errors related to the canonical dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The file header does not match the canonical column order.
    #[error("unexpected header: expected {expected}, found {found}")]
    Header { expected: String, found: String },

    /// A row could not be parsed into the canonical schema.
    #[error("malformed row {line}: {reason}")]
    Malformed { line: u64, reason: String },

    /// CSV reader or writer failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the processing ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Reset rejected by the credential gate; nothing changed.
    #[error("authorization denied")]
    AuthDenied,

    /// The ledger file exists but is not valid JSON.
    #[error("corrupt ledger file: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the tally library.
pub type Result<T> = std::result::Result<T, TallyError>;
