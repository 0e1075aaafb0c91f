//! Core library for structuring scanned fleet invoices.
//!
//! This crate provides:
//! - Token geometry: grouping OCR tokens into ordered rows
//! - Per-supplier field extraction into validated invoice records
//! - Reconciliation of approved records into a deduplicated, date-sorted dataset
//! - A processing ledger with a passphrase-gated reset
//! - Page loading from images and scanned PDFs, and an OCR adapter

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod reconcile;
pub mod session;

pub use error::{Result, TallyError};
pub use invoice::{extract, LayoutExtractor, SupplierLayout};
pub use ledger::{CredentialGate, ProcessingLedger, ResetScope};
pub use models::config::TallyConfig;
pub use models::invoice::{finalize, Field, InvoiceRecord, LineItem, ReviewFlag};
pub use ocr::{group_rows, Row, Token, TokenSource};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use reconcile::{merge, merge_rows, summarize, DatasetRow, MergeOutcome, SupplierSummary};
pub use session::Session;
