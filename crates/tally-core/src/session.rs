//! A processing session: extraction, approval and ledger upkeep.
//!
//! The session owns the processing ledger for its lifetime. Approval is the
//! only path that writes the dataset, and it writes the dataset before the
//! ledger so an interrupted approval leaves the document re-extractable.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result, TallyError};
use crate::invoice::{LayoutExtractor, SupplierLayout};
use crate::ledger::{document_id, CredentialGate, ProcessingLedger, ResetScope};
use crate::models::config::TallyConfig;
use crate::models::invoice::InvoiceRecord;
use crate::ocr::{group_rows, is_blank_page, Token, TokenSource};
use crate::pdf::ScannedPdf;
use crate::reconcile::{self, DatasetRow, MergeOutcome, SupplierSummary};

/// Stateful front end over the extraction and reconciliation engines.
pub struct Session {
    config: TallyConfig,
    ledger: ProcessingLedger,
    ledger_path: PathBuf,
    dataset_path: PathBuf,
}

impl Session {
    /// Open a session, loading the ledger named by `config`.
    pub fn open(config: TallyConfig) -> Result<Self> {
        let ledger_path = config.ledger_path();
        let dataset_path = config.dataset_path();
        let ledger = ProcessingLedger::load(&ledger_path)?;
        Ok(Self {
            config,
            ledger,
            ledger_path,
            dataset_path,
        })
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    pub fn ledger(&self) -> &ProcessingLedger {
        &self.ledger
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    fn extractor(&self, layout: SupplierLayout) -> LayoutExtractor {
        LayoutExtractor::new(layout).with_owner(self.config.extraction.default_owner.clone())
    }

    /// Register a document and refuse it when already approved.
    fn begin(&mut self, layout: SupplierLayout, file_name: &str, reprocess: bool) -> Result<String> {
        let id = document_id(layout.id(), file_name);
        if self.ledger.is_processed(&id) {
            if !reprocess {
                return Err(ExtractionError::AlreadyProcessed(id).into());
            }
            warn!("Reprocessing {} although it is already approved", id);
        }
        self.ledger.observe(&id);
        Ok(id)
    }

    /// OCR and extract a scanned invoice (image or PDF).
    pub fn extract_document(
        &mut self,
        path: &Path,
        supplier_id: &str,
        ocr: &dyn TokenSource,
        reprocess: bool,
    ) -> Result<InvoiceRecord> {
        let layout = SupplierLayout::from_id(supplier_id)?;
        let id = self.begin(layout, &file_name(path)?, reprocess)?;

        let pages = load_pages(path)?;
        let mut record = self.extract_pages(&pages, layout, ocr)?;
        record.source_document = Some(id);
        Ok(record)
    }

    /// Extract from tokens recognized earlier, e.g. by an external OCR run.
    pub fn extract_tokens(
        &mut self,
        file_name: &str,
        supplier_id: &str,
        tokens: &[Token],
        reprocess: bool,
    ) -> Result<InvoiceRecord> {
        let layout = SupplierLayout::from_id(supplier_id)?;
        let id = self.begin(layout, file_name, reprocess)?;

        let rows = group_rows(tokens, self.config.geometry.y_tolerance);
        let mut record = self.extractor(layout).extract(&rows)?;
        record.source_document = Some(id);
        Ok(record)
    }

    /// Try each page in turn; the first one that extracts wins.
    ///
    /// Pages after the first that look blank are skipped without OCR.
    pub fn extract_pages(
        &self,
        pages: &[DynamicImage],
        layout: SupplierLayout,
        ocr: &dyn TokenSource,
    ) -> Result<InvoiceRecord> {
        let extractor = self.extractor(layout);
        let threshold = self.config.ocr.blank_page_threshold;
        let mut last_error = ExtractionError::DocumentUnreadable("no pages".into());

        for (index, page) in pages.iter().enumerate() {
            if index > 0 && is_blank_page(page, threshold) {
                debug!("Skipping blank page {}", index + 1);
                continue;
            }

            let tokens = ocr.recognize(page)?;
            let rows = group_rows(&tokens, self.config.geometry.y_tolerance);
            debug!("Page {}: {} tokens in {} rows", index + 1, tokens.len(), rows.len());

            match extractor.extract(&rows) {
                Ok(record) => return Ok(record),
                Err(e) => {
                    debug!("Page {} did not extract: {}", index + 1, e);
                    last_error = e;
                }
            }
        }

        Err(last_error.into())
    }

    /// Persist ledger observations without approving anything.
    pub fn checkpoint(&self) -> Result<()> {
        self.ledger.save(&self.ledger_path)?;
        Ok(())
    }

    /// Merge a reviewed record into the dataset and mark its document.
    ///
    /// The record is revalidated first; open flags refuse the approval
    /// unless `accept_flags` is set. Nothing is written on failure.
    pub fn approve(&mut self, record: InvoiceRecord, accept_flags: bool) -> Result<MergeOutcome> {
        let record = record.revalidate();
        if record.needs_review() && !accept_flags {
            return Err(TallyError::NeedsReview(record.flags.len()));
        }

        let existing = reconcile::read_dataset(&self.dataset_path)?;
        let outcome = reconcile::merge(existing, std::slice::from_ref(&record));
        reconcile::write_dataset(&self.dataset_path, &outcome.rows)?;

        if let Some(id) = &record.source_document {
            self.ledger.mark_processed(id);
            self.ledger.save(&self.ledger_path)?;
        }

        info!(
            "Approved invoice '{}': dataset now {} rows",
            record.invoice_number,
            outcome.rows.len()
        );
        Ok(outcome)
    }

    /// Fold an external CSV of dataset rows into the canonical dataset.
    pub fn merge_file(&self, path: &Path) -> Result<MergeOutcome> {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
            .into());
        }
        let incoming = reconcile::read_dataset(path)?;
        let existing = reconcile::read_dataset(&self.dataset_path)?;
        let outcome = reconcile::merge_rows(existing, incoming);
        reconcile::write_dataset(&self.dataset_path, &outcome.rows)?;
        Ok(outcome)
    }

    pub fn dataset(&self) -> Result<Vec<DatasetRow>> {
        Ok(reconcile::read_dataset(&self.dataset_path)?)
    }

    pub fn summary(&self) -> Result<Vec<SupplierSummary>> {
        Ok(reconcile::summarize(&self.dataset()?))
    }

    /// Clear processed flags after checking the passphrase.
    pub fn reset(&mut self, scope: &ResetScope, passphrase: &str) -> Result<usize> {
        let gate = CredentialGate::from_config(&self.config.credential)?;
        let cleared = self.ledger.reset(scope, &gate, passphrase)?;
        self.ledger.save(&self.ledger_path)?;
        Ok(cleared)
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| TallyError::Config(format!("not a file path: {}", path.display())))
}

/// Page images of a scan: every embedded page of a PDF, or the image itself.
pub fn load_pages(path: &Path) -> Result<Vec<DynamicImage>> {
    let is_pdf = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let data = std::fs::read(path)?;
        let pages = ScannedPdf::load(&data)?.page_images()?;
        if pages.is_empty() {
            return Err(ExtractionError::DocumentUnreadable(format!(
                "{} has no scanned pages",
                path.display()
            ))
            .into());
        }
        Ok(pages)
    } else {
        Ok(vec![image::open(path)?])
    }
}
