//! Processing ledger: which source documents have already been approved.
//!
//! Document ids are `<supplier>/<file name>`. The ledger is an explicitly
//! owned value, loaded at session start and saved at checkpoints.

mod credential;

pub use credential::CredentialGate;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::LedgerError;

/// State of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub processed: bool,
    pub first_seen: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    fn new() -> Self {
        Self {
            processed: false,
            first_seen: Utc::now(),
            processed_at: None,
        }
    }
}

/// Which entries a reset clears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    All,
    Document(String),
    /// Every document under one supplier's inbox.
    Supplier(String),
}

impl ResetScope {
    fn covers(&self, id: &str) -> bool {
        match self {
            ResetScope::All => true,
            ResetScope::Document(doc) => doc == id,
            ResetScope::Supplier(supplier) => id
                .split_once('/')
                .is_some_and(|(prefix, _)| prefix == supplier),
        }
    }
}

/// Source documents seen and approved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingLedger {
    entries: BTreeMap<String, LedgerEntry>,
}

/// Ledger id of a document: `<supplier>/<file name>`.
pub fn document_id(supplier_id: &str, file_name: &str) -> String {
    format!("{}/{}", supplier_id, file_name)
}

impl ProcessingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger at `path`. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        if !path.exists() {
            debug!("No ledger at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let ledger: Self = serde_json::from_str(&content)?;
        debug!("Loaded {} ledger entries from {}", ledger.len(), path.display());
        Ok(ledger)
    }

    /// Save the ledger to `path` via a temporary file in the same directory.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LedgerError::Io(e.error))?;

        debug!("Saved {} ledger entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Record that a document was seen, creating an unprocessed entry.
    pub fn observe(&mut self, id: &str) -> &LedgerEntry {
        self.entries.entry(id.to_string()).or_insert_with(|| {
            debug!("New document {}", id);
            LedgerEntry::new()
        })
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| e.processed)
    }

    pub fn mark_processed(&mut self, id: &str) {
        let entry = self.entries.entry(id.to_string()).or_insert_with(LedgerEntry::new);
        entry.processed = true;
        entry.processed_at = Some(Utc::now());
        info!("Marked {} as processed", id);
    }

    /// Clear the processed flag of every entry in `scope`.
    ///
    /// The passphrase is checked first; on `AuthDenied` nothing changes.
    /// Returns the number of entries that were processed before the reset.
    pub fn reset(
        &mut self,
        scope: &ResetScope,
        gate: &CredentialGate,
        passphrase: &str,
    ) -> Result<usize, LedgerError> {
        if !gate.verify(passphrase) {
            warn!("Ledger reset denied");
            return Err(LedgerError::AuthDenied);
        }

        let mut cleared = 0;
        for (id, entry) in self.entries.iter_mut() {
            if scope.covers(id) && entry.processed {
                entry.processed = false;
                entry.processed_at = None;
                cleared += 1;
            }
        }

        info!("Ledger reset {:?} cleared {} entries", scope, cleared);
        Ok(cleared)
    }

    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
