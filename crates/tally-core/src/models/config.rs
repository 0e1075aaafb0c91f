//! Configuration structures for the tally pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ocr::DEFAULT_Y_TOLERANCE;

/// Main configuration for the tally pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Inbox, dataset and ledger locations.
    pub paths: PathConfig,

    /// Row grouping configuration.
    pub geometry: GeometryConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// Ledger reset credential override.
    pub credential: CredentialConfig,
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory holding one sub-folder of scans per supplier id.
    pub inbox_dir: PathBuf,

    /// Directory holding the dataset and ledger files.
    pub data_dir: PathBuf,

    /// Canonical dataset file name (CSV).
    pub dataset_file: String,

    /// Processing ledger file name (JSON).
    pub ledger_file: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            inbox_dir: PathBuf::from("invoices"),
            data_dir: PathBuf::from("output"),
            dataset_file: "master_data.csv".to_string(),
            ledger_file: "processed_files.json".to_string(),
        }
    }
}

/// Row grouping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Same-row overlap as a fraction of the shorter box height.
    pub y_tolerance: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            y_tolerance: DEFAULT_Y_TOLERANCE,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` markers in recognized text instead of blanking them.
    pub keep_unk: bool,

    /// Pages after the first with a mean grey level above this are skipped.
    pub blank_page_threshold: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            blank_page_threshold: 240.0,
        }
    }
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Owner written on records that do not name one.
    pub default_owner: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_owner: crate::models::invoice::DEFAULT_OWNER.to_string(),
        }
    }
}

/// Salted digest replacing the built-in administrator credential.
///
/// Both fields must be set for the override to apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub salt: Option<String>,
    /// Hex-encoded SHA-256 of `salt || passphrase`.
    pub digest: Option<String>,
}

impl TallyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Full path to the canonical dataset.
    pub fn dataset_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.dataset_file)
    }

    /// Full path to the processing ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.ledger_file)
    }

    /// Inbox folder for one supplier.
    pub fn supplier_inbox(&self, supplier_id: &str) -> PathBuf {
        self.paths.inbox_dir.join(supplier_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: TallyConfig =
            serde_json::from_str(r#"{"paths": {"data_dir": "/srv/tally"}}"#).unwrap();
        assert_eq!(config.paths.data_dir, PathBuf::from("/srv/tally"));
        assert_eq!(config.paths.dataset_file, "master_data.csv");
        assert_eq!(config.geometry.y_tolerance, DEFAULT_Y_TOLERANCE);
        assert_eq!(config.extraction.default_owner, "FIRESIDE");
        assert_eq!(config.dataset_path(), PathBuf::from("/srv/tally/master_data.csv"));
    }
}
