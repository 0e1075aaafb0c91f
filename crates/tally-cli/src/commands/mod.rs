//! Subcommands of the `tally` binary.

pub mod approve;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod extract;
pub mod pending;
pub mod reset;
pub mod suppliers;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::debug;

use tally_core::{Session, TallyConfig};

/// Scan extensions picked up from supplier inboxes.
pub const SCAN_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Configuration resolved from the global flags.
pub struct Context {
    pub config: TallyConfig,
}

impl Context {
    /// `--config` wins, then the user config file, then defaults.
    pub fn load(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = match config_path {
            Some(path) => TallyConfig::from_file(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    debug!("Using config {}", path.display());
                    TallyConfig::from_file(&path)?
                } else {
                    TallyConfig::default()
                }
            }
        };

        if let Some(dir) = data_dir {
            config.paths.data_dir = dir;
        }

        Ok(Self { config })
    }

    pub fn session(&self) -> anyhow::Result<Session> {
        Ok(Session::open(self.config.clone())?)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("config.json")
}

pub fn is_scan(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCAN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Scans in a supplier's inbox folder, sorted by path.
pub fn inbox_scans(config: &TallyConfig, supplier_id: &str) -> anyhow::Result<Vec<PathBuf>> {
    let inbox = config.supplier_inbox(supplier_id);
    if !inbox.is_dir() {
        debug!("No inbox folder at {}", inbox.display());
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*", glob::Pattern::escape(&inbox.to_string_lossy()));
    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_scan(p))
        .collect();
    files.sort();
    Ok(files)
}

pub fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))
}
