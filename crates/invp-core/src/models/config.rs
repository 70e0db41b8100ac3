//! Configuration structures for the invoice pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the invp pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvpConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Upload, export and database locations.
    pub storage: StorageConfig,

    /// Text extraction configuration.
    pub ocr: OcrConfig,

    /// Validation rule configuration.
    pub validation: ValidationConfig,

    /// Export configuration.
    pub export: ExportConfig,

    /// Envelope signing configuration.
    pub signing: SigningConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// File system locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory.
    pub data_dir: PathBuf,

    /// Where uploaded documents are saved.
    pub upload_dir: PathBuf,

    /// Where exported files are written.
    pub output_dir: PathBuf,

    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            upload_dir: data_dir.join("input"),
            output_dir: data_dir.join("output"),
            database_path: data_dir.join("invoices.db"),
            data_dir,
        }
    }
}

/// Which text extractor the pipeline uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    /// Fixed simulated text for any input.
    #[default]
    Simulated,
    /// Read the document as UTF-8 text.
    PlainText,
}

/// Text extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub mode: OcrMode,
}

/// Validation rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Highest accepted `tax / subtotal` ratio.
    pub max_tax_rate: f64,

    /// Required invoice number prefix.
    pub invoice_prefix: String,

    /// Absolute tolerance for monetary equality checks. Zero compares exactly.
    pub amount_tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_tax_rate: 0.20,
            invoice_prefix: "INV-".to_string(),
            amount_tolerance: 0.0,
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when a request does not name one.
    pub default_format: Option<String>,

    /// Google Sheets configuration.
    pub sheets: SheetsConfig,
}

/// Google Sheets API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// OAuth bearer token. Sheets export is disabled when unset.
    pub access_token: Option<String>,

    /// API base URL.
    pub api_base: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: "https://sheets.googleapis.com/v4".to_string(),
        }
    }
}

/// Envelope signing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// HMAC secret for pipeline receipts. Receipts are skipped when unset.
    pub secret: Option<String>,
}

impl InvpConfig {
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

    /// Apply overrides from process environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// `DATA_DIR` re-roots the upload/output/database locations unless
    /// those are overridden individually.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = var("DATA_DIR") {
            let data_dir = PathBuf::from(dir);
            self.storage.upload_dir = data_dir.join("input");
            self.storage.output_dir = data_dir.join("output");
            self.storage.database_path = data_dir.join("invoices.db");
            self.storage.data_dir = data_dir;
        }
        if let Some(dir) = var("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = var("DB_PATH") {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(host) = var("INVP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("INVP_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(secret) = var("SIGNING_SECRET") {
            self.signing.secret = Some(secret);
        }
        if let Some(token) = var("GSHEETS_ACCESS_TOKEN") {
            self.export.sheets.access_token = Some(token);
        }
        if let Some(base) = var("GSHEETS_API_BASE") {
            self.export.sheets.api_base = base;
        }

        self
    }

    /// Create the upload and output directories.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.storage.upload_dir)?;
        std::fs::create_dir_all(&self.storage.output_dir)?;
        if let Some(parent) = self.storage.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
