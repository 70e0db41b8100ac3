//! Export of validated invoices to CSV, XLSX and Google Sheets.

pub mod csv;
pub mod sheets;
pub mod xlsx;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ExportError;
use crate::models::config::InvpConfig;
use crate::models::{InvoiceRecord, Status};

pub use self::sheets::SheetsClient;

/// Supported export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Gsheets,
}

impl ExportFormat {
    /// Parse a format selector. Matching is case-insensitive and an empty
    /// selector means CSV.
    pub fn parse(selector: &str) -> Result<Self, ExportError> {
        match selector.trim().to_lowercase().as_str() {
            "" | "csv" => Ok(ExportFormat::Csv),
            "xls" | "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "gsheets" | "sheets" | "sheet" => Ok(ExportFormat::Gsheets),
            _ => Err(ExportError::UnsupportedFormat(selector.to_lowercase())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Gsheets => "gsheets",
        }
    }

    /// File extension for local formats.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Csv => Some("csv"),
            ExportFormat::Xlsx => Some("xlsx"),
            ExportFormat::Gsheets => None,
        }
    }

    /// MIME type of the produced file.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Gsheets => "text/uri-list",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an export. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    pub status: Status,

    /// Local path or spreadsheet URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ExportFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResult {
    pub fn pass(file: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            status: Status::Pass,
            file: Some(file.into()),
            format: Some(format),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            file: None,
            format: None,
            error: Some(error.into()),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass
    }
}

/// Trait for invoice exporters.
#[async_trait]
pub trait InvoiceExporter: Send + Sync {
    /// Export a record. `invoice_id` names the output when the record has
    /// no invoice number.
    async fn export(&self, record: &InvoiceRecord, format: &str, invoice_id: Option<i64>) -> ExportResult;
}

/// Exporter writing local files into one directory, with optional Google
/// Sheets support.
#[derive(Debug, Clone)]
pub struct Exporter {
    export_dir: PathBuf,
    sheets: Option<SheetsClient>,
}

impl Exporter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            sheets: None,
        }
    }

    pub fn with_sheets(mut self, client: SheetsClient) -> Self {
        self.sheets = Some(client);
        self
    }

    /// Exporter for the configured output directory and Sheets account.
    pub fn from_config(config: &InvpConfig) -> Self {
        let exporter = Self::new(&config.storage.output_dir);
        match SheetsClient::from_config(&config.export.sheets) {
            Some(client) => exporter.with_sheets(client),
            None => exporter,
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Export and return the produced location, propagating errors.
    pub async fn try_export(
        &self,
        record: &InvoiceRecord,
        format: ExportFormat,
        invoice_id: Option<i64>,
    ) -> Result<String, ExportError> {
        let stem = record.file_stem(invoice_id);

        match format {
            ExportFormat::Gsheets => {
                let client = self.sheets.as_ref().ok_or(ExportError::SheetsNotConfigured)?;
                client.export(record, &stem).await
            }
            ExportFormat::Csv | ExportFormat::Xlsx => {
                std::fs::create_dir_all(&self.export_dir)?;
                let path = self.output_path(&stem, format);
                if format == ExportFormat::Csv {
                    self::csv::write_csv(record, &path)?;
                } else {
                    xlsx::write_xlsx(record, &path)?;
                }
                Ok(path.display().to_string())
            }
        }
    }

    fn output_path(&self, stem: &str, format: ExportFormat) -> PathBuf {
        let ext = format.extension().unwrap_or("out");
        self.export_dir.join(format!("{}.{}", stem, ext))
    }
}

#[async_trait]
impl InvoiceExporter for Exporter {
    async fn export(&self, record: &InvoiceRecord, format: &str, invoice_id: Option<i64>) -> ExportResult {
        let format = match ExportFormat::parse(format) {
            Ok(format) => format,
            Err(err) => return ExportResult::fail(err.to_string()),
        };

        match self.try_export(record, format, invoice_id).await {
            Ok(location) => {
                info!("Exported {} as {} to {}", record.invoice_number, format, location);
                ExportResult::pass(location, format)
            }
            Err(err) => {
                warn!("Export of {} as {} failed: {}", record.invoice_number, format, err);
                ExportResult::fail(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use pretty_assertions::assert_eq;

    fn record(number: &str) -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: number.to_string(),
            date: "2025-09-18".to_string(),
            vendor: "ACME Corp".to_string(),
            line_items: vec![LineItem::new("Widget", 1.0, 50.0, 50.0)],
            subtotal: 50.0,
            tax: 5.0,
            total: 55.0,
        }
    }

    #[test]
    fn test_format_selectors() {
        assert_eq!(ExportFormat::parse("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("Excel").unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse("xls").unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse("sheet").unwrap(), ExportFormat::Gsheets);
        assert_eq!(
            ExportFormat::parse("pdf").unwrap_err().to_string(),
            "Unsupported format pdf"
        );
    }

    #[test]
    fn test_result_serialization() {
        let value = serde_json::to_value(ExportResult::pass("out/INV-1.csv", ExportFormat::Csv)).unwrap();
        assert_eq!(value, serde_json::json!({"status": "PASS", "file": "out/INV-1.csv", "format": "csv"}));

        let value = serde_json::to_value(ExportResult::fail("boom")).unwrap();
        assert_eq!(value, serde_json::json!({"status": "FAIL", "error": "boom"}));
    }

    #[tokio::test]
    async fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());

        let result = exporter.export(&record("INV-1001"), "csv", None).await;

        assert!(result.is_pass());
        assert_eq!(result.format, Some(ExportFormat::Csv));
        let path = PathBuf::from(result.file.unwrap());
        assert_eq!(path, dir.path().join("INV-1001.csv"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("description,quantity,unit_price,total\n"));
    }

    #[tokio::test]
    async fn test_export_xlsx_uses_id_stem() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("nested"));

        let result = exporter.export(&record(""), "excel", Some(7)).await;

        assert!(result.is_pass());
        assert!(dir.path().join("nested").join("invoice_7.xlsx").exists());
    }

    #[tokio::test]
    async fn test_unsupported_format_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Exporter::new(dir.path()).export(&record("INV-1"), "pdf", None).await;

        assert_eq!(result, ExportResult::fail("Unsupported format pdf"));
    }

    #[tokio::test]
    async fn test_sheets_without_client_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Exporter::new(dir.path()).export(&record("INV-1"), "gsheets", None).await;

        assert_eq!(result.error.as_deref(), Some("Google Sheets not configured"));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
