//! Error types for the invp-core library.

use thiserror::Error;

/// Main error type for the invp library.
#[derive(Error, Debug)]
pub enum InvpError {
    /// Text extraction error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Envelope signing error.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the text extraction stage.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The source document could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Extraction produced no text.
    #[error("OCR failed or returned empty text")]
    Empty,
}

/// Errors raised by exporters. These never cross the export stage boundary;
/// they are folded into a FAIL [`crate::export::ExportResult`].
#[derive(Error, Debug)]
pub enum ExportError {
    /// The requested format selector is unknown.
    #[error("Unsupported format {0}")]
    UnsupportedFormat(String),

    /// Google Sheets export requested without a configured client.
    #[error("Google Sheets not configured")]
    SheetsNotConfigured,

    /// The Sheets API rejected a request.
    #[error("Google Sheets API error ({status}): {message}")]
    SheetsApi { status: u16, message: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook writer error.
    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to invoice persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored JSON could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored timestamp could not be parsed.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    /// The database directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to envelope signing.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The envelope body could not be serialized for signing.
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The signing key was rejected.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Result type for the invp library.
pub type Result<T> = std::result::Result<T, InvpError>;
