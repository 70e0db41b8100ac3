//! Core library for invoice processing.
//!
//! This crate provides:
//! - Text extraction (simulated OCR, plain text documents)
//! - Rule-based invoice field extraction
//! - Record normalization and validation (schema, dates, business and custom rules)
//! - Export to CSV, XLSX and Google Sheets
//! - SQLite persistence of processed invoices
//! - The pipeline tying the stages together, with a signed envelope trail

pub mod envelope;
pub mod error;
pub mod export;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod store;
pub mod validation;

pub use envelope::Envelope;
pub use error::{InvpError, Result};
pub use export::{ExportFormat, ExportResult, Exporter, InvoiceExporter, SheetsClient};
pub use invoice::{ExtractionResult, InvoiceParser, RuleBasedParser};
pub use models::{InvoiceRecord, InvpConfig, LineItem, Status, ValidationResult};
pub use ocr::{ExtractedText, SourceDocument, TextExtractor};
pub use pipeline::{Pipeline, PipelineOutcome, Stage, StageFailure};
pub use store::{InvoiceStore, NewInvoice, StoredInvoice};
pub use validation::{InvoiceValidator, Validator};
