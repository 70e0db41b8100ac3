//! Text extraction stage.
//!
//! Real OCR is out of scope: the default extractor returns a fixed invoice
//! text for any document. Plain text documents can be read verbatim.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::{OcrConfig, OcrMode};

/// Text returned by [`SimulatedOcr`] for every document.
pub const SIMULATED_TEXT: &str = "INV-1001\nDate: 2025-09-18\nVendor: ACME Corp\n\
1 x Widget @ 50.00 = 50.00\nSubtotal: 50.00\nTax: 5.00\nTotal: 55.00";

/// An uploaded document handed to the pipeline.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Original file name (base name only).
    pub filename: String,

    /// Where the document was saved, if it was.
    pub path: Option<PathBuf>,

    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: sanitize_filename(&filename.into()),
            path: None,
            bytes,
        }
    }

    /// Read a document from disk.
    pub fn from_path(path: &Path) -> Result<Self, OcrError> {
        let bytes = std::fs::read(path).map_err(|source| OcrError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("uploaded_invoice");

        Ok(Self {
            filename: sanitize_filename(filename),
            path: Some(path.to_path_buf()),
            bytes,
        })
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }
}

/// Reduce a client supplied file name to a safe base name.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        "uploaded_invoice".to_string()
    } else {
        base.to_string()
    }
}

/// Output of the extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Extracted invoice text.
    pub invoice_text: String,

    /// File the text came from.
    pub source_file: String,
}

/// Trait for text extractors.
pub trait TextExtractor: Send + Sync {
    /// Short identifier used in logs and envelopes.
    fn name(&self) -> &'static str;

    /// Extract invoice text from a document.
    fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, OcrError>;
}

/// Returns [`SIMULATED_TEXT`] for any input.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedOcr;

impl TextExtractor for SimulatedOcr {
    fn name(&self) -> &'static str {
        "simulated-ocr"
    }

    fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, OcrError> {
        debug!("Simulating OCR for {}", document.filename);
        Ok(ExtractedText {
            invoice_text: SIMULATED_TEXT.to_string(),
            source_file: document.filename.clone(),
        })
    }
}

/// Treats the document bytes as UTF-8 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, OcrError> {
        let text = String::from_utf8_lossy(&document.bytes);
        if text.trim().is_empty() {
            return Err(OcrError::Empty);
        }

        debug!("Read {} characters from {}", text.len(), document.filename);
        Ok(ExtractedText {
            invoice_text: text.into_owned(),
            source_file: document.filename.clone(),
        })
    }
}

/// Build the extractor selected by configuration.
pub fn extractor_from_config(config: &OcrConfig) -> Box<dyn TextExtractor> {
    match config.mode {
        OcrMode::Simulated => Box::new(SimulatedOcr),
        OcrMode::PlainText => Box::new(PlainTextExtractor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simulated_ignores_input() {
        let doc = SourceDocument::new("scan.pdf", vec![0xff, 0x00]);
        let out = SimulatedOcr.extract(&doc).unwrap();

        assert_eq!(out.invoice_text, SIMULATED_TEXT);
        assert_eq!(out.source_file, "scan.pdf");
    }

    #[test]
    fn test_plain_text() {
        let doc = SourceDocument::new("inv.txt", b"INV-7\nVendor: Foo".to_vec());
        let out = PlainTextExtractor.extract(&doc).unwrap();
        assert_eq!(out.invoice_text, "INV-7\nVendor: Foo");
    }

    #[test]
    fn test_plain_text_empty() {
        let doc = SourceDocument::new("inv.txt", b"  \n".to_vec());
        assert!(matches!(PlainTextExtractor.extract(&doc), Err(OcrError::Empty)));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\scans\\a b.pdf"), "a b.pdf");
        assert_eq!(sanitize_filename(""), "uploaded_invoice");
        assert_eq!(sanitize_filename("dir/.."), "uploaded_invoice");
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.txt");
        std::fs::write(&path, "hello").unwrap();

        let doc = SourceDocument::from_path(&path).unwrap();
        assert_eq!(doc.filename, "invoice.txt");
        assert_eq!(doc.bytes, b"hello");
        assert!(SourceDocument::from_path(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_extractor_from_config() {
        let config = OcrConfig { mode: OcrMode::PlainText };
        assert_eq!(extractor_from_config(&config).name(), "plain-text");
        assert_eq!(extractor_from_config(&OcrConfig::default()).name(), "simulated-ocr");
    }
}
