//! End-to-end invoice processing: extract, parse, validate, persist, export.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::envelope::Envelope;
use crate::export::{ExportResult, Exporter, InvoiceExporter};
use crate::invoice::{InvoiceParser, RuleBasedParser};
use crate::models::config::InvpConfig;
use crate::models::{InvoiceRecord, ValidationResult};
use crate::ocr::{extractor_from_config, SourceDocument, TextExtractor};
use crate::store::{InvoiceStore, NewInvoice};
use crate::validation::{InvoiceValidator, Validator};

/// Participant id of the pipeline itself in the envelope trail.
pub const GATEWAY_ID: &str = "gateway";
const OCR_ID: &str = "ocr-agent";
const PARSER_ID: &str = "parser-agent";
const VALIDATOR_ID: &str = "validator-agent";
const EXPORTER_ID: &str = "exporter-agent";

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Ocr,
    Parser,
    Validate,
    Store,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ocr => "ocr",
            Stage::Parser => "parser",
            Stage::Validate => "validate",
            Stage::Store => "store",
            Stage::Export => "export",
        }
    }

    /// Whether a failure in this stage is caused by the input document.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Stage::Ocr | Stage::Parser | Stage::Validate)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first stage that failed, with its error or validation report.
#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub stage: Stage,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,

    /// Envelopes exchanged up to and including the failure.
    #[serde(skip)]
    pub trail: Vec<Envelope<Value>>,
}

impl StageFailure {
    fn error(stage: Stage, error: impl Into<String>, trail: Vec<Envelope<Value>>) -> Self {
        Self {
            stage,
            error: Some(error.into()),
            validation: None,
            trail,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.validation) {
            (Some(error), _) => write!(f, "{} stage failed: {}", self.stage, error),
            (None, Some(validation)) => write!(
                f,
                "{} stage failed: {}",
                self.stage,
                validation.messages().join("; ")
            ),
            (None, None) => write!(f, "{} stage failed", self.stage),
        }
    }
}

impl std::error::Error for StageFailure {}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Store id, when the invoice was persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<i64>,

    /// The normalized record that was exported.
    pub record: InvoiceRecord,

    pub validation: ValidationResult,

    pub export: ExportResult,

    /// Parser fallbacks that were applied.
    pub warnings: Vec<String>,

    /// Request and reply envelope for every stage.
    pub trail: Vec<Envelope<Value>>,

    /// Signature of the final reply, when signing is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

/// Records the request/reply envelopes of a run.
#[derive(Default)]
struct Trail {
    envelopes: Vec<Envelope<Value>>,
}

impl Trail {
    /// Request of kind `<stage>.<action>`, tagged with its stage.
    fn request(&mut self, stage: Stage, action: &str, to: &str, body: Value) -> Envelope<Value> {
        let envelope = Envelope::new(format!("{}.{}", stage, action), GATEWAY_ID, to, body)
            .with_metadata("stage", json!(stage));
        self.envelopes.push(envelope.clone());
        envelope
    }

    fn reply(&mut self, request: &Envelope<Value>, body: Value) -> Envelope<Value> {
        self.push_reply(request.reply(request.to.clone(), body))
    }

    fn push_reply(&mut self, reply: Envelope<Value>) -> Envelope<Value> {
        self.envelopes.push(reply.clone());
        reply
    }

    fn into_inner(self) -> Vec<Envelope<Value>> {
        self.envelopes
    }
}

/// The processing pipeline. Built once and shared; every stage is injected.
pub struct Pipeline {
    extractor: Box<dyn TextExtractor>,
    parser: Box<dyn InvoiceParser>,
    validator: Box<dyn Validator>,
    exporter: Box<dyn InvoiceExporter>,
    store: Option<Arc<InvoiceStore>>,
    signing_secret: Option<String>,
}

impl Pipeline {
    pub fn new(
        extractor: Box<dyn TextExtractor>,
        parser: Box<dyn InvoiceParser>,
        validator: Box<dyn Validator>,
        exporter: Box<dyn InvoiceExporter>,
    ) -> Self {
        Self {
            extractor,
            parser,
            validator,
            exporter,
            store: None,
            signing_secret: None,
        }
    }

    /// Pipeline with the default stages for a configuration. The store is
    /// attached separately.
    pub fn from_config(config: &InvpConfig) -> Self {
        let pipeline = Self::new(
            extractor_from_config(&config.ocr),
            Box::new(RuleBasedParser::new()),
            Box::new(InvoiceValidator::new(config.validation.clone())),
            Box::new(Exporter::from_config(config)),
        );

        match config.signing.secret.clone().filter(|s| !s.is_empty()) {
            Some(secret) => pipeline.with_signing_secret(secret),
            None => pipeline,
        }
    }

    /// Pipeline for a configuration with its directories created and the
    /// invoice store opened.
    pub fn open(config: &InvpConfig) -> crate::Result<Self> {
        config.ensure_dirs()?;
        let store = InvoiceStore::open(&config.storage.database_path)?;
        Ok(Self::from_config(config).with_store(Arc::new(store)))
    }

    pub fn with_store(mut self, store: Arc<InvoiceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    pub fn store(&self) -> Option<&Arc<InvoiceStore>> {
        self.store.as_ref()
    }

    pub fn validator(&self) -> &dyn Validator {
        self.validator.as_ref()
    }

    pub fn exporter(&self) -> &dyn InvoiceExporter {
        self.exporter.as_ref()
    }

    /// Run every stage on `document`, stopping at the first failure.
    ///
    /// With `persist` the validated record is stored before export and the
    /// export location recorded against it.
    pub async fn process(
        &self,
        document: &SourceDocument,
        format: &str,
        persist: bool,
    ) -> Result<PipelineOutcome, StageFailure> {
        let mut trail = Trail::default();

        // ocr
        let file_path = document
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| document.filename.clone());
        let request = trail.request(Stage::Ocr, "extract", OCR_ID, json!({ "file_path": file_path }));
        let extracted = match self.extractor.extract(document) {
            Ok(extracted) if !extracted.invoice_text.trim().is_empty() => extracted,
            Ok(_) => {
                trail.reply(&request, json!({"status": "FAIL", "error": "OCR failed or returned empty text"}));
                return Err(StageFailure::error(Stage::Ocr, "OCR failed or returned empty text", trail.into_inner()));
            }
            Err(err) => {
                warn!("OCR failed for {}: {}", document.filename, err);
                trail.reply(&request, json!({"status": "FAIL", "error": err.to_string()}));
                return Err(StageFailure::error(Stage::Ocr, err.to_string(), trail.into_inner()));
            }
        };
        trail.reply(&request, json!(extracted));
        info!("OCR ({}) extracted {} characters from {}", self.extractor.name(), extracted.invoice_text.len(), extracted.source_file);

        // parser
        let request = trail.request(Stage::Parser, "parse_text", PARSER_ID, json!({ "text": extracted.invoice_text }));
        let parsed = self.parser.parse(&extracted.invoice_text);
        for warning in &parsed.warnings {
            warn!("Parser fallback: {}", warning);
        }
        let invoice_value = parsed.invoice.to_value();
        if !invoice_value.is_object() {
            trail.reply(&request, json!({"status": "FAIL", "error": "Parsing failed or returned no invoice"}));
            return Err(StageFailure::error(Stage::Parser, "Parsing failed or returned no invoice", trail.into_inner()));
        }
        trail.push_reply(
            request
                .reply(PARSER_ID, json!({ "invoice": invoice_value }))
                .with_metadata("warnings", json!(parsed.warnings)),
        );
        info!("Parsed invoice {}", parsed.invoice.invoice_number);

        // validate
        let request = trail.request(Stage::Validate, "invoice", VALIDATOR_ID, json!({ "invoice": invoice_value }));
        let validation = self.validator.validate(&invoice_value);
        trail.reply(&request, json!(validation));
        let record = match validation.record() {
            Some(record) if validation.is_pass() => record,
            _ => {
                info!("Validation failed with {} error(s)", validation.error_count());
                return Err(StageFailure {
                    stage: Stage::Validate,
                    error: None,
                    validation: Some(validation),
                    trail: trail.into_inner(),
                });
            }
        };
        info!("Validated invoice {}", record.invoice_number);

        // store
        let invoice_id = if persist {
            let Some(store) = &self.store else {
                return Err(StageFailure::error(Stage::Store, "Invoice store not configured", trail.into_inner()));
            };
            let new_invoice = NewInvoice {
                filename: document.filename.clone(),
                source_path: document.path.as_ref().map(|p| p.display().to_string()),
                record: record.clone(),
            };
            match store.insert(&new_invoice) {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!("Failed to store invoice {}: {}", record.invoice_number, err);
                    return Err(StageFailure::error(Stage::Store, err.to_string(), trail.into_inner()));
                }
            }
        } else {
            None
        };

        // export
        let request = trail.request(
            Stage::Export,
            "invoice",
            EXPORTER_ID,
            json!({ "invoice": record, "format": format, "invoice_id": invoice_id }),
        );
        let export = self.exporter.export(&record, format, invoice_id).await;
        let reply = trail.reply(&request, json!(export));
        if !export.is_pass() {
            let error = export.error.clone().unwrap_or_default();
            // A stored row must always have at least one export.
            if let (Some(store), Some(id)) = (&self.store, invoice_id) {
                match store.delete(id) {
                    Ok(_) => info!("Removed invoice {} after failed export", id),
                    Err(err) => warn!("Failed to remove invoice {} after failed export: {}", id, err),
                }
            }
            return Err(StageFailure::error(Stage::Export, error, trail.into_inner()));
        }

        if let (Some(store), Some(id), Some(location), Some(format)) =
            (&self.store, invoice_id, &export.file, export.format)
        {
            if let Err(err) = store.record_export(id, format.as_str(), location) {
                warn!("Failed to record export of invoice {}: {}", id, err);
            }
        }

        let receipt = match &self.signing_secret {
            Some(secret) => match reply.sign(secret) {
                Ok(signature) => Some(signature),
                Err(err) => {
                    warn!("Failed to sign receipt: {}", err);
                    None
                }
            },
            None => None,
        };

        Ok(PipelineOutcome {
            invoice_id,
            record,
            validation,
            export,
            warnings: parsed.warnings,
            trail: trail.into_inner(),
            receipt,
        })
    }
}
