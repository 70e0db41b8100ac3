//! Data models shared across the pipeline.

pub mod config;
pub mod invoice;
pub mod validation;

pub use config::InvpConfig;
pub use invoice::{InvoiceRecord, LineItem};
pub use validation::{PathSegment, SchemaViolation, Status, ValidationResult};
