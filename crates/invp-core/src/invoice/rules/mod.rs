//! Rule-based field extractors.
//!
//! Each field has its own extractor implementing [`FieldExtractor`], so the
//! rules can be swapped or tested in isolation.

pub mod amounts;
pub mod dates;
pub mod line_items;
pub mod number;
pub mod patterns;
pub mod vendor;

pub use amounts::{extract_amounts, parse_amount, InvoiceAmounts};
pub use dates::{parse_invoice_date, DateExtractor};
pub use line_items::LineItemExtractor;
pub use number::InvoiceNumberExtractor;
pub use patterns::*;
pub use vendor::VendorExtractor;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value extracted from text, with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
