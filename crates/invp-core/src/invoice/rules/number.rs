//! Invoice number extraction.

use super::patterns::INVOICE_NUMBER;
use super::{ExtractionMatch, FieldExtractor};

/// Finds `INV`-prefixed invoice numbers, upper-cased.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvoiceNumberExtractor;

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        INVOICE_NUMBER
            .find_iter(text)
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_uppercase(), m.as_str())
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_invoice_number() {
        let extractor = InvoiceNumberExtractor::new();

        assert_eq!(extractor.extract("INV-1001\nDate").unwrap().value, "INV-1001");
        assert_eq!(extractor.extract("ref inv-42 paid").unwrap().value, "INV-42");
        assert_eq!(extractor.extract("Invoice INV 7").unwrap().value, "INV 7");
        assert_eq!(extractor.extract("INV9").unwrap().value, "INV9");
    }

    #[test]
    fn test_no_invoice_number() {
        let extractor = InvoiceNumberExtractor::new();
        assert!(extractor.extract("Invoice ABC-1").is_none());
        assert!(extractor.extract("INV-").is_none());
    }

    #[test]
    fn test_extract_all_keeps_order() {
        let extractor = InvoiceNumberExtractor::new();
        let found: Vec<String> = extractor
            .extract_all("INV-2 replaces inv-1")
            .into_iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(found, vec!["INV-2", "INV-1"]);
    }
}
