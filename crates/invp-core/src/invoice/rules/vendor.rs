//! Vendor extraction.

use super::patterns::VENDOR;
use super::{ExtractionMatch, FieldExtractor};

/// Reads the value after a `Vendor:` label.
#[derive(Debug, Default, Clone, Copy)]
pub struct VendorExtractor;

impl VendorExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for VendorExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        VENDOR
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let name = caps[1].trim();
                if name.is_empty() {
                    return None;
                }
                Some(ExtractionMatch::new(name.to_string(), full.as_str()).with_position(full.start(), full.end()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_vendor() {
        let extractor = VendorExtractor::new();
        assert_eq!(extractor.extract("Vendor: ACME Corp  \nTotal").unwrap().value, "ACME Corp");
        assert_eq!(extractor.extract("Vendor:Globex").unwrap().value, "Globex");
    }

    #[test]
    fn test_missing_vendor() {
        assert!(VendorExtractor::new().extract("Seller: ACME").is_none());
    }
}
