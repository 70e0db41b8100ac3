//! Line item extraction.

use tracing::debug;

use crate::models::invoice::LineItem;

use super::amounts::parse_amount;
use super::patterns::LINE_ITEM;
use super::{ExtractionMatch, FieldExtractor};

/// Parses `<qty> x <description> @ <unit price> = <total>` lines.
///
/// At most one item per line. Lines whose numbers do not parse are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineItemExtractor;

impl LineItemExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_line(&self, line: &str) -> Option<LineItem> {
        let caps = LINE_ITEM.captures(line)?;

        let quantity = caps[1].parse::<f64>().ok()?;
        let description = caps[2].trim().to_string();
        let unit_price = parse_amount(&caps[3]);
        let total = parse_amount(&caps[4]);

        match (unit_price, total) {
            (Some(unit_price), Some(total)) => Some(LineItem {
                description,
                quantity,
                unit_price,
                total,
            }),
            _ => {
                debug!("Skipping line item with unparsable amounts: {}", line.trim());
                None
            }
        }
    }
}

impl FieldExtractor for LineItemExtractor {
    type Output = ExtractionMatch<LineItem>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        text.lines()
            .filter_map(|line| self.parse_line(line).map(|item| ExtractionMatch::new(item, line.trim())))
            .collect()
    }
}
