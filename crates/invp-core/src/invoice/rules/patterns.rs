//! Common regex patterns for invoice field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number: INV-1001, inv 42, INV7
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)(INV[-\s]?\d+)"
    ).unwrap();

    // Labeled date, ISO order with - or / separators
    pub static ref INVOICE_DATE: Regex = Regex::new(
        r"Date[:\s]*([0-9]{4}[-/][0-9]{2}[-/][0-9]{2})"
    ).unwrap();

    pub static ref VENDOR: Regex = Regex::new(
        r"Vendor[:\s]*(.+)"
    ).unwrap();

    // <qty> x <description> @ <unit price> = <total>
    pub static ref LINE_ITEM: Regex = Regex::new(
        r"(\d+)\s*x\s*(.+?)@\s*([\d.,]+)\s*=\s*([\d.,]+)"
    ).unwrap();

    // Labeled amounts. Case sensitive, so "Total" does not match inside "Subtotal".
    pub static ref SUBTOTAL: Regex = Regex::new(
        r"Subtotal[:\s]*([\d.,]+)"
    ).unwrap();

    pub static ref TAX: Regex = Regex::new(
        r"Tax[:\s]*([\d.,]+)"
    ).unwrap();

    pub static ref TOTAL: Regex = Regex::new(
        r"Total[:\s]*([\d.,]+)"
    ).unwrap();
}
