//! Excel workbook export.
//!
//! Produces a two sheet workbook: `LineItems` (one row per item) and
//! `Summary` (label/value pairs).

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::error::ExportError;
use crate::models::InvoiceRecord;

use super::csv::LINE_ITEM_HEADER;

/// Worksheet names in workbook order.
pub const SHEET_NAMES: [&str; 2] = ["LineItems", "Summary"];

/// A worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Rows of the `LineItems` sheet, header first.
pub fn line_item_rows(record: &InvoiceRecord) -> Vec<Vec<Cell>> {
    let header = LINE_ITEM_HEADER.iter().map(|h| Cell::from(*h)).collect();
    let items = record.line_items.iter().map(|item| {
        vec![
            Cell::from(item.description.as_str()),
            Cell::from(item.quantity),
            Cell::from(item.unit_price),
            Cell::from(item.total),
        ]
    });

    std::iter::once(header).chain(items).collect()
}

/// Rows of the `Summary` sheet.
pub fn summary_rows(record: &InvoiceRecord) -> Vec<Vec<Cell>> {
    vec![
        vec![Cell::from("Invoice Number"), Cell::from(record.invoice_number.as_str())],
        vec![Cell::from("Vendor"), Cell::from(record.vendor.as_str())],
        vec![Cell::from("Date"), Cell::from(record.date.as_str())],
        vec![Cell::from("Subtotal"), Cell::from(record.subtotal)],
        vec![Cell::from("Tax"), Cell::from(record.tax)],
        vec![Cell::from("Total"), Cell::from(record.total)],
    ]
}

/// Write the record as an `.xlsx` workbook to `path`.
pub fn write_xlsx(record: &InvoiceRecord, path: &Path) -> Result<(), ExportError> {
    build_workbook(record)?.save(path)?;
    Ok(())
}

/// The workbook as `.xlsx` bytes.
pub fn workbook_bytes(record: &InvoiceRecord) -> Result<Vec<u8>, ExportError> {
    Ok(build_workbook(record)?.save_to_buffer()?)
}

fn build_workbook(record: &InvoiceRecord) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheets = [(SHEET_NAMES[0], line_item_rows(record), true), (SHEET_NAMES[1], summary_rows(record), false)];
    for (name, rows, has_header) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_rows(sheet, &rows, has_header.then_some(&bold))?;
    }

    Ok(workbook)
}

fn write_rows(sheet: &mut Worksheet, rows: &[Vec<Cell>], header: Option<&Format>) -> Result<(), XlsxError> {
    for (r, row) in rows.iter().enumerate() {
        let r = r as u32;
        let format = header.filter(|_| r == 0);

        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match (cell, format) {
                (Cell::Text(s), Some(format)) => {
                    sheet.write_string_with_format(r, c, s, format)?;
                }
                (Cell::Text(s), None) => {
                    sheet.write_string(r, c, s)?;
                }
                (Cell::Number(n), _) if n.is_finite() => {
                    sheet.write_number(r, c, *n)?;
                }
                // Excel has no NaN or infinity.
                (Cell::Number(n), _) => {
                    sheet.write_string(r, c, n.to_string())?;
                }
            }
        }
    }
    Ok(())
}
