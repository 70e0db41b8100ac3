//! CSV export of line items.

use std::io::Write;
use std::path::Path;

use crate::error::ExportError;
use crate::models::InvoiceRecord;

/// Column order shared by every line item export.
pub const LINE_ITEM_HEADER: [&str; 4] = ["description", "quantity", "unit_price", "total"];

/// Write the record's line items as CSV to `path`.
pub fn write_csv(record: &InvoiceRecord, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_line_items(record, file)
}

/// Write the record's line items as CSV to any writer.
pub fn write_line_items<W: Write>(record: &InvoiceRecord, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(LINE_ITEM_HEADER)?;
    for item in &record.line_items {
        wtr.serialize(item)?;
    }

    wtr.flush()?;
    Ok(())
}
