//! SQLite persistence for processed invoices and their exports.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::InvoiceRecord;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// An invoice to persist.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    /// Original upload name.
    pub filename: String,
    /// Where the upload was saved, if it was.
    pub source_path: Option<String>,
    /// The normalized record.
    pub record: InvoiceRecord,
}

/// One export of a stored invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub format: String,
    /// Local path or spreadsheet URL.
    pub location: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInvoice {
    pub id: i64,
    pub filename: String,
    pub source_path: Option<String>,
    pub invoice_number: String,
    pub vendor: String,
    pub date: String,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub normalized: InvoiceRecord,
    pub created_at: DateTime<Utc>,
    pub exports: Vec<ExportEntry>,
}

/// Invoice store over a single SQLite connection.
///
/// The connection is guarded by a mutex so the store can be shared between
/// request handlers.
pub struct InvoiceStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    source_path TEXT,
    invoice_number TEXT NOT NULL,
    vendor TEXT NOT NULL,
    date TEXT NOT NULL,
    subtotal REAL NOT NULL,
    tax REAL NOT NULL,
    total REAL NOT NULL,
    normalized_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_invoices_number ON invoices(invoice_number);
CREATE TABLE IF NOT EXISTS exports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_id INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    format TEXT NOT NULL,
    location TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_exports_invoice ON exports(invoice_id);
";

const SELECT_INVOICE: &str = "SELECT id, filename, source_path, invoice_number, vendor, date,
        subtotal, tax, total, normalized_json, created_at
 FROM invoices";

impl InvoiceStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        info!("Opened invoice store at {}", path.display());
        Self::init(conn)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persist an invoice and return its id.
    pub fn insert(&self, invoice: &NewInvoice) -> StoreResult<i64> {
        let record = &invoice.record;
        let json = serde_json::to_string(record)?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO invoices (filename, source_path, invoice_number, vendor, date,
                                   subtotal, tax, total, normalized_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                invoice.filename,
                invoice.source_path,
                record.invoice_number,
                record.vendor,
                record.date,
                record.subtotal,
                record.tax,
                record.total,
                json,
                now(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Stored invoice {} as id {}", record.invoice_number, id);
        Ok(id)
    }

    /// Record an export of invoice `id`.
    pub fn record_export(&self, id: i64, format: &str, location: &str) -> StoreResult<()> {
        self.conn.lock().execute(
            "INSERT INTO exports (invoice_id, format, location, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, format, location, now()],
        )?;
        Ok(())
    }

    /// Fetch one invoice with its exports.
    pub fn get(&self, id: i64) -> StoreResult<Option<StoredInvoice>> {
        let conn = self.conn.lock();

        let raw = conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_INVOICE), [id], RawInvoice::from_row)
            .optional()?;

        match raw {
            Some(raw) => {
                let exports = load_exports(&conn, id)?;
                Ok(Some(raw.into_stored(exports)?))
            }
            None => Ok(None),
        }
    }

    /// All invoices, newest first.
    pub fn list(&self) -> StoreResult<Vec<StoredInvoice>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!("{} ORDER BY id DESC", SELECT_INVOICE))?;
        let rows = stmt
            .query_map([], RawInvoice::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|raw| {
                let exports = load_exports(&conn, raw.id)?;
                raw.into_stored(exports)
            })
            .collect()
    }

    /// Delete an invoice and its exports. Returns whether it existed.
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM invoices WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }
}

struct RawInvoice {
    id: i64,
    filename: String,
    source_path: Option<String>,
    invoice_number: String,
    vendor: String,
    date: String,
    subtotal: f64,
    tax: f64,
    total: f64,
    normalized_json: String,
    created_at: String,
}

impl RawInvoice {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            filename: row.get(1)?,
            source_path: row.get(2)?,
            invoice_number: row.get(3)?,
            vendor: row.get(4)?,
            date: row.get(5)?,
            subtotal: row.get(6)?,
            tax: row.get(7)?,
            total: row.get(8)?,
            normalized_json: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_stored(self, exports: Vec<ExportEntry>) -> StoreResult<StoredInvoice> {
        Ok(StoredInvoice {
            id: self.id,
            filename: self.filename,
            source_path: self.source_path,
            invoice_number: self.invoice_number,
            vendor: self.vendor,
            date: self.date,
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
            normalized: serde_json::from_str(&self.normalized_json)?,
            created_at: parse_timestamp(&self.created_at)?,
            exports,
        })
    }
}

fn load_exports(conn: &Connection, invoice_id: i64) -> StoreResult<Vec<ExportEntry>> {
    let mut stmt = conn.prepare(
        "SELECT format, location, created_at FROM exports WHERE invoice_id = ?1 ORDER BY id",
    )?;

    let rows = stmt
        .query_map([invoice_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(format, location, created_at)| {
            Ok(ExportEntry {
                format,
                location,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Timestamp(format!("{}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use pretty_assertions::assert_eq;

    fn new_invoice(number: &str) -> NewInvoice {
        NewInvoice {
            filename: format!("{}.pdf", number),
            source_path: Some(format!("data/input/{}.pdf", number)),
            record: InvoiceRecord {
                invoice_number: number.to_string(),
                date: "2025-09-18".to_string(),
                vendor: "ACME Corp".to_string(),
                line_items: vec![LineItem::new("Widget", 1.0, 50.0, 50.0)],
                subtotal: 50.0,
                tax: 5.0,
                total: 55.0,
            },
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = InvoiceStore::open_in_memory().unwrap();
        let id = store.insert(&new_invoice("INV-1")).unwrap();
        store.record_export(id, "csv", "data/output/INV-1.csv").unwrap();

        let stored = store.get(id).unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.invoice_number, "INV-1");
        assert_eq!(stored.total, 55.0);
        assert_eq!(stored.normalized, new_invoice("INV-1").record);
        assert_eq!(stored.exports.len(), 1);
        assert_eq!(stored.exports[0].location, "data/output/INV-1.csv");
    }

    #[test]
    fn test_get_missing() {
        let store = InvoiceStore::open_in_memory().unwrap();
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let store = InvoiceStore::open_in_memory().unwrap();
        store.insert(&new_invoice("INV-1")).unwrap();
        store.insert(&new_invoice("INV-2")).unwrap();

        let numbers: Vec<String> = store.list().unwrap().into_iter().map(|i| i.invoice_number).collect();
        assert_eq!(numbers, vec!["INV-2", "INV-1"]);
    }

    #[test]
    fn test_delete_cascades() {
        let store = InvoiceStore::open_in_memory().unwrap();
        let id = store.insert(&new_invoice("INV-1")).unwrap();
        store.record_export(id, "xlsx", "out.xlsx").unwrap();

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert!(store.get(id).unwrap().is_none());

        let orphans: i64 = store
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM exports", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("invoices.db");

        let id = InvoiceStore::open(&path).unwrap().insert(&new_invoice("INV-9")).unwrap();
        let reopened = InvoiceStore::open(&path).unwrap();

        assert_eq!(reopened.get(id).unwrap().unwrap().invoice_number, "INV-9");
    }
}
