//! History command - list persisted invoices.

use clap::Args;
use console::style;

use invp_core::{InvoiceStore, StoredInvoice};

use super::load_config;

/// Arguments for the history command.
#[derive(Args)]
pub struct HistoryArgs {
    /// Show at most this many invoices
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: HistoryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let db_path = &config.storage.database_path;

    if !db_path.exists() {
        println!("{} No invoices stored yet ({})", style("ℹ").blue(), db_path.display());
        return Ok(());
    }

    let store = InvoiceStore::open(db_path)?;
    let mut invoices = store.list()?;
    if let Some(limit) = args.limit {
        invoices.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&invoices)?);
        return Ok(());
    }

    if invoices.is_empty() {
        println!("{} No invoices stored yet", style("ℹ").blue());
        return Ok(());
    }

    println!(
        "{}",
        style(format!(
            "{:>5}  {:<14} {:<10}  {:<24} {:>10}  {}",
            "ID", "NUMBER", "DATE", "VENDOR", "TOTAL", "EXPORTS"
        ))
        .bold()
    );
    for invoice in &invoices {
        println!("{}", format_row(invoice));
    }

    Ok(())
}

fn format_row(invoice: &StoredInvoice) -> String {
    let exports: Vec<&str> = invoice.exports.iter().map(|e| e.format.as_str()).collect();
    format!(
        "{:>5}  {:<14} {:<10}  {:<24} {:>10.2}  {}",
        invoice.id,
        invoice.invoice_number,
        invoice.date,
        truncate(&invoice.vendor, 24),
        invoice.total,
        exports.join(",")
    )
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("ACME Corp", 24), "ACME Corp");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
