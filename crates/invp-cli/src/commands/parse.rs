//! Parse command - extract invoice fields from text.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use invp_core::{InvoiceParser, RuleBasedParser};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file to parse, `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Tax rate used when the text has no tax amount
    #[arg(long)]
    tax_rate: Option<f64>,

    /// Print only the invoice record
    #[arg(long)]
    record_only: bool,
}

pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let text = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.input)?
    };

    let mut parser = RuleBasedParser::new();
    if let Some(rate) = args.tax_rate {
        parser = parser.with_default_tax_rate(rate);
    }

    let result = parser.parse(&text);
    info!("Parsed in {}ms", result.processing_time_ms);

    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    if args.record_only {
        println!("{}", serde_json::to_string_pretty(&result.invoice)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
