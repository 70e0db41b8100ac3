//! Validate command - run the validation engine on a JSON record.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use serde_json::Value;

use invp_core::{InvoiceValidator, ValidationResult, Validator};

use super::load_config;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// JSON file holding the invoice record
    #[arg(required = true)]
    input: PathBuf,

    /// Reference date for the future-date check (YYYY-MM-DD)
    #[arg(long)]
    today: Option<String>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let content = std::fs::read_to_string(&args.input)?;
    let record: Value = serde_json::from_str(&content)?;

    let mut validator = InvoiceValidator::new(config.validation);
    if let Some(today) = &args.today {
        let date = NaiveDate::parse_from_str(today, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("Invalid --today '{}': {}", today, e))?;
        validator = validator.with_reference_date(date);
    }

    let result = validator.validate(&record);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if !result.is_pass() {
        anyhow::bail!("Validation failed with {} error(s)", result.error_count());
    }

    Ok(())
}

fn print_result(result: &ValidationResult) {
    if result.is_pass() {
        println!("{} Invoice is valid", style("✓").green());
        return;
    }

    println!("{} Invoice is invalid", style("✗").red());
    for message in result.messages() {
        println!("  - {}", message);
    }
}
