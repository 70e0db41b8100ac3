//! Process command - run the full pipeline on a single document.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use invp_core::models::config::OcrMode;
use invp_core::{InvpConfig, Pipeline, PipelineOutcome, SourceDocument, StageFailure};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input document
    #[arg(required = true)]
    input: PathBuf,

    /// Export format (csv, xlsx, gsheets)
    #[arg(short, long)]
    format: Option<String>,

    /// Store the invoice in the database
    #[arg(long)]
    persist: bool,

    /// Read the document as plain text instead of simulated OCR
    #[arg(long)]
    text: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.text {
        config.ocr.mode = OcrMode::PlainText;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pipeline = build_pipeline(&config, args.persist)?;
    let format = export_format(args.format, &config);
    let document = SourceDocument::from_path(&args.input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Processing {}", document.filename));

    let result = pipeline.process(&document, &format, args.persist).await;
    pb.finish_and_clear();

    match result {
        Ok(outcome) => {
            match args.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                OutputFormat::Text => print_outcome(&outcome),
            }
            info!("Done in {}ms", start.elapsed().as_millis());
            Ok(())
        }
        Err(failure) => {
            if matches!(args.output, OutputFormat::Json) {
                println!("{}", serde_json::to_string_pretty(&failure)?);
            } else {
                print_failure(&failure);
            }
            Err(failure.into())
        }
    }
}

/// Pipeline for the CLI; the store is only opened when persisting.
pub fn build_pipeline(config: &InvpConfig, persist: bool) -> anyhow::Result<Pipeline> {
    if persist {
        Ok(Pipeline::open(config)?)
    } else {
        Ok(Pipeline::from_config(config))
    }
}

/// Requested format, else the configured default, else CSV.
pub fn export_format(requested: Option<String>, config: &InvpConfig) -> String {
    requested
        .or_else(|| config.export.default_format.clone())
        .unwrap_or_else(|| "csv".to_string())
}

fn print_outcome(outcome: &PipelineOutcome) {
    let record = &outcome.record;

    println!("{}", style("Invoice").bold());
    println!("  Number:   {}", record.invoice_number);
    println!("  Date:     {}", record.date);
    println!("  Vendor:   {}", record.vendor);
    println!("  Items:    {}", record.line_items.len());
    println!("  Subtotal: {:.2}", record.subtotal);
    println!("  Tax:      {:.2}", record.tax);
    println!("  Total:    {:.2}", record.total);

    for warning in &outcome.warnings {
        println!("{} {}", style("⚠").yellow(), warning);
    }

    if let Some(id) = outcome.invoice_id {
        println!("{} Stored as invoice {}", style("✓").green(), id);
    }
    if let Some(file) = &outcome.export.file {
        println!("{} Exported to {}", style("✓").green(), file);
    }
    if let Some(receipt) = &outcome.receipt {
        println!("{} Receipt: {}", style("ℹ").blue(), receipt);
    }
}

fn print_failure(failure: &StageFailure) {
    eprintln!("{} {} stage failed", style("✗").red(), failure.stage);

    if let Some(error) = &failure.error {
        eprintln!("  {}", error);
    }
    if let Some(validation) = &failure.validation {
        for message in validation.messages() {
            eprintln!("  - {}", message);
        }
    }
}
