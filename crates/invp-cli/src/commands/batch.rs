//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use invp_core::models::config::OcrMode;
use invp_core::{Pipeline, PipelineOutcome, SourceDocument, StageFailure};

use super::load_config;
use super::process::{build_pipeline, export_format};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Export format for each file (csv, xlsx, gsheets)
    #[arg(short, long)]
    format: Option<String>,

    /// Directory for exports and the summary
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Store every processed invoice in the database
    #[arg(long)]
    persist: bool,

    /// Read documents as plain text instead of simulated OCR
    #[arg(long)]
    text: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    outcome: Result<PipelineOutcome, StageFailure>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.text {
        config.ocr.mode = OcrMode::PlainText;
    }
    if let Some(ref output_dir) = args.output_dir {
        config.storage.output_dir = output_dir.clone();
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!("{} Found {} files to process", style("ℹ").blue(), files.len());

    let pipeline = build_pipeline(&config, args.persist)?;
    let format = export_format(args.format.clone(), &config);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_file(&pipeline, &path, &format, args.persist).await?;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        if let Err(ref failure) = outcome {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", path.display(), failure);
            } else {
                error!("Failed to process {}: {}", path.display(), failure);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", path.display(), failure);
            }
        }

        results.push(FileResult {
            path,
            outcome,
            processing_time_ms,
        });
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if args.summary {
        fs::create_dir_all(&config.storage.output_dir)?;
        let summary_path = config.storage.output_dir.join("batch_summary.csv");
        write_summary(&summary_path, &results)?;
        println!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    let failed: Vec<_> = results.iter().filter(|r| r.outcome.is_err()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(failure) = &result.outcome {
                println!("  - {}: {}", result.path.display(), failure);
            }
        }
    }

    Ok(())
}

/// Unreadable files are reported as errors of the command, stage failures
/// as per-file results.
async fn process_file(
    pipeline: &Pipeline,
    path: &Path,
    format: &str,
    persist: bool,
) -> anyhow::Result<Result<PipelineOutcome, StageFailure>> {
    let document = SourceDocument::from_path(path)?;
    Ok(pipeline.process(&document, format, persist).await)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "stage",
        "invoice_number",
        "vendor",
        "date",
        "total",
        "export",
        "error",
        "processing_time_ms",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let elapsed = result.processing_time_ms.to_string();

        match &result.outcome {
            Ok(outcome) => {
                let record = &outcome.record;
                wtr.write_record([
                    filename,
                    "success",
                    "",
                    &record.invoice_number,
                    &record.vendor,
                    &record.date,
                    &format!("{:.2}", record.total),
                    outcome.export.file.as_deref().unwrap_or(""),
                    "",
                    &elapsed,
                ])?;
            }
            Err(failure) => {
                let error = match (&failure.error, &failure.validation) {
                    (Some(error), _) => error.clone(),
                    (None, Some(validation)) => validation.messages().join("; "),
                    (None, None) => String::new(),
                };
                wtr.write_record([
                    filename,
                    "error",
                    failure.stage.as_str(),
                    "",
                    "",
                    "",
                    "",
                    "",
                    &error,
                    &elapsed,
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
