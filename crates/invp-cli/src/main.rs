//! CLI application for the invoice processing pipeline.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, history, parse, process, serve, validate};

/// Invoice pipeline - extract, validate and export invoice data
#[derive(Parser)]
#[command(name = "invp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a single document
    Process(process::ProcessArgs),

    /// Extract invoice fields from a text file
    Parse(parse::ParseArgs),

    /// Validate an invoice record stored as JSON
    Validate(validate::ValidateArgs),

    /// Run the pipeline on multiple documents
    Batch(batch::BatchArgs),

    /// List persisted invoices
    History(history::HistoryArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Start the HTTP API
    Serve(serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    if matches!(cli.command, Commands::Serve(_)) {
        // Request logs are emitted at INFO.
        let level = level.max(Level::INFO);
        let filter = format!(
            "invp_server={l},invp_core={l},tower_http={l}",
            l = level.as_str().to_lowercase()
        );
        invp_server::init_tracing(&filter);
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;
    }

    let config_path = cli.config.as_deref();

    // Execute command
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Parse(args) => parse::run(args),
        Commands::Validate(args) => validate::run(args, config_path),
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::History(args) => history::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
        Commands::Serve(args) => serve::run(args, config_path).await,
    }
}
