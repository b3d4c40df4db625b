//! CLI application for supplier invoice ingestion.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, preview, process, register, template};

/// Supplier invoice ingestion - load line items from spreadsheets and PDFs
#[derive(Parser)]
#[command(name = "sinv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one registered invoice
    Process(process::ProcessArgs),

    /// Process all pending invoices
    Batch(batch::BatchArgs),

    /// Extract line items from a file without touching the database
    Preview(preview::PreviewArgs),

    /// Register an uploaded file as a pending invoice
    Register(register::RegisterArgs),

    /// Manage supplier templates
    Template(template::TemplateArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Logs go to stderr so stdout stays machine-readable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Preview(args) => preview::run(args, config_path).await,
        Commands::Register(args) => register::run(args, config_path).await,
        Commands::Template(args) => template::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
