//! Register command - record an uploaded file as a pending invoice.

use std::path::PathBuf;

use clap::Args;
use console::style;

use sinv_store::InvoiceRepo;

use super::process::SummaryFormat;
use super::{connect, load_config, resolve_file_type, FileTypeArg};

/// Arguments for the register command.
#[derive(Args)]
pub struct RegisterArgs {
    /// Uploaded invoice document
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier id
    #[arg(short, long)]
    supplier: i64,

    /// Document type (inferred from the extension by default)
    #[arg(long, value_enum)]
    file_type: Option<FileTypeArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: SummaryFormat,
}

pub async fn run(args: RegisterArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let file_type = resolve_file_type(&args.input, args.file_type)?;
    let path = std::fs::canonicalize(&args.input)?;

    let config = load_config(config_path)?;
    let pool = connect(&config).await?;

    let invoice = InvoiceRepo::create(&pool, args.supplier, &path, file_type).await?;

    match args.format {
        SummaryFormat::Json => println!("{}", serde_json::to_string(&invoice)?),
        SummaryFormat::Text => println!(
            "{} Registered invoice {} ({} from supplier {})",
            style("✓").green(),
            invoice.id,
            invoice.file_type,
            invoice.supplier_id
        ),
    }

    Ok(())
}
