//! Process command - ingest one registered invoice.

use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use sinv_core::{DocumentReader, InvoiceProcessor, ProcessingSummary};
use sinv_store::{InvoiceRepo, SqlStore, SqlitePool};

use super::{connect, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Invoice id
    invoice_id: i64,

    /// Set the invoice status to failed when processing does not succeed
    #[arg(long)]
    mark_failed: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: SummaryFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum SummaryFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let pool = connect(&config).await?;
    let processor = InvoiceProcessor::new(SqlStore::new(pool.clone()), DocumentReader::new(&config));

    match processor.process_by_id(args.invoice_id).await {
        Ok(summary) => {
            println!("{}", format_summary(&summary, args.format)?);
        }
        Err(e) => {
            if args.mark_failed {
                record_failure(&pool, args.invoice_id).await;
            }
            return Err(e.into());
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Best-effort `failed` status after an unsuccessful run.
pub async fn record_failure(pool: &SqlitePool, invoice_id: i64) {
    match InvoiceRepo::mark_failed(pool, invoice_id).await {
        Ok(true) => info!("Marked invoice {} as failed", invoice_id),
        Ok(false) => warn!("Invoice {} does not exist, nothing to mark", invoice_id),
        Err(e) => warn!("Could not mark invoice {} as failed: {}", invoice_id, e),
    }
}

pub fn format_summary(summary: &ProcessingSummary, format: SummaryFormat) -> anyhow::Result<String> {
    match format {
        SummaryFormat::Json => Ok(serde_json::to_string(summary)?),
        SummaryFormat::Text => Ok(format!(
            "{} Invoice {}: {} items, total {}, cbm {} (read with {})",
            style("✓").green(),
            summary.invoice_id,
            summary.item_count,
            summary.total_amount,
            summary.total_cbm,
            summary.extractor
        )),
    }
}
