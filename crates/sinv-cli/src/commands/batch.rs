//! Batch command - ingest every pending invoice.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use sinv_core::{DocumentReader, Invoice, InvoiceProcessor, InvoiceStatus, ProcessingSummary};
use sinv_store::{InvoiceRepo, SqlStore};

use super::process::record_failure;
use super::{connect, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Maximum number of pending invoices to process
    #[arg(short, long, default_value = "100")]
    limit: i64,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Set the status of invoices that fail to failed
    #[arg(long)]
    mark_failed: bool,

    /// Write a summary CSV to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Result of processing a single invoice.
struct BatchResult {
    invoice: Invoice,
    summary: Option<ProcessingSummary>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let pool = connect(&config).await?;

    let pending = InvoiceRepo::list_by_status(&pool, InvoiceStatus::Pending, args.limit).await?;
    if pending.is_empty() {
        println!("{} No pending invoices", style("ℹ").blue());
        return Ok(());
    }

    println!(
        "{} Found {} pending invoices",
        style("ℹ").blue(),
        pending.len()
    );

    let processor = InvoiceProcessor::new(SqlStore::new(pool.clone()), DocumentReader::new(&config));

    let pb = ProgressBar::new(pending.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} invoices")?
            .progress_chars("=>-"),
    );

    // Sequential: a run must not overlap another run for the same invoice.
    let mut results = Vec::with_capacity(pending.len());
    for invoice in pending {
        let invoice_start = Instant::now();
        let outcome = processor.process_invoice(&invoice).await;
        let processing_time_ms = invoice_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(summary) => results.push(BatchResult {
                invoice,
                summary: Some(summary),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.mark_failed {
                    record_failure(&pool, invoice.id).await;
                }
                if !args.continue_on_error {
                    pb.abandon();
                    error!("Failed to process invoice {}: {}", invoice.id, error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
                warn!("Failed to process invoice {}: {}", invoice.id, error_msg);
                results.push(BatchResult {
                    invoice,
                    summary: None,
                    error: Some(error_msg),
                    processing_time_ms,
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let items: usize = results
        .iter()
        .filter_map(|r| r.summary.as_ref())
        .map(|s| s.item_count)
        .sum();

    println!();
    println!(
        "{} Processed {} invoices ({} line items) in {:?}",
        style("✓").green(),
        results.len() - failed.len(),
        items,
        start.elapsed()
    );

    if !failed.is_empty() {
        println!("{} {} invoices failed:", style("✗").red(), failed.len());
        for result in &failed {
            println!(
                "  - #{} {}: {}",
                result.invoice.id,
                result.invoice.file_path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "invoice_id",
        "supplier_id",
        "file",
        "status",
        "item_count",
        "total_amount",
        "total_cbm",
        "extractor",
        "error",
        "processing_time_ms",
    ])?;

    for result in results {
        let (status, item_count, total_amount, total_cbm, extractor) = match &result.summary {
            Some(s) => (
                "processed",
                s.item_count.to_string(),
                s.total_amount.to_string(),
                s.total_cbm.to_string(),
                s.extractor.clone(),
            ),
            None => ("error", String::new(), String::new(), String::new(), String::new()),
        };

        wtr.write_record([
            result.invoice.id.to_string(),
            result.invoice.supplier_id.to_string(),
            result.invoice.file_path.display().to_string(),
            status.to_string(),
            item_count,
            total_amount,
            total_cbm,
            extractor,
            result.error.clone().unwrap_or_default(),
            result.processing_time_ms.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
