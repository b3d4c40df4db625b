//! Preview command - dry run of reading, mapping and validation.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use sinv_core::{extract_items, DocumentReader, InvoiceTotals, LineItem};

use super::template::parse_template;
use super::{load_config, resolve_file_type, FileTypeArg};

/// Arguments for the preview command.
#[derive(Args)]
pub struct PreviewArgs {
    /// Invoice document (spreadsheet or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Template JSON file
    #[arg(short, long)]
    template: PathBuf,

    /// Document type (inferred from the extension by default)
    #[arg(long, value_enum)]
    file_type: Option<FileTypeArg>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text table
    Text,
}

#[derive(Serialize)]
struct Preview<'a> {
    extractor: &'a str,
    #[serde(flatten)]
    totals: InvoiceTotals,
    items: &'a [LineItem],
}

pub async fn run(args: PreviewArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let file_type = resolve_file_type(&args.input, args.file_type)?;

    let template_json = fs::read_to_string(&args.template)?;
    let template = parse_template(&template_json, Some(file_type))?;

    info!("Previewing {} as {}", args.input.display(), file_type);

    let reader = DocumentReader::new(&config);
    let document = reader.read(&args.input, file_type)?;
    let items = extract_items(0, &document.content, &template)?;
    let totals = InvoiceTotals::from_items(&items);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&Preview {
            extractor: document.extractor,
            totals,
            items: &items,
        })?,
        OutputFormat::Csv => format_csv(&items)?,
        OutputFormat::Text => format_text(&items, &totals, document.extractor),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn format_csv(items: &[LineItem]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "product_code",
        "description",
        "quantity",
        "unit",
        "unit_price",
        "total_price",
        "fob_price",
        "cbm",
    ])?;

    for item in items {
        wtr.write_record([
            item.product_code.clone(),
            item.description.clone(),
            item.quantity.to_string(),
            item.unit.clone(),
            item.unit_price.to_string(),
            item.total_price.to_string(),
            item.fob_price.map(|d| d.to_string()).unwrap_or_default(),
            item.cbm.map(|d| d.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(items: &[LineItem], totals: &InvoiceTotals, extractor: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Read with: {}\n\n", extractor));

    for item in items {
        output.push_str(&format!(
            "  {:<16} {:>8} {:<6} x {:>12} = {:>14}  {}\n",
            item.product_code,
            item.quantity,
            item.unit,
            item.unit_price,
            item.total_price,
            item.description
        ));
    }

    output.push('\n');
    output.push_str(&format!("Items: {}\n", totals.item_count));
    output.push_str(&format!("Total: {}\n", totals.total_amount));
    output.push_str(&format!("CBM:   {}\n", totals.total_cbm));

    output
}
