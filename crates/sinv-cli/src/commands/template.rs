//! Template command - manage per-supplier mapping templates.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use console::style;

use sinv_core::{FileType, Template};
use sinv_store::TemplateRepo;

use super::{connect, load_config, FileTypeArg};

/// Arguments for the template command.
#[derive(Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    command: TemplateCommand,
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// Store a template from a JSON file and make it the active one
    Import {
        /// Template JSON file
        file: PathBuf,

        /// Supplier id
        #[arg(short, long)]
        supplier: i64,

        /// Document type (read from the file's "file_type" tag by default)
        #[arg(long, value_enum)]
        file_type: Option<FileTypeArg>,

        /// Template name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show the active template of a supplier
    Show {
        /// Supplier id
        #[arg(short, long)]
        supplier: i64,

        /// Document type
        #[arg(long, value_enum)]
        file_type: FileTypeArg,
    },

    /// List every template of a supplier
    List {
        /// Supplier id
        #[arg(short, long)]
        supplier: i64,
    },

    /// Deactivate the active template of a supplier
    Deactivate {
        /// Supplier id
        #[arg(short, long)]
        supplier: i64,

        /// Document type
        #[arg(long, value_enum)]
        file_type: FileTypeArg,
    },
}

pub async fn run(args: TemplateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let pool = connect(&config).await?;

    match args.command {
        TemplateCommand::Import {
            file,
            supplier,
            file_type,
            name,
        } => {
            let json = fs::read_to_string(&file)?;
            let template = parse_template(&json, file_type.map(FileType::from))?;
            let name = name.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });

            let record = TemplateRepo::activate(&pool, supplier, &name, &template).await?;
            println!(
                "{} Activated {} template {} for supplier {}",
                style("✓").green(),
                record.template.file_type(),
                record.id,
                supplier
            );
        }
        TemplateCommand::Show {
            supplier,
            file_type,
        } => {
            let file_type = FileType::from(file_type);
            let Some(record) = TemplateRepo::find_active(&pool, supplier, file_type).await? else {
                anyhow::bail!("Supplier {} has no active {} template", supplier, file_type);
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        TemplateCommand::List { supplier } => {
            let records = TemplateRepo::list_for_supplier(&pool, supplier).await?;
            if records.is_empty() {
                println!("{} Supplier {} has no templates", style("ℹ").blue(), supplier);
            }
            for record in records {
                let marker = if record.is_active {
                    style("active").green()
                } else {
                    style("inactive").dim()
                };
                println!(
                    "{:>6}  {:<6} {:<10} {}  {}",
                    record.id,
                    record.template.file_type(),
                    marker,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.name
                );
            }
        }
        TemplateCommand::Deactivate {
            supplier,
            file_type,
        } => {
            let file_type = FileType::from(file_type);
            if TemplateRepo::deactivate(&pool, supplier, file_type).await? {
                println!(
                    "{} Deactivated {} template of supplier {}",
                    style("✓").green(),
                    file_type,
                    supplier
                );
            } else {
                println!(
                    "{} Supplier {} has no active {} template",
                    style("ℹ").blue(),
                    supplier,
                    file_type
                );
            }
        }
    }

    Ok(())
}

/// Parse template JSON, either the bare mapping body for a known file type or
/// a document tagged with `"file_type"`.
pub fn parse_template(json: &str, file_type: Option<FileType>) -> anyhow::Result<Template> {
    match file_type {
        Some(file_type) => Template::from_mapping(file_type, json)
            .with_context(|| format!("Invalid {} template", file_type)),
        None => serde_json::from_str(json)
            .context("Invalid template; add a \"file_type\" tag or pass --file-type"),
    }
}
