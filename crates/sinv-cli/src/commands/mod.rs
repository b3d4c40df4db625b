//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod preview;
pub mod process;
pub mod register;
pub mod template;

use std::path::{Path, PathBuf};

use sinv_core::{FileType, SinvConfig};
use sinv_store::SqlitePool;
use tracing::debug;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sinv")
        .join("config.json")
}

/// Load the configuration: an explicit path, else the default file if it
/// exists, else built-in defaults. `DATABASE_URL` overrides the database URL.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SinvConfig> {
    let config = match config_path {
        Some(path) => SinvConfig::from_file(Path::new(path))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                SinvConfig::from_file(&default_path)?
            } else {
                SinvConfig::default()
            }
        }
    };
    Ok(config.with_env_overrides())
}

/// Open the database, applying migrations.
pub async fn connect(config: &SinvConfig) -> anyhow::Result<SqlitePool> {
    debug!("Connecting to {}", config.database.url);
    let pool = sinv_store::create_pool(&config.database).await?;
    Ok(pool)
}

/// Explicit file type, else one inferred from the extension.
pub fn resolve_file_type(path: &Path, explicit: Option<FileTypeArg>) -> anyhow::Result<FileType> {
    match explicit {
        Some(arg) => Ok(arg.into()),
        None => FileType::from_path(path).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot infer file type of {}; pass --file-type",
                path.display()
            )
        }),
    }
}

/// File type as accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FileTypeArg {
    /// Spreadsheet (xlsx, xls, ods, csv)
    Excel,
    /// PDF document
    Pdf,
}

impl From<FileTypeArg> for FileType {
    fn from(arg: FileTypeArg) -> Self {
        match arg {
            FileTypeArg::Excel => FileType::Excel,
            FileTypeArg::Pdf => FileType::Pdf,
        }
    }
}
