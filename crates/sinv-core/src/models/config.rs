//! Configuration structures for the ingestion pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for sinv.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinvConfig {
    /// Database configuration.
    pub database: DatabaseConfig,

    /// PDF text extraction configuration.
    pub pdf: PdfConfig,

    /// Spreadsheet reading configuration.
    pub spreadsheet: SpreadsheetConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (overridden by `DATABASE_URL`).
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Seconds to wait for a free connection.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://sinv.db?mode=rwc".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 10,
        }
    }
}

/// PDF text extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// External text extraction program, probed at startup.
    pub external_tool: String,

    /// Arguments placed before the input path. Output goes to stdout.
    pub external_tool_args: Vec<String>,

    /// Try the external program before in-process extraction.
    pub prefer_external_tool: bool,

    /// Use the in-process lopdf/pdf-extract extractor.
    pub enable_embedded_text: bool,

    /// Minimum characters for an extractor's output to be accepted.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            external_tool: "pdftotext".to_string(),
            external_tool_args: vec!["-layout".to_string()],
            prefer_external_tool: true,
            enable_embedded_text: true,
            min_text_length: 1,
        }
    }
}

/// Spreadsheet reading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetConfig {
    /// Worksheet to read. The first sheet when unset.
    pub sheet: Option<String>,

    /// Field delimiter for CSV files.
    pub csv_delimiter: char,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            csv_delimiter: ',',
        }
    }
}

impl SinvConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Apply environment overrides (`DATABASE_URL`).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.database.url = url;
            }
        }
        self
    }
}
