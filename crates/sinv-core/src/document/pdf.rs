//! PDF text extraction strategies.
//!
//! Extractors are tried in order until one recovers text. The external tool
//! only joins the chain when a runtime probe finds it on the host.

use std::path::Path;
use std::process::{Command, Stdio};

use lopdf::Document;
use tracing::{debug, warn};

use super::Result;
use super::raw::RawStreamScan;
use crate::error::DocumentError;
use crate::models::config::PdfConfig;

/// Strategy for turning a PDF file into plain text.
pub trait PdfTextExtractor: Send + Sync {
    /// Short name used in logs and processing summaries.
    fn name(&self) -> &'static str;

    /// Extract the full text of the document.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// External text extraction program such as `pdftotext`.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: String,
    args: Vec<String>,
}

impl ExternalTool {
    /// `program <args...> <file> -`, reading text from stdout.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Check whether the program can be spawned on this host.
    pub fn probe(&self) -> bool {
        let available = Command::new(&self.program)
            .arg("-v")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        debug!("External PDF tool {} available: {}", self.program, available);
        available
    }
}

impl PdfTextExtractor for ExternalTool {
    fn name(&self) -> &'static str {
        "external-tool"
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .arg("-")
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(DocumentError::Pdf(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// In-process extraction using lopdf and pdf-extract.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedText;

impl EmbeddedText {
    /// Load the document, decrypting empty-password PDFs, and return bytes
    /// suitable for pdf-extract.
    fn prepare(data: &[u8]) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(data).map_err(|e| DocumentError::Pdf(e.to_string()))?;

        if doc.get_pages().is_empty() {
            return Err(DocumentError::Pdf("PDF has no pages".to_string()));
        }

        if !doc.is_encrypted() {
            return Ok(data.to_vec());
        }

        if doc.decrypt("").is_err() {
            return Err(DocumentError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| DocumentError::Pdf(format!("failed to save decrypted PDF: {}", e)))?;
        Ok(decrypted)
    }
}

impl PdfTextExtractor for EmbeddedText {
    fn name(&self) -> &'static str {
        "embedded-text"
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        let data = Self::prepare(&data)?;

        // pdf-extract panics on some malformed font dictionaries.
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&data))
            .map_err(|_| DocumentError::Pdf("pdf-extract panicked".to_string()))?
            .map_err(|e| DocumentError::Pdf(e.to_string()))
    }
}

/// Ordered chain of PDF text extractors.
pub struct PdfReader {
    extractors: Vec<Box<dyn PdfTextExtractor>>,
    min_text_length: usize,
}

impl PdfReader {
    /// Build the chain from configuration, probing for the external tool.
    pub fn from_config(config: &PdfConfig) -> Self {
        let mut extractors: Vec<Box<dyn PdfTextExtractor>> = Vec::new();

        if config.prefer_external_tool && !config.external_tool.is_empty() {
            let tool = ExternalTool::new(&config.external_tool, config.external_tool_args.clone());
            if tool.probe() {
                extractors.push(Box::new(tool));
            }
        }
        if config.enable_embedded_text {
            extractors.push(Box::new(EmbeddedText));
        }
        extractors.push(Box::new(RawStreamScan));

        Self::with_extractors(extractors, config.min_text_length)
    }

    /// Build a chain from explicit extractors.
    pub fn with_extractors(extractors: Vec<Box<dyn PdfTextExtractor>>, min_text_length: usize) -> Self {
        Self {
            extractors,
            min_text_length: min_text_length.max(1),
        }
    }

    /// Names of the extractors in the order they are tried.
    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Extract text with the first extractor that recovers any.
    pub fn read(&self, path: &Path) -> Result<(String, &'static str)> {
        for extractor in &self.extractors {
            match extractor.extract(path) {
                Ok(text) if text.trim().chars().count() >= self.min_text_length => {
                    debug!(
                        "Extracted {} chars from {} using {}",
                        text.len(),
                        path.display(),
                        extractor.name()
                    );
                    return Ok((text, extractor.name()));
                }
                Ok(_) => {
                    debug!("{} recovered no text from {}", extractor.name(), path.display());
                }
                Err(e) => {
                    warn!("{} failed on {}: {}", extractor.name(), path.display(), e);
                }
            }
        }

        Err(DocumentError::NoText)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<&'static str>);

    impl PdfTextExtractor for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn extract(&self, _path: &Path) -> Result<String> {
            self.1
                .map(str::to_string)
                .ok_or_else(|| DocumentError::Pdf("unavailable".to_string()))
        }
    }

    #[test]
    fn test_chain_falls_through_failures_and_blank_text() {
        let reader = PdfReader::with_extractors(
            vec![
                Box::new(Fixed("broken", None)),
                Box::new(Fixed("blank", Some("  \n "))),
                Box::new(Fixed("good", Some("ITEMS START\nA1 2 3.00"))),
            ],
            1,
        );

        let (text, name) = reader.read(Path::new("unused.pdf")).unwrap();
        assert_eq!(name, "good");
        assert!(text.starts_with("ITEMS START"));
    }

    #[test]
    fn test_chain_without_text_is_unreadable() {
        let reader = PdfReader::with_extractors(vec![Box::new(Fixed("blank", Some("")))], 1);
        let err = reader.read(Path::new("unused.pdf")).unwrap_err();
        assert!(matches!(err, DocumentError::NoText));
    }

    #[test]
    fn test_missing_tool_fails_probe() {
        let tool = ExternalTool::new("sinv-no-such-pdf-tool", vec![]);
        assert!(!tool.probe());
    }

    #[test]
    fn test_config_chain_ends_with_fallback() {
        let config = PdfConfig {
            external_tool: "sinv-no-such-pdf-tool".to_string(),
            ..PdfConfig::default()
        };
        let reader = PdfReader::from_config(&config);
        assert_eq!(reader.extractor_names(), vec!["embedded-text", "raw-stream-scan"]);

        let config = PdfConfig {
            prefer_external_tool: false,
            enable_embedded_text: false,
            ..PdfConfig::default()
        };
        let reader = PdfReader::from_config(&config);
        assert_eq!(reader.extractor_names(), vec!["raw-stream-scan"]);
    }

    #[test]
    fn test_embedded_text_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        assert!(EmbeddedText.extract(&path).is_err());
    }

    #[test]
    fn test_embedded_text_reads_text_pdf() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/text_items.pdf");

        let text = EmbeddedText.extract(&path).unwrap();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(text.contains("ITEMS START"), "{}", text);
        assert!(text.contains("AB-1 Widget 2 $10.00"), "{}", text);
        assert!(text.contains("ITEMS END"), "{}", text);

        let reader = PdfReader::with_extractors(vec![Box::new(EmbeddedText), Box::new(RawStreamScan)], 10);
        let (_, name) = reader.read(&path).unwrap();
        assert_eq!(name, "embedded-text");
    }
}
