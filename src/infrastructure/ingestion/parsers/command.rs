//! Parser backed by an external converter process
//!
//! The converter is expected to write UTF-8 text to stdout with form feeds
//! between pages (`pdftotext -layout {input} -` does this).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::text_file::document_from_text;
use crate::domain::ingestion::{DocumentParser, ParsedDocument};
use crate::domain::DomainError;

/// Placeholder replaced with the input path in converter arguments
pub const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandParserConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for CommandParserConfig {
    fn default() -> Self {
        Self {
            program: "pdftotext".to_string(),
            args: vec![
                "-layout".to_string(),
                INPUT_PLACEHOLDER.to_string(),
                "-".to_string(),
            ],
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandParser {
    config: CommandParserConfig,
    extensions: Vec<&'static str>,
}

impl CommandParser {
    pub fn new(config: CommandParserConfig) -> Self {
        Self {
            config,
            extensions: vec!["pdf", "docx", "doc"],
        }
    }

    pub fn with_extensions(mut self, extensions: &[&'static str]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }

    fn build_args(&self, path: &Path) -> Vec<String> {
        let input = path.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, &input))
            .collect()
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(CommandParserConfig::default())
    }
}

#[async_trait]
impl DocumentParser for CommandParser {
    fn supported_extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, DomainError> {
        let args = self.build_args(path);
        debug!(program = %self.config.program, ?args, "Running document converter");

        let run = Command::new(&self.config.program)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), run)
            .await
            .map_err(|_| {
                DomainError::parse(format!(
                    "{} timed out after {}s on {}",
                    self.config.program,
                    self.config.timeout_secs,
                    path.display()
                ))
            })?
            .map_err(|e| {
                DomainError::parse(format!("Failed to run {}: {}", self.config.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::parse(format!(
                "{} exited with {}: {}",
                self.config.program,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(document_from_text(&text, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_parser(script: &str) -> CommandParser {
        CommandParser::new(CommandParserConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout_secs: 5,
        })
    }

    #[test]
    fn test_input_placeholder_substituted() {
        let parser = CommandParser::default();
        let args = parser.build_args(Path::new("/data/lease.pdf"));
        assert_eq!(args, vec!["-layout", "/data/lease.pdf", "-"]);
    }

    #[test]
    fn test_default_extensions() {
        let parser = CommandParser::default();
        assert!(parser.supports_file(Path::new("lease.pdf")));
        assert!(parser.supports_file(Path::new("lease.DOCX")));
        assert!(!parser.supports_file(Path::new("lease.md")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_pages() {
        let parser = shell_parser("printf 'first page\\fsecond page'");
        let document = parser.parse(Path::new("lease.pdf")).await.unwrap();

        assert_eq!(document.pages(), &["first page", "second page"]);
        assert_eq!(document.title(), Some("lease"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_parse_error() {
        let parser = shell_parser("echo broken >&2; exit 3");
        let error = parser.parse(Path::new("lease.pdf")).await.unwrap_err();

        assert!(matches!(error, DomainError::Parse { .. }));
        assert!(error.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_missing_program_is_parse_error() {
        let parser = CommandParser::new(CommandParserConfig {
            program: "definitely-not-a-real-converter".to_string(),
            ..Default::default()
        });

        assert!(parser.parse(Path::new("lease.pdf")).await.is_err());
    }
}
