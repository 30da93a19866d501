//! Plain text and markdown file parser

use async_trait::async_trait;
use std::path::Path;

use crate::domain::ingestion::{DocumentParser, ParsedDocument};
use crate::domain::DomainError;

/// Page separator emitted by most PDF-to-text converters
pub const FORM_FEED: char = '\u{000C}';

/// Split converter output into pages and pick up a title
pub(crate) fn document_from_text(text: &str, path: &Path) -> ParsedDocument {
    let pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();

    let title = text
        .lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        });

    let document = ParsedDocument::new(pages);
    match title {
        Some(title) => document.with_title(title),
        None => document,
    }
}

/// Reads `.md`, `.markdown` and `.txt` files as UTF-8
#[derive(Debug, Clone, Default)]
pub struct TextFileParser;

impl TextFileParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for TextFileParser {
    fn supported_extensions(&self) -> &[&'static str] {
        &["md", "markdown", "txt"]
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, DomainError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::parse(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Ok(document_from_text(&text, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_parse_markdown_with_pages() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "# Retail Lease\n\nPage one text\u{000C}Page two text").unwrap();

        let parser = TextFileParser::new();
        let document = parser.parse(file.path()).await.unwrap();

        assert_eq!(document.page_count(), 2);
        assert_eq!(document.title(), Some("Retail Lease"));
        assert_eq!(document.page_of("Page two"), Some(2));
    }

    #[tokio::test]
    async fn test_title_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Unit 4 Lease.txt");
        std::fs::write(&path, "No headings here").unwrap();

        let document = TextFileParser::new().parse(&path).await.unwrap();
        assert_eq!(document.title(), Some("Unit 4 Lease"));
    }

    #[tokio::test]
    async fn test_missing_file_is_parse_error() {
        let error = TextFileParser::new()
            .parse(Path::new("/nonexistent/lease.md"))
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Parse { .. }));
    }

    #[test]
    fn test_supports_file() {
        let parser = TextFileParser::new();
        assert!(parser.supports_file(Path::new("lease.MD")));
        assert!(parser.supports_file(Path::new("lease.markdown")));
        assert!(!parser.supports_file(Path::new("lease.pdf")));
    }
}
