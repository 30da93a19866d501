//! Document parser trait and types

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::domain::DomainError;

/// Text extracted from a source document, one entry per page
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pages: Vec<String>,
    title: Option<String>,
}

impl ParsedDocument {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages, title: None }
    }

    /// A document without page structure
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Full text with pages separated by a blank line
    pub fn text(&self) -> String {
        self.pages.join("\n\n")
    }

    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }

    /// 1-based number of the first page containing `needle`
    pub fn page_of(&self, needle: &str) -> Option<u32> {
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }

        self.pages
            .iter()
            .position(|page| page.contains(needle))
            .map(|idx| idx as u32 + 1)
    }

    /// Pages spanned by a passage, located by its first and last lines.
    ///
    /// Returns an empty list when neither line can be located, which happens
    /// when normalization rewrote the surrounding text.
    pub fn pages_for(&self, passage: &str) -> Vec<u32> {
        let mut lines = passage
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));

        let first = lines.next();
        let last = lines.last().or(first);

        let start = first.and_then(|l| self.page_of(l));
        let end = last.and_then(|l| self.page_of(l));

        match (start, end) {
            (Some(s), Some(e)) if e >= s => (s..=e).collect(),
            (Some(p), _) | (None, Some(p)) => vec![p],
            (None, None) => Vec::new(),
        }
    }
}

/// Trait for document parsers
#[async_trait]
pub trait DocumentParser: Send + Sync + Debug {
    /// Lower-case extensions this parser accepts (e.g. ["pdf"])
    fn supported_extensions(&self) -> &[&'static str];

    /// Extract the text of the document at `path`
    async fn parse(&self, path: &Path) -> Result<ParsedDocument, DomainError>;

    fn supports_file(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ext))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_pages() {
        let doc = ParsedDocument::new(vec!["page one".into(), "page two".into()]);
        assert_eq!(doc.text(), "page one\n\npage two");
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_is_blank() {
        assert!(ParsedDocument::new(vec!["  ".into(), "\n".into()]).is_blank());
        assert!(!ParsedDocument::from_text("Lease").is_blank());
    }

    #[test]
    fn test_pages_for_spanning_passage() {
        let doc = ParsedDocument::new(vec![
            "Intro text\nThe Tenant shall pay rent".into(),
            "monthly in advance.\nOther".into(),
            "Schedule B".into(),
        ]);

        let pages = doc.pages_for("## 4.01 Rent\nThe Tenant shall pay rent\nmonthly in advance.");
        assert_eq!(pages, vec![1, 2]);
    }

    #[test]
    fn test_pages_for_unknown_passage() {
        let doc = ParsedDocument::from_text("something else");
        assert!(doc.pages_for("not present").is_empty());
    }

    #[test]
    fn test_supports_file_by_extension() {
        let parser = mock::MockDocumentParser::new();
        assert!(parser.supports_file(Path::new("/tmp/Lease.PDF")));
        assert!(!parser.supports_file(Path::new("/tmp/lease.xlsx")));
    }
}
