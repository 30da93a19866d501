//! Parser selection by file extension

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::{CommandParser, CommandParserConfig, TextFileParser};
use crate::domain::ingestion::{file_extension, DocumentParser, ParsedDocument};
use crate::domain::DomainError;

/// Dispatches to the first registered parser that accepts the extension
#[derive(Debug, Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn DocumentParser>>,
    extensions: Vec<&'static str>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text files plus an external converter for binary formats
    pub fn with_defaults(command: CommandParserConfig) -> Self {
        Self::new()
            .register(Arc::new(TextFileParser::new()))
            .register(Arc::new(CommandParser::new(command)))
    }

    pub fn register(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        for &ext in parser.supported_extensions() {
            if !self.extensions.contains(&ext) {
                self.extensions.push(ext);
            }
        }
        self.parsers.push(parser);
        self
    }

    pub fn parser_for(&self, path: &Path) -> Option<&Arc<dyn DocumentParser>> {
        self.parsers.iter().find(|p| p.supports_file(path))
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

#[async_trait]
impl DocumentParser for ParserRegistry {
    fn supported_extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, DomainError> {
        let parser = self.parser_for(path).ok_or_else(|| {
            DomainError::validation(format!(
                "Unsupported file type '{}' for {}",
                file_extension(path).unwrap_or_default(),
                path.display()
            ))
        })?;

        parser.parse(path).await
    }
}
