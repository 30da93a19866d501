//! Chunk types and chunking configuration

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Approximate token count for a piece of text.
///
/// Uses the 4-characters-per-token heuristic; this is not a tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Configuration for header-aware chunking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Segments above this approximate token count are re-split
    pub max_tokens: usize,
    /// Target size of secondary-split pieces, in tokens
    pub secondary_chunk_tokens: usize,
    /// Overlap carried between adjacent secondary pieces, in tokens
    pub secondary_overlap_tokens: usize,
    /// Secondary pieces with fewer words than this are dropped
    pub min_fragment_words: usize,
    /// Chunks below this token count are fused into their successor
    pub orphan_min_tokens: usize,
    /// Upper bound on full orphan-merge passes
    pub max_merge_passes: usize,
}

impl ChunkerConfig {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            ..Default::default()
        }
    }

    pub fn with_secondary(mut self, chunk_tokens: usize, overlap_tokens: usize) -> Self {
        self.secondary_chunk_tokens = chunk_tokens;
        self.secondary_overlap_tokens = overlap_tokens;
        self
    }

    pub fn with_min_fragment_words(mut self, words: usize) -> Self {
        self.min_fragment_words = words;
        self
    }

    pub fn with_orphan_min_tokens(mut self, tokens: usize) -> Self {
        self.orphan_min_tokens = tokens;
        self
    }

    pub fn with_max_merge_passes(mut self, passes: usize) -> Self {
        self.max_merge_passes = passes;
        self
    }

    /// Secondary piece size in characters
    pub fn secondary_chunk_chars(&self) -> usize {
        self.secondary_chunk_tokens * 4
    }

    /// Secondary overlap in characters
    pub fn secondary_overlap_chars(&self) -> usize {
        self.secondary_overlap_tokens * 4
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_tokens == 0 {
            return Err(DomainError::validation("max_tokens must be greater than 0"));
        }

        if self.secondary_chunk_tokens == 0 {
            return Err(DomainError::validation(
                "secondary_chunk_tokens must be greater than 0",
            ));
        }

        if self.secondary_overlap_tokens >= self.secondary_chunk_tokens {
            return Err(DomainError::validation(
                "secondary_overlap_tokens must be less than secondary_chunk_tokens",
            ));
        }

        if self.secondary_chunk_tokens > self.max_tokens {
            return Err(DomainError::validation(
                "secondary_chunk_tokens must be less than or equal to max_tokens",
            ));
        }

        if self.max_merge_passes == 0 {
            return Err(DomainError::validation(
                "max_merge_passes must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            secondary_chunk_tokens: 800,
            secondary_overlap_tokens: 100,
            min_fragment_words: 5,
            orphan_min_tokens: 25,
            max_merge_passes: 10,
        }
    }
}

/// Structural labels carried by a chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Article header text (level 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    /// Section header text (level 2)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Position within a secondary split (0-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_chunk: Option<usize>,
}

impl ChunkMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_article(mut self, article: impl Into<String>) -> Self {
        self.article = Some(article.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_sub_chunk(mut self, index: usize) -> Self {
        self.sub_chunk = Some(index);
        self
    }

    /// Merge `next` into a copy of `self`; keys present on `next` win.
    pub fn merged_with(&self, next: &ChunkMetadata) -> ChunkMetadata {
        ChunkMetadata {
            article: next.article.clone().or_else(|| self.article.clone()),
            section: next.section.clone().or_else(|| self.section.clone()),
            sub_chunk: next.sub_chunk.or(self.sub_chunk),
        }
    }

    /// Most specific header label: section, then article
    pub fn source_section(&self) -> Option<&str> {
        self.section.as_deref().or(self.article.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.article.is_none() && self.section.is_none() && self.sub_chunk.is_none()
    }
}

/// A contiguous piece of a normalized document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    content: String,
    metadata: ChunkMetadata,
    token_count: usize,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        let content = content.into();
        let token_count = estimate_tokens(&content);

        Self {
            content,
            metadata,
            token_count,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Replace the content; the token count follows it.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.token_count = estimate_tokens(&self.content);
    }

    pub fn set_metadata(&mut self, metadata: ChunkMetadata) {
        self.metadata = metadata;
    }

    /// Fuse this chunk into `next`, which comes directly after it.
    pub fn absorb_into(self, next: Chunk) -> Chunk {
        let metadata = self.metadata.merged_with(&next.metadata);
        Chunk::new(format!("{}\n\n{}", self.content, next.content), metadata)
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Splits normalized document text into ordered chunks
pub trait DocumentChunker: Send + Sync + Debug {
    fn chunk(&self, text: &str) -> Result<Vec<Chunk>, DomainError>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(4001)), 1000);
    }

    #[test]
    fn test_token_count_follows_content() {
        let mut chunk = Chunk::new("short", ChunkMetadata::new());
        assert_eq!(chunk.token_count(), 1);

        chunk.set_content("a".repeat(400));
        assert_eq!(chunk.token_count(), 100);
    }

    #[test]
    fn test_metadata_merge_next_wins() {
        let first = ChunkMetadata::new()
            .with_article("# ARTICLE 7 - Repairs")
            .with_section("## 7.02 Light Fixtures");
        let next = ChunkMetadata::new()
            .with_article("# ARTICLE 7 - Repairs")
            .with_section("## 7.03 Glass");

        let merged = first.merged_with(&next);

        assert_eq!(merged.section.as_deref(), Some("## 7.03 Glass"));
        assert_eq!(merged.article.as_deref(), Some("# ARTICLE 7 - Repairs"));
    }

    #[test]
    fn test_metadata_merge_keeps_missing_keys() {
        let first = ChunkMetadata::new().with_article("# ARTICLE 1");
        let merged = first.merged_with(&ChunkMetadata::new().with_sub_chunk(2));

        assert_eq!(merged.article.as_deref(), Some("# ARTICLE 1"));
        assert_eq!(merged.sub_chunk, Some(2));
    }

    #[test]
    fn test_absorb_into_joins_with_blank_line() {
        let small = Chunk::new("## 7.02 Light Fixtures", ChunkMetadata::new());
        let next = Chunk::new("## 7.03 Glass\n\nTenant shall replace glass.", ChunkMetadata::new());

        let fused = small.absorb_into(next);

        assert!(fused.content().starts_with("## 7.02 Light Fixtures\n\n## 7.03 Glass"));
        assert_eq!(fused.token_count(), estimate_tokens(fused.content()));
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkerConfig::default().validate().is_ok());
        assert!(ChunkerConfig::new(0).validate().is_err());
        assert!(ChunkerConfig::default()
            .with_secondary(100, 100)
            .validate()
            .is_err());
        assert!(ChunkerConfig::new(500).validate().is_err());
        assert!(ChunkerConfig::new(500)
            .with_secondary(400, 50)
            .validate()
            .is_ok());
    }
}
