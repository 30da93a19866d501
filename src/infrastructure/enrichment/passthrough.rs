//! Enrichment disabled

use async_trait::async_trait;

use crate::domain::enrichment::{EnrichedChunk, EnrichmentMode, EnrichmentStrategy};
use crate::domain::ingestion::Chunk;

/// Leaves every enrichment field empty with clause type `other`
#[derive(Debug, Clone, Default)]
pub struct PassthroughEnrichment;

impl PassthroughEnrichment {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EnrichmentStrategy for PassthroughEnrichment {
    async fn enrich(&self, chunk: &Chunk, position: usize, source_document: &str) -> EnrichedChunk {
        EnrichedChunk::from_chunk(chunk.clone(), position, source_document)
    }

    fn mode(&self) -> EnrichmentMode {
        EnrichmentMode::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enrichment::ClauseType;
    use crate::domain::ingestion::ChunkMetadata;

    #[tokio::test]
    async fn test_passthrough_leaves_fields_empty() {
        let chunk = Chunk::new("Body", ChunkMetadata::new().with_article("ARTICLE 1"));
        let enriched = PassthroughEnrichment::new().enrich(&chunk, 4, "lease.md").await;

        assert_eq!(enriched.chunk_index, 4);
        assert_eq!(enriched.source_document, "lease.md");
        assert_eq!(enriched.clause_type(), ClauseType::Other);
        assert!(enriched.enrichment.semantic_tags.is_empty());
        assert!(!enriched.enrichment_failed);
        assert_eq!(enriched.enriched_content(), "Body");
    }
}
