//! Domain layer - Core types, traits and invariants of lease ingestion

pub mod embedding;
pub mod enrichment;
pub mod error;
pub mod ingestion;
pub mod lease;
pub mod llm;
pub mod vector_index;

pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use enrichment::{ClauseType, EnrichedChunk, Enrichment, EnrichmentMode, EnrichmentStrategy};
pub use error::DomainError;
pub use ingestion::{
    Chunk, ChunkMetadata, ChunkerConfig, DegradationReport, DegradedVectorPolicy,
    DocumentChunker, DocumentParser, ParsedDocument, PipelineConfig, PipelineResult, RetryPolicy,
};
pub use lease::{
    ClauseExtractor, ExtractedClause, IngestionLogEntry, IngestionStatus, Lease, LeaseExtractor,
    LeaseRecord, LeaseRepository, RentStep,
};
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message, MessageRole};
pub use vector_index::{MetadataFilter, VectorIndex, VectorMatch, VectorQuery, VectorRecord};
