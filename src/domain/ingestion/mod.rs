//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `DocumentParser` trait for turning source files into page text
//! - `DocumentChunker` trait and the `Chunk` type produced by segmentation
//! - `RetryPolicy`, the backoff combinator for batched external calls
//! - Configuration and result types for the ingestion pipeline

pub mod chunker;
pub mod parser;
pub mod pipeline;
pub mod retry;
pub mod validation;

pub use chunker::{estimate_tokens, Chunk, ChunkMetadata, ChunkerConfig, DocumentChunker};
pub use parser::{DocumentParser, ParsedDocument};
pub use pipeline::{DegradationReport, DegradedVectorPolicy, PipelineConfig, PipelineResult};
pub use retry::{RetryExhausted, RetryPolicy};
pub use validation::{document_key, document_name, file_extension, validate_document_name, vector_id};

#[cfg(test)]
pub use parser::mock::MockDocumentParser;
