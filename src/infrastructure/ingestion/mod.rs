//! Document ingestion infrastructure
//!
//! This module provides implementations for document parsing, text
//! normalization, header-aware chunking, and the ingestion pipeline.

pub mod chunkers;
pub mod normalizer;
pub mod parsers;
pub mod pipeline;

// Re-export parsers
pub use parsers::{CommandParser, CommandParserConfig, ParserRegistry, TextFileParser};

// Re-export chunking
pub use chunkers::{HeaderAwareChunker, RecursiveSplitter};
pub use normalizer::{normalize, NormalizerConfig, TextNormalizer};

// Re-export pipeline
pub use pipeline::{remove_document, IngestionPipeline, PipelineDeps, RemovalOptions, RemovalReport};
