//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod enrichment;
pub mod extraction;
pub mod http_client;
pub mod ingestion;
pub mod lease_store;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod vector_index;
