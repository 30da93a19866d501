//! Ingestion pipeline configuration and result types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::chunker::ChunkerConfig;
use super::retry::RetryPolicy;
use crate::domain::enrichment::EnrichmentMode;
use crate::domain::lease::Lease;
use crate::domain::DomainError;

/// What to do with chunks whose embedding batch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedVectorPolicy {
    /// Upload the zero-vector placeholder like any other vector
    Upsert,
    /// Keep the placeholder out of the vector index
    #[default]
    Omit,
}

/// Configuration for a pipeline instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub enrichment_mode: EnrichmentMode,
    pub enrichment_batch_size: usize,
    pub enrichment_batch_delay_ms: u64,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub embedding_batch_size: usize,
    pub embedding_batch_delay_ms: u64,
    pub namespace: String,
    pub upload_batch_size: usize,
    /// Characters of document text sent to the structured extractors
    pub extraction_window_chars: usize,
    pub degraded_vector_policy: DegradedVectorPolicy,
    /// Delete vectors left over from a previous, longer ingestion
    pub prune_stale_vectors: bool,
    pub retry: RetryPolicy,
    pub chunker: ChunkerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enrichment_mode: EnrichmentMode::default(),
            enrichment_batch_size: 5,
            enrichment_batch_delay_ms: 12_000,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            embedding_batch_size: 50,
            embedding_batch_delay_ms: 500,
            namespace: "leases-test".to_string(),
            upload_batch_size: 100,
            extraction_window_chars: 100_000,
            degraded_vector_policy: DegradedVectorPolicy::default(),
            prune_stale_vectors: true,
            retry: RetryPolicy::default(),
            chunker: ChunkerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enrichment_mode(mut self, mode: EnrichmentMode) -> Self {
        self.enrichment_mode = mode;
        self
    }

    pub fn with_embedding_batch_size(mut self, size: usize) -> Self {
        self.embedding_batch_size = size;
        self
    }

    pub fn with_embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.embedding_dimensions = dimensions;
        self
    }

    pub fn with_upload_batch_size(mut self, size: usize) -> Self {
        self.upload_batch_size = size;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_degraded_vector_policy(mut self, policy: DegradedVectorPolicy) -> Self {
        self.degraded_vector_policy = policy;
        self
    }

    /// Drop every inter-batch delay
    pub fn without_delays(mut self) -> Self {
        self.enrichment_batch_delay_ms = 0;
        self.embedding_batch_delay_ms = 0;
        self
    }

    pub fn enrichment_batch_delay(&self) -> Duration {
        Duration::from_millis(self.enrichment_batch_delay_ms)
    }

    pub fn embedding_batch_delay(&self) -> Duration {
        Duration::from_millis(self.embedding_batch_delay_ms)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.embedding_batch_size == 0 {
            return Err(DomainError::validation(
                "embedding_batch_size must be greater than 0",
            ));
        }

        if self.upload_batch_size == 0 {
            return Err(DomainError::validation(
                "upload_batch_size must be greater than 0",
            ));
        }

        if self.enrichment_batch_size == 0 {
            return Err(DomainError::validation(
                "enrichment_batch_size must be greater than 0",
            ));
        }

        if self.embedding_dimensions == 0 {
            return Err(DomainError::validation(
                "embedding_dimensions must be greater than 0",
            ));
        }

        if self.namespace.trim().is_empty() {
            return Err(DomainError::validation("namespace cannot be empty"));
        }

        self.chunker.validate()
    }
}

/// Partial failures a successful run tolerated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegradationReport {
    /// Chunk positions whose vectors are zero-vector placeholders
    pub failed_embedding_chunks: Vec<usize>,
    /// Vector IDs whose upload batch was exhausted
    pub failed_vector_ids: Vec<String>,
    /// Chunk positions that carry no enrichment because the provider failed
    pub failed_enrichment_chunks: Vec<usize>,
    pub clause_extraction_failed: bool,
}

impl DegradationReport {
    pub fn is_clean(&self) -> bool {
        self.failed_embedding_chunks.is_empty()
            && self.failed_vector_ids.is_empty()
            && self.failed_enrichment_chunks.is_empty()
            && !self.clause_extraction_failed
    }
}

/// Outcome of one `run`
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub document_name: String,
    pub success: bool,
    pub chunks_processed: usize,
    pub vectors_uploaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_data: Option<Lease>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub processing_time_seconds: f64,
    pub degradation: DegradationReport,
}

impl PipelineResult {
    pub fn success(
        document_name: impl Into<String>,
        chunks_processed: usize,
        vectors_uploaded: usize,
        lease_data: Lease,
        elapsed: Duration,
        degradation: DegradationReport,
    ) -> Self {
        Self {
            document_name: document_name.into(),
            success: true,
            chunks_processed,
            vectors_uploaded,
            lease_data: Some(lease_data),
            error_message: None,
            processing_time_seconds: elapsed.as_secs_f64(),
            degradation,
        }
    }

    /// A run stopped by a fatal stage; nothing was indexed
    pub fn failure(document_name: impl Into<String>, error: impl ToString, elapsed: Duration) -> Self {
        Self {
            document_name: document_name.into(),
            success: false,
            chunks_processed: 0,
            vectors_uploaded: 0,
            lease_data: None,
            error_message: Some(error.to_string()),
            processing_time_seconds: elapsed.as_secs_f64(),
            degradation: DegradationReport::default(),
        }
    }

    /// Report work already done before the failing stage
    pub fn with_progress(mut self, chunks_processed: usize, vectors_uploaded: usize) -> Self {
        self.chunks_processed = chunks_processed;
        self.vectors_uploaded = vectors_uploaded;
        self
    }

    pub fn with_degradation(mut self, degradation: DegradationReport) -> Self {
        self.degradation = degradation;
        self
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradation.is_clean()
    }
}
