//! Lease Ingest
//!
//! Turns commercial-lease documents into a queryable index:
//! - Header-aware segmentation with size-bounded re-splitting and orphan fusion
//! - Pluggable chunk enrichment (LLM, rule-based or none)
//! - Batched embedding and vector upload with retry and partial-failure isolation
//! - Structured lease records persisted by document name

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use domain::{EmbeddingProvider, LeaseRepository, LlmProvider, VectorIndex};
use crate::config::{read_secret, StorageBackend, VectorIndexProvider};
use infrastructure::{
    embedding::OpenAiEmbeddingProvider,
    enrichment::EnrichmentFactory,
    extraction::{LlmClauseExtractor, LlmLeaseExtractor},
    http_client::HttpClient,
    ingestion::{HeaderAwareChunker, IngestionPipeline, ParserRegistry, PipelineDeps, TextNormalizer},
    lease_store::{InMemoryLeaseRepository, PostgresLeaseRepository},
    llm::OpenAiProvider,
    vector_index::{InMemoryVectorIndex, PineconeVectorIndex},
};

/// Build the lease store selected by configuration
pub async fn create_lease_store(config: &AppConfig) -> anyhow::Result<Arc<dyn LeaseRepository>> {
    match config.storage.backend {
        StorageBackend::InMemory => {
            info!("Using in-memory lease store");
            Ok(Arc::new(InMemoryLeaseRepository::new()))
        }
        StorageBackend::Postgres => {
            let url = read_secret(&config.storage.database_url_env)?;
            let store = PostgresLeaseRepository::connect(&url, config.storage.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;

            info!("Using PostgreSQL lease store");
            Ok(Arc::new(store))
        }
    }
}

/// Build the vector index selected by configuration
pub fn create_vector_index(config: &AppConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let settings = &config.vector_index;

    match settings.provider {
        VectorIndexProvider::InMemory => {
            info!("Using in-memory vector index");
            Ok(Arc::new(InMemoryVectorIndex::new()))
        }
        VectorIndexProvider::Pinecone => {
            let host = settings
                .host
                .clone()
                .context("vector_index.host is required for the pinecone provider")?;
            let api_key = read_secret(&settings.api_key_env)?;
            let client = HttpClient::with_timeout(Duration::from_secs(settings.timeout_secs))?;

            info!(host = %host, "Using Pinecone vector index");
            Ok(Arc::new(PineconeVectorIndex::new(client, api_key, host)))
        }
    }
}

fn create_llm_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = read_secret(&config.llm.api_key_env)?;
    let client = HttpClient::with_timeout(Duration::from_secs(config.llm.timeout_secs))?;

    Ok(Arc::new(OpenAiProvider::with_base_url(
        client,
        api_key,
        &config.llm.base_url,
    )))
}

fn create_embedder(config: &AppConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let api_key = read_secret(&config.embedding.api_key_env)?;
    let client = HttpClient::with_timeout(Duration::from_secs(config.embedding.timeout_secs))?;

    Ok(Arc::new(OpenAiEmbeddingProvider::with_base_url(
        client,
        api_key,
        &config.embedding.base_url,
    )))
}

/// Wire the ingestion pipeline from configuration
pub async fn create_pipeline(config: &AppConfig) -> anyhow::Result<IngestionPipeline> {
    config
        .pipeline
        .validate()
        .context("Invalid pipeline configuration")?;

    let llm = create_llm_provider(config)?;
    let enrichment = EnrichmentFactory::create(
        &config.pipeline,
        Some((llm.clone(), config.llm.enrichment_model.clone())),
    )?;

    let deps = PipelineDeps {
        parser: Arc::new(ParserRegistry::with_defaults(config.parser.clone())),
        normalizer: TextNormalizer::new(config.normalizer.clone()),
        chunker: Arc::new(HeaderAwareChunker::new(config.pipeline.chunker.clone())),
        enrichment,
        lease_extractor: Arc::new(LlmLeaseExtractor::new(
            llm.clone(),
            &config.llm.extraction_model,
        )),
        clause_extractor: Arc::new(LlmClauseExtractor::new(llm, &config.llm.extraction_model)),
        embedder: create_embedder(config)?,
        vector_index: create_vector_index(config)?,
        lease_store: create_lease_store(config).await?,
    };

    info!(
        enrichment = %config.pipeline.enrichment_mode.as_str(),
        namespace = %config.pipeline.namespace,
        "Ingestion pipeline ready"
    );

    Ok(IngestionPipeline::new(deps, config.pipeline.clone()))
}
