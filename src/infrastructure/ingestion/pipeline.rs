//! Ingestion pipeline service
//!
//! Drives one document through parse, normalize, chunk, extract, enrich,
//! embed, index and persist. Stages before embedding are fatal; batched
//! external stages retry and then degrade; clause extraction is best-effort.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::enrichment::{EnrichedChunk, EnrichmentStrategy};
use crate::domain::ingestion::{
    document_key, document_name, vector_id, DegradationReport, DegradedVectorPolicy,
    DocumentChunker, DocumentParser, ParsedDocument, PipelineConfig, PipelineResult,
};
use crate::domain::lease::{extraction_window, ClauseExtractor, LeaseExtractor, LeaseRepository};
use crate::domain::vector_index::{delete_document_vectors, document_vector_ids, VectorIndex, VectorRecord};
use crate::domain::DomainError;
use crate::infrastructure::observability;

use super::normalizer::TextNormalizer;

/// Collaborators the pipeline is built from
#[derive(Clone)]
pub struct PipelineDeps {
    pub parser: Arc<dyn DocumentParser>,
    pub normalizer: TextNormalizer,
    pub chunker: Arc<dyn DocumentChunker>,
    pub enrichment: Arc<dyn EnrichmentStrategy>,
    pub lease_extractor: Arc<dyn LeaseExtractor>,
    pub clause_extractor: Arc<dyn ClauseExtractor>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub lease_store: Arc<dyn LeaseRepository>,
}

impl fmt::Debug for PipelineDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineDeps")
            .field("parser", &self.parser)
            .field("chunker", &self.chunker)
            .field("enrichment", &self.enrichment.mode())
            .field("embedder", &self.embedder.provider_name())
            .field("vector_index", &self.vector_index.provider_name())
            .finish_non_exhaustive()
    }
}

/// What `remove_document` deleted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalReport {
    pub vectors_deleted: usize,
    pub lease_deleted: bool,
    pub logs_deleted: u64,
}

/// Which stores `remove_document` touches
#[derive(Debug, Clone, Copy)]
pub struct RemovalOptions {
    pub vectors: bool,
    pub lease: bool,
    pub logs: bool,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            vectors: true,
            lease: true,
            logs: true,
        }
    }
}

/// A chunk ready for upload, or a placeholder that stands in for one
struct Embedded {
    chunk: EnrichedChunk,
    values: Vec<f32>,
    degraded: bool,
}

/// Ingestion pipeline for lease documents
#[derive(Debug)]
pub struct IngestionPipeline {
    deps: PipelineDeps,
    config: PipelineConfig,
}

impl IngestionPipeline {
    pub fn new(deps: PipelineDeps, config: PipelineConfig) -> Self {
        Self { deps, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn lease_store(&self) -> &Arc<dyn LeaseRepository> {
        &self.deps.lease_store
    }

    /// Ingest one document. Never returns an error; failures are reported
    /// on the result.
    pub async fn run(&self, path: &Path) -> PipelineResult {
        let started = Instant::now();

        let name = match document_name(path) {
            Ok(name) => name,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Rejected document path");
                let result = PipelineResult::failure(path.display().to_string(), e, started.elapsed());
                observability::record_pipeline_run(false, false, started.elapsed());
                return result;
            }
        };

        let span = info_span!("ingest", document = %name, run_id = %Uuid::new_v4());
        let result = self.run_document(path, &name, started).instrument(span).await;

        observability::record_pipeline_run(result.success, result.is_degraded(), started.elapsed());
        if result.success {
            observability::record_volumes(result.chunks_processed, result.vectors_uploaded);
        }

        result
    }

    async fn run_document(&self, path: &Path, name: &str, started: Instant) -> PipelineResult {
        info!("Starting ingestion");

        if let Err(e) = self.config.validate() {
            error!(error = %e, "Invalid pipeline configuration");
            return PipelineResult::failure(name, e, started.elapsed());
        }

        let document = match self.parse(path).await {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "Parsing failed");
                return PipelineResult::failure(name, e, started.elapsed());
            }
        };

        let text = self.deps.normalizer.normalize(&document.text());

        let chunks = match self.deps.chunker.chunk(&text) {
            Ok(chunks) if chunks.is_empty() => {
                let e = DomainError::parse("Document produced no chunks");
                error!(error = %e, "Chunking failed");
                return PipelineResult::failure(name, e, started.elapsed());
            }
            Ok(chunks) => chunks,
            Err(e) => {
                error!(error = %e, "Chunking failed");
                return PipelineResult::failure(name, e, started.elapsed());
            }
        };
        info!(chunks = chunks.len(), chunker = self.deps.chunker.name(), "Chunked document");

        let window = extraction_window(&text, self.config.extraction_window_chars);
        let lease = match self.deps.lease_extractor.extract(window).await {
            Ok(lease) => lease,
            Err(e) => {
                error!(error = %e, "Lease extraction failed");
                return PipelineResult::failure(name, e, started.elapsed());
            }
        };
        info!(tenant = %lease.tenant_name, "Extracted lease fields");

        let mut degradation = DegradationReport::default();

        let enriched = self.deps.enrichment.enrich_all(&chunks, name).await;
        degradation.failed_enrichment_chunks = enriched
            .iter()
            .filter(|c| c.enrichment_failed)
            .map(|c| c.chunk_index)
            .collect();
        if !degradation.failed_enrichment_chunks.is_empty() {
            warn!(
                failed = degradation.failed_enrichment_chunks.len(),
                "Some chunks carry no enrichment"
            );
        }
        info!(mode = %self.deps.enrichment.mode().as_str(), "Enriched chunks");

        let located = locate_chunks(enriched, &text, &document);
        let embedded = self.embed(located, &mut degradation).await;

        let key = document_key(name);
        let (records, current_ids) = self.build_records(&key, embedded);
        let vectors_uploaded = self.upload(records, &mut degradation).await;
        info!(vectors = vectors_uploaded, "Uploaded vectors");

        if self.config.prune_stale_vectors {
            self.prune_stale(name, &current_ids).await;
        }

        let chunks_processed = chunks.len();

        let lease_id = match self.deps.lease_store.upsert_lease(name, &lease).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Failed to persist lease");
                return PipelineResult::failure(name, e, started.elapsed())
                    .with_progress(chunks_processed, vectors_uploaded)
                    .with_degradation(degradation);
            }
        };
        info!(lease_id, "Persisted lease record");

        if let Err(e) = self.store_clauses(lease_id, window).await {
            warn!(error = %e, "Clause extraction failed; continuing");
            degradation.clause_extraction_failed = true;
        }

        let result = PipelineResult::success(
            name,
            chunks_processed,
            vectors_uploaded,
            lease,
            started.elapsed(),
            degradation,
        );

        if result.is_degraded() {
            warn!(
                chunks = result.chunks_processed,
                vectors = result.vectors_uploaded,
                "Ingestion finished with degradation"
            );
        } else {
            info!(
                chunks = result.chunks_processed,
                vectors = result.vectors_uploaded,
                seconds = result.processing_time_seconds,
                "Ingestion finished"
            );
        }

        result
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, DomainError> {
        let document = self.deps.parser.parse(path).await?;

        if document.is_blank() {
            return Err(DomainError::parse(format!(
                "No text extracted from {}",
                path.display()
            )));
        }

        info!(pages = document.page_count(), "Parsed document");
        Ok(document)
    }

    async fn embed(&self, chunks: Vec<EnrichedChunk>, degradation: &mut DegradationReport) -> Vec<Embedded> {
        let batch_size = self.config.embedding_batch_size;
        let batch_count = chunks.len().div_ceil(batch_size);
        let delay = self.config.embedding_batch_delay();
        let embedder = &self.deps.embedder;

        let mut embedded = Vec::with_capacity(chunks.len());
        let mut remaining = chunks.into_iter().peekable();
        let mut batch_index = 0;

        while remaining.peek().is_some() {
            let batch: Vec<EnrichedChunk> = remaining.by_ref().take(batch_size).collect();
            let request = EmbeddingRequest::new(
                &self.config.embedding_model,
                batch.iter().map(EnrichedChunk::enriched_content).collect(),
            )
            .with_dimensions(self.config.embedding_dimensions);
            let expected = batch.len();

            debug!(batch = batch_index + 1, batches = batch_count, size = expected, "Embedding batch");

            let mut attempts = 0u32;
            let outcome = self
                .config
                .retry
                .run("embedding", || {
                    attempts += 1;
                    let request = request.clone();
                    async move {
                        let response = embedder.embed(request).await?;
                        if response.len() != expected {
                            return Err(DomainError::provider(
                                embedder.provider_name(),
                                format!("Expected {} embeddings, got {}", expected, response.len()),
                            ));
                        }
                        Ok(response.into_vectors())
                    }
                })
                .await;

            observability::record_retries("embedding", attempts.saturating_sub(1));

            match outcome {
                Ok(vectors) => {
                    embedded.extend(batch.into_iter().zip(vectors).map(|(chunk, values)| Embedded {
                        chunk,
                        values,
                        degraded: false,
                    }));
                }
                Err(exhausted) => {
                    warn!(
                        batch = batch_index + 1,
                        attempts = exhausted.attempts,
                        error = %exhausted.error,
                        "Embedding batch failed; using zero vectors"
                    );
                    observability::record_degraded_batch("embedding");

                    for chunk in batch {
                        degradation.failed_embedding_chunks.push(chunk.chunk_index);
                        embedded.push(Embedded {
                            chunk,
                            values: vec![0.0; self.config.embedding_dimensions],
                            degraded: true,
                        });
                    }
                }
            }

            batch_index += 1;
            if batch_index < batch_count && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        embedded
    }

    /// Records to upload plus the IDs of every chunk position in this run.
    /// Omitted placeholders still claim their ID so a previous good vector
    /// at that position survives pruning.
    fn build_records(&self, key: &str, embedded: Vec<Embedded>) -> (Vec<VectorRecord>, HashSet<String>) {
        let mut records = Vec::with_capacity(embedded.len());
        let mut current_ids = HashSet::with_capacity(embedded.len());

        for item in embedded {
            current_ids.insert(vector_id(key, item.chunk.chunk_index));

            if item.degraded && self.config.degraded_vector_policy == DegradedVectorPolicy::Omit {
                continue;
            }

            records.push(vector_record(key, item.chunk, item.values));
        }

        (records, current_ids)
    }

    async fn upload(&self, records: Vec<VectorRecord>, degradation: &mut DegradationReport) -> usize {
        let namespace = &self.config.namespace;
        let index = &self.deps.vector_index;
        let mut uploaded = 0;

        for (batch_index, batch) in records.chunks(self.config.upload_batch_size).enumerate() {
            let mut attempts = 0u32;
            let outcome = self
                .config
                .retry
                .run("upsert", || {
                    attempts += 1;
                    let batch = batch.to_vec();
                    async move { index.upsert(namespace, batch).await }
                })
                .await;

            observability::record_retries("upsert", attempts.saturating_sub(1));

            match outcome {
                Ok(count) => {
                    debug!(batch = batch_index + 1, count, "Upserted batch");
                    uploaded += count;
                }
                Err(exhausted) => {
                    warn!(
                        batch = batch_index + 1,
                        attempts = exhausted.attempts,
                        error = %exhausted.error,
                        "Upsert batch failed"
                    );
                    observability::record_degraded_batch("upsert");
                    degradation
                        .failed_vector_ids
                        .extend(batch.iter().map(|r| r.id.clone()));
                }
            }
        }

        uploaded
    }

    async fn prune_stale(&self, name: &str, current_ids: &HashSet<String>) {
        let index = self.deps.vector_index.as_ref();
        let namespace = &self.config.namespace;

        let existing = match document_vector_ids(index, namespace, name, self.config.embedding_dimensions).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Could not list existing vectors; skipping prune");
                return;
            }
        };

        let stale: Vec<String> = existing
            .into_iter()
            .filter(|id| !current_ids.contains(id))
            .collect();

        if stale.is_empty() {
            return;
        }

        match index.delete(namespace, &stale).await {
            Ok(()) => info!(count = stale.len(), "Pruned stale vectors"),
            Err(e) => warn!(error = %e, "Failed to prune stale vectors"),
        }
    }

    async fn store_clauses(&self, lease_id: i64, text: &str) -> Result<(), DomainError> {
        let clauses = self.deps.clause_extractor.extract(text).await?;
        self.deps.lease_store.replace_clauses(lease_id, &clauses).await?;

        info!(clauses = clauses.len(), "Stored clause summaries");
        Ok(())
    }

    /// Delete a document from the vector index and the lease store
    pub async fn remove_document(
        &self,
        name: &str,
        options: RemovalOptions,
    ) -> Result<RemovalReport, DomainError> {
        remove_document(
            self.deps.vector_index.as_ref(),
            self.deps.lease_store.as_ref(),
            &self.config,
            name,
            options,
        )
        .await
    }
}

/// Delete a document without building a full pipeline
pub async fn remove_document(
    index: &dyn VectorIndex,
    store: &dyn LeaseRepository,
    config: &PipelineConfig,
    name: &str,
    options: RemovalOptions,
) -> Result<RemovalReport, DomainError> {
    let mut report = RemovalReport::default();

    if options.vectors {
        report.vectors_deleted =
            delete_document_vectors(index, &config.namespace, name, config.embedding_dimensions)
                .await?;
    }

    if options.lease {
        report.lease_deleted = store.delete_lease(name).await?;
    }

    if options.logs {
        report.logs_deleted = store.delete_ingestion_logs(name).await?;
    }

    info!(
        document = %name,
        vectors = report.vectors_deleted,
        lease = report.lease_deleted,
        logs = report.logs_deleted,
        "Removed document"
    );

    Ok(report)
}

/// Attach character offsets and page numbers.
///
/// Chunks are searched for in order from a moving cursor so repeated
/// passages resolve to successive occurrences.
fn locate_chunks(chunks: Vec<EnrichedChunk>, text: &str, document: &ParsedDocument) -> Vec<EnrichedChunk> {
    let mut cursor = 0;

    chunks
        .into_iter()
        .map(|chunk| {
            let span = find_span(text, chunk.content(), cursor);
            let (start, end) = span.unwrap_or((cursor, cursor));
            if span.is_some() {
                cursor = (start + 1..=text.len())
                    .find(|&i| text.is_char_boundary(i))
                    .unwrap_or(text.len());
            }

            let char_start = text[..start].chars().count();
            let char_end = char_start + text[start..end].chars().count();
            let pages = document.pages_for(chunk.content());

            chunk.with_location(char_start, char_end, pages)
        })
        .collect()
}

/// Byte span of `content` in `text`, searching from `from`. Merged chunks
/// are matched by their first and last lines.
fn find_span(text: &str, content: &str, from: usize) -> Option<(usize, usize)> {
    let haystack = &text[from..];

    if let Some(pos) = haystack.find(content) {
        return Some((from + pos, from + pos + content.len()));
    }

    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    let first = lines.next()?;
    let last = lines.last().unwrap_or(first);

    let start = from + haystack.find(first)?;
    let end = text[start..]
        .find(last)
        .map(|pos| start + pos + last.len())
        .unwrap_or(start + first.len());

    Some((start, end))
}

fn vector_record(key: &str, chunk: EnrichedChunk, values: Vec<f32>) -> VectorRecord {
    let metadata = chunk.metadata().clone();
    let first_page = chunk.page_numbers.first().copied();
    let last_page = chunk.page_numbers.last().copied();

    VectorRecord::new(vector_id(key, chunk.chunk_index), values)
        .with_metadata("source_document", chunk.source_document.clone())
        .with_metadata("chunk_index", chunk.chunk_index as u64)
        .with_metadata("text", chunk.content())
        .with_metadata("token_count", chunk.token_count() as u64)
        .with_metadata("char_start", chunk.char_start as u64)
        .with_metadata("char_end", chunk.char_end as u64)
        .with_metadata("clause_type", chunk.clause_type().as_str())
        .with_metadata("semantic_tags", chunk.enrichment.semantic_tags.clone())
        .with_metadata("key_entities", chunk.enrichment.key_entities.clone())
        .with_metadata("enrichment_failed", chunk.enrichment_failed)
        .with_optional("contextual_summary", chunk.enrichment.contextual_summary.clone())
        .with_optional("source_section", chunk.source_section.clone())
        .with_optional("article", metadata.article)
        .with_optional("section", metadata.section)
        .with_optional("sub_chunk", metadata.sub_chunk.map(|i| i as u64))
        .with_optional("page_start", first_page)
        .with_optional("page_end", last_page)
}
