//! LLM-backed chunk enrichment

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::enrichment::{
    ClauseType, EnrichedChunk, Enrichment, EnrichmentMode, EnrichmentStrategy,
};
use crate::domain::ingestion::Chunk;
use crate::domain::llm::{LlmProvider, LlmRequest};

const SYSTEM_PROMPT: &str = "You annotate sections of commercial lease agreements for retrieval.";

/// One chat call per chunk; batches run concurrently with a pause between them
#[derive(Debug)]
pub struct LlmEnrichment {
    provider: Arc<dyn LlmProvider>,
    model: String,
    batch_size: usize,
    batch_delay: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl LlmEnrichment {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            batch_size: 5,
            batch_delay: Duration::from_secs(12),
            temperature: 0.0,
            max_tokens: 400,
        }
    }

    pub fn with_batching(mut self, batch_size: usize, batch_delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_prompt(&self, chunk: &Chunk, source_document: &str) -> String {
        let metadata = chunk.metadata();
        format!(
            "Document: {}\nArticle: {}\nSection: {}\n\n\
             Answer with exactly these lines:\n\
             CONTEXTUAL_SUMMARY: [one or two sentences placing the text in the lease]\n\
             SEMANTIC_TAGS: [comma separated tags]\n\
             KEY_ENTITIES: [comma separated parties, amounts, dates]\n\
             CLAUSE_TYPE: [one of: {}]\n\n\
             Text:\n{}",
            source_document,
            metadata.article.as_deref().unwrap_or("-"),
            metadata.section.as_deref().unwrap_or("-"),
            ClauseType::label_list(),
            chunk.content()
        )
    }
}

fn strip_brackets(value: &str) -> &str {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
}

fn parse_list(value: &str) -> Vec<String> {
    strip_brackets(value)
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the labelled-line response format. `None` when no label is present.
pub fn parse_enrichment_response(response: &str) -> Option<Enrichment> {
    let mut enrichment = Enrichment::default();
    let mut found = false;

    for line in response.lines() {
        let line = line.trim().trim_start_matches(['*', '-', ' ']);
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim_start_matches('*');

        match label.trim().trim_end_matches('*').to_uppercase().as_str() {
            "CONTEXTUAL_SUMMARY" => {
                enrichment = enrichment.with_summary(strip_brackets(value));
                found = true;
            }
            "SEMANTIC_TAGS" => {
                enrichment = enrichment.with_tags(parse_list(value));
                found = true;
            }
            "KEY_ENTITIES" => {
                enrichment = enrichment.with_entities(parse_list(value));
                found = true;
            }
            "CLAUSE_TYPE" => {
                enrichment = enrichment.with_clause_type(ClauseType::from_label(value));
                found = true;
            }
            _ => {}
        }
    }

    found.then_some(enrichment)
}

#[async_trait]
impl EnrichmentStrategy for LlmEnrichment {
    async fn enrich(&self, chunk: &Chunk, position: usize, source_document: &str) -> EnrichedChunk {
        let enriched = EnrichedChunk::from_chunk(chunk.clone(), position, source_document);

        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(self.build_prompt(chunk, source_document))
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        let response = match self.provider.chat(&self.model, request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(chunk_index = position, error = %e, "Enrichment call failed");
                return enriched.mark_failed();
            }
        };

        match parse_enrichment_response(response.content()) {
            Some(enrichment) => enriched.with_enrichment(enrichment),
            None => {
                warn!(chunk_index = position, "Enrichment response had no labelled fields");
                enriched.mark_failed()
            }
        }
    }

    async fn enrich_all(&self, chunks: &[Chunk], source_document: &str) -> Vec<EnrichedChunk> {
        let mut enriched = Vec::with_capacity(chunks.len());
        let batch_count = chunks.len().div_ceil(self.batch_size);

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            debug!(
                batch = batch_index + 1,
                batches = batch_count,
                size = batch.len(),
                "Enriching batch"
            );

            let calls = batch
                .iter()
                .enumerate()
                .map(|(i, chunk)| self.enrich(chunk, offset + i, source_document));
            enriched.extend(join_all(calls).await);

            if batch_index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        enriched
    }

    fn mode(&self) -> EnrichmentMode {
        EnrichmentMode::Llm
    }
}
