//! Enrichment strategy selection

use std::sync::Arc;

use crate::domain::enrichment::{EnrichmentMode, EnrichmentStrategy};
use crate::domain::ingestion::PipelineConfig;
use crate::domain::llm::LlmProvider;
use crate::domain::DomainError;

use super::{LlmEnrichment, PassthroughEnrichment, RuleBasedEnrichment};

/// Factory for enrichment strategies
#[derive(Debug, Default)]
pub struct EnrichmentFactory;

impl EnrichmentFactory {
    /// Build the strategy for `config.enrichment_mode`. LLM mode needs a
    /// provider and model.
    pub fn create(
        config: &PipelineConfig,
        llm: Option<(Arc<dyn LlmProvider>, String)>,
    ) -> Result<Arc<dyn EnrichmentStrategy>, DomainError> {
        match config.enrichment_mode {
            EnrichmentMode::Llm => {
                let (provider, model) = llm.ok_or_else(|| {
                    DomainError::configuration("LLM enrichment requires an LLM provider")
                })?;

                Ok(Arc::new(LlmEnrichment::new(provider, model).with_batching(
                    config.enrichment_batch_size,
                    config.enrichment_batch_delay(),
                )))
            }
            EnrichmentMode::RuleBased => Ok(Arc::new(RuleBasedEnrichment::new())),
            EnrichmentMode::None => Ok(Arc::new(PassthroughEnrichment::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockLlmProvider;

    #[test]
    fn test_create_by_mode() {
        let mut config = PipelineConfig::default();

        config.enrichment_mode = EnrichmentMode::RuleBased;
        let strategy = EnrichmentFactory::create(&config, None).unwrap();
        assert_eq!(strategy.mode(), EnrichmentMode::RuleBased);

        config.enrichment_mode = EnrichmentMode::None;
        let strategy = EnrichmentFactory::create(&config, None).unwrap();
        assert_eq!(strategy.mode(), EnrichmentMode::None);

        config.enrichment_mode = EnrichmentMode::Llm;
        let provider: Arc<dyn LlmProvider> = Arc::new(MockLlmProvider::new());
        let strategy =
            EnrichmentFactory::create(&config, Some((provider, "gpt-4o-mini".to_string()))).unwrap();
        assert_eq!(strategy.mode(), EnrichmentMode::Llm);
    }

    #[test]
    fn test_llm_mode_without_provider() {
        let config = PipelineConfig::default().with_enrichment_mode(EnrichmentMode::Llm);
        assert!(EnrichmentFactory::create(&config, None).is_err());
    }
}
