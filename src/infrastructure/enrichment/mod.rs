//! Enrichment strategy implementations

mod factory;
mod llm;
mod passthrough;
mod rule_based;

pub use factory::EnrichmentFactory;
pub use llm::{parse_enrichment_response, LlmEnrichment};
pub use passthrough::PassthroughEnrichment;
pub use rule_based::RuleBasedEnrichment;
