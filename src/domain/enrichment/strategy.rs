use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;

use super::EnrichedChunk;
use crate::domain::ingestion::Chunk;
use crate::domain::DomainError;

/// Which enrichment strategy a pipeline uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentMode {
    Llm,
    #[default]
    #[serde(alias = "rule-based")]
    RuleBased,
    None,
}

impl EnrichmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::RuleBased => "rule_based",
            Self::None => "none",
        }
    }
}

impl fmt::Display for EnrichmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrichmentMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "llm" => Ok(Self::Llm),
            "rule_based" => Ok(Self::RuleBased),
            "none" | "off" => Ok(Self::None),
            other => Err(DomainError::configuration(format!(
                "Unknown enrichment mode '{}'",
                other
            ))),
        }
    }
}

/// Attaches contextual metadata to chunks.
///
/// Implementations never fail: a provider error yields an `EnrichedChunk`
/// with empty enrichment fields and `enrichment_failed` set.
#[async_trait]
pub trait EnrichmentStrategy: Send + Sync + Debug {
    async fn enrich(&self, chunk: &Chunk, position: usize, source_document: &str) -> EnrichedChunk;

    /// Enrich an ordered chunk list; output position `i` describes input `i`.
    async fn enrich_all(&self, chunks: &[Chunk], source_document: &str) -> Vec<EnrichedChunk> {
        let mut enriched = Vec::with_capacity(chunks.len());
        for (position, chunk) in chunks.iter().enumerate() {
            enriched.push(self.enrich(chunk, position, source_document).await);
        }
        enriched
    }

    fn mode(&self) -> EnrichmentMode;
}
