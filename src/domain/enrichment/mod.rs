//! Chunk enrichment domain types and the strategy trait

mod entity;
mod strategy;

pub use entity::{ClauseType, EnrichedChunk, Enrichment};
pub use strategy::{EnrichmentMode, EnrichmentStrategy};

#[cfg(test)]
pub use strategy::mock::MockEnrichmentStrategy;
