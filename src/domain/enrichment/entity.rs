use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ingestion::{Chunk, ChunkMetadata};

/// Lease clause categories used for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    Definitions,
    RentPayment,
    SecurityDeposit,
    MaintenanceRepairs,
    Insurance,
    DefaultRemedies,
    Termination,
    AssignmentSubletting,
    UseRestrictions,
    Environmental,
    Indemnification,
    GeneralProvisions,
    SchedulesExhibits,
    PartiesRecitals,
    TermRenewal,
    #[default]
    Other,
}

impl ClauseType {
    pub const ALL: [ClauseType; 16] = [
        Self::Definitions,
        Self::RentPayment,
        Self::SecurityDeposit,
        Self::MaintenanceRepairs,
        Self::Insurance,
        Self::DefaultRemedies,
        Self::Termination,
        Self::AssignmentSubletting,
        Self::UseRestrictions,
        Self::Environmental,
        Self::Indemnification,
        Self::GeneralProvisions,
        Self::SchedulesExhibits,
        Self::PartiesRecitals,
        Self::TermRenewal,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definitions => "definitions",
            Self::RentPayment => "rent_payment",
            Self::SecurityDeposit => "security_deposit",
            Self::MaintenanceRepairs => "maintenance_repairs",
            Self::Insurance => "insurance",
            Self::DefaultRemedies => "default_remedies",
            Self::Termination => "termination",
            Self::AssignmentSubletting => "assignment_subletting",
            Self::UseRestrictions => "use_restrictions",
            Self::Environmental => "environmental",
            Self::Indemnification => "indemnification",
            Self::GeneralProvisions => "general_provisions",
            Self::SchedulesExhibits => "schedules_exhibits",
            Self::PartiesRecitals => "parties_recitals",
            Self::TermRenewal => "term_renewal",
            Self::Other => "other",
        }
    }

    /// Lenient parse of a model-produced label; unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label
            .trim()
            .trim_matches(|c: char| c == '[' || c == ']' || c == '"' || c == '\'')
            .trim()
            .to_lowercase()
            .replace([' ', '-', '/'], "_");

        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .unwrap_or(Self::Other)
    }

    /// Comma-separated label list for prompts
    pub fn label_list() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ClauseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contextual fields attached to a chunk by an enrichment strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contextual_summary: Option<String>,
    #[serde(default)]
    pub semantic_tags: Vec<String>,
    #[serde(default)]
    pub key_entities: Vec<String>,
    #[serde(default)]
    pub clause_type: ClauseType,
}

impl Enrichment {
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.contextual_summary = if summary.trim().is_empty() {
            None
        } else {
            Some(summary)
        };
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.semantic_tags = tags;
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.key_entities = entities;
        self
    }

    pub fn with_clause_type(mut self, clause_type: ClauseType) -> Self {
        self.clause_type = clause_type;
        self
    }
}

/// A chunk decorated with position, provenance and enrichment
#[derive(Debug, Clone)]
pub struct EnrichedChunk {
    chunk: Chunk,
    pub chunk_index: usize,
    pub source_document: String,
    pub source_section: Option<String>,
    pub char_start: usize,
    pub char_end: usize,
    pub page_numbers: Vec<u32>,
    pub enrichment: Enrichment,
    /// Set when the strategy fell back to empty fields after a provider error
    pub enrichment_failed: bool,
}

impl EnrichedChunk {
    pub fn from_chunk(chunk: Chunk, position: usize, source_document: impl Into<String>) -> Self {
        let source_section = chunk.metadata().source_section().map(str::to_string);

        Self {
            chunk,
            chunk_index: position,
            source_document: source_document.into(),
            source_section,
            char_start: 0,
            char_end: 0,
            page_numbers: Vec::new(),
            enrichment: Enrichment::default(),
            enrichment_failed: false,
        }
    }

    pub fn with_enrichment(mut self, enrichment: Enrichment) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn mark_failed(mut self) -> Self {
        self.enrichment = Enrichment::default();
        self.enrichment_failed = true;
        self
    }

    pub fn with_location(mut self, char_start: usize, char_end: usize, page_numbers: Vec<u32>) -> Self {
        self.char_start = char_start;
        self.char_end = char_end;
        self.page_numbers = page_numbers;
        self
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn content(&self) -> &str {
        self.chunk.content()
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        self.chunk.metadata()
    }

    pub fn token_count(&self) -> usize {
        self.chunk.token_count()
    }

    pub fn clause_type(&self) -> ClauseType {
        self.enrichment.clause_type
    }

    /// Text sent to the embedding model: summary, blank line, content.
    pub fn enriched_content(&self) -> String {
        match self.enrichment.contextual_summary.as_deref() {
            Some(summary) if !summary.trim().is_empty() => {
                format!("{}\n\n{}", summary, self.chunk.content())
            }
            _ => self.chunk.content().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Chunk {
        Chunk::new(
            "## 4.01 Basic Rent\n\nThe Tenant shall pay Basic Rent monthly.",
            ChunkMetadata::new()
                .with_article("# ARTICLE 4 - RENT")
                .with_section("## 4.01 Basic Rent"),
        )
    }

    #[test]
    fn test_clause_type_from_label() {
        assert_eq!(ClauseType::from_label("rent_payment"), ClauseType::RentPayment);
        assert_eq!(ClauseType::from_label("[Rent Payment]"), ClauseType::RentPayment);
        assert_eq!(ClauseType::from_label("assignment-subletting"), ClauseType::AssignmentSubletting);
        assert_eq!(ClauseType::from_label("weather"), ClauseType::Other);
    }

    #[test]
    fn test_clause_type_serde() {
        let json = serde_json::to_string(&ClauseType::MaintenanceRepairs).unwrap();
        assert_eq!(json, "\"maintenance_repairs\"");
    }

    #[test]
    fn test_enriched_content_with_summary() {
        let enriched = EnrichedChunk::from_chunk(chunk(), 0, "lease.pdf")
            .with_enrichment(Enrichment::default().with_summary("This clause sets rent."));

        assert_eq!(
            enriched.enriched_content(),
            "This clause sets rent.\n\n## 4.01 Basic Rent\n\nThe Tenant shall pay Basic Rent monthly."
        );
    }

    #[test]
    fn test_enriched_content_without_summary() {
        let enriched = EnrichedChunk::from_chunk(chunk(), 0, "lease.pdf")
            .with_enrichment(Enrichment::default().with_summary("   "));

        assert_eq!(enriched.enriched_content(), enriched.content());
    }

    #[test]
    fn test_source_section_prefers_section() {
        let enriched = EnrichedChunk::from_chunk(chunk(), 3, "lease.pdf");
        assert_eq!(enriched.source_section.as_deref(), Some("## 4.01 Basic Rent"));
        assert_eq!(enriched.chunk_index, 3);
    }

    #[test]
    fn test_mark_failed_clears_fields() {
        let enriched = EnrichedChunk::from_chunk(chunk(), 0, "lease.pdf")
            .with_enrichment(Enrichment::default().with_clause_type(ClauseType::RentPayment))
            .mark_failed();

        assert!(enriched.enrichment_failed);
        assert_eq!(enriched.clause_type(), ClauseType::Other);
    }
}
