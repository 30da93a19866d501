//! Keyword and pattern based enrichment, no external calls

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::enrichment::{
    ClauseType, EnrichedChunk, Enrichment, EnrichmentMode, EnrichmentStrategy,
};
use crate::domain::ingestion::Chunk;

static CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s?\d[\d,]*(?:\.\d{1,2})?").unwrap());

static PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:%|percent\b)").unwrap());

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}|\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2})\b")
        .unwrap()
});

static AREA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d[\d,]*(?:\.\d+)?\s*(?:square\s+feet|sq\.?\s*ft\b\.?|sf\b)").unwrap()
});

/// Checked in order; the first clause type with a hit wins. Each keyword
/// matches as a whole word, optionally pluralised.
const KEYWORDS: &[(ClauseType, &[&str])] = &[
    (ClauseType::Definitions, &["definition", "interpretation", "defined terms"]),
    (ClauseType::PartiesRecitals, &["parties", "recital", "witnesseth", "basic terms"]),
    (ClauseType::SecurityDeposit, &["deposit", "security", "letter of credit"]),
    (ClauseType::Termination, &["termination", "terminate", "terminated", "surrender", "overholding", "holding over"]),
    (ClauseType::RentPayment, &["rent", "additional rent", "payment", "operating costs", "taxes"]),
    (ClauseType::TermRenewal, &["term", "renewal", "extension", "commencement", "option to renew"]),
    (ClauseType::MaintenanceRepairs, &["repair", "maintenance", "alteration", "improvement"]),
    (ClauseType::Insurance, &["insurance", "insure", "liability coverage"]),
    (ClauseType::Indemnification, &["indemnity", "indemnification", "indemnify", "hold harmless", "release"]),
    (ClauseType::DefaultRemedies, &["default", "remedies", "re-entry", "distress", "bankruptcy"]),
    (ClauseType::AssignmentSubletting, &["assign", "assignment", "sublet", "sublease", "transfer"]),
    (ClauseType::UseRestrictions, &["use of premises", "permitted use", "exclusive", "radius", "restriction"]),
    (ClauseType::Environmental, &["environmental", "hazardous", "contaminant"]),
    (ClauseType::SchedulesExhibits, &["schedule", "exhibit", "appendix"]),
    (ClauseType::GeneralProvisions, &["notice", "general", "miscellaneous", "governing law", "entire agreement"]),
];

type KeywordPatterns = Vec<(ClauseType, Vec<(&'static str, Regex)>)>;

static KEYWORD_PATTERNS: Lazy<KeywordPatterns> = Lazy::new(|| {
    KEYWORDS
        .iter()
        .map(|(clause_type, words)| {
            let patterns = words
                .iter()
                .map(|w| {
                    let pattern = format!(r"(?i)\b{}(?:s|es)?\b", regex::escape(w));
                    (*w, Regex::new(&pattern).unwrap())
                })
                .collect();
            (*clause_type, patterns)
        })
        .collect()
});

/// Leading content characters inspected when headers give no match
const CONTENT_PREFIX_CHARS: usize = 300;

const MAX_ENTITIES: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct RuleBasedEnrichment;

impl RuleBasedEnrichment {
    pub fn new() -> Self {
        Self
    }

    /// Clause type and the keywords that matched
    pub fn classify(&self, chunk: &Chunk) -> (ClauseType, Vec<&'static str>) {
        let metadata = chunk.metadata();
        let headers = [metadata.article.as_deref(), metadata.section.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if let Some(hit) = match_keywords(&headers) {
            return hit;
        }

        let prefix: String = chunk
            .content()
            .chars()
            .take(CONTENT_PREFIX_CHARS)
            .collect::<String>()
            .to_lowercase();

        match_keywords(&prefix).unwrap_or((ClauseType::Other, Vec::new()))
    }

    pub fn extract_entities(&self, text: &str) -> Vec<String> {
        let mut entities: Vec<String> = Vec::new();

        for pattern in [&*CURRENCY, &*PERCENTAGE, &*DATE, &*AREA] {
            for m in pattern.find_iter(text) {
                let entity = m.as_str().trim().to_string();
                if !entities.contains(&entity) {
                    entities.push(entity);
                }
            }
        }

        entities.truncate(MAX_ENTITIES);
        entities
    }

    fn summarize(&self, chunk: &Chunk, clause_type: ClauseType, source_document: &str) -> Option<String> {
        let metadata = chunk.metadata();
        let location = match (metadata.article.as_deref(), metadata.section.as_deref()) {
            (Some(article), Some(section)) => format!("{} ({})", section, article),
            (Some(label), None) | (None, Some(label)) => label.to_string(),
            (None, None) => return None,
        };

        Some(format!(
            "{} of {}, covering {}.",
            location,
            source_document,
            clause_type.as_str().replace('_', " ")
        ))
    }
}

fn match_keywords(text: &str) -> Option<(ClauseType, Vec<&'static str>)> {
    if text.trim().is_empty() {
        return None;
    }

    KEYWORD_PATTERNS.iter().find_map(|(clause_type, patterns)| {
        let hits: Vec<&'static str> = patterns
            .iter()
            .filter(|(_, pattern)| pattern.is_match(text))
            .map(|(word, _)| *word)
            .collect();
        (!hits.is_empty()).then_some((*clause_type, hits))
    })
}

#[async_trait]
impl EnrichmentStrategy for RuleBasedEnrichment {
    async fn enrich(&self, chunk: &Chunk, position: usize, source_document: &str) -> EnrichedChunk {
        let (clause_type, keywords) = self.classify(chunk);

        let mut tags = vec![clause_type.as_str().to_string()];
        tags.extend(keywords.into_iter().map(str::to_string));

        let mut enrichment = Enrichment::default()
            .with_tags(tags)
            .with_entities(self.extract_entities(chunk.content()))
            .with_clause_type(clause_type);

        if let Some(summary) = self.summarize(chunk, clause_type, source_document) {
            enrichment = enrichment.with_summary(summary);
        }

        EnrichedChunk::from_chunk(chunk.clone(), position, source_document).with_enrichment(enrichment)
    }

    fn mode(&self) -> EnrichmentMode {
        EnrichmentMode::RuleBased
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::ChunkMetadata;

    fn chunk(article: Option<&str>, section: Option<&str>, content: &str) -> Chunk {
        let mut metadata = ChunkMetadata::new();
        metadata.article = article.map(str::to_string);
        metadata.section = section.map(str::to_string);
        Chunk::new(content, metadata)
    }

    #[test]
    fn test_classify_by_header() {
        let strategy = RuleBasedEnrichment::new();

        let c = chunk(Some("ARTICLE 4 - RENT"), Some("4.01 Basic Rent"), "The Tenant shall pay.");
        assert_eq!(strategy.classify(&c).0, ClauseType::RentPayment);

        let c = chunk(Some("ARTICLE 9 - INSURANCE"), None, "Coverage text.");
        assert_eq!(strategy.classify(&c).0, ClauseType::Insurance);

        let c = chunk(None, Some("12.03 Assignment by Tenant"), "");
        assert_eq!(strategy.classify(&c).0, ClauseType::AssignmentSubletting);
    }

    #[test]
    fn test_classify_termination_before_term() {
        let strategy = RuleBasedEnrichment::new();
        let c = chunk(
            Some("ARTICLE 14 - TERMINATION"),
            Some("14.01 Termination by Landlord"),
            "The Landlord may end this Lease on notice.",
        );

        let (clause_type, keywords) = strategy.classify(&c);
        assert_eq!(clause_type, ClauseType::Termination);
        assert_eq!(keywords, vec!["termination"]);

        let c = chunk(Some("ARTICLE 3 - TERM"), Some("3.02 Renewal Option"), "");
        assert_eq!(strategy.classify(&c), (ClauseType::TermRenewal, vec!["term", "renewal"]));
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let strategy = RuleBasedEnrichment::new();
        let c = chunk(
            Some("ARTICLE 8 - CURRENT EXPENSES"),
            None,
            "Different parent companies may share current expenses.",
        );
        assert_eq!(strategy.classify(&c).0, ClauseType::Other);

        let c = chunk(None, Some("4.02 Rents Payable"), "");
        assert_eq!(strategy.classify(&c), (ClauseType::RentPayment, vec!["rent"]));
    }

    #[test]
    fn test_classify_falls_back_to_content() {
        let strategy = RuleBasedEnrichment::new();
        let c = chunk(None, None, "The Tenant shall not store any hazardous substances on site.");

        let (clause_type, keywords) = strategy.classify(&c);
        assert_eq!(clause_type, ClauseType::Environmental);
        assert_eq!(keywords, vec!["hazardous"]);
    }

    #[test]
    fn test_classify_unknown_is_other() {
        let strategy = RuleBasedEnrichment::new();
        let c = chunk(Some("SIGNATURES"), None, "IN WITNESS whereof");
        assert_eq!(strategy.classify(&c).0, ClauseType::Other);
    }

    #[test]
    fn test_extract_entities() {
        let strategy = RuleBasedEnrichment::new();
        let text = "Basic Rent of $25.50 per square foot on 2,450 square feet, escalating 3% on July 1, 2021 and again on 07/01/2022. Deposit $10,000.";

        let entities = strategy.extract_entities(text);
        assert_eq!(
            entities,
            vec!["$25.50", "$10,000", "3%", "July 1, 2021", "07/01/2022", "2,450 square feet"]
        );
    }

    #[tokio::test]
    async fn test_enrich_fills_fields() {
        let strategy = RuleBasedEnrichment::new();
        let c = chunk(
            Some("ARTICLE 5 - SECURITY DEPOSIT"),
            Some("5.01 Deposit"),
            "The Tenant has paid a deposit of $5,000.",
        );

        let enriched = strategy.enrich(&c, 2, "plaza.pdf").await;

        assert_eq!(enriched.chunk_index, 2);
        assert_eq!(enriched.clause_type(), ClauseType::SecurityDeposit);
        assert_eq!(enriched.enrichment.semantic_tags[0], "security_deposit");
        assert_eq!(enriched.enrichment.key_entities, vec!["$5,000"]);
        assert_eq!(
            enriched.enrichment.contextual_summary.as_deref(),
            Some("5.01 Deposit (ARTICLE 5 - SECURITY DEPOSIT) of plaza.pdf, covering security deposit.")
        );
        assert!(!enriched.enrichment_failed);
    }

    #[tokio::test]
    async fn test_enrich_without_headers_has_no_summary() {
        let strategy = RuleBasedEnrichment::new();
        let enriched = strategy.enrich(&chunk(None, None, "Preamble"), 0, "plaza.pdf").await;

        assert!(enriched.enrichment.contextual_summary.is_none());
        assert_eq!(enriched.enriched_content(), "Preamble");
    }
}
