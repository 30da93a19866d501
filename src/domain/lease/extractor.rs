use async_trait::async_trait;

use super::{ExtractedClause, Lease};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Extracts the structured lease record from document text
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LeaseExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Lease, DomainError>;
}

/// Extracts per-clause summaries for comparison views
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClauseExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<ExtractedClause>, DomainError>;
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn extraction_window(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enrichment::ClauseType;

    #[test]
    fn test_extraction_window_respects_char_boundaries() {
        let text = "Bail à loyer";
        assert_eq!(extraction_window(text, 6), "Bail à");
        assert_eq!(extraction_window(text, 100), text);
        assert_eq!(extraction_window(text, 0), "");
    }

    #[tokio::test]
    async fn test_mock_lease_extractor() {
        let mut mock = MockLeaseExtractor::new();
        mock.expect_extract()
            .returning(|_| Ok(Lease::new("Tenant Inc.", "Landlord Ltd.")));

        let lease = mock.extract("lease text").await.unwrap();
        assert_eq!(lease.tenant_name, "Tenant Inc.");
    }

    #[tokio::test]
    async fn test_mock_clause_extractor() {
        let mut mock = MockClauseExtractor::new();
        mock.expect_extract().returning(|_| {
            Ok(vec![ExtractedClause::new(ClauseType::Insurance, "Tenant carries $5M CGL.")])
        });

        let clauses = mock.extract("lease text").await.unwrap();
        assert_eq!(clauses.len(), 1);
    }
}
