use async_trait::async_trait;
use std::fmt::Debug;

use super::{MetadataFilter, VectorMatch, VectorQuery, VectorRecord};
use crate::domain::DomainError;

/// Largest `top_k` a single query may request
pub const MAX_QUERY_TOP_K: usize = 10_000;

/// Namespaced vector store. There is no delete-by-filter: callers query
/// matching IDs first, then delete by ID.
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Insert or overwrite records by ID; returns the number written
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<usize, DomainError>;

    async fn query(&self, namespace: &str, query: VectorQuery) -> Result<Vec<VectorMatch>, DomainError>;

    async fn delete(&self, namespace: &str, ids: &[String]) -> Result<(), DomainError>;

    /// Number of vectors stored in the namespace
    async fn count(&self, namespace: &str) -> Result<usize, DomainError>;

    fn provider_name(&self) -> &'static str;
}

/// Non-zero vector used to enumerate IDs under a filter
pub fn listing_vector(dimensions: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimensions.max(1)];
    v[0] = 1.0;
    v
}

/// IDs of every vector whose `source_document` is `document_name`
pub async fn document_vector_ids(
    index: &dyn VectorIndex,
    namespace: &str,
    document_name: &str,
    dimensions: usize,
) -> Result<Vec<String>, DomainError> {
    let query = VectorQuery::new(listing_vector(dimensions), MAX_QUERY_TOP_K)
        .with_filter(MetadataFilter::source_document(document_name))
        .ids_only();

    let matches = index.query(namespace, query).await?;
    Ok(matches.into_iter().map(|m| m.id).collect())
}

/// Delete every vector of a document; returns how many were removed
pub async fn delete_document_vectors(
    index: &dyn VectorIndex,
    namespace: &str,
    document_name: &str,
    dimensions: usize,
) -> Result<usize, DomainError> {
    let ids = document_vector_ids(index, namespace, document_name, dimensions).await?;

    if ids.is_empty() {
        return Ok(0);
    }

    index.delete(namespace, &ids).await?;
    Ok(ids.len())
}
