//! In-memory vector index for development and testing

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::embedding::cosine_similarity;
use crate::domain::vector_index::{VectorIndex, VectorMatch, VectorQuery, VectorRecord};
use crate::domain::DomainError;

type Namespace = HashMap<String, VectorRecord>;

/// Brute-force cosine search over namespaced records
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorIndex {
    namespaces: Arc<RwLock<HashMap<String, Namespace>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, namespace: &str, id: &str) -> Option<VectorRecord> {
        let namespaces = self.namespaces.read().await;
        namespaces.get(namespace).and_then(|ns| ns.get(id)).cloned()
    }

    pub async fn ids(&self, namespace: &str) -> Vec<String> {
        let namespaces = self.namespaces.read().await;
        let mut ids: Vec<String> = namespaces
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<usize, DomainError> {
        let mut namespaces = self.namespaces.write().await;
        let ns = namespaces.entry(namespace.to_string()).or_default();
        let count = records.len();

        for record in records {
            ns.insert(record.id.clone(), record);
        }

        Ok(count)
    }

    async fn query(&self, namespace: &str, query: VectorQuery) -> Result<Vec<VectorMatch>, DomainError> {
        let namespaces = self.namespaces.read().await;
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<VectorMatch> = ns
            .values()
            .filter(|r| query.filter.as_ref().is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| VectorMatch {
                id: r.id.clone(),
                score: cosine_similarity(&query.vector, &r.values),
                metadata: if query.include_metadata {
                    r.metadata.clone()
                } else {
                    HashMap::new()
                },
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(query.top_k);

        Ok(matches)
    }

    async fn delete(&self, namespace: &str, ids: &[String]) -> Result<(), DomainError> {
        let mut namespaces = self.namespaces.write().await;

        if let Some(ns) = namespaces.get_mut(namespace) {
            for id in ids {
                ns.remove(id);
            }
        }

        Ok(())
    }

    async fn count(&self, namespace: &str) -> Result<usize, DomainError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.get(namespace).map(|ns| ns.len()).unwrap_or(0))
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vector_index::{delete_document_vectors, MetadataFilter};

    fn record(id: &str, values: Vec<f32>, document: &str) -> VectorRecord {
        VectorRecord::new(id, values).with_metadata("source_document", document)
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let index = InMemoryVectorIndex::new();

        index.upsert("ns", vec![record("a", vec![1.0, 0.0], "x.pdf")]).await.unwrap();
        index.upsert("ns", vec![record("a", vec![0.0, 1.0], "x.pdf")]).await.unwrap();

        assert_eq!(index.count("ns").await.unwrap(), 1);
        assert_eq!(index.get("ns", "a").await.unwrap().values, vec![0.0, 1.0]);
        assert_eq!(index.count("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_ranks_and_filters() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(
                "ns",
                vec![
                    record("a", vec![1.0, 0.0], "x.pdf"),
                    record("b", vec![0.7, 0.7], "x.pdf"),
                    record("c", vec![1.0, 0.0], "y.pdf"),
                ],
            )
            .await
            .unwrap();

        let matches = index
            .query(
                "ns",
                VectorQuery::new(vec![1.0, 0.0], 10).with_filter(MetadataFilter::source_document("x.pdf")),
            )
            .await
            .unwrap();

        let ids: Vec<_> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(matches[0].score > matches[1].score);
        assert_eq!(matches[0].metadata["source_document"], "x.pdf");
    }

    #[tokio::test]
    async fn test_ids_only_and_top_k() {
        let index = InMemoryVectorIndex::new();
        let records = (0..5).map(|i| record(&format!("r{}", i), vec![1.0, i as f32], "x.pdf")).collect();
        index.upsert("ns", records).await.unwrap();

        let matches = index.query("ns", VectorQuery::new(vec![1.0, 0.0], 2).ids_only()).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.metadata.is_empty()));
    }

    #[tokio::test]
    async fn test_delete_document_vectors() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(
                "ns",
                vec![
                    record("x_chunk_0", vec![0.0, 0.0], "x.pdf"),
                    record("x_chunk_1", vec![1.0, 0.0], "x.pdf"),
                    record("y_chunk_0", vec![1.0, 0.0], "y.pdf"),
                ],
            )
            .await
            .unwrap();

        let deleted = delete_document_vectors(&index, "ns", "x.pdf", 2).await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(index.ids("ns").await, vec!["y_chunk_0"]);
    }
}
