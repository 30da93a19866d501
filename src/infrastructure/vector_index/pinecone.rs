//! Pinecone REST vector index

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::vector_index::{VectorIndex, VectorMatch, VectorQuery, VectorRecord};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

/// Data-plane client for one Pinecone index, addressed by its host URL
#[derive(Debug)]
pub struct PineconeVectorIndex<C: HttpClientTrait> {
    client: C,
    api_key: String,
    host: String,
}

impl<C: HttpClientTrait> PineconeVectorIndex<C> {
    pub fn new(client: C, api_key: impl Into<String>, host: impl Into<String>) -> Self {
        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        Self {
            client,
            api_key: api_key.into(),
            host: host.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Api-Key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, DomainError> {
        self.client
            .post_json(&self.url(path), self.headers(), &body)
            .await
            .map_err(|e| DomainError::vector_index(format!("pinecone {}: {}", path, e)))
    }
}

#[async_trait]
impl<C: HttpClientTrait> VectorIndex for PineconeVectorIndex<C> {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> Result<usize, DomainError> {
        if records.is_empty() {
            return Ok(0);
        }

        let expected = records.len();
        let body = json!({ "vectors": records, "namespace": namespace });
        let response: UpsertResponse = parse(self.post("/vectors/upsert", body).await?)?;

        Ok(response.upserted_count.unwrap_or(expected))
    }

    async fn query(&self, namespace: &str, query: VectorQuery) -> Result<Vec<VectorMatch>, DomainError> {
        let mut body = json!({
            "vector": query.vector,
            "topK": query.top_k,
            "namespace": namespace,
            "includeMetadata": query.include_metadata,
            "includeValues": false,
        });

        if let Some(filter) = &query.filter {
            body["filter"] = filter.to_pinecone();
        }

        let response: QueryResponse = parse(self.post("/query", body).await?)?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| VectorMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }

    async fn delete(&self, namespace: &str, ids: &[String]) -> Result<(), DomainError> {
        // Pinecone caps deletes at 1000 IDs per request
        for batch in ids.chunks(1000) {
            self.post("/vectors/delete", json!({ "ids": batch, "namespace": namespace }))
                .await?;
        }
        Ok(())
    }

    async fn count(&self, namespace: &str) -> Result<usize, DomainError> {
        let response: StatsResponse = parse(self.post("/describe_index_stats", json!({})).await?)?;

        Ok(response
            .namespaces
            .get(namespace)
            .map(|ns| ns.vector_count)
            .unwrap_or(0))
    }

    fn provider_name(&self) -> &'static str {
        "pinecone"
    }
}

fn parse<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, DomainError> {
    serde_json::from_value(value)
        .map_err(|e| DomainError::vector_index(format!("Unexpected pinecone response: {}", e)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Debug, Deserialize)]
struct PineconeMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}
