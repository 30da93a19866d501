//! Embedding request types

use serde::{Deserialize, Serialize};

/// Request to embed a batch of texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    /// Output dimensions, for models that support truncation
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.input
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_without_dimensions() {
        let request = EmbeddingRequest::new("text-embedding-3-small", vec!["a".into(), "b".into()]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["input"], serde_json::json!(["a", "b"]));
        assert!(json.get("dimensions").is_none());
        assert_eq!(request.len(), 2);
    }

    #[test]
    fn test_request_with_dimensions() {
        let request = EmbeddingRequest::new("text-embedding-3-large", vec!["a".into()])
            .with_dimensions(1024);

        assert_eq!(request.dimensions(), Some(1024));
    }
}
