//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for embedding providers.
///
/// A response must carry exactly one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder; calls can be made to fail by content or
    /// by call count.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        dimensions: usize,
        fail_marker: Option<String>,
        fail_first_calls: usize,
        short_response: bool,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                fail_marker: None,
                fail_first_calls: 0,
                short_response: false,
                calls: AtomicUsize::new(0),
            }
        }

        /// Fail every batch containing an input with `marker`
        pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
            self.fail_marker = Some(marker.into());
            self
        }

        /// Fail the first `n` calls, then succeed
        pub fn failing_first(mut self, n: usize) -> Self {
            self.fail_first_calls = n;
            self
        }

        /// Return one vector fewer than requested
        pub fn with_short_response(mut self) -> Self {
            self.short_response = true;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn vector_for(&self, text: &str) -> Vec<f32> {
            let hash = text.bytes().fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64 * 17) % 1000) as f32 / 1000.0) + 0.001)
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            if call < self.fail_first_calls {
                return Err(DomainError::provider("mock", "HTTP 503: unavailable"));
            }

            if let Some(ref marker) = self.fail_marker {
                if request.inputs().iter().any(|t| t.contains(marker.as_str())) {
                    return Err(DomainError::provider("mock", "HTTP 500: batch rejected"));
                }
            }

            let mut vectors: Vec<Vec<f32>> =
                request.inputs().iter().map(|t| self.vector_for(t)).collect();

            if self.short_response {
                vectors.pop();
            }

            Ok(EmbeddingResponse::new(request.model(), vectors))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_batch() {
            let provider = MockEmbeddingProvider::new(8);
            let request = EmbeddingRequest::new("m", vec!["Hello".into(), "World".into()]);

            let response = provider.embed(request).await.unwrap();

            assert_eq!(response.len(), 2);
            assert_eq!(response.vectors()[0].len(), 8);
        }

        #[tokio::test]
        async fn test_mock_provider_marker_failure() {
            let provider = MockEmbeddingProvider::new(8).failing_on("POISON");
            let request = EmbeddingRequest::new("m", vec!["ok".into(), "POISON pill".into()]);

            assert!(provider.embed(request).await.is_err());
        }

        #[tokio::test]
        async fn test_deterministic_embeddings() {
            let provider = MockEmbeddingProvider::new(16);
            let a = provider
                .embed(EmbeddingRequest::new("m", vec!["rent".into()]))
                .await
                .unwrap();
            let b = provider
                .embed(EmbeddingRequest::new("m", vec!["rent".into()]))
                .await
                .unwrap();

            assert_eq!(a.vectors(), b.vectors());
        }
    }
}
