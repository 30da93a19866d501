//! Clause summary extraction through a chat model

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::json::{parse_json_payload, strip_nulls};
use crate::domain::enrichment::ClauseType;
use crate::domain::lease::{ClauseExtractor, ExtractedClause};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::DomainError;

const SYSTEM_PROMPT: &str = "You summarise the key clauses of commercial lease agreements. Reply with a JSON object.";

#[derive(Debug)]
pub struct LlmClauseExtractor {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
}

impl LlmClauseExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 3000,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_prompt(&self, text: &str) -> String {
        format!(
            "Return {{\"clauses\": [{{\"clause_type\", \"article_reference\", \"summary\", \"key_terms\"}}]}}.\n\
             clause_type is one of: {}\n\nLease:\n{}",
            ClauseType::label_list(),
            text
        )
    }
}

/// Accepts `{"clauses": [...]}` or a bare array. Items that do not fit are
/// skipped.
pub fn parse_clause_response(content: &str) -> Result<Vec<ExtractedClause>, DomainError> {
    let value = strip_nulls(parse_json_payload(content)?);

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("clauses") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(DomainError::extraction(
                    "Clause response has no 'clauses' list",
                ))
            }
        },
        _ => return Err(DomainError::extraction("Clause response is not a list")),
    };

    let clauses = items
        .into_iter()
        .map(flatten_key_terms)
        .filter_map(|item| match serde_json::from_value::<ExtractedClause>(item) {
            Ok(clause) if !clause.summary.trim().is_empty() => Some(clause),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Skipping malformed clause");
                None
            }
        })
        .collect();

    Ok(clauses)
}

/// `key_terms` sometimes arrives as a list
fn flatten_key_terms(mut item: Value) -> Value {
    if let Some(Value::Array(terms)) = item.get("key_terms") {
        let joined = terms
            .iter()
            .map(|t| match t {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        item["key_terms"] = Value::String(joined);
    }
    item
}

#[async_trait]
impl ClauseExtractor for LlmClauseExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<ExtractedClause>, DomainError> {
        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(self.build_prompt(text))
            .temperature(0.0)
            .max_tokens(self.max_tokens)
            .json_object()
            .build();

        let response = self
            .provider
            .chat(&self.model, request)
            .await
            .map_err(|e| DomainError::extraction(format!("Clause extraction call failed: {}", e)))?;

        let clauses = parse_clause_response(response.content())?;
        debug!(clauses = clauses.len(), "Extracted clauses");

        Ok(clauses)
    }
}
