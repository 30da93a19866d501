//! Metadata filtering for vector index queries

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Filter over vector metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFilter {
    /// Field equals value
    Eq { field: String, value: Value },
    /// Field equals any of the values
    In { field: String, values: Vec<Value> },
    /// Every nested filter matches
    And(Vec<MetadataFilter>),
}

impl MetadataFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Combine with another filter under AND, flattening nested ANDs
    pub fn and(self, other: MetadataFilter) -> Self {
        match (self, other) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (first, second) => Self::And(vec![first, second]),
        }
    }

    /// Filter selecting every vector of one source document
    pub fn source_document(document_name: impl Into<String>) -> Self {
        Self::eq("source_document", Value::String(document_name.into()))
    }

    /// Evaluate against a metadata map
    pub fn matches(&self, metadata: &HashMap<String, Value>) -> bool {
        match self {
            Self::Eq { field, value } => metadata.get(field) == Some(value),
            Self::In { field, values } => metadata
                .get(field)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            Self::And(filters) => filters.iter().all(|f| f.matches(metadata)),
        }
    }

    /// Render in the Pinecone filter language (`$eq`, `$in`, `$and`)
    pub fn to_pinecone(&self) -> Value {
        let condition = |field: &str, op: &str, operand: Value| {
            let mut inner = serde_json::Map::new();
            inner.insert(op.to_string(), operand);
            let mut outer = serde_json::Map::new();
            outer.insert(field.to_string(), Value::Object(inner));
            Value::Object(outer)
        };

        match self {
            Self::Eq { field, value } => condition(field, "$eq", value.clone()),
            Self::In { field, values } => condition(field, "$in", Value::Array(values.clone())),
            Self::And(filters) => {
                let parts: Vec<Value> = filters.iter().map(|f| f.to_pinecone()).collect();
                serde_json::json!({ "$and": parts })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> HashMap<String, Value> {
        HashMap::from([
            ("source_document".to_string(), Value::from("lease.pdf")),
            ("clause_type".to_string(), Value::from("rent_payment")),
        ])
    }

    #[test]
    fn test_eq_matches() {
        assert!(MetadataFilter::source_document("lease.pdf").matches(&metadata()));
        assert!(!MetadataFilter::source_document("other.pdf").matches(&metadata()));
        assert!(!MetadataFilter::eq("missing", "x").matches(&metadata()));
    }

    #[test]
    fn test_and_flattens_and_matches() {
        let filter = MetadataFilter::source_document("lease.pdf")
            .and(MetadataFilter::eq("clause_type", "rent_payment"))
            .and(MetadataFilter::is_in(
                "clause_type",
                vec![Value::from("rent_payment"), Value::from("insurance")],
            ));

        match &filter {
            MetadataFilter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
        assert!(filter.matches(&metadata()));
    }

    #[test]
    fn test_to_pinecone() {
        let filter = MetadataFilter::source_document("lease.pdf");
        assert_eq!(
            filter.to_pinecone(),
            serde_json::json!({"source_document": {"$eq": "lease.pdf"}})
        );

        let combined = filter.and(MetadataFilter::eq("clause_type", "insurance"));
        assert_eq!(
            combined.to_pinecone(),
            serde_json::json!({"$and": [
                {"source_document": {"$eq": "lease.pdf"}},
                {"clause_type": {"$eq": "insurance"}}
            ]})
        );
    }
}
