//! Model-backed lease and clause extractors

mod json;
mod llm_clause;
mod llm_lease;

pub use json::{parse_json_payload, strip_code_fences, strip_nulls};
pub use llm_clause::{parse_clause_response, LlmClauseExtractor};
pub use llm_lease::{parse_lease_response, LlmLeaseExtractor};
