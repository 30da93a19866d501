//! Helpers for JSON returned by chat models

use serde_json::Value;

use crate::domain::DomainError;

/// Remove a surrounding markdown code fence, with or without a language tag
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

/// Outermost JSON object or array in the text
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;

    (start < end).then(|| &text[start..=end])
}

/// Parse a model response into JSON, tolerating fences and surrounding prose
pub fn parse_json_payload(text: &str) -> Result<Value, DomainError> {
    let stripped = strip_code_fences(text);
    let candidate = extract_json(stripped).unwrap_or(stripped);

    serde_json::from_str(candidate).map_err(|e| {
        DomainError::extraction(format!("Model response is not valid JSON: {}", e))
    })
}

/// Drop `null` members so serde defaults apply to them
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
