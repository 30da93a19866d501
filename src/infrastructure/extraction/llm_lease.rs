//! Structured lease extraction through a chat model

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::json::{parse_json_payload, strip_nulls};
use crate::domain::lease::{Lease, LeaseExtractor};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::DomainError;

const SYSTEM_PROMPT: &str = "You extract structured data from commercial lease agreements. Reply with a single JSON object.";

const FIELDS: &str = "lease_date, tenant_name, trade_name, landlord_name, premises_description, \
property_address, rentable_area_sqft, commencement_date, expiration_date, term_years, \
possession_date, deposit_amount, basic_rent_schedule (list of {start_year, end_year, rate_psf, \
monthly_rent, annual_rent}), renewal_options, permitted_use, exclusive_use, radius_restriction, \
indemnifier_name, tenant_address, indemnifier_address, fixturing_period, free_rent_period, \
tenant_improvement_allowance, offer_to_lease_date, indemnity_agreement_date";

#[derive(Debug)]
pub struct LlmLeaseExtractor {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
}

impl LlmLeaseExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 2000,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_prompt(&self, text: &str) -> String {
        format!(
            "Fields: {}\nUse ISO dates (YYYY-MM-DD) and plain numbers. Use null when a field is absent.\n\nLease:\n{}",
            FIELDS, text
        )
    }
}

/// Parse a model reply into a `Lease`
pub fn parse_lease_response(content: &str) -> Result<Lease, DomainError> {
    let value = strip_nulls(parse_json_payload(content)?);

    if !value.is_object() {
        return Err(DomainError::extraction("Lease extraction did not return an object"));
    }

    serde_json::from_value(value)
        .map_err(|e| DomainError::extraction(format!("Lease fields did not match: {}", e)))
}

#[async_trait]
impl LeaseExtractor for LlmLeaseExtractor {
    async fn extract(&self, text: &str) -> Result<Lease, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::extraction("No text to extract lease fields from"));
        }

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
            .map_err(|e| DomainError::extraction(format!("Lease extraction call failed: {}", e)))?;

        let lease = parse_lease_response(response.content())?;

        if !lease.has_tenant() {
            warn!("Extracted lease has no tenant name");
        }
        debug!(
            tenant = %lease.tenant_name,
            rent_steps = lease.basic_rent_schedule.len(),
            "Extracted lease fields"
        );

        Ok(lease)
    }
}
