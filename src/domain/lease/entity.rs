use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::domain::enrichment::ClauseType;

/// Accepts `YYYY-MM-DD`, `null` or an unparseable string (mapped to `None`).
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

fn lenient_clause_type<'de, D>(deserializer: D) -> Result<ClauseType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| ClauseType::from_label(&s)).unwrap_or_default())
}

/// One period of the basic rent schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentStep {
    pub start_year: f64,
    pub end_year: f64,
    /// Annual rent per square foot
    pub rate_psf: f64,
    #[serde(default)]
    pub monthly_rent: Option<f64>,
    #[serde(default)]
    pub annual_rent: Option<f64>,
}

impl RentStep {
    pub fn new(start_year: f64, end_year: f64, rate_psf: f64) -> Self {
        Self {
            start_year,
            end_year,
            rate_psf,
            monthly_rent: None,
            annual_rent: None,
        }
    }

    pub fn with_rent(mut self, monthly: f64, annual: f64) -> Self {
        self.monthly_rent = Some(monthly);
        self.annual_rent = Some(annual);
        self
    }

    /// Number of years covered, both ends inclusive
    pub fn duration_years(&self) -> f64 {
        self.end_year - self.start_year + 1.0
    }
}

/// Structured fields of a lease abstract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lease {
    #[serde(deserialize_with = "lenient_date")]
    pub lease_date: Option<NaiveDate>,
    pub tenant_name: String,
    pub trade_name: Option<String>,
    pub landlord_name: String,

    pub premises_description: String,
    pub property_address: Option<String>,
    pub rentable_area_sqft: f64,

    #[serde(deserialize_with = "lenient_date")]
    pub commencement_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub expiration_date: Option<NaiveDate>,
    pub term_years: f64,
    pub possession_date: Option<String>,

    pub deposit_amount: Option<f64>,
    pub basic_rent_schedule: Vec<RentStep>,

    pub renewal_options: Option<String>,
    pub permitted_use: Option<String>,
    pub exclusive_use: Option<String>,
    pub radius_restriction: Option<String>,

    pub indemnifier_name: Option<String>,

    pub tenant_address: Option<String>,
    pub indemnifier_address: Option<String>,
    pub fixturing_period: Option<String>,
    pub free_rent_period: Option<String>,
    pub tenant_improvement_allowance: Option<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub offer_to_lease_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub indemnity_agreement_date: Option<NaiveDate>,
}

impl Lease {
    pub fn new(tenant_name: impl Into<String>, landlord_name: impl Into<String>) -> Self {
        Self {
            tenant_name: tenant_name.into(),
            landlord_name: landlord_name.into(),
            ..Default::default()
        }
    }

    pub fn with_rent_schedule(mut self, schedule: Vec<RentStep>) -> Self {
        self.basic_rent_schedule = schedule;
        self
    }

    pub fn with_property_address(mut self, address: impl Into<String>) -> Self {
        self.property_address = Some(address.into());
        self
    }

    pub fn with_trade_name(mut self, trade_name: impl Into<String>) -> Self {
        self.trade_name = Some(trade_name.into());
        self
    }

    /// Weighted average annual rent PSF over the schedule, rounded to cents.
    ///
    /// Year ranges are inclusive; steps with a non-positive duration are
    /// skipped. Returns 0.0 when nothing remains.
    pub fn average_rent_psf(&self) -> f64 {
        let (total_value, total_duration) = self
            .basic_rent_schedule
            .iter()
            .filter(|step| step.duration_years() > 0.0)
            .fold((0.0, 0.0), |(value, duration), step| {
                let years = step.duration_years();
                (value + step.rate_psf * years, duration + years)
            });

        if total_duration == 0.0 {
            return 0.0;
        }

        (total_value / total_duration * 100.0).round() / 100.0
    }

    /// Annual rent of the first schedule step
    pub fn base_rent(&self) -> Option<f64> {
        self.basic_rent_schedule.first().and_then(|s| s.annual_rent)
    }

    pub fn has_tenant(&self) -> bool {
        !self.tenant_name.trim().is_empty()
    }
}

/// Clause summary used for side-by-side lease comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedClause {
    #[serde(default, deserialize_with = "lenient_clause_type")]
    pub clause_type: ClauseType,
    #[serde(default)]
    pub article_reference: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub key_terms: String,
}

impl ExtractedClause {
    pub fn new(clause_type: ClauseType, summary: impl Into<String>) -> Self {
        Self {
            clause_type,
            article_reference: None,
            summary: summary.into(),
            key_terms: String::new(),
        }
    }

    pub fn with_article_reference(mut self, reference: impl Into<String>) -> Self {
        self.article_reference = Some(reference.into());
        self
    }

    pub fn with_key_terms(mut self, terms: impl Into<String>) -> Self {
        self.key_terms = terms.into();
        self
    }
}

/// A lease as stored, keyed by document name
#[derive(Debug, Clone, Serialize)]
pub struct LeaseRecord {
    pub id: i64,
    pub document_name: String,
    pub lease: Lease,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Success,
    Failed,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("success") {
            Self::Success
        } else {
            Self::Failed
        }
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit row written once per ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestionLogEntry {
    pub document_name: String,
    pub status: IngestionStatus,
    pub chunks_processed: usize,
    pub vectors_uploaded: usize,
    pub processing_time_seconds: f64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IngestionLogEntry {
    pub fn from_result(result: &crate::domain::ingestion::PipelineResult) -> Self {
        Self {
            document_name: result.document_name.clone(),
            status: if result.success {
                IngestionStatus::Success
            } else {
                IngestionStatus::Failed
            },
            chunks_processed: result.chunks_processed,
            vectors_uploaded: result.vectors_uploaded,
            processing_time_seconds: result.processing_time_seconds,
            error_message: result.error_message.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rent_psf_weighted() {
        let lease = Lease::new("Tenant Inc.", "Landlord Ltd.").with_rent_schedule(vec![
            RentStep::new(1.0, 5.0, 20.0),
            RentStep::new(6.0, 10.0, 25.0),
        ]);

        assert_eq!(lease.average_rent_psf(), 22.5);
    }

    #[test]
    fn test_average_rent_psf_uneven_steps() {
        let lease = Lease::new("T", "L").with_rent_schedule(vec![
            RentStep::new(1.0, 3.0, 30.0),
            RentStep::new(4.0, 10.0, 33.33),
        ]);

        // (30*3 + 33.33*7) / 10 = 32.331
        assert_eq!(lease.average_rent_psf(), 32.33);
    }

    #[test]
    fn test_average_rent_psf_skips_non_positive_durations() {
        let lease = Lease::new("T", "L").with_rent_schedule(vec![
            RentStep::new(5.0, 3.0, 100.0),
            RentStep::new(1.0, 1.0, 18.0),
        ]);

        assert_eq!(lease.average_rent_psf(), 18.0);
    }

    #[test]
    fn test_average_rent_psf_empty() {
        assert_eq!(Lease::new("T", "L").average_rent_psf(), 0.0);
    }

    #[test]
    fn test_base_rent_is_first_step_annual() {
        let lease = Lease::new("T", "L").with_rent_schedule(vec![
            RentStep::new(1.0, 5.0, 20.0).with_rent(2500.0, 30000.0),
            RentStep::new(6.0, 10.0, 22.0).with_rent(2750.0, 33000.0),
        ]);

        assert_eq!(lease.base_rent(), Some(30000.0));
    }

    #[test]
    fn test_lease_deserializes_lenient_dates() {
        let lease: Lease = serde_json::from_value(serde_json::json!({
            "tenant_name": "Church's Chicken Ltd.",
            "landlord_name": "Plaza Holdings",
            "commencement_date": "2021-03-01",
            "expiration_date": "March 2031",
            "lease_date": null,
            "rentable_area_sqft": 1450.0,
            "term_years": 10,
            "basic_rent_schedule": [
                {"start_year": 1, "end_year": 5, "rate_psf": 28.0}
            ]
        }))
        .unwrap();

        assert_eq!(lease.commencement_date, NaiveDate::from_ymd_opt(2021, 3, 1));
        assert_eq!(lease.expiration_date, None);
        assert_eq!(lease.basic_rent_schedule.len(), 1);
        assert!(lease.has_tenant());
    }

    #[test]
    fn test_extracted_clause_lenient_type() {
        let clause: ExtractedClause = serde_json::from_value(serde_json::json!({
            "clause_type": "Term Renewal",
            "article_reference": "Article 3",
            "summary": "Two options of five years each.",
            "key_terms": "2 x 5 years, 6 months notice"
        }))
        .unwrap();

        assert_eq!(clause.clause_type, ClauseType::TermRenewal);
    }

    #[test]
    fn test_ingestion_status_parse() {
        assert_eq!(IngestionStatus::parse("SUCCESS"), IngestionStatus::Success);
        assert_eq!(IngestionStatus::parse("failed"), IngestionStatus::Failed);
    }
}
