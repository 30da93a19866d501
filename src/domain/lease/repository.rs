use async_trait::async_trait;

use super::{ExtractedClause, IngestionLogEntry, Lease, LeaseRecord, RentStep};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Relational store for lease records, clauses and the ingestion log
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LeaseRepository: Send + Sync {
    /// Create tables if they do not exist
    async fn ensure_schema(&self) -> Result<(), DomainError>;

    /// Insert or update the lease for `document_name`, replacing its rent
    /// schedule. Atomic per document. Returns the lease ID.
    async fn upsert_lease(&self, document_name: &str, lease: &Lease) -> Result<i64, DomainError>;

    async fn get_lease(&self, document_name: &str) -> Result<Option<LeaseRecord>, DomainError>;

    async fn rent_schedule(&self, lease_id: i64) -> Result<Vec<RentStep>, DomainError>;

    /// Replace every stored clause for a lease
    async fn replace_clauses(
        &self,
        lease_id: i64,
        clauses: &[ExtractedClause],
    ) -> Result<(), DomainError>;

    async fn clauses(&self, lease_id: i64) -> Result<Vec<ExtractedClause>, DomainError>;

    /// Delete a lease with its schedule and clauses; false if absent
    async fn delete_lease(&self, document_name: &str) -> Result<bool, DomainError>;

    async fn log_ingestion(&self, entry: &IngestionLogEntry) -> Result<(), DomainError>;

    /// Returns the number of log rows removed
    async fn delete_ingestion_logs(&self, document_name: &str) -> Result<u64, DomainError>;

    /// Whether a successful ingestion was ever logged for the document
    async fn is_document_processed(&self, document_name: &str) -> Result<bool, DomainError>;

    async fn count_leases(&self) -> Result<usize, DomainError>;
}
