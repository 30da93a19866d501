//! In-memory lease repository for development and testing

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::lease::{
    ExtractedClause, IngestionLogEntry, IngestionStatus, Lease, LeaseRecord, LeaseRepository,
    RentStep,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    leases: HashMap<String, LeaseRecord>,
    clauses: HashMap<i64, Vec<ExtractedClause>>,
    logs: Vec<IngestionLogEntry>,
}

/// Every write takes the single lock, so upserts are atomic per document
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaseRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryLeaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ingestion_logs(&self, document_name: &str) -> Vec<IngestionLogEntry> {
        let state = self.state.read().await;
        state
            .logs
            .iter()
            .filter(|l| l.document_name == document_name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LeaseRepository for InMemoryLeaseRepository {
    async fn ensure_schema(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn upsert_lease(&self, document_name: &str, lease: &Lease) -> Result<i64, DomainError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(existing) = state.leases.get_mut(document_name) {
            existing.lease = lease.clone();
            existing.updated_at = now;
            return Ok(existing.id);
        }

        state.next_id += 1;
        let id = state.next_id;
        state.leases.insert(
            document_name.to_string(),
            LeaseRecord {
                id,
                document_name: document_name.to_string(),
                lease: lease.clone(),
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn get_lease(&self, document_name: &str) -> Result<Option<LeaseRecord>, DomainError> {
        let state = self.state.read().await;
        Ok(state.leases.get(document_name).cloned())
    }

    async fn rent_schedule(&self, lease_id: i64) -> Result<Vec<RentStep>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .leases
            .values()
            .find(|r| r.id == lease_id)
            .map(|r| r.lease.basic_rent_schedule.clone())
            .unwrap_or_default())
    }

    async fn replace_clauses(
        &self,
        lease_id: i64,
        clauses: &[ExtractedClause],
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;

        if !state.leases.values().any(|r| r.id == lease_id) {
            return Err(DomainError::not_found(format!("Lease {} not found", lease_id)));
        }

        state.clauses.insert(lease_id, clauses.to_vec());
        Ok(())
    }

    async fn clauses(&self, lease_id: i64) -> Result<Vec<ExtractedClause>, DomainError> {
        let state = self.state.read().await;
        Ok(state.clauses.get(&lease_id).cloned().unwrap_or_default())
    }

    async fn delete_lease(&self, document_name: &str) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;

        match state.leases.remove(document_name) {
            Some(record) => {
                state.clauses.remove(&record.id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn log_ingestion(&self, entry: &IngestionLogEntry) -> Result<(), DomainError> {
        self.state.write().await.logs.push(entry.clone());
        Ok(())
    }

    async fn delete_ingestion_logs(&self, document_name: &str) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;
        let before = state.logs.len();
        state.logs.retain(|l| l.document_name != document_name);
        Ok((before - state.logs.len()) as u64)
    }

    async fn is_document_processed(&self, document_name: &str) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .logs
            .iter()
            .any(|l| l.document_name == document_name && l.status == IngestionStatus::Success))
    }

    async fn count_leases(&self) -> Result<usize, DomainError> {
        Ok(self.state.read().await.leases.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enrichment::ClauseType;

    fn log(document: &str, status: IngestionStatus) -> IngestionLogEntry {
        IngestionLogEntry {
            document_name: document.to_string(),
            status,
            chunks_processed: 3,
            vectors_uploaded: 3,
            processing_time_seconds: 1.5,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_keyed_by_document() {
        let repo = InMemoryLeaseRepository::new();

        let first = Lease::new("Tenant A", "Landlord").with_rent_schedule(vec![RentStep::new(1.0, 5.0, 20.0)]);
        let id = repo.upsert_lease("a.pdf", &first).await.unwrap();

        let second = Lease::new("Tenant A2", "Landlord").with_rent_schedule(vec![
            RentStep::new(1.0, 2.0, 21.0),
            RentStep::new(3.0, 5.0, 22.0),
        ]);
        let again = repo.upsert_lease("a.pdf", &second).await.unwrap();

        assert_eq!(id, again);
        assert_eq!(repo.count_leases().await.unwrap(), 1);

        let record = repo.get_lease("a.pdf").await.unwrap().unwrap();
        assert_eq!(record.lease.tenant_name, "Tenant A2");
        assert_eq!(repo.rent_schedule(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clauses_replaced_and_deleted_with_lease() {
        let repo = InMemoryLeaseRepository::new();
        let id = repo.upsert_lease("a.pdf", &Lease::new("T", "L")).await.unwrap();

        repo.replace_clauses(id, &[ExtractedClause::new(ClauseType::Insurance, "CGL")]).await.unwrap();
        repo.replace_clauses(id, &[ExtractedClause::new(ClauseType::Termination, "Early exit")])
            .await
            .unwrap();

        let clauses = repo.clauses(id).await.unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].clause_type, ClauseType::Termination);

        assert!(repo.delete_lease("a.pdf").await.unwrap());
        assert!(!repo.delete_lease("a.pdf").await.unwrap());
        assert!(repo.clauses(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_clauses_unknown_lease() {
        let repo = InMemoryLeaseRepository::new();
        assert!(repo.replace_clauses(99, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_ingestion_log() {
        let repo = InMemoryLeaseRepository::new();

        repo.log_ingestion(&log("a.pdf", IngestionStatus::Failed)).await.unwrap();
        assert!(!repo.is_document_processed("a.pdf").await.unwrap());

        repo.log_ingestion(&log("a.pdf", IngestionStatus::Success)).await.unwrap();
        repo.log_ingestion(&log("b.pdf", IngestionStatus::Success)).await.unwrap();
        assert!(repo.is_document_processed("a.pdf").await.unwrap());

        assert_eq!(repo.delete_ingestion_logs("a.pdf").await.unwrap(), 2);
        assert!(repo.ingestion_logs("a.pdf").await.is_empty());
        assert_eq!(repo.ingestion_logs("b.pdf").await.len(), 1);
    }
}
