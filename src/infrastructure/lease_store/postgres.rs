//! PostgreSQL lease repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;

use crate::domain::enrichment::ClauseType;
use crate::domain::lease::{
    ExtractedClause, IngestionLogEntry, Lease, LeaseRecord, LeaseRepository, RentStep,
};
use crate::domain::DomainError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS leases (
        id BIGSERIAL PRIMARY KEY,
        document_name TEXT NOT NULL UNIQUE,
        tenant_name TEXT NOT NULL,
        trade_name TEXT,
        landlord_name TEXT NOT NULL,
        property_address TEXT,
        premises_description TEXT,
        rentable_area_sqft DOUBLE PRECISION,
        lease_start DATE,
        lease_end DATE,
        term_years DOUBLE PRECISION,
        possession_date TEXT,
        base_rent DOUBLE PRECISION,
        average_rent_psf DOUBLE PRECISION,
        deposit_amount DOUBLE PRECISION,
        renewal_option TEXT,
        permitted_use TEXT,
        exclusive_use TEXT,
        radius_restriction TEXT,
        lease_data JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rent_schedule (
        id BIGSERIAL PRIMARY KEY,
        lease_id BIGINT NOT NULL REFERENCES leases(id) ON DELETE CASCADE,
        start_year DOUBLE PRECISION NOT NULL,
        end_year DOUBLE PRECISION NOT NULL,
        rate_psf DOUBLE PRECISION NOT NULL,
        monthly_rent DOUBLE PRECISION,
        annual_rent DOUBLE PRECISION
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lease_clauses (
        id BIGSERIAL PRIMARY KEY,
        lease_id BIGINT NOT NULL REFERENCES leases(id) ON DELETE CASCADE,
        clause_type TEXT NOT NULL,
        article_reference TEXT,
        summary TEXT NOT NULL,
        key_terms TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ingestion_logs (
        id BIGSERIAL PRIMARY KEY,
        document_name TEXT NOT NULL,
        status TEXT NOT NULL,
        chunks_processed BIGINT NOT NULL DEFAULT 0,
        vectors_uploaded BIGINT NOT NULL DEFAULT 0,
        processing_time_seconds DOUBLE PRECISION NOT NULL DEFAULT 0,
        error_message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_rent_schedule_lease ON rent_schedule(lease_id)",
    "CREATE INDEX IF NOT EXISTS idx_lease_clauses_lease ON lease_clauses(lease_id)",
    "CREATE INDEX IF NOT EXISTS idx_ingestion_logs_document ON ingestion_logs(document_name)",
];

#[derive(Debug, Clone)]
pub struct PostgresLeaseRepository {
    pool: PgPool,
}

impl PostgresLeaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to database: {}", e)))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl LeaseRepository for PostgresLeaseRepository {
    async fn ensure_schema(&self) -> Result<(), DomainError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create schema: {}", e)))?;
        }

        info!("Lease schema ready");
        Ok(())
    }

    async fn upsert_lease(&self, document_name: &str, lease: &Lease) -> Result<i64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let lease_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO leases (document_name, tenant_name, trade_name, landlord_name,
                                property_address, premises_description, rentable_area_sqft,
                                lease_start, lease_end, term_years, possession_date, base_rent,
                                average_rent_psf, deposit_amount, renewal_option, permitted_use,
                                exclusive_use, radius_restriction, lease_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (document_name) DO UPDATE SET
                tenant_name = EXCLUDED.tenant_name,
                trade_name = EXCLUDED.trade_name,
                landlord_name = EXCLUDED.landlord_name,
                property_address = EXCLUDED.property_address,
                premises_description = EXCLUDED.premises_description,
                rentable_area_sqft = EXCLUDED.rentable_area_sqft,
                lease_start = EXCLUDED.lease_start,
                lease_end = EXCLUDED.lease_end,
                term_years = EXCLUDED.term_years,
                possession_date = EXCLUDED.possession_date,
                base_rent = EXCLUDED.base_rent,
                average_rent_psf = EXCLUDED.average_rent_psf,
                deposit_amount = EXCLUDED.deposit_amount,
                renewal_option = EXCLUDED.renewal_option,
                permitted_use = EXCLUDED.permitted_use,
                exclusive_use = EXCLUDED.exclusive_use,
                radius_restriction = EXCLUDED.radius_restriction,
                lease_data = EXCLUDED.lease_data,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(document_name)
        .bind(&lease.tenant_name)
        .bind(&lease.trade_name)
        .bind(&lease.landlord_name)
        .bind(&lease.property_address)
        .bind(&lease.premises_description)
        .bind(lease.rentable_area_sqft)
        .bind(lease.commencement_date)
        .bind(lease.expiration_date)
        .bind(lease.term_years)
        .bind(&lease.possession_date)
        .bind(lease.base_rent())
        .bind(lease.average_rent_psf())
        .bind(lease.deposit_amount)
        .bind(&lease.renewal_options)
        .bind(&lease.permitted_use)
        .bind(&lease.exclusive_use)
        .bind(&lease.radius_restriction)
        .bind(Json(lease))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to upsert lease: {}", e)))?;

        sqlx::query("DELETE FROM rent_schedule WHERE lease_id = $1")
            .bind(lease_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to clear rent schedule: {}", e)))?;

        for step in &lease.basic_rent_schedule {
            sqlx::query(
                r#"
                INSERT INTO rent_schedule (lease_id, start_year, end_year, rate_psf, monthly_rent, annual_rent)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(lease_id)
            .bind(step.start_year)
            .bind(step.end_year)
            .bind(step.rate_psf)
            .bind(step.monthly_rent)
            .bind(step.annual_rent)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert rent step: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit lease: {}", e)))?;

        Ok(lease_id)
    }

    async fn get_lease(&self, document_name: &str) -> Result<Option<LeaseRecord>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, document_name, lease_data, created_at, updated_at
            FROM leases
            WHERE document_name = $1
            "#,
        )
        .bind(document_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get lease: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Json(lease): Json<Lease> = row.get("lease_data");
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        Ok(Some(LeaseRecord {
            id: row.get("id"),
            document_name: row.get("document_name"),
            lease,
            created_at,
            updated_at,
        }))
    }

    async fn rent_schedule(&self, lease_id: i64) -> Result<Vec<RentStep>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT start_year, end_year, rate_psf, monthly_rent, annual_rent
            FROM rent_schedule
            WHERE lease_id = $1
            ORDER BY start_year
            "#,
        )
        .bind(lease_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get rent schedule: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| RentStep {
                start_year: row.get("start_year"),
                end_year: row.get("end_year"),
                rate_psf: row.get("rate_psf"),
                monthly_rent: row.get("monthly_rent"),
                annual_rent: row.get("annual_rent"),
            })
            .collect())
    }

    async fn replace_clauses(
        &self,
        lease_id: i64,
        clauses: &[ExtractedClause],
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query("DELETE FROM lease_clauses WHERE lease_id = $1")
            .bind(lease_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to clear clauses: {}", e)))?;

        for clause in clauses {
            sqlx::query(
                r#"
                INSERT INTO lease_clauses (lease_id, clause_type, article_reference, summary, key_terms)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(lease_id)
            .bind(clause.clause_type.as_str())
            .bind(&clause.article_reference)
            .bind(&clause.summary)
            .bind(&clause.key_terms)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert clause: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit clauses: {}", e)))?;

        Ok(())
    }

    async fn clauses(&self, lease_id: i64) -> Result<Vec<ExtractedClause>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT clause_type, article_reference, summary, key_terms
            FROM lease_clauses
            WHERE lease_id = $1
            ORDER BY id
            "#,
        )
        .bind(lease_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get clauses: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| {
                let clause_type: String = row.get("clause_type");
                ExtractedClause {
                    clause_type: ClauseType::from_label(&clause_type),
                    article_reference: row.get("article_reference"),
                    summary: row.get("summary"),
                    key_terms: row.get("key_terms"),
                }
            })
            .collect())
    }

    async fn delete_lease(&self, document_name: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM leases WHERE document_name = $1")
            .bind(document_name)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete lease: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn log_ingestion(&self, entry: &IngestionLogEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO ingestion_logs (document_name, status, chunks_processed, vectors_uploaded,
                                        processing_time_seconds, error_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&entry.document_name)
        .bind(entry.status.as_str())
        .bind(entry.chunks_processed as i64)
        .bind(entry.vectors_uploaded as i64)
        .bind(entry.processing_time_seconds)
        .bind(&entry.error_message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to write ingestion log: {}", e)))?;

        Ok(())
    }

    async fn delete_ingestion_logs(&self, document_name: &str) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM ingestion_logs WHERE document_name = $1")
            .bind(document_name)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete ingestion logs: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn is_document_processed(&self, document_name: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM ingestion_logs WHERE document_name = $1 AND status = 'success')",
        )
        .bind(document_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to check ingestion status: {}", e)))
    }

    async fn count_leases(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leases")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count leases: {}", e)))?;

        Ok(count as usize)
    }
}
