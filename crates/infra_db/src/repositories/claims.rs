//! Claims repository implementation
//!
//! Row-level access to clauses, diagnoses, receipts, claims and their line
//! items. Queries are built at runtime with `query_as` so the crate builds
//! without a live database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    claim_id, claim_number, product_id, patient_name, diagnosis_id, receipt_id,
    status, claim_amount, currency, claim_reason, rejection_reason, version,
    calculated_at, created_at, updated_at
"#;

/// Repository for claim calculation data
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    /// Creates a new ClaimsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a claim by its identifier
    ///
    /// # Returns
    ///
    /// The claim record or NotFound error
    pub async fn get_by_id(&self, claim_id: Uuid) -> Result<ClaimRow, DatabaseError> {
        let query = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ClaimRow>(&query)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))
    }

    pub async fn get_diagnosis(&self, diagnosis_id: Uuid) -> Result<DiagnosisRow, DatabaseError> {
        sqlx::query_as::<_, DiagnosisRow>(
            r#"
            SELECT diagnosis_id, patient_name, diagnosis_name, diagnosis_text,
                   icd_code, hospital_name, admission_days
            FROM diagnoses
            WHERE diagnosis_id = $1
            "#,
        )
        .bind(diagnosis_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Diagnosis", diagnosis_id))
    }

    pub async fn get_receipt(&self, receipt_id: Uuid) -> Result<ReceiptRow, DatabaseError> {
        sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT receipt_id, patient_name, total_amount, currency, treatment_details
            FROM receipts
            WHERE receipt_id = $1
            "#,
        )
        .bind(receipt_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Receipt", receipt_id))
    }

    /// Inserts a diagnosis record
    pub async fn insert_diagnosis(&self, row: &DiagnosisRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO diagnoses (
                diagnosis_id, patient_name, diagnosis_name, diagnosis_text,
                icd_code, hospital_name, admission_days
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.diagnosis_id)
        .bind(&row.patient_name)
        .bind(&row.diagnosis_name)
        .bind(&row.diagnosis_text)
        .bind(&row.icd_code)
        .bind(&row.hospital_name)
        .bind(row.admission_days)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a receipt record
    pub async fn insert_receipt(&self, row: &ReceiptRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO receipts (receipt_id, patient_name, total_amount, currency, treatment_details)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(row.receipt_id)
        .bind(&row.patient_name)
        .bind(row.total_amount)
        .bind(&row.currency)
        .bind(&row.treatment_details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a clause into the catalog
    pub async fn insert_clause(&self, row: &ClauseRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO clauses (
                clause_id, product_id, name, category, unit_type,
                per_unit, max_total, conditions
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(row.clause_id)
        .bind(row.product_id)
        .bind(&row.name)
        .bind(&row.category)
        .bind(&row.unit_type)
        .bind(row.per_unit)
        .bind(row.max_total)
        .bind(&row.conditions)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Clauses of a product, in id order
    pub async fn clauses_for_product(&self, product_id: Uuid) -> Result<Vec<ClauseRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClauseRow>(
            r#"
            SELECT clause_id, product_id, name, category, unit_type,
                   per_unit, max_total, conditions
            FROM clauses
            WHERE product_id = $1
            ORDER BY clause_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a newly opened claim
    pub async fn insert_claim(&self, row: &ClaimRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claims (
                claim_id, claim_number, product_id, patient_name, diagnosis_id,
                receipt_id, status, claim_amount, currency, claim_reason,
                rejection_reason, version, calculated_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(row.claim_id)
        .bind(&row.claim_number)
        .bind(row.product_id)
        .bind(&row.patient_name)
        .bind(row.diagnosis_id)
        .bind(row.receipt_id)
        .bind(row.status)
        .bind(row.claim_amount)
        .bind(&row.currency)
        .bind(&row.claim_reason)
        .bind(&row.rejection_reason)
        .bind(row.version)
        .bind(row.calculated_at)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Line items of a claim in calculation order
    pub async fn line_items(&self, claim_id: Uuid) -> Result<Vec<LineItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT line_item_id, claim_id, position, clause_id, clause_name, category,
                   calculated_amount, currency, explanation, created_at
            FROM claim_line_items
            WHERE claim_id = $1
            ORDER BY position
            "#,
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Replaces a claim's calculation in one transaction
    ///
    /// The claim row is locked first; if its version is no longer
    /// `expected_version` nothing is written and `VersionConflict` is returned.
    pub async fn commit_calculation(
        &self,
        claim: &ClaimRow,
        expected_version: i64,
        items: &[LineItemRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let stored: Option<i64> =
            sqlx::query_scalar(
                "SELECT version FROM claims WHERE claim_id = $1 AND deleted_at IS NULL FOR UPDATE",
            )
                .bind(claim.claim_id)
                .fetch_optional(&mut *tx)
                .await?;

        match stored {
            None => return Err(DatabaseError::not_found("Claim", claim.claim_id)),
            Some(version) if version != expected_version => {
                return Err(DatabaseError::VersionConflict {
                    entity: "Claim",
                    id: claim.claim_id.to_string(),
                    expected: expected_version,
                })
            }
            Some(_) => {}
        }

        sqlx::query(
            r#"
            UPDATE claims
            SET status = $2, claim_amount = $3, rejection_reason = $4, version = $5,
                calculated_at = $6, updated_at = $7
            WHERE claim_id = $1
            "#,
        )
        .bind(claim.claim_id)
        .bind(claim.status)
        .bind(claim.claim_amount)
        .bind(&claim.rejection_reason)
        .bind(claim.version)
        .bind(claim.calculated_at)
        .bind(claim.updated_at)
        .execute(&mut *tx)
        .await?;

        replace_line_items(&mut tx, claim.claim_id, items).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists live claims newest first
    ///
    /// `patient_name` matches any part of the stored name, ignoring case.
    pub async fn list(
        &self,
        status: Option<ClaimStatus>,
        patient_name: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClaimRow>, DatabaseError> {
        let query = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims
             WHERE deleted_at IS NULL
               AND ($1::claim_status IS NULL OR status = $1)
               AND ($2::text IS NULL OR patient_name ILIKE $2 ESCAPE '\\')
             ORDER BY created_at DESC, claim_id DESC
             LIMIT $3 OFFSET $4"
        );

        let rows = sqlx::query_as::<_, ClaimRow>(&query)
            .bind(status)
            .bind(patient_name.map(contains_pattern))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Per-status counts and amounts
    pub async fn status_totals(&self) -> Result<Vec<StatusTotalsRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, StatusTotalsRow>(
            r#"
            SELECT status, currency,
                   COUNT(*) AS claim_count,
                   COALESCE(SUM(claim_amount), 0) AS total_amount,
                   COALESCE(MAX(claim_amount), 0) AS max_amount
            FROM claims
            WHERE deleted_at IS NULL
            GROUP BY status, currency
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Overwrites a claim's status, as the payment process does
    pub async fn set_status(&self, claim_id: Uuid, status: ClaimStatus) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE claims SET status = $2, updated_at = NOW() WHERE claim_id = $1 AND deleted_at IS NULL",
        )
        .bind(claim_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim", claim_id));
        }
        Ok(())
    }

    /// Marks a claim deleted; it stays in the table but leaves every query
    ///
    /// # Returns
    ///
    /// NotFound if the claim does not exist or was already deleted
    pub async fn soft_delete(&self, claim_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE claims
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE claim_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(claim_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Claim", claim_id));
        }
        Ok(())
    }

    /// Runs a trivial query to check connectivity
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

/// ILIKE pattern matching `needle` anywhere, with wildcards escaped
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

async fn replace_line_items(
    tx: &mut Transaction<'_, Postgres>,
    claim_id: Uuid,
    items: &[LineItemRow],
) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM claim_line_items WHERE claim_id = $1")
        .bind(claim_id)
        .execute(&mut **tx)
        .await?;

    for item in items {
        sqlx::query(
            r#"
            INSERT INTO claim_line_items (
                line_item_id, claim_id, position, clause_id, clause_name, category,
                calculated_amount, currency, explanation, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.line_item_id)
        .bind(claim_id)
        .bind(item.position)
        .bind(item.clause_id)
        .bind(&item.clause_name)
        .bind(&item.category)
        .bind(item.calculated_amount)
        .bind(&item.currency)
        .bind(&item.explanation)
        .bind(item.created_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Claim status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

/// Database row for claim
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub product_id: Uuid,
    pub patient_name: String,
    pub diagnosis_id: Uuid,
    pub receipt_id: Uuid,
    pub status: ClaimStatus,
    pub claim_amount: Decimal,
    pub currency: String,
    pub claim_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub version: i64,
    pub calculated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a clause
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClauseRow {
    pub clause_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub unit_type: String,
    pub per_unit: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub conditions: Option<String>,
}

/// Database row for a diagnosis
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiagnosisRow {
    pub diagnosis_id: Uuid,
    pub patient_name: String,
    pub diagnosis_name: String,
    pub diagnosis_text: String,
    pub icd_code: Option<String>,
    pub hospital_name: String,
    pub admission_days: i32,
}

/// Database row for a receipt
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReceiptRow {
    pub receipt_id: Uuid,
    pub patient_name: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub treatment_details: String,
}

/// Database row for a claim line item
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineItemRow {
    pub line_item_id: Uuid,
    pub claim_id: Uuid,
    pub position: i32,
    pub clause_id: Uuid,
    pub clause_name: String,
    pub category: String,
    pub calculated_amount: Decimal,
    pub currency: String,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate row for one status and currency
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusTotalsRow {
    pub status: ClaimStatus,
    pub currency: String,
    pub claim_count: i64,
    pub total_amount: Decimal,
    pub max_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Kim"), "%Kim%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
