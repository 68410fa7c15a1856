//! PostgreSQL Claim Adapter
//!
//! Implements the claims domain ports on top of [`ClaimsRepository`],
//! translating between row types and domain values.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(PostgresClaimStore::new(pool));
//! let ledger = ClaimLedger::new(store.clone(), store, Arc::new(engine));
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, ClaimId, ClauseId, Currency, DiagnosisId, DomainPort, HealthCheckResult,
    HealthCheckable, LineItemId, Money, PortError, ProductId, ReceiptId,
};
use domain_claims::{
    Claim, ClaimQuery, ClaimRepository, ClaimStatus, Clause, ClauseCatalog, ClauseCategory,
    DiagnosisFacts, LineItem, ReceiptFacts, RejectionReason, StatusTotals,
};

use crate::error::DatabaseError;
use crate::repositories::claims::{
    ClaimRow, ClaimStatus as DbClaimStatus, ClaimsRepository, ClauseRow, DiagnosisRow,
    LineItemRow, ReceiptRow, StatusTotalsRow,
};

const ADAPTER_ID: &str = "postgres-claim-store";

/// PostgreSQL-backed implementation of the claim ports
///
/// Error translation follows `From<DatabaseError> for PortError`: missing
/// rows become `NotFound`, stale versions become `Conflict`.
#[derive(Debug, Clone)]
pub struct PostgresClaimStore {
    repository: ClaimsRepository,
}

impl PostgresClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    ///
    /// Used for seeding facts and clauses, which the ports do not expose.
    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

impl DomainPort for PostgresClaimStore {}

#[async_trait]
impl HealthCheckable for PostgresClaimStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = self.repository.ping().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(()) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ClaimRepository for PostgresClaimStore {
    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        let row = self.repository.get_by_id(*id.as_uuid()).await?;
        Ok(row_to_claim(row)?)
    }

    async fn get_diagnosis(&self, id: DiagnosisId) -> Result<DiagnosisFacts, PortError> {
        let row = self.repository.get_diagnosis(*id.as_uuid()).await?;
        Ok(row_to_diagnosis(row)?)
    }

    async fn get_receipt(&self, id: ReceiptId) -> Result<ReceiptFacts, PortError> {
        let row = self.repository.get_receipt(*id.as_uuid()).await?;
        Ok(row_to_receipt(row)?)
    }

    async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError> {
        self.repository.insert_claim(&claim_to_row(claim)).await?;
        Ok(())
    }

    async fn line_items(&self, claim_id: ClaimId) -> Result<Vec<LineItem>, PortError> {
        let rows = self.repository.line_items(*claim_id.as_uuid()).await?;
        let items = rows
            .into_iter()
            .map(row_to_line_item)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    #[instrument(skip(self, claim, items), fields(claim_id = %claim.id, items = items.len()))]
    async fn commit_calculation(
        &self,
        claim: &Claim,
        expected_version: i64,
        items: &[LineItem],
    ) -> Result<(), PortError> {
        let rows: Vec<LineItemRow> = items
            .iter()
            .enumerate()
            .map(|(position, item)| line_item_to_row(item, position))
            .collect::<Result<_, _>>()?;

        self.repository
            .commit_calculation(&claim_to_row(claim), expected_version, &rows)
            .await?;

        debug!(version = claim.version, "calculation committed");
        Ok(())
    }

    async fn list_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
        let rows = self
            .repository
            .list(
                query.status.map(status_to_db),
                query.patient_name.as_deref(),
                query.limit.map(i64::from).unwrap_or(i64::MAX),
                query.offset.map(i64::from).unwrap_or(0),
            )
            .await?;

        let claims = rows
            .into_iter()
            .map(row_to_claim)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(claims)
    }

    async fn status_totals(&self) -> Result<Vec<StatusTotals>, PortError> {
        let rows = self.repository.status_totals().await?;
        let totals = rows
            .into_iter()
            .map(row_to_status_totals)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(totals)
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn soft_delete_claim(&self, id: ClaimId) -> Result<(), PortError> {
        self.repository.soft_delete(*id.as_uuid()).await?;
        debug!("claim soft-deleted");
        Ok(())
    }
}

#[async_trait]
impl ClauseCatalog for PostgresClaimStore {
    /// Loads a product's clauses, skipping rows whose category or unit type
    /// is not recognized
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn candidate_clauses(&self, product_id: ProductId) -> Result<Vec<Clause>, PortError> {
        let rows = self.repository.clauses_for_product(*product_id.as_uuid()).await?;

        let clauses = rows
            .into_iter()
            .filter_map(|row| match row_to_clause(&row) {
                Ok(clause) => Some(clause),
                Err(e) => {
                    warn!(clause_id = %row.clause_id, clause_name = %row.name, error = %e, "skipping unreadable clause");
                    None
                }
            })
            .collect();

        Ok(clauses)
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    code.parse().map_err(DatabaseError::invalid_data)
}

fn money(amount: rust_decimal::Decimal, code: &str) -> Result<Money, DatabaseError> {
    Money::from_major(amount, parse_currency(code)?).map_err(DatabaseError::invalid_data)
}

fn status_to_db(status: ClaimStatus) -> DbClaimStatus {
    match status {
        ClaimStatus::Pending => DbClaimStatus::Pending,
        ClaimStatus::Approved => DbClaimStatus::Approved,
        ClaimStatus::Rejected => DbClaimStatus::Rejected,
        ClaimStatus::Paid => DbClaimStatus::Paid,
    }
}

fn status_from_db(status: DbClaimStatus) -> ClaimStatus {
    match status {
        DbClaimStatus::Pending => ClaimStatus::Pending,
        DbClaimStatus::Approved => ClaimStatus::Approved,
        DbClaimStatus::Rejected => ClaimStatus::Rejected,
        DbClaimStatus::Paid => ClaimStatus::Paid,
    }
}

fn row_to_clause(row: &ClauseRow) -> Result<Clause, DatabaseError> {
    Ok(Clause {
        id: ClauseId::from_uuid(row.clause_id),
        product_id: ProductId::from_uuid(row.product_id),
        name: row.name.clone(),
        category: row.category.parse().map_err(DatabaseError::invalid_data)?,
        unit_type: row.unit_type.parse().map_err(DatabaseError::invalid_data)?,
        per_unit: row.per_unit,
        max_total: row.max_total,
        conditions: row.conditions.clone(),
    })
}

/// Builds a clause row for seeding the catalog
pub fn clause_to_row(clause: &Clause) -> ClauseRow {
    ClauseRow {
        clause_id: *clause.id.as_uuid(),
        product_id: *clause.product_id.as_uuid(),
        name: clause.name.clone(),
        category: clause.category.as_str().to_string(),
        unit_type: clause.unit_type.as_str().to_string(),
        per_unit: clause.per_unit,
        max_total: clause.max_total,
        conditions: clause.conditions.clone(),
    }
}

fn row_to_diagnosis(row: DiagnosisRow) -> Result<DiagnosisFacts, DatabaseError> {
    Ok(DiagnosisFacts {
        id: DiagnosisId::from_uuid(row.diagnosis_id),
        patient_name: row.patient_name,
        diagnosis_name: row.diagnosis_name,
        diagnosis_text: row.diagnosis_text,
        icd_code: row.icd_code,
        hospital_name: row.hospital_name,
        admission_days: u32::try_from(row.admission_days)
            .map_err(|_| DatabaseError::invalid_data(format!("negative admission_days {}", row.admission_days)))?,
    })
}

/// Builds a diagnosis row for seeding
pub fn diagnosis_to_row(diagnosis: &DiagnosisFacts) -> Result<DiagnosisRow, DatabaseError> {
    Ok(DiagnosisRow {
        diagnosis_id: *diagnosis.id.as_uuid(),
        patient_name: diagnosis.patient_name.clone(),
        diagnosis_name: diagnosis.diagnosis_name.clone(),
        diagnosis_text: diagnosis.diagnosis_text.clone(),
        icd_code: diagnosis.icd_code.clone(),
        hospital_name: diagnosis.hospital_name.clone(),
        admission_days: i32::try_from(diagnosis.admission_days)
            .map_err(|_| DatabaseError::invalid_data("admission_days out of range"))?,
    })
}

fn row_to_receipt(row: ReceiptRow) -> Result<ReceiptFacts, DatabaseError> {
    Ok(ReceiptFacts {
        id: ReceiptId::from_uuid(row.receipt_id),
        patient_name: row.patient_name,
        total_amount: money(row.total_amount, &row.currency)?,
        treatment_details: row.treatment_details,
    })
}

/// Builds a receipt row for seeding
pub fn receipt_to_row(receipt: &ReceiptFacts) -> ReceiptRow {
    ReceiptRow {
        receipt_id: *receipt.id.as_uuid(),
        patient_name: receipt.patient_name.clone(),
        total_amount: receipt.total_amount.amount(),
        currency: receipt.total_amount.currency().code().to_string(),
        treatment_details: receipt.treatment_details.clone(),
    }
}

fn row_to_claim(row: ClaimRow) -> Result<Claim, DatabaseError> {
    let rejection_reason = row
        .rejection_reason
        .as_deref()
        .map(str::parse::<RejectionReason>)
        .transpose()
        .map_err(DatabaseError::invalid_data)?;

    Ok(Claim {
        id: ClaimId::from_uuid(row.claim_id),
        claim_amount: money(row.claim_amount, &row.currency)?,
        claim_number: row.claim_number,
        product_id: ProductId::from_uuid(row.product_id),
        patient_name: row.patient_name,
        diagnosis_id: DiagnosisId::from_uuid(row.diagnosis_id),
        receipt_id: ReceiptId::from_uuid(row.receipt_id),
        status: status_from_db(row.status),
        claim_reason: row.claim_reason,
        rejection_reason,
        version: row.version,
        calculated_at: row.calculated_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn claim_to_row(claim: &Claim) -> ClaimRow {
    ClaimRow {
        claim_id: *claim.id.as_uuid(),
        claim_number: claim.claim_number.clone(),
        product_id: *claim.product_id.as_uuid(),
        patient_name: claim.patient_name.clone(),
        diagnosis_id: *claim.diagnosis_id.as_uuid(),
        receipt_id: *claim.receipt_id.as_uuid(),
        status: status_to_db(claim.status),
        claim_amount: claim.claim_amount.amount(),
        currency: claim.claim_amount.currency().code().to_string(),
        claim_reason: claim.claim_reason.clone(),
        rejection_reason: claim.rejection_reason.map(|r| r.as_str().to_string()),
        version: claim.version,
        calculated_at: claim.calculated_at,
        created_at: claim.created_at,
        updated_at: claim.updated_at,
    }
}

fn row_to_line_item(row: LineItemRow) -> Result<LineItem, DatabaseError> {
    Ok(LineItem {
        id: LineItemId::from_uuid(row.line_item_id),
        claim_id: ClaimId::from_uuid(row.claim_id),
        clause_id: ClauseId::from_uuid(row.clause_id),
        category: row.category.parse::<ClauseCategory>().map_err(DatabaseError::invalid_data)?,
        calculated_amount: money(row.calculated_amount, &row.currency)?,
        clause_name: row.clause_name,
        explanation: row.explanation,
        created_at: row.created_at,
    })
}

fn line_item_to_row(item: &LineItem, position: usize) -> Result<LineItemRow, DatabaseError> {
    Ok(LineItemRow {
        line_item_id: *item.id.as_uuid(),
        claim_id: *item.claim_id.as_uuid(),
        position: i32::try_from(position).map_err(|_| DatabaseError::invalid_data("too many line items"))?,
        clause_id: *item.clause_id.as_uuid(),
        clause_name: item.clause_name.clone(),
        category: item.category.as_str().to_string(),
        calculated_amount: item.calculated_amount.amount(),
        currency: item.calculated_amount.currency().code().to_string(),
        explanation: item.explanation.clone(),
        created_at: item.created_at,
    })
}

fn row_to_status_totals(row: StatusTotalsRow) -> Result<StatusTotals, DatabaseError> {
    Ok(StatusTotals {
        status: status_from_db(row.status),
        count: u64::try_from(row.claim_count).map_err(DatabaseError::invalid_data)?,
        total_amount: money(row.total_amount, &row.currency)?,
        max_amount: money(row.max_amount, &row.currency)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::UnitType;
    use rust_decimal_macros::dec;

    fn clause_row(category: &str, unit_type: &str) -> ClauseRow {
        ClauseRow {
            clause_id: uuid::Uuid::now_v7(),
            product_id: uuid::Uuid::now_v7(),
            name: "Hospital Daily".to_string(),
            category: category.to_string(),
            unit_type: unit_type.to_string(),
            per_unit: Some(dec!(50000)),
            max_total: None,
            conditions: None,
        }
    }

    #[test]
    fn test_clause_row_with_korean_labels() {
        let clause = row_to_clause(&clause_row("입원", "정액")).unwrap();
        assert_eq!(clause.category, ClauseCategory::Inpatient);
        assert_eq!(clause.unit_type, UnitType::Amount);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(row_to_clause(&clause_row("dental", "amount")).is_err());
        assert!(row_to_clause(&clause_row("inpatient", "per_day")).is_err());
    }

    #[test]
    fn test_claim_row_round_trip() {
        let now = Utc::now();
        let claim = Claim {
            id: ClaimId::new_v7(),
            claim_number: "CLM-20240101-ABCDEF12".to_string(),
            product_id: ProductId::new_v7(),
            patient_name: "Kim Minsu".to_string(),
            diagnosis_id: DiagnosisId::new_v7(),
            receipt_id: ReceiptId::new_v7(),
            status: ClaimStatus::Rejected,
            claim_amount: Money::zero(Currency::KRW),
            claim_reason: None,
            rejection_reason: Some(RejectionReason::NoApplicableClauses),
            version: 2,
            calculated_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        assert_eq!(row_to_claim(claim_to_row(&claim)).unwrap(), claim);
    }

    #[test]
    fn test_receipt_with_unknown_currency() {
        let row = ReceiptRow {
            receipt_id: uuid::Uuid::now_v7(),
            patient_name: "Kim Minsu".to_string(),
            total_amount: dec!(1000),
            currency: "XXX".to_string(),
            treatment_details: String::new(),
        };
        assert!(row_to_receipt(row).is_err());
    }
}
