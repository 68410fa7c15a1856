//! Claim ledger
//!
//! The imperative shell around [`ClaimEngine`]: it loads facts and clauses
//! through the ports, runs the pure calculation, and commits the outcome.
//! Calculations for the same claim are serialized by an in-process lock,
//! and the repository's version check catches writers in other processes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, DiagnosisId, HealthCheckResult, ProductId, ReceiptId};

use crate::claim::{Claim, LineItem};
use crate::engine::{CalculationResult, ClaimEngine};
use crate::error::ClaimError;
use crate::facts::ClaimFacts;
use crate::ports::{ClaimQuery, ClaimRepository, ClauseCatalog};
use crate::summary::{ClaimStatistics, ClaimSummary};

/// Request to open a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenClaimRequest {
    pub product_id: ProductId,
    pub diagnosis_id: DiagnosisId,
    pub receipt_id: ReceiptId,
    pub claim_reason: Option<String>,
}

/// A committed calculation and the claim it updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationOutcome {
    pub claim: Claim,
    pub result: CalculationResult,
}

/// A claim with its persisted line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDetail {
    pub claim: Claim,
    pub line_items: Vec<LineItem>,
}

type ClaimLock = Arc<tokio::sync::Mutex<()>>;

/// Orchestrates claim calculation over the claim ports
pub struct ClaimLedger {
    claims: Arc<dyn ClaimRepository>,
    catalog: Arc<dyn ClauseCatalog>,
    engine: Arc<ClaimEngine>,
    locks: Mutex<HashMap<ClaimId, ClaimLock>>,
}

impl ClaimLedger {
    pub fn new(
        claims: Arc<dyn ClaimRepository>,
        catalog: Arc<dyn ClauseCatalog>,
        engine: Arc<ClaimEngine>,
    ) -> Self {
        Self {
            claims,
            catalog,
            engine,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &ClaimEngine {
        &self.engine
    }

    /// Opens a pending claim
    ///
    /// # Errors
    ///
    /// `NotFound` when the diagnosis or receipt does not exist and
    /// `PatientMismatch` when they belong to different patients.
    pub async fn open_claim(&self, request: OpenClaimRequest) -> Result<Claim, ClaimError> {
        let diagnosis = self.claims.get_diagnosis(request.diagnosis_id).await?;
        let receipt = self.claims.get_receipt(request.receipt_id).await?;

        let claim = Claim::open(
            request.product_id,
            &diagnosis,
            &receipt,
            request.claim_reason,
            self.engine.currency(),
        )?;
        self.claims.insert_claim(&claim).await?;

        info!(claim_id = %claim.id, claim_number = %claim.claim_number, "claim opened");
        Ok(claim)
    }

    /// Recalculates a claim from scratch and commits the result
    ///
    /// The line-item set is replaced as a whole; on any failure the
    /// previously committed state stays in place.
    #[instrument(skip_all, fields(claim_id = %claim_id))]
    pub async fn calculate(&self, claim_id: ClaimId) -> Result<CalculationOutcome, ClaimError> {
        self.with_claim_lock(claim_id, self.calculate_locked(claim_id)).await
    }

    /// Soft-deletes a claim
    ///
    /// Waits for a running calculation of the same claim, so a delete never
    /// lands between its read and its commit.
    #[instrument(skip_all, fields(claim_id = %claim_id))]
    pub async fn delete_claim(&self, claim_id: ClaimId) -> Result<(), ClaimError> {
        self.with_claim_lock(claim_id, async {
            self.claims.soft_delete_claim(claim_id).await?;
            info!("claim deleted");
            Ok::<_, ClaimError>(())
        })
        .await
    }

    async fn with_claim_lock<T>(&self, claim_id: ClaimId, work: impl Future<Output = T>) -> T {
        let lock = self.lock_for(claim_id);
        let outcome = {
            let _guard = lock.lock().await;
            work.await
        };
        drop(lock);
        self.release_lock(claim_id);
        outcome
    }

    async fn calculate_locked(&self, claim_id: ClaimId) -> Result<CalculationOutcome, ClaimError> {
        let mut claim = self.claims.get_claim(claim_id).await?;
        claim.ensure_recalculable()?;

        let diagnosis = self.claims.get_diagnosis(claim.diagnosis_id).await?;
        let receipt = self.claims.get_receipt(claim.receipt_id).await?;
        let facts = ClaimFacts::new(diagnosis, receipt)?;

        let mut clauses = self.catalog.candidate_clauses(claim.product_id).await?;
        clauses.sort_by_key(|clause| clause.id);

        let result = self.engine.calculate(&facts, &clauses)?;

        let expected_version = claim.version;
        claim.apply_calculation(&result, !clauses.is_empty())?;
        let items = claim.line_items(&result);

        if let Err(e) = self.claims.commit_calculation(&claim, expected_version, &items).await {
            warn!(error = %e, "calculation commit failed");
            return Err(e.into());
        }

        info!(
            status = %claim.status,
            total = result.total_amount.minor_units(),
            lines = result.line_items.len(),
            skipped = result.skipped.len(),
            reduced = result.reduction_ratio.is_some(),
            "claim calculated"
        );

        Ok(CalculationOutcome { claim, result })
    }

    fn lock_for(&self, claim_id: ClaimId) -> ClaimLock {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(claim_id).or_default().clone()
    }

    fn release_lock(&self, claim_id: ClaimId) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks.get(&claim_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&claim_id);
        }
    }

    /// Opens a claim and calculates it straight away
    pub async fn submit_claim(&self, request: OpenClaimRequest) -> Result<CalculationOutcome, ClaimError> {
        let claim = self.open_claim(request).await?;
        self.calculate(claim.id).await
    }

    pub async fn get_claim(&self, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        Ok(self.claims.get_claim(claim_id).await?)
    }

    /// Claim plus its persisted line items
    pub async fn claim_detail(&self, claim_id: ClaimId) -> Result<ClaimDetail, ClaimError> {
        let claim = self.claims.get_claim(claim_id).await?;
        let line_items = self.claims.line_items(claim_id).await?;
        Ok(ClaimDetail { claim, line_items })
    }

    /// Summary built from the persisted calculation
    pub async fn summary(&self, claim_id: ClaimId) -> Result<ClaimSummary, ClaimError> {
        let detail = self.claim_detail(claim_id).await?;
        Ok(ClaimSummary::new(&detail.claim, &detail.line_items))
    }

    pub async fn list_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, ClaimError> {
        Ok(self.claims.list_claims(query).await?)
    }

    pub async fn statistics(&self) -> Result<ClaimStatistics, ClaimError> {
        let totals = self.claims.status_totals().await?;
        Ok(ClaimStatistics::from_totals(&totals, self.engine.currency())?)
    }

    /// Health of the claim repository
    pub async fn health(&self) -> HealthCheckResult {
        self.claims.health_check().await
    }
}
