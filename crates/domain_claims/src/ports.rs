//! Claims Domain Ports
//!
//! The ledger reaches its data only through these traits. The PostgreSQL
//! adapter in `infra_db` implements them for production; the in-memory
//! adapter in [`mock`] implements them for tests.
//!
//! ```rust,ignore
//! let store = Arc::new(PostgresClaimStore::new(pool));
//! let ledger = ClaimLedger::new(store.clone(), store, Arc::new(engine));
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, DiagnosisId, DomainPort, HealthCheckable, Money, PortError, ProductId, ReceiptId};

use crate::claim::{Claim, ClaimStatus, LineItem};
use crate::clause::Clause;
use crate::facts::{DiagnosisFacts, ReceiptFacts};

/// Query parameters for listing claims
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimQuery {
    /// Filter by status
    pub status: Option<ClaimStatus>,
    /// Filter by any part of the patient name, ignoring case
    pub patient_name: Option<String>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl ClaimQuery {
    /// Creates a query for one status
    pub fn by_status(status: ClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Narrows the query to patients whose name contains `name`
    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_name = Some(name.into());
        self
    }

    /// True if `name` passes the patient-name filter
    pub fn matches_patient(&self, name: &str) -> bool {
        self.patient_name
            .as_deref()
            .map_or(true, |needle| name.to_lowercase().contains(&needle.to_lowercase()))
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// Claim count and amounts for one status and currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub status: ClaimStatus,
    pub count: u64,
    pub total_amount: Money,
    pub max_amount: Money,
}

/// Storage of claims, their facts and their line items
#[async_trait]
pub trait ClaimRepository: DomainPort + HealthCheckable {
    /// Retrieves a claim by ID
    ///
    /// # Returns
    ///
    /// The claim if found, or `PortError::NotFound`. Deleted claims are not
    /// found.
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Retrieves a diagnosis record
    async fn get_diagnosis(&self, id: DiagnosisId) -> Result<DiagnosisFacts, PortError>;

    /// Retrieves a receipt record
    async fn get_receipt(&self, id: ReceiptId) -> Result<ReceiptFacts, PortError>;

    /// Stores a newly opened claim
    async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError>;

    /// Line items of the last committed calculation, in calculation order
    async fn line_items(&self, claim_id: ClaimId) -> Result<Vec<LineItem>, PortError>;

    /// Atomically replaces the claim's line items and updates the claim
    ///
    /// # Arguments
    ///
    /// * `claim` - The claim with its new amount, status and version
    /// * `expected_version` - The version the calculation started from
    /// * `items` - The complete new line-item set
    ///
    /// # Returns
    ///
    /// `PortError::Conflict` if the stored version is no longer
    /// `expected_version`; nothing is written in that case.
    async fn commit_calculation(
        &self,
        claim: &Claim,
        expected_version: i64,
        items: &[LineItem],
    ) -> Result<(), PortError>;

    /// Lists claims, newest first
    async fn list_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError>;

    /// Per-status counts and amounts, one entry per status and currency
    async fn status_totals(&self) -> Result<Vec<StatusTotals>, PortError>;

    /// Marks a claim deleted
    ///
    /// The claim and its line items are kept but no longer returned by any
    /// other method. `PortError::NotFound` if the claim is missing or
    /// already deleted.
    async fn soft_delete_claim(&self, id: ClaimId) -> Result<(), PortError>;
}

/// Read-only source of clauses
#[async_trait]
pub trait ClauseCatalog: DomainPort {
    /// Clauses offered under a product
    async fn candidate_clauses(&self, product_id: ProductId) -> Result<Vec<Clause>, PortError>;
}

/// In-memory adapters for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, Currency, HealthCheckResult};

    #[derive(Debug, Default)]
    struct Tables {
        claims: HashMap<ClaimId, Claim>,
        diagnoses: HashMap<DiagnosisId, DiagnosisFacts>,
        receipts: HashMap<ReceiptId, ReceiptFacts>,
        line_items: HashMap<ClaimId, Vec<LineItem>>,
        clauses: Vec<Clause>,
        deleted: HashSet<ClaimId>,
    }

    impl Tables {
        fn live_claim(&self, id: ClaimId) -> Option<&Claim> {
            self.claims.get(&id).filter(|_| !self.deleted.contains(&id))
        }

        fn live_claims(&self) -> impl Iterator<Item = &Claim> {
            self.claims.values().filter(|c| !self.deleted.contains(&c.id))
        }
    }

    /// In-memory implementation of both claim ports
    ///
    /// All tables sit behind one lock so a commit is atomic to readers.
    #[derive(Debug, Default)]
    pub struct InMemoryClaimStore {
        tables: Arc<RwLock<Tables>>,
        fail_commits: AtomicBool,
    }

    impl InMemoryClaimStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a diagnosis record
        pub async fn insert_diagnosis(&self, diagnosis: DiagnosisFacts) {
            self.tables.write().await.diagnoses.insert(diagnosis.id, diagnosis);
        }

        /// Adds a receipt record
        pub async fn insert_receipt(&self, receipt: ReceiptFacts) {
            self.tables.write().await.receipts.insert(receipt.id, receipt);
        }

        /// Adds clauses to the catalog
        pub async fn insert_clauses(&self, clauses: impl IntoIterator<Item = Clause>) {
            self.tables.write().await.clauses.extend(clauses);
        }

        /// Replaces a clause, keyed by id
        pub async fn replace_clause(&self, clause: Clause) {
            let mut tables = self.tables.write().await;
            if let Some(existing) = tables.clauses.iter_mut().find(|c| c.id == clause.id) {
                *existing = clause;
            }
        }

        /// Overwrites a claim's status, as outside processes (payment) do
        pub async fn set_status(&self, id: ClaimId, status: ClaimStatus) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            if tables.deleted.contains(&id) {
                return Err(PortError::not_found("Claim", id));
            }
            let claim = tables
                .claims
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Claim", id))?;
            claim.status = status;
            Ok(())
        }

        /// Makes subsequent commits fail, to exercise rollback paths
        pub fn fail_commits(&self, fail: bool) {
            self.fail_commits.store(fail, Ordering::SeqCst);
        }
    }

    impl DomainPort for InMemoryClaimStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryClaimStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-claim-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl ClaimRepository for InMemoryClaimStore {
        async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.tables
                .read()
                .await
                .live_claim(id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn get_diagnosis(&self, id: DiagnosisId) -> Result<DiagnosisFacts, PortError> {
            self.tables
                .read()
                .await
                .diagnoses
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Diagnosis", id))
        }

        async fn get_receipt(&self, id: ReceiptId) -> Result<ReceiptFacts, PortError> {
            self.tables
                .read()
                .await
                .receipts
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Receipt", id))
        }

        async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            if tables.claims.contains_key(&claim.id) {
                return Err(PortError::conflict(format!("claim {} already exists", claim.id)));
            }
            tables.claims.insert(claim.id, claim.clone());
            Ok(())
        }

        async fn line_items(&self, claim_id: ClaimId) -> Result<Vec<LineItem>, PortError> {
            Ok(self
                .tables
                .read()
                .await
                .line_items
                .get(&claim_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn commit_calculation(
            &self,
            claim: &Claim,
            expected_version: i64,
            items: &[LineItem],
        ) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;

            let stored = tables
                .live_claim(claim.id)
                .ok_or_else(|| PortError::not_found("Claim", claim.id))?;
            if stored.version != expected_version {
                return Err(PortError::conflict(format!(
                    "claim {} is at version {}, expected {}",
                    claim.id, stored.version, expected_version
                )));
            }

            if self.fail_commits.load(Ordering::SeqCst) {
                return Err(PortError::internal("simulated commit failure"));
            }

            tables.line_items.insert(claim.id, items.to_vec());
            tables.claims.insert(claim.id, claim.clone());
            Ok(())
        }

        async fn list_claims(&self, query: ClaimQuery) -> Result<Vec<Claim>, PortError> {
            let tables = self.tables.read().await;
            let mut results: Vec<Claim> = tables
                .live_claims()
                .filter(|c| query.status.map_or(true, |s| c.status == s))
                .filter(|c| query.matches_patient(&c.patient_name))
                .cloned()
                .collect();

            results.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

            // Apply pagination
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(results.into_iter().skip(offset).take(limit).collect())
        }

        async fn status_totals(&self) -> Result<Vec<StatusTotals>, PortError> {
            let tables = self.tables.read().await;
            let mut totals: HashMap<(ClaimStatus, Currency), StatusTotals> = HashMap::new();

            for claim in tables.live_claims() {
                let currency = claim.claim_amount.currency();
                let entry = totals.entry((claim.status, currency)).or_insert_with(|| StatusTotals {
                    status: claim.status,
                    count: 0,
                    total_amount: Money::zero(currency),
                    max_amount: Money::zero(currency),
                });
                entry.count += 1;
                entry.total_amount = entry
                    .total_amount
                    .checked_add(&claim.claim_amount)
                    .map_err(|e| PortError::internal(e.to_string()))?;
                if claim.claim_amount.minor_units() > entry.max_amount.minor_units() {
                    entry.max_amount = claim.claim_amount;
                }
            }

            let mut totals: Vec<StatusTotals> = totals.into_values().collect();
            totals.sort_by_key(|t| (t.status.as_str(), t.total_amount.currency().code()));
            Ok(totals)
        }

        async fn soft_delete_claim(&self, id: ClaimId) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            if tables.live_claim(id).is_none() {
                return Err(PortError::not_found("Claim", id));
            }
            tables.deleted.insert(id);
            Ok(())
        }
    }

    #[async_trait]
    impl ClauseCatalog for InMemoryClaimStore {
        async fn candidate_clauses(&self, product_id: ProductId) -> Result<Vec<Clause>, PortError> {
            Ok(self
                .tables
                .read()
                .await
                .clauses
                .iter()
                .filter(|c| c.product_id == product_id)
                .cloned()
                .collect())
        }
    }
}
