//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, ClauseId, Currency, DiagnosisId, LineItemId, Money, ProductId, ReceiptId};

use crate::calculation::CalculatedLine;
use crate::clause::ClauseCategory;
use crate::engine::CalculationResult;
use crate::error::ClaimError;
use crate::facts::{DiagnosisFacts, ReceiptFacts};

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Opened, not yet calculated
    Pending,
    /// Calculated with a payable amount
    Approved,
    /// Calculated with nothing payable
    Rejected,
    /// Paid out; set outside this engine
    Paid,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            "paid" => Ok(ClaimStatus::Paid),
            other => Err(ClaimError::invalid_facts(format!("unknown claim status '{}'", other))),
        }
    }
}

/// Why a calculated claim was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The product has no clauses to evaluate
    NoCandidateClauses,
    /// Clauses exist but none produced a payable amount
    NoApplicableClauses,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::NoCandidateClauses => "no_candidate_clauses",
            RejectionReason::NoApplicableClauses => "no_applicable_clauses",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RejectionReason::NoCandidateClauses => "the product has no clauses to evaluate",
            RejectionReason::NoApplicableClauses => "no clause applies to this diagnosis and receipt",
        }
    }
}

impl FromStr for RejectionReason {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_candidate_clauses" => Ok(RejectionReason::NoCandidateClauses),
            "no_applicable_clauses" => Ok(RejectionReason::NoApplicableClauses),
            other => Err(ClaimError::invalid_facts(format!("unknown rejection reason '{}'", other))),
        }
    }
}

/// A claim against an insurance product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// Human-facing number, `CLM-YYYYMMDD-XXXXXXXX`
    pub claim_number: String,
    pub product_id: ProductId,
    pub patient_name: String,
    pub diagnosis_id: DiagnosisId,
    pub receipt_id: ReceiptId,
    pub status: ClaimStatus,
    pub claim_amount: Money,
    pub claim_reason: Option<String>,
    pub rejection_reason: Option<RejectionReason>,
    /// Incremented on every committed calculation
    pub version: i64,
    pub calculated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Opens a pending claim for a diagnosis and receipt of the same patient
    pub fn open(
        product_id: ProductId,
        diagnosis: &DiagnosisFacts,
        receipt: &ReceiptFacts,
        claim_reason: Option<String>,
        currency: Currency,
    ) -> Result<Self, ClaimError> {
        if diagnosis.patient_name.trim() != receipt.patient_name.trim() {
            return Err(ClaimError::PatientMismatch {
                diagnosis_patient: diagnosis.patient_name.clone(),
                receipt_patient: receipt.patient_name.clone(),
            });
        }

        let now = Utc::now();
        let id = ClaimId::new_v7();

        Ok(Self {
            id,
            claim_number: generate_claim_number(&id, now),
            product_id,
            patient_name: diagnosis.patient_name.trim().to_string(),
            diagnosis_id: diagnosis.id,
            receipt_id: receipt.id,
            status: ClaimStatus::Pending,
            claim_amount: Money::zero(currency),
            claim_reason,
            rejection_reason: None,
            version: 0,
            calculated_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fails if the claim can no longer be recalculated
    pub fn ensure_recalculable(&self) -> Result<(), ClaimError> {
        if self.status == ClaimStatus::Paid {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: "recalculated".to_string(),
            });
        }
        Ok(())
    }

    /// Applies a calculation: amount, status and rejection reason are all
    /// derived from the result
    ///
    /// `had_candidates` tells an empty catalog apart from one where nothing
    /// matched.
    pub fn apply_calculation(&mut self, result: &CalculationResult, had_candidates: bool) -> Result<(), ClaimError> {
        self.ensure_recalculable()?;

        let (status, reason) = if result.is_payable() {
            (ClaimStatus::Approved, None)
        } else if had_candidates {
            (ClaimStatus::Rejected, Some(RejectionReason::NoApplicableClauses))
        } else {
            (ClaimStatus::Rejected, Some(RejectionReason::NoCandidateClauses))
        };

        let now = Utc::now();
        self.claim_amount = result.total_amount;
        self.status = status;
        self.rejection_reason = reason;
        self.version += 1;
        self.calculated_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Line items to persist for a calculation result
    pub fn line_items(&self, result: &CalculationResult) -> Vec<LineItem> {
        let now = Utc::now();
        result
            .line_items
            .iter()
            .map(|line| LineItem::from_calculated(self.id, line, now))
            .collect()
    }
}

/// A persisted line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub claim_id: ClaimId,
    pub clause_id: ClauseId,
    /// Clause name at calculation time
    pub clause_name: String,
    pub category: ClauseCategory,
    pub calculated_amount: Money,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    pub fn from_calculated(claim_id: ClaimId, line: &CalculatedLine, created_at: DateTime<Utc>) -> Self {
        Self {
            id: LineItemId::new_v7(),
            claim_id,
            clause_id: line.clause_id,
            clause_name: line.clause_name.clone(),
            category: line.category,
            calculated_amount: line.amount,
            explanation: line.explanation.clone(),
            created_at,
        }
    }
}

fn generate_claim_number(id: &ClaimId, at: DateTime<Utc>) -> String {
    let simple = id.as_uuid().simple().to_string().to_uppercase();
    let suffix = &simple[simple.len() - 8..];
    format!("CLM-{}-{}", at.format("%Y%m%d"), suffix)
}
