//! Caller-facing summaries and statistics
//!
//! Summaries are built from what was persisted, never by recalculating.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use core_kernel::{ClaimId, Currency, Money, MoneyError};

use crate::claim::{Claim, ClaimStatus, LineItem, RejectionReason};
use crate::clause::ClauseCategory;
use crate::ports::StatusTotals;

/// One line of a summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub clause_name: String,
    pub category: ClauseCategory,
    pub amount: Money,
    pub explanation: String,
}

/// Summary of a calculated claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub claim_id: ClaimId,
    pub claim_number: String,
    pub patient_name: String,
    pub status: ClaimStatus,
    pub rejection_reason: Option<RejectionReason>,
    pub total_amount: Money,
    pub lines: Vec<SummaryLine>,
    pub calculated_at: Option<DateTime<Utc>>,
}

impl ClaimSummary {
    pub fn new(claim: &Claim, items: &[LineItem]) -> Self {
        Self {
            claim_id: claim.id,
            claim_number: claim.claim_number.clone(),
            patient_name: claim.patient_name.clone(),
            status: claim.status,
            rejection_reason: claim.rejection_reason,
            total_amount: claim.claim_amount,
            lines: items
                .iter()
                .map(|item| SummaryLine {
                    clause_name: item.clause_name.clone(),
                    category: item.category,
                    amount: item.calculated_amount,
                    explanation: item.explanation.clone(),
                })
                .collect(),
            calculated_at: claim.calculated_at,
        }
    }

    /// The calculation as a JSON blob
    pub fn calculation_json(&self) -> serde_json::Value {
        json!({
            "claim_number": self.claim_number,
            "status": self.status.as_str(),
            "currency": self.total_amount.currency().code(),
            "total_amount": self.total_amount.amount(),
            "line_items": self.lines.iter().map(|line| json!({
                "clause_name": line.clause_name,
                "category": line.category.as_str(),
                "amount": line.amount.amount(),
                "explanation": line.explanation,
            })).collect::<Vec<_>>(),
        })
    }

    /// Human-readable narrative with the calculation blob embedded
    pub fn narrative(&self) -> String {
        let outcome = match self.status {
            ClaimStatus::Pending => "has not been calculated yet".to_string(),
            ClaimStatus::Approved | ClaimStatus::Paid => format!(
                "is {} with {} payable across {} clause(s)",
                self.status,
                self.total_amount,
                self.lines.len()
            ),
            ClaimStatus::Rejected => format!(
                "was rejected because {}",
                self.rejection_reason
                    .map(|r| r.description())
                    .unwrap_or("nothing is payable")
            ),
        };

        format!(
            "Claim {} for {} {}. Calculation: {}",
            self.claim_number,
            self.patient_name,
            outcome,
            self.calculation_json()
        )
    }
}

/// Portfolio-wide claim statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimStatistics {
    pub total_claims: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub paid: u64,
    /// (approved + paid) / total as a percentage, one decimal place
    pub approval_rate: Decimal,
    pub total_amount: Money,
    pub average_amount: Money,
    pub max_amount: Money,
    pub generated_at: DateTime<Utc>,
}

impl ClaimStatistics {
    /// Folds per-status totals into statistics
    ///
    /// Totals recorded in another currency are left out.
    pub fn from_totals(totals: &[StatusTotals], currency: Currency) -> Result<Self, MoneyError> {
        let totals: Vec<&StatusTotals> = totals
            .iter()
            .filter(|t| {
                let same = t.total_amount.currency() == currency;
                if !same {
                    warn!(
                        status = %t.status,
                        currency = %t.total_amount.currency(),
                        count = t.count,
                        "ignoring claim totals in foreign currency"
                    );
                }
                same
            })
            .collect();

        let count_of = |status: ClaimStatus| {
            totals
                .iter()
                .filter(|t| t.status == status)
                .map(|t| t.count)
                .sum::<u64>()
        };

        let total_claims: u64 = totals.iter().map(|t| t.count).sum();
        let total_amount = Money::sum(totals.iter().map(|t| &t.total_amount), currency)?;
        let max_amount = totals
            .iter()
            .map(|t| t.max_amount)
            .max_by_key(Money::minor_units)
            .unwrap_or_else(|| Money::zero(currency));

        let (approved, paid) = (count_of(ClaimStatus::Approved), count_of(ClaimStatus::Paid));

        let approval_rate = if total_claims == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(approved + paid) * Decimal::ONE_HUNDRED / Decimal::from(total_claims))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };

        let average_amount = if total_claims == 0 {
            Money::zero(currency)
        } else {
            let count = i64::try_from(total_claims).map_err(|_| MoneyError::Overflow)?;
            let average = (Decimal::from(total_amount.minor_units()) / Decimal::from(count))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
            Money::from_minor(i64::try_from(average).map_err(|_| MoneyError::Overflow)?, currency)
        };

        Ok(Self {
            total_claims,
            pending: count_of(ClaimStatus::Pending),
            approved,
            rejected: count_of(ClaimStatus::Rejected),
            paid,
            approval_rate,
            total_amount,
            average_amount,
            max_amount,
            generated_at: Utc::now(),
        })
    }
}
