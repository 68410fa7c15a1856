//! Claims DTOs
//!
//! Money leaves the API as decimal major units next to a currency code.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{DiagnosisId, ProductId, ReceiptId};
use domain_claims::{
    CalculatedLine, CalculationResult, Claim, ClaimStatistics, ClaimSummary, LineItem,
    OpenClaimRequest, SkippedClause,
};

#[derive(Debug, Deserialize, Validate)]
pub struct OpenClaimBody {
    pub product_id: Uuid,
    pub diagnosis_id: Uuid,
    pub receipt_id: Uuid,
    #[validate(length(max = 2000, message = "claim_reason is limited to 2000 characters"))]
    pub claim_reason: Option<String>,
}

impl From<OpenClaimBody> for OpenClaimRequest {
    fn from(body: OpenClaimBody) -> Self {
        OpenClaimRequest {
            product_id: ProductId::from_uuid(body.product_id),
            diagnosis_id: DiagnosisId::from_uuid(body.diagnosis_id),
            receipt_id: ReceiptId::from_uuid(body.receipt_id),
            claim_reason: body.claim_reason,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListClaimsParams {
    pub status: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub patient_name: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub claim_number: String,
    pub product_id: Uuid,
    pub patient_name: String,
    pub diagnosis_id: Uuid,
    pub receipt_id: Uuid,
    pub status: String,
    pub claim_amount: Decimal,
    pub currency: String,
    pub claim_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub version: i64,
    pub calculated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Claim> for ClaimResponse {
    fn from(claim: &Claim) -> Self {
        Self {
            id: *claim.id.as_uuid(),
            claim_number: claim.claim_number.clone(),
            product_id: *claim.product_id.as_uuid(),
            patient_name: claim.patient_name.clone(),
            diagnosis_id: *claim.diagnosis_id.as_uuid(),
            receipt_id: *claim.receipt_id.as_uuid(),
            status: claim.status.to_string(),
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
}

#[derive(Debug, Serialize)]
pub struct LineResponse {
    pub clause_id: Uuid,
    pub clause_name: String,
    pub category: String,
    pub amount: Decimal,
    pub explanation: String,
}

impl From<&CalculatedLine> for LineResponse {
    fn from(line: &CalculatedLine) -> Self {
        Self {
            clause_id: *line.clause_id.as_uuid(),
            clause_name: line.clause_name.clone(),
            category: line.category.to_string(),
            amount: line.amount.amount(),
            explanation: line.explanation.clone(),
        }
    }
}

impl From<&LineItem> for LineResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            clause_id: *item.clause_id.as_uuid(),
            clause_name: item.clause_name.clone(),
            category: item.category.to_string(),
            amount: item.calculated_amount.amount(),
            explanation: item.explanation.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkippedResponse {
    pub clause_id: Uuid,
    pub clause_name: String,
    pub reason: String,
}

impl From<&SkippedClause> for SkippedResponse {
    fn from(skipped: &SkippedClause) -> Self {
        Self {
            clause_id: *skipped.clause_id.as_uuid(),
            clause_name: skipped.clause_name.clone(),
            reason: skipped.reason.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    pub total_amount: Decimal,
    pub currency: String,
    pub line_items: Vec<LineResponse>,
    /// Percentage applied when the medical cost capped the total
    pub reduction_percentage: Option<Decimal>,
    pub skipped: Vec<SkippedResponse>,
}

impl From<&CalculationResult> for CalculationResponse {
    fn from(result: &CalculationResult) -> Self {
        Self {
            total_amount: result.total_amount.amount(),
            currency: result.total_amount.currency().code().to_string(),
            line_items: result.line_items.iter().map(LineResponse::from).collect(),
            reduction_percentage: result.reduction_ratio.map(|r| r.as_percentage()),
            skipped: result.skipped.iter().map(SkippedResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalculatedClaimResponse {
    pub claim: ClaimResponse,
    pub calculation: CalculationResponse,
}

#[derive(Debug, Serialize)]
pub struct ClaimDetailResponse {
    pub claim: ClaimResponse,
    pub line_items: Vec<LineResponse>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub claim_number: String,
    pub patient_name: String,
    pub status: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub line_items: Vec<SummaryLineResponse>,
    pub narrative: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryLineResponse {
    pub clause_name: String,
    pub category: String,
    pub amount: Decimal,
    pub explanation: String,
}

impl From<&ClaimSummary> for SummaryResponse {
    fn from(summary: &ClaimSummary) -> Self {
        Self {
            claim_number: summary.claim_number.clone(),
            patient_name: summary.patient_name.clone(),
            status: summary.status.to_string(),
            total_amount: summary.total_amount.amount(),
            currency: summary.total_amount.currency().code().to_string(),
            line_items: summary
                .lines
                .iter()
                .map(|line| SummaryLineResponse {
                    clause_name: line.clause_name.clone(),
                    category: line.category.to_string(),
                    amount: line.amount.amount(),
                    explanation: line.explanation.clone(),
                })
                .collect(),
            narrative: summary.narrative(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub total_claims: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub paid: u64,
    pub approval_rate: Decimal,
    pub total_amount: Decimal,
    pub average_amount: Decimal,
    pub max_amount: Decimal,
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

impl From<&ClaimStatistics> for StatisticsResponse {
    fn from(stats: &ClaimStatistics) -> Self {
        Self {
            total_claims: stats.total_claims,
            pending: stats.pending,
            approved: stats.approved,
            rejected: stats.rejected,
            paid: stats.paid,
            approval_rate: stats.approval_rate,
            total_amount: stats.total_amount.amount(),
            average_amount: stats.average_amount.amount(),
            max_amount: stats.max_amount.amount(),
            currency: stats.total_amount.currency().code().to_string(),
            generated_at: stats.generated_at,
        }
    }
}
