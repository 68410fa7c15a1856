//! Diagnosis and receipt facts a calculation is based on
//!
//! Facts are produced outside this crate (manual entry or document
//! extraction) and are read-only here.

use serde::{Deserialize, Serialize};

use core_kernel::{DiagnosisId, Money, ReceiptId};

use crate::error::ClaimError;

/// A medical diagnosis record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisFacts {
    pub id: DiagnosisId,
    pub patient_name: String,
    pub diagnosis_name: String,
    /// Free-text clinical notes
    pub diagnosis_text: String,
    pub icd_code: Option<String>,
    pub hospital_name: String,
    pub admission_days: u32,
}

impl DiagnosisFacts {
    /// Returns true if the patient was admitted
    pub fn is_admitted(&self) -> bool {
        self.admission_days > 0
    }
}

/// A medical-cost receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptFacts {
    pub id: ReceiptId,
    pub patient_name: String,
    pub total_amount: Money,
    pub treatment_details: String,
}

/// The diagnosis and receipt behind one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimFacts {
    pub diagnosis: DiagnosisFacts,
    pub receipt: ReceiptFacts,
}

impl ClaimFacts {
    /// Pairs a diagnosis with a receipt, rejecting a negative medical cost
    pub fn new(diagnosis: DiagnosisFacts, receipt: ReceiptFacts) -> Result<Self, ClaimError> {
        let facts = Self { diagnosis, receipt };
        facts.validate()?;
        Ok(facts)
    }

    /// Checks the invariants the engine relies on
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.receipt.total_amount.is_negative() {
            return Err(ClaimError::invalid_facts(format!(
                "receipt total {} is negative",
                self.receipt.total_amount
            )));
        }
        Ok(())
    }

    /// The actual medical cost, the ceiling for the whole claim
    pub fn medical_cost(&self) -> Money {
        self.receipt.total_amount
    }
}
