//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClauseId, Currency, DiagnosisId, Money, ProductId, ReceiptId};
use domain_claims::{Clause, ClauseCategory, DiagnosisFacts, ReceiptFacts, UnitType};

const DEFAULT_PATIENT: &str = "Kim Minsu";

/// Builder for clauses
pub struct ClauseBuilder {
    id: ClauseId,
    product_id: ProductId,
    name: String,
    category: ClauseCategory,
    unit_type: UnitType,
    per_unit: Option<Decimal>,
    max_total: Option<Decimal>,
    conditions: Option<String>,
}

impl ClauseBuilder {
    /// A fixed 100,000 diagnosis benefit under `product_id`
    pub fn new(product_id: ProductId) -> Self {
        Self {
            id: ClauseId::new_v7(),
            product_id,
            name: "Injury Diagnosis".to_string(),
            category: ClauseCategory::Diagnosis,
            unit_type: UnitType::Amount,
            per_unit: Some(dec!(100000)),
            max_total: None,
            conditions: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: ClauseCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_unit_type(mut self, unit_type: UnitType) -> Self {
        self.unit_type = unit_type;
        self
    }

    pub fn with_per_unit(mut self, per_unit: Decimal) -> Self {
        self.per_unit = Some(per_unit);
        self
    }

    /// Clears `per_unit`, which makes the clause malformed
    pub fn without_per_unit(mut self) -> Self {
        self.per_unit = None;
        self
    }

    pub fn with_max_total(mut self, max_total: Decimal) -> Self {
        self.max_total = Some(max_total);
        self
    }

    pub fn build(self) -> Clause {
        Clause {
            id: self.id,
            product_id: self.product_id,
            name: self.name,
            category: self.category,
            unit_type: self.unit_type,
            per_unit: self.per_unit,
            max_total: self.max_total,
            conditions: self.conditions,
        }
    }
}

/// Builder for diagnosis facts
pub struct DiagnosisBuilder {
    facts: DiagnosisFacts,
}

impl Default for DiagnosisBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisBuilder {
    /// A distal radius fracture treated without admission
    pub fn new() -> Self {
        Self {
            facts: DiagnosisFacts {
                id: DiagnosisId::new_v7(),
                patient_name: DEFAULT_PATIENT.to_string(),
                diagnosis_name: "Distal radius fracture".to_string(),
                diagnosis_text: "Closed reduction and cast".to_string(),
                icd_code: Some("S52.5".to_string()),
                hospital_name: "Seoul National University Hospital".to_string(),
                admission_days: 0,
            },
        }
    }

    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.facts.patient_name = name.into();
        self
    }

    pub fn with_diagnosis_name(mut self, name: impl Into<String>) -> Self {
        self.facts.diagnosis_name = name.into();
        self
    }

    pub fn with_icd_code(mut self, code: impl Into<String>) -> Self {
        self.facts.icd_code = Some(code.into());
        self
    }

    pub fn with_admission_days(mut self, days: u32) -> Self {
        self.facts.admission_days = days;
        self
    }

    pub fn build(self) -> DiagnosisFacts {
        self.facts
    }
}

/// Builder for receipt facts
pub struct ReceiptBuilder {
    facts: ReceiptFacts,
}

impl Default for ReceiptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptBuilder {
    /// A 500,000 KRW receipt
    pub fn new() -> Self {
        Self {
            facts: ReceiptFacts {
                id: ReceiptId::new_v7(),
                patient_name: DEFAULT_PATIENT.to_string(),
                total_amount: Money::from_minor(500_000, Currency::KRW),
                treatment_details: "X-ray, cast, medication".to_string(),
            },
        }
    }

    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.facts.patient_name = name.into();
        self
    }

    /// Sets the total in KRW
    pub fn with_total_amount(mut self, total: i64) -> Self {
        self.facts.total_amount = Money::from_minor(total, Currency::KRW);
        self
    }

    pub fn build(self) -> ReceiptFacts {
        self.facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_share_patient() {
        let diagnosis = DiagnosisBuilder::new().build();
        let receipt = ReceiptBuilder::new().build();
        assert_eq!(diagnosis.patient_name, receipt.patient_name);
    }

    #[test]
    fn test_clause_builder_overrides() {
        let clause = ClauseBuilder::new(ProductId::new_v7())
            .with_category(ClauseCategory::Surgery)
            .without_per_unit()
            .build();

        assert_eq!(clause.category, ClauseCategory::Surgery);
        assert!(clause.per_unit.is_none());
    }
}
