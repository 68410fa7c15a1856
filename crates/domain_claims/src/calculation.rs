//! Raw amount calculation per clause
//!
//! Every strategy produces an amount in integer minor units and an English
//! audit line. `max_total`, when the clause defines one, caps the result of
//! every strategy.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{ClauseId, Money, Rate};

use crate::clause::{Benefit, Clause, ClauseCategory, ClauseDefect, ClauseTerms};
use crate::error::ClaimError;
use crate::facts::ClaimFacts;
use crate::matching::Strategy;

/// Deductible and coverage of indemnity (actual-loss) clauses
///
/// An indemnity clause pays `min((medical cost - deductible) × coverage,
/// per_unit)`, never less than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndemnityTerms {
    /// Subtracted from the medical cost first, in major units
    #[serde(default = "default_deductible")]
    pub deductible: Decimal,
    /// Covered share of the remainder, 0 to 100
    #[serde(default = "default_coverage_percentage")]
    pub coverage_percentage: Decimal,
}

fn default_deductible() -> Decimal {
    dec!(20000)
}

fn default_coverage_percentage() -> Decimal {
    dec!(80)
}

impl Default for IndemnityTerms {
    fn default() -> Self {
        Self {
            deductible: default_deductible(),
            coverage_percentage: default_coverage_percentage(),
        }
    }
}

impl IndemnityTerms {
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.deductible.is_sign_negative() {
            return Err(ClaimError::Configuration(format!(
                "indemnity deductible must not be negative, got {}",
                self.deductible
            )));
        }
        if self.coverage_percentage < Decimal::ZERO || self.coverage_percentage > dec!(100) {
            return Err(ClaimError::Configuration(format!(
                "indemnity coverage must be between 0 and 100, got {}",
                self.coverage_percentage
            )));
        }
        Ok(())
    }

    pub fn coverage(&self) -> Rate {
        Rate::from_percentage(self.coverage_percentage)
    }
}

/// One clause's computed contribution to a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedLine {
    pub clause_id: ClauseId,
    pub clause_name: String,
    pub category: ClauseCategory,
    pub amount: Money,
    pub explanation: String,
}

/// Computes raw, pre-reconciliation amounts
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountCalculator {
    indemnity: IndemnityTerms,
}

impl AmountCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculator with the given indemnity deductible and coverage
    pub fn with_indemnity(indemnity: IndemnityTerms) -> Self {
        Self { indemnity }
    }

    pub fn indemnity(&self) -> &IndemnityTerms {
        &self.indemnity
    }

    /// Computes the raw amount for a matched clause
    ///
    /// # Arguments
    ///
    /// * `clause` - The clause being paid
    /// * `terms` - Its validated terms, in the receipt currency
    /// * `strategy` - The strategy chosen by the match engine
    /// * `facts` - Diagnosis and receipt
    ///
    /// # Returns
    ///
    /// The line, or the defect that kept this clause from being paid
    pub fn compute_raw(
        &self,
        clause: &Clause,
        terms: &ClauseTerms,
        strategy: Strategy,
        facts: &ClaimFacts,
    ) -> Result<CalculatedLine, ClauseDefect> {
        let label = format!("{} clause '{}'", clause.category, clause.name);
        let medical_cost = facts.medical_cost();

        let (amount, mut explanation) = match (strategy, terms.benefit) {
            (Strategy::OneTime, Benefit::Fixed(per_unit)) => (
                per_unit,
                format!(
                    "{}: one-time benefit for '{}' = {}",
                    label,
                    facts.diagnosis.diagnosis_name,
                    per_unit.grouped()
                ),
            ),
            (Strategy::PerAdmissionDay, Benefit::Fixed(per_day)) => {
                let days = facts.diagnosis.admission_days;
                let amount = per_day.checked_mul(i64::from(days))?;
                (
                    amount,
                    format!("{}: {} days × {} = {}", label, days, per_day.grouped(), amount.grouped()),
                )
            }
            (Strategy::CappedByMedicalCost, Benefit::Fixed(limit)) => {
                let amount = medical_cost.min(&limit)?;
                (
                    amount,
                    format!(
                        "{}: min({}, {}) = {}",
                        label,
                        medical_cost.grouped(),
                        limit.grouped(),
                        amount.grouped()
                    ),
                )
            }
            (Strategy::Indemnity, Benefit::Fixed(limit)) => {
                let deductible = Money::from_major(self.indemnity.deductible, medical_cost.currency())?;
                let coverage = self.indemnity.coverage();
                let remainder = medical_cost.checked_sub(&deductible)?;
                let remainder = if remainder.is_negative() {
                    Money::zero(medical_cost.currency())
                } else {
                    remainder
                };
                let amount = remainder.apply_rate(&coverage)?.min(&limit)?;
                (
                    amount,
                    format!(
                        "{}: min(({} - {}) × {}, {}) = {}",
                        label,
                        medical_cost.grouped(),
                        deductible.grouped(),
                        coverage,
                        limit.grouped(),
                        amount.grouped()
                    ),
                )
            }
            (Strategy::ShareOfMedicalCost, Benefit::Share(rate)) => {
                let share = medical_cost.apply_rate(&rate)?;
                let amount = share.min(&medical_cost)?;
                (
                    amount,
                    format!("{}: {} × {} = {}", label, medical_cost.grouped(), rate, amount.grouped()),
                )
            }
            (strategy, benefit) => {
                return Err(ClauseDefect::StrategyMismatch {
                    strategy: strategy.as_str(),
                    unit_type: match benefit {
                        Benefit::Fixed(_) => "amount",
                        Benefit::Share(_) => "percentage",
                    },
                })
            }
        };

        let amount = match terms.max_total {
            Some(max_total) => {
                let capped = amount.min(&max_total)?;
                if capped != amount {
                    explanation.push_str(&format!(", limited to max_total {}", max_total.grouped()));
                }
                capped
            }
            None => amount,
        };

        Ok(CalculatedLine {
            clause_id: clause.id,
            clause_name: clause.name.clone(),
            category: clause.category,
            amount,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, DiagnosisId, ProductId, ReceiptId};

    use crate::clause::UnitType;
    use crate::facts::{DiagnosisFacts, ReceiptFacts};

    fn facts(admission_days: u32, total: i64) -> ClaimFacts {
        ClaimFacts {
            diagnosis: DiagnosisFacts {
                id: DiagnosisId::new_v7(),
                patient_name: "Kim".to_string(),
                diagnosis_name: "Femur fracture".to_string(),
                diagnosis_text: String::new(),
                icd_code: Some("S72.0".to_string()),
                hospital_name: "Seoul Hospital".to_string(),
                admission_days,
            },
            receipt: ReceiptFacts {
                id: ReceiptId::new_v7(),
                patient_name: "Kim".to_string(),
                total_amount: Money::from_minor(total, Currency::KRW),
                treatment_details: String::new(),
            },
        }
    }

    fn clause(
        category: ClauseCategory,
        unit_type: UnitType,
        per_unit: Decimal,
        max_total: Option<Decimal>,
    ) -> Clause {
        Clause {
            id: ClauseId::new_v7(),
            product_id: ProductId::new_v7(),
            name: "Benefit".to_string(),
            category,
            unit_type,
            per_unit: Some(per_unit),
            max_total,
            conditions: None,
        }
    }

    fn compute(clause: &Clause, strategy: Strategy, facts: &ClaimFacts) -> Result<CalculatedLine, ClauseDefect> {
        let terms = clause.terms(Currency::KRW)?;
        AmountCalculator::new().compute_raw(clause, &terms, strategy, facts)
    }

    #[test]
    fn test_per_admission_day() {
        let c = clause(ClauseCategory::Inpatient, UnitType::Amount, dec!(50000), Some(dec!(900000)));
        let line = compute(&c, Strategy::PerAdmissionDay, &facts(5, 800_000)).unwrap();

        assert_eq!(line.amount.minor_units(), 250_000);
        assert_eq!(line.explanation, "inpatient clause 'Benefit': 5 days × 50,000 = 250,000");
    }

    #[test]
    fn test_per_admission_day_capped_by_max_total() {
        let c = clause(ClauseCategory::Inpatient, UnitType::Amount, dec!(50000), Some(dec!(900000)));
        let line = compute(&c, Strategy::PerAdmissionDay, &facts(30, 5_000_000)).unwrap();

        assert_eq!(line.amount.minor_units(), 900_000);
        assert!(line.explanation.ends_with("limited to max_total 900,000"));
    }

    #[test]
    fn test_capped_by_medical_cost() {
        let c = clause(ClauseCategory::Outpatient, UnitType::Amount, dec!(30000), None);
        let line = compute(&c, Strategy::CappedByMedicalCost, &facts(0, 12_000)).unwrap();
        assert_eq!(line.amount.minor_units(), 12_000);

        let line = compute(&c, Strategy::CappedByMedicalCost, &facts(0, 120_000)).unwrap();
        assert_eq!(line.amount.minor_units(), 30_000);
        assert_eq!(line.explanation, "outpatient clause 'Benefit': min(120,000, 30,000) = 30,000");
    }

    #[test]
    fn test_one_time() {
        let c = clause(ClauseCategory::Diagnosis, UnitType::Amount, dec!(1000000), None);
        let line = compute(&c, Strategy::OneTime, &facts(0, 100_000)).unwrap();

        assert_eq!(line.amount.minor_units(), 1_000_000);
        assert!(line.explanation.contains("Femur fracture"));
    }

    #[test]
    fn test_share_of_medical_cost() {
        let c = clause(ClauseCategory::Other, UnitType::Percentage, dec!(80), None);
        let line = compute(&c, Strategy::ShareOfMedicalCost, &facts(0, 100_000)).unwrap();

        assert_eq!(line.amount.minor_units(), 80_000);
        assert_eq!(line.explanation, "other clause 'Benefit': 100,000 × 80% = 80,000");
    }

    #[test]
    fn test_share_capped_by_max_total() {
        let c = clause(ClauseCategory::Other, UnitType::Percentage, dec!(80), Some(dec!(50000)));
        let line = compute(&c, Strategy::ShareOfMedicalCost, &facts(0, 100_000)).unwrap();
        assert_eq!(line.amount.minor_units(), 50_000);
    }

    #[test]
    fn test_indemnity_deducts_then_covers() {
        let c = clause(ClauseCategory::Other, UnitType::Amount, dec!(5000000), None);
        let line = compute(&c, Strategy::Indemnity, &facts(0, 300_000)).unwrap();

        assert_eq!(line.amount.minor_units(), 224_000);
        assert_eq!(
            line.explanation,
            "other clause 'Benefit': min((300,000 - 20,000) × 80%, 5,000,000) = 224,000"
        );
    }

    #[test]
    fn test_indemnity_limited_by_per_unit() {
        let c = clause(ClauseCategory::Other, UnitType::Amount, dec!(100000), None);
        let line = compute(&c, Strategy::Indemnity, &facts(0, 300_000)).unwrap();
        assert_eq!(line.amount.minor_units(), 100_000);
    }

    #[test]
    fn test_indemnity_below_deductible_pays_nothing() {
        let c = clause(ClauseCategory::Other, UnitType::Amount, dec!(100000), None);
        let line = compute(&c, Strategy::Indemnity, &facts(0, 15_000)).unwrap();
        assert!(line.amount.is_zero());
    }

    #[test]
    fn test_indemnity_uses_configured_terms() {
        let c = clause(ClauseCategory::Other, UnitType::Amount, dec!(5000000), None);
        let terms = c.terms(Currency::KRW).unwrap();
        let calculator = AmountCalculator::with_indemnity(IndemnityTerms {
            deductible: dec!(10000),
            coverage_percentage: dec!(90),
        });

        let line = calculator
            .compute_raw(&c, &terms, Strategy::Indemnity, &facts(0, 110_000))
            .unwrap();
        assert_eq!(line.amount.minor_units(), 90_000);
    }

    #[test]
    fn test_indemnity_terms_validation() {
        assert!(IndemnityTerms::default().validate().is_ok());

        let negative = IndemnityTerms {
            deductible: dec!(-1),
            ..IndemnityTerms::default()
        };
        assert!(matches!(negative.validate(), Err(ClaimError::Configuration(_))));

        let over = IndemnityTerms {
            coverage_percentage: dec!(101),
            ..IndemnityTerms::default()
        };
        assert!(matches!(over.validate(), Err(ClaimError::Configuration(_))));
    }

    #[test]
    fn test_indemnity_with_percentage_is_defect() {
        let c = clause(ClauseCategory::Other, UnitType::Percentage, dec!(80), None);
        let result = compute(&c, Strategy::Indemnity, &facts(0, 100_000));
        assert!(matches!(result, Err(ClauseDefect::StrategyMismatch { .. })));
    }

    #[test]
    fn test_strategy_mismatch_is_defect() {
        let c = clause(ClauseCategory::Inpatient, UnitType::Percentage, dec!(50), None);
        let result = compute(&c, Strategy::PerAdmissionDay, &facts(2, 100_000));
        assert!(matches!(result, Err(ClauseDefect::StrategyMismatch { .. })));
    }

    #[test]
    fn test_overflow_is_defect() {
        let c = clause(
            ClauseCategory::Inpatient,
            UnitType::Amount,
            Decimal::from(i64::MAX / 2),
            None,
        );
        let result = compute(&c, Strategy::PerAdmissionDay, &facts(3, 100_000));
        assert!(matches!(result, Err(ClauseDefect::Arithmetic(_))));
    }
}
