//! Clause matching
//!
//! Matching is driven by an ordered rule table rather than branching code.
//! Each `MatchRule` pairs a clause category with the condition the facts must
//! satisfy and the strategy used to pay the clause. The first rule whose
//! category matches decides the clause: if its condition fails the clause is
//! excluded, there is no fall-through to later rules. A category with no rule
//! is excluded as well.
//!
//! | category   | condition          | strategy              |
//! |------------|--------------------|-----------------------|
//! | inpatient  | admitted           | per admission day     |
//! | outpatient | not admitted       | capped by medical cost|
//! | surgery    | surgery mentioned  | one-time              |
//! | diagnosis  | diagnosis policy   | one-time              |
//! | other      | keyword hit        | one-time              |
//!
//! A keyword entry may carry its own strategy; on keyword-hit rows it
//! replaces the rule's. The shipped dictionary routes indemnity clauses
//! (실손, 의료비) this way.
//!
//! Percentage clauses are always paid as a share of the medical cost,
//! whichever rule admitted them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::clause::{Clause, ClauseCategory, UnitType};
use crate::facts::ClaimFacts;
use crate::keywords::{KeywordDictionary, KeywordEntry};

/// What the facts must satisfy for a clause to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Admission days > 0
    Admitted,
    /// Admission days == 0
    NotAdmitted,
    /// The diagnosis text mentions a surgery term
    SurgeryMentioned,
    /// Governed by the configured `DiagnosisMatchPolicy`
    DiagnosisPolicy,
    /// The clause resolves to a keyword entry that hits the diagnosis
    KeywordHit,
}

/// How an applicable clause is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `per_unit` once
    OneTime,
    /// `per_unit` × admission days
    PerAdmissionDay,
    /// `min(medical cost, per_unit)`
    CappedByMedicalCost,
    /// `medical cost × per_unit%`
    ShareOfMedicalCost,
    /// `min((medical cost - deductible) × coverage, per_unit)`
    Indemnity,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::OneTime => "one_time",
            Strategy::PerAdmissionDay => "per_admission_day",
            Strategy::CappedByMedicalCost => "capped_by_medical_cost",
            Strategy::ShareOfMedicalCost => "share_of_medical_cost",
            Strategy::Indemnity => "indemnity",
        }
    }
}

/// How diagnosis-category clauses are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisMatchPolicy {
    /// Every diagnosis clause applies
    #[default]
    Always,
    /// A diagnosis clause applies only when its keyword entry hits
    Keyword,
}

/// One row of the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    pub category: ClauseCategory,
    pub condition: Condition,
    pub strategy: Strategy,
}

impl MatchRule {
    pub const fn new(category: ClauseCategory, condition: Condition, strategy: Strategy) -> Self {
        Self {
            category,
            condition,
            strategy,
        }
    }
}

/// Ordered list of match rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<MatchRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self { rules }
    }

    /// The default table, in priority order
    pub fn standard() -> Self {
        Self::new(vec![
            MatchRule::new(ClauseCategory::Inpatient, Condition::Admitted, Strategy::PerAdmissionDay),
            MatchRule::new(ClauseCategory::Outpatient, Condition::NotAdmitted, Strategy::CappedByMedicalCost),
            MatchRule::new(ClauseCategory::Surgery, Condition::SurgeryMentioned, Strategy::OneTime),
            MatchRule::new(ClauseCategory::Diagnosis, Condition::DiagnosisPolicy, Strategy::OneTime),
            MatchRule::new(ClauseCategory::Other, Condition::KeywordHit, Strategy::OneTime),
        ])
    }

    /// The first rule for `category`
    pub fn rule_for(&self, category: ClauseCategory) -> Option<&MatchRule> {
        self.rules.iter().find(|rule| rule.category == category)
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Outcome of matching one clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Applies(Strategy),
    Excluded(&'static str),
}

/// A clause selected for payment together with its strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matched<'a> {
    pub clause: &'a Clause,
    pub strategy: Strategy,
}

/// Decides which clauses apply to a diagnosis and receipt
#[derive(Debug, Clone)]
pub struct MatchEngine {
    rules: RuleTable,
    dictionary: Arc<KeywordDictionary>,
    diagnosis_policy: DiagnosisMatchPolicy,
}

impl MatchEngine {
    pub fn new(
        rules: RuleTable,
        dictionary: Arc<KeywordDictionary>,
        diagnosis_policy: DiagnosisMatchPolicy,
    ) -> Self {
        Self {
            rules,
            dictionary,
            diagnosis_policy,
        }
    }

    pub fn dictionary(&self) -> &KeywordDictionary {
        &self.dictionary
    }

    /// Decides a single clause
    pub fn decide(&self, facts: &ClaimFacts, clause: &Clause) -> Decision {
        let Some(rule) = self.rules.rule_for(clause.category) else {
            return Decision::Excluded("no rule for category");
        };

        let mut strategy = rule.strategy;
        let satisfied = match rule.condition {
            Condition::Admitted => facts.diagnosis.is_admitted(),
            Condition::NotAdmitted => !facts.diagnosis.is_admitted(),
            Condition::SurgeryMentioned => self.dictionary.mentions_surgery(&facts.diagnosis),
            Condition::DiagnosisPolicy => match self.diagnosis_policy {
                DiagnosisMatchPolicy::Always => true,
                DiagnosisMatchPolicy::Keyword => self.keyword_hit(facts, clause).is_some(),
            },
            Condition::KeywordHit => match self.keyword_hit(facts, clause) {
                Some(entry) => {
                    strategy = entry.strategy.unwrap_or(strategy);
                    true
                }
                None => false,
            },
        };

        if !satisfied {
            return Decision::Excluded(match rule.condition {
                Condition::Admitted => "patient was not admitted",
                Condition::NotAdmitted => "patient was admitted",
                Condition::SurgeryMentioned => "no surgery mentioned",
                Condition::DiagnosisPolicy | Condition::KeywordHit => "no keyword hit",
            });
        }

        let strategy = match clause.unit_type {
            UnitType::Percentage => Strategy::ShareOfMedicalCost,
            UnitType::Amount => strategy,
        };
        Decision::Applies(strategy)
    }

    /// The clause's keyword entry, if it hits the diagnosis
    fn keyword_hit(&self, facts: &ClaimFacts, clause: &Clause) -> Option<&KeywordEntry> {
        self.dictionary
            .resolve(&clause.searchable_text())
            .filter(|entry| entry.hits(&facts.diagnosis))
    }

    /// Filters `candidates` down to the applicable clauses, preserving
    /// input order
    pub fn select<'a>(&self, facts: &ClaimFacts, candidates: &'a [Clause]) -> Vec<Matched<'a>> {
        candidates
            .iter()
            .filter_map(|clause| match self.decide(facts, clause) {
                Decision::Applies(strategy) => Some(Matched { clause, strategy }),
                Decision::Excluded(reason) => {
                    debug!(clause_id = %clause.id, category = %clause.category, reason, "clause excluded");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{ClauseId, Currency, DiagnosisId, Money, ProductId, ReceiptId};
    use rust_decimal_macros::dec;

    use crate::facts::{DiagnosisFacts, ReceiptFacts};

    fn facts(admission_days: u32, diagnosis_name: &str, diagnosis_text: &str) -> ClaimFacts {
        ClaimFacts {
            diagnosis: DiagnosisFacts {
                id: DiagnosisId::new_v7(),
                patient_name: "Kim".to_string(),
                diagnosis_name: diagnosis_name.to_string(),
                diagnosis_text: diagnosis_text.to_string(),
                icd_code: None,
                hospital_name: "Seoul Hospital".to_string(),
                admission_days,
            },
            receipt: ReceiptFacts {
                id: ReceiptId::new_v7(),
                patient_name: "Kim".to_string(),
                total_amount: Money::from_minor(800_000, Currency::KRW),
                treatment_details: String::new(),
            },
        }
    }

    fn clause(name: &str, category: ClauseCategory, unit_type: UnitType) -> Clause {
        Clause {
            id: ClauseId::new_v7(),
            product_id: ProductId::new_v7(),
            name: name.to_string(),
            category,
            unit_type,
            per_unit: Some(dec!(10000)),
            max_total: None,
            conditions: None,
        }
    }

    fn engine(policy: DiagnosisMatchPolicy) -> MatchEngine {
        MatchEngine::new(
            RuleTable::standard(),
            Arc::new(KeywordDictionary::builtin().unwrap()),
            policy,
        )
    }

    #[test]
    fn test_admission_gating() {
        let engine = engine(DiagnosisMatchPolicy::Always);
        let inpatient = clause("Hospital Daily", ClauseCategory::Inpatient, UnitType::Amount);
        let outpatient = clause("Outpatient Care", ClauseCategory::Outpatient, UnitType::Amount);

        let admitted = facts(3, "Pneumonia", "");
        assert_eq!(engine.decide(&admitted, &inpatient), Decision::Applies(Strategy::PerAdmissionDay));
        assert!(matches!(engine.decide(&admitted, &outpatient), Decision::Excluded(_)));

        let outpatient_visit = facts(0, "Pneumonia", "");
        assert!(matches!(engine.decide(&outpatient_visit, &inpatient), Decision::Excluded(_)));
        assert_eq!(
            engine.decide(&outpatient_visit, &outpatient),
            Decision::Applies(Strategy::CappedByMedicalCost)
        );
    }

    #[test]
    fn test_surgery_requires_mention() {
        let engine = engine(DiagnosisMatchPolicy::Always);
        let surgery = clause("Surgery Benefit", ClauseCategory::Surgery, UnitType::Amount);

        assert_eq!(
            engine.decide(&facts(0, "Appendicitis", "laparoscopic surgery performed"), &surgery),
            Decision::Applies(Strategy::OneTime)
        );
        assert!(matches!(
            engine.decide(&facts(0, "Appendicitis", "antibiotics"), &surgery),
            Decision::Excluded(_)
        ));
    }

    #[test]
    fn test_diagnosis_policy() {
        let diagnosis = clause("Fracture Diagnosis", ClauseCategory::Diagnosis, UnitType::Amount);
        let cold = facts(0, "Common cold", "");

        let always = engine(DiagnosisMatchPolicy::Always);
        assert_eq!(always.decide(&cold, &diagnosis), Decision::Applies(Strategy::OneTime));

        let keyword = engine(DiagnosisMatchPolicy::Keyword);
        assert!(matches!(keyword.decide(&cold, &diagnosis), Decision::Excluded(_)));
        assert_eq!(
            keyword.decide(&facts(0, "Wrist fracture", ""), &diagnosis),
            Decision::Applies(Strategy::OneTime)
        );
    }

    #[test]
    fn test_keyword_clause_fails_closed() {
        let engine = engine(DiagnosisMatchPolicy::Always);
        let unresolvable = clause("Dental Care", ClauseCategory::Other, UnitType::Amount);
        assert!(matches!(
            engine.decide(&facts(0, "Caries", ""), &unresolvable),
            Decision::Excluded(_)
        ));

        let disease = clause("Disease Care", ClauseCategory::Other, UnitType::Amount);
        assert_eq!(engine.decide(&facts(0, "Caries", ""), &disease), Decision::Applies(Strategy::OneTime));
    }

    #[test]
    fn test_indemnity_keywords_route_to_indemnity() {
        let engine = engine(DiagnosisMatchPolicy::Always);
        let flu = facts(0, "Flu", "");

        for name in ["실손의료비", "질병 의료비", "Actual Loss Medical Expense"] {
            let indemnity = clause(name, ClauseCategory::Other, UnitType::Amount);
            assert_eq!(engine.decide(&flu, &indemnity), Decision::Applies(Strategy::Indemnity), "{name}");
        }

        let share = clause("실손의료비", ClauseCategory::Other, UnitType::Percentage);
        assert_eq!(engine.decide(&flu, &share), Decision::Applies(Strategy::ShareOfMedicalCost));
    }

    #[test]
    fn test_entry_strategy_ignored_outside_keyword_rows() {
        let engine = engine(DiagnosisMatchPolicy::Keyword);
        let diagnosis = clause("실손 진단비", ClauseCategory::Diagnosis, UnitType::Amount);
        assert_eq!(
            engine.decide(&facts(0, "Flu", ""), &diagnosis),
            Decision::Applies(Strategy::OneTime)
        );
    }

    #[test]
    fn test_percentage_uses_share_strategy() {
        let engine = engine(DiagnosisMatchPolicy::Always);
        let share = clause("Outpatient Copay", ClauseCategory::Outpatient, UnitType::Percentage);
        assert_eq!(
            engine.decide(&facts(0, "Flu", ""), &share),
            Decision::Applies(Strategy::ShareOfMedicalCost)
        );
    }

    #[test]
    fn test_missing_rule_excludes() {
        let engine = MatchEngine::new(
            RuleTable::new(vec![]),
            Arc::new(KeywordDictionary::builtin().unwrap()),
            DiagnosisMatchPolicy::Always,
        );
        let diagnosis = clause("Diagnosis", ClauseCategory::Diagnosis, UnitType::Amount);
        assert_eq!(
            engine.decide(&facts(0, "Flu", ""), &diagnosis),
            Decision::Excluded("no rule for category")
        );
    }

    #[test]
    fn test_select_preserves_order() {
        let engine = engine(DiagnosisMatchPolicy::Always);
        let candidates = vec![
            clause("Diagnosis B", ClauseCategory::Diagnosis, UnitType::Amount),
            clause("Hospital Daily", ClauseCategory::Inpatient, UnitType::Amount),
            clause("Diagnosis A", ClauseCategory::Diagnosis, UnitType::Amount),
        ];

        let matched = engine.select(&facts(0, "Flu", ""), &candidates);
        let names: Vec<_> = matched.iter().map(|m| m.clause.name.as_str()).collect();
        assert_eq!(names, vec!["Diagnosis B", "Diagnosis A"]);
    }
}
