//! Pure claim calculation
//!
//! `ClaimEngine::calculate` takes facts and candidate clauses and returns a
//! `CalculationResult`. It performs no I/O; persistence lives in
//! [`crate::ledger::ClaimLedger`].
//!
//! Per-clause problems (malformed terms, arithmetic failures) are isolated:
//! the clause is skipped and reported, and the remaining clauses carry on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use core_kernel::{Currency, Money, Rate};

use crate::calculation::{AmountCalculator, CalculatedLine, IndemnityTerms};
use crate::clause::{Clause, SkippedClause};
use crate::error::ClaimError;
use crate::facts::ClaimFacts;
use crate::keywords::KeywordDictionary;
use crate::matching::{Decision, DiagnosisMatchPolicy, MatchEngine, RuleTable};
use crate::reconciliation::CapReconciler;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Currency claims are calculated in
    #[serde(default = "default_currency")]
    pub currency: Currency,
    #[serde(default)]
    pub diagnosis_match: DiagnosisMatchPolicy,
    /// Overrides the built-in keyword dictionary
    #[serde(default)]
    pub keyword_dictionary_path: Option<PathBuf>,
    /// Deductible and coverage of indemnity clauses
    #[serde(default)]
    pub indemnity: IndemnityTerms,
}

fn default_currency() -> Currency {
    Currency::KRW
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            diagnosis_match: DiagnosisMatchPolicy::default(),
            keyword_dictionary_path: None,
            indemnity: IndemnityTerms::default(),
        }
    }
}

/// Outcome of one calculation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub total_amount: Money,
    pub line_items: Vec<CalculatedLine>,
    /// Ratio applied when the raw total exceeded the medical cost
    pub reduction_ratio: Option<Rate>,
    /// Clauses left out because of data-quality defects
    pub skipped: Vec<SkippedClause>,
}

impl CalculationResult {
    /// Returns true if anything is payable
    pub fn is_payable(&self) -> bool {
        self.total_amount.is_positive()
    }
}

/// Matches, computes and reconciles clauses for a claim
#[derive(Debug, Clone)]
pub struct ClaimEngine {
    currency: Currency,
    matcher: MatchEngine,
    calculator: AmountCalculator,
    reconciler: CapReconciler,
}

impl ClaimEngine {
    pub fn new(currency: Currency, matcher: MatchEngine) -> Self {
        Self {
            currency,
            matcher,
            calculator: AmountCalculator::new(),
            reconciler: CapReconciler::new(),
        }
    }

    /// Replaces the indemnity deductible and coverage
    pub fn with_indemnity(mut self, indemnity: IndemnityTerms) -> Self {
        self.calculator = AmountCalculator::with_indemnity(indemnity);
        self
    }

    /// Builds an engine from configuration, loading the keyword dictionary
    pub fn from_config(config: &EngineConfig) -> Result<Self, ClaimError> {
        let dictionary = match &config.keyword_dictionary_path {
            Some(path) => KeywordDictionary::from_path(path),
            None => KeywordDictionary::builtin(),
        }
        .map_err(|e| ClaimError::Configuration(e.to_string()))?;
        config.indemnity.validate()?;

        debug!(
            dictionary_version = %dictionary.version,
            diagnosis_match = ?config.diagnosis_match,
            indemnity_deductible = %config.indemnity.deductible,
            indemnity_coverage = %config.indemnity.coverage_percentage,
            "claim engine configured"
        );

        let matcher = MatchEngine::new(RuleTable::standard(), Arc::new(dictionary), config.diagnosis_match);
        Ok(Self::new(config.currency, matcher).with_indemnity(config.indemnity))
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn matcher(&self) -> &MatchEngine {
        &self.matcher
    }

    /// Calculates the payable amount for `facts` against `clauses`
    ///
    /// Line items come out in the order of `clauses`. Only facts-level
    /// problems fail the call; clause-level problems end up in `skipped`.
    pub fn calculate(&self, facts: &ClaimFacts, clauses: &[Clause]) -> Result<CalculationResult, ClaimError> {
        facts.validate()?;

        let cap = facts.medical_cost();
        if cap.currency() != self.currency {
            return Err(ClaimError::invalid_facts(format!(
                "receipt currency {} does not match engine currency {}",
                cap.currency(),
                self.currency
            )));
        }

        let mut lines = Vec::new();
        let mut skipped = Vec::new();

        for clause in clauses {
            let terms = match clause.terms(self.currency) {
                Ok(terms) => terms,
                Err(defect) => {
                    warn!(clause_id = %clause.id, clause_name = %clause.name, defect = %defect, "skipping malformed clause");
                    skipped.push(SkippedClause::new(clause, &defect));
                    continue;
                }
            };

            let strategy = match self.matcher.decide(facts, clause) {
                Decision::Applies(strategy) => strategy,
                Decision::Excluded(reason) => {
                    debug!(clause_id = %clause.id, category = %clause.category, reason, "clause excluded");
                    continue;
                }
            };

            match self.calculator.compute_raw(clause, &terms, strategy, facts) {
                Ok(line) if line.amount.is_zero() => {
                    debug!(clause_id = %clause.id, "dropping zero-amount line");
                }
                Ok(line) => {
                    debug!(clause_id = %clause.id, strategy = strategy.as_str(), amount = line.amount.minor_units(), "clause applied");
                    lines.push(line);
                }
                Err(defect) => {
                    warn!(clause_id = %clause.id, clause_name = %clause.name, defect = %defect, "clause computation failed");
                    skipped.push(SkippedClause::new(clause, &defect));
                }
            }
        }

        let reconciled = self.reconciler.reconcile(lines, cap)?;

        Ok(CalculationResult {
            total_amount: reconciled.total,
            line_items: reconciled.lines,
            reduction_ratio: reconciled.reduction,
            skipped,
        })
    }
}
