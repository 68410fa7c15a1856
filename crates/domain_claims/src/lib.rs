//! Claim Calculation Domain
//!
//! This crate decides which insurance clauses apply to a diagnosis and a
//! medical receipt, computes a payable amount per clause, and reconciles the
//! total against the actual medical cost.
//!
//! # Calculation Pipeline
//!
//! ```text
//! clauses -> validate terms -> MatchEngine -> AmountCalculator -> CapReconciler -> CalculationResult
//! ```
//!
//! [`engine::ClaimEngine`] runs the pipeline as a pure function.
//! [`ledger::ClaimLedger`] wraps it with loading, locking and persistence
//! through the port traits in [`ports`].

pub mod clause;
pub mod facts;
pub mod keywords;
pub mod matching;
pub mod calculation;
pub mod reconciliation;
pub mod engine;
pub mod claim;
pub mod ports;
pub mod ledger;
pub mod summary;
pub mod error;

pub use clause::{Benefit, Clause, ClauseCategory, ClauseDefect, ClauseTerms, SkippedClause, UnitType};
pub use facts::{ClaimFacts, DiagnosisFacts, ReceiptFacts};
pub use keywords::{DictionaryError, KeywordDictionary, KeywordEntry};
pub use matching::{Condition, Decision, DiagnosisMatchPolicy, MatchEngine, MatchRule, Matched, RuleTable, Strategy};
pub use calculation::{AmountCalculator, CalculatedLine, IndemnityTerms};
pub use reconciliation::{CapReconciler, Reconciliation};
pub use engine::{CalculationResult, ClaimEngine, EngineConfig};
pub use claim::{Claim, ClaimStatus, LineItem, RejectionReason};
pub use ports::{ClaimQuery, ClaimRepository, ClauseCatalog, StatusTotals};
pub use ledger::{CalculationOutcome, ClaimDetail, ClaimLedger, OpenClaimRequest};
pub use summary::{ClaimStatistics, ClaimSummary, SummaryLine};
pub use error::ClaimError;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryClaimStore;
