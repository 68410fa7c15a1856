//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for the claim calculation scenarios. Fixtures are
//! deterministic except where a fake name is asked for explicitly.

use fake::faker::name::en::Name;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::{Currency, Money, ProductId};
use domain_claims::{
    ClaimEngine, Clause, ClauseCategory, DiagnosisFacts, EngineConfig, KeywordDictionary,
    MatchEngine, ReceiptFacts, RuleTable, UnitType,
};

use crate::builders::{ClauseBuilder, DiagnosisBuilder, ReceiptBuilder};

static BUILTIN_DICTIONARY: Lazy<Arc<KeywordDictionary>> = Lazy::new(|| {
    Arc::new(KeywordDictionary::builtin().expect("builtin keyword dictionary is valid"))
});

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn krw(amount: i64) -> Money {
        Money::from_minor(amount, Currency::KRW)
    }

    pub fn krw_zero() -> Money {
        Money::zero(Currency::KRW)
    }

    /// A USD amount for currency mismatch tests
    pub fn usd_100() -> Money {
        Money::from_minor(10_000, Currency::USD)
    }
}

/// Fixture for diagnoses and receipts
pub struct FactFixtures;

impl FactFixtures {
    /// Five-day hospital stay for a fracture
    pub fn inpatient_fracture() -> DiagnosisFacts {
        DiagnosisBuilder::new().with_admission_days(5).build()
    }

    /// Outpatient visit, no admission
    pub fn outpatient_visit() -> DiagnosisFacts {
        DiagnosisBuilder::new()
            .with_diagnosis_name("Acute bronchitis")
            .with_icd_code("J20.9")
            .with_admission_days(0)
            .build()
    }

    pub fn receipt(total: i64) -> ReceiptFacts {
        ReceiptBuilder::new().with_total_amount(total).build()
    }

    /// A random patient name
    pub fn patient_name() -> String {
        Name().fake()
    }
}

/// Fixture for clause catalogs
pub struct ClauseFixtures;

impl ClauseFixtures {
    /// Daily inpatient benefit of 50,000 capped at 900,000
    pub fn hospital_daily(product_id: ProductId) -> Clause {
        ClauseBuilder::new(product_id)
            .with_name("Hospital Daily")
            .with_category(ClauseCategory::Inpatient)
            .with_per_unit(dec!(50000))
            .with_max_total(dec!(900000))
            .build()
    }

    /// Outpatient benefit of 30,000 per visit
    pub fn outpatient_care(product_id: ProductId) -> Clause {
        ClauseBuilder::new(product_id)
            .with_name("Outpatient Care")
            .with_category(ClauseCategory::Outpatient)
            .with_per_unit(dec!(30000))
            .build()
    }

    /// 80% share of the medical cost
    pub fn medical_expense_share(product_id: ProductId) -> Clause {
        ClauseBuilder::new(product_id)
            .with_name("Medical Expense Share")
            .with_category(ClauseCategory::Diagnosis)
            .with_unit_type(UnitType::Percentage)
            .with_per_unit(dec!(80))
            .build()
    }

    /// A percentage clause that cannot be evaluated
    pub fn malformed_percentage(product_id: ProductId) -> Clause {
        ClauseBuilder::new(product_id)
            .with_name("Broken Percentage")
            .with_unit_type(UnitType::Percentage)
            .with_per_unit(dec!(150))
            .build()
    }

    /// A small product covering inpatient, outpatient and diagnosis benefits
    pub fn standard_catalog(product_id: ProductId) -> Vec<Clause> {
        vec![
            Self::hospital_daily(product_id),
            Self::outpatient_care(product_id),
            ClauseBuilder::new(product_id)
                .with_name("Fracture Diagnosis")
                .with_per_unit(dec!(200000))
                .build(),
        ]
    }
}

/// Fixture for engines
pub struct EngineFixtures;

impl EngineFixtures {
    /// A KRW engine over the builtin dictionary
    pub fn default_engine() -> ClaimEngine {
        let config = EngineConfig::default();
        let matcher = MatchEngine::new(
            RuleTable::standard(),
            BUILTIN_DICTIONARY.clone(),
            config.diagnosis_match,
        );
        ClaimEngine::new(config.currency, matcher).with_indemnity(config.indemnity)
    }

    pub fn dictionary() -> Arc<KeywordDictionary> {
        BUILTIN_DICTIONARY.clone()
    }
}
