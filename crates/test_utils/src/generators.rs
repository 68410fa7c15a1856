//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating claim facts and clause
//! catalogs that respect the domain's value ranges.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::ProductId;
use domain_claims::{Clause, ClauseCategory, DiagnosisFacts, ReceiptFacts, UnitType};

use crate::builders::{ClauseBuilder, DiagnosisBuilder, ReceiptBuilder};

/// Strategy for clause categories
pub fn category_strategy() -> impl Strategy<Value = ClauseCategory> {
    prop_oneof![
        Just(ClauseCategory::Diagnosis),
        Just(ClauseCategory::Inpatient),
        Just(ClauseCategory::Outpatient),
        Just(ClauseCategory::Surgery),
        Just(ClauseCategory::Other),
    ]
}

/// Strategy for receipt totals in KRW
pub fn medical_cost_strategy() -> impl Strategy<Value = i64> {
    0i64..50_000_000i64
}

/// Strategy for admission lengths, zero included
pub fn admission_days_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(0u32), 1u32..120u32]
}

/// Strategy for well-formed clauses under one product
///
/// Amount clauses get a per-unit benefit of up to 5,000,000, percentage
/// clauses a share between 0 and 100.
pub fn clause_strategy(product_id: ProductId) -> impl Strategy<Value = Clause> {
    (
        category_strategy(),
        any::<bool>(),
        0i64..5_000_000i64,
        0i64..=100i64,
        proptest::option::of(0i64..10_000_000i64),
    )
        .prop_map(move |(category, percentage, amount, share, max_total)| {
            let builder = ClauseBuilder::new(product_id).with_category(category);
            let builder = if percentage {
                builder.with_unit_type(UnitType::Percentage).with_per_unit(Decimal::from(share))
            } else {
                builder.with_per_unit(Decimal::from(amount))
            };
            match max_total {
                Some(max) => builder.with_max_total(Decimal::from(max)).build(),
                None => builder.build(),
            }
        })
}

/// Strategy for a catalog of up to `max` clauses
pub fn catalog_strategy(max: usize) -> impl Strategy<Value = Vec<Clause>> {
    let product_id = ProductId::new_v7();
    prop::collection::vec(clause_strategy(product_id), 0..max)
}

/// Strategy for a matching diagnosis and receipt pair
pub fn facts_strategy() -> impl Strategy<Value = (DiagnosisFacts, ReceiptFacts)> {
    (admission_days_strategy(), medical_cost_strategy()).prop_map(|(days, total)| {
        (
            DiagnosisBuilder::new().with_admission_days(days).build(),
            ReceiptBuilder::new().with_total_amount(total).build(),
        )
    })
}
