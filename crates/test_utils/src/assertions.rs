//! Custom Test Assertions
//!
//! Assertion helpers for calculation results that give more meaningful
//! failure messages than standard assertions.

use core_kernel::Money;
use domain_claims::{CalculationResult, ClaimStatus, LineItem};

/// Asserts that a Money value has the expected minor units
///
/// # Panics
///
/// Panics with both amounts formatted if they differ
pub fn assert_money_eq(actual: &Money, expected_minor: i64) {
    assert_eq!(
        actual.minor_units(),
        expected_minor,
        "Expected {} minor units, got {}",
        expected_minor,
        actual
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that a result's lines sum to its total and stay within the
/// medical cost
///
/// # Panics
///
/// Panics if either bound is broken
pub fn assert_within_medical_cost(result: &CalculationResult, medical_cost: &Money) {
    let sum = Money::sum(result.line_items.iter().map(|l| &l.amount), medical_cost.currency())
        .expect("line items share the medical cost currency");

    assert_eq!(
        sum, result.total_amount,
        "Line items sum to {} but total is {}",
        sum, result.total_amount
    );
    assert!(
        sum.minor_units() <= medical_cost.minor_units(),
        "Total {} exceeds medical cost {}",
        sum,
        medical_cost
    );
}

/// Asserts the line amounts of a result in order
pub fn assert_line_amounts(result: &CalculationResult, expected_minor: &[i64]) {
    let actual: Vec<i64> = result.line_items.iter().map(|l| l.amount.minor_units()).collect();
    assert_eq!(actual, expected_minor, "Line amounts differ");
}

/// Asserts that persisted line items match a calculation result
pub fn assert_items_match_result(items: &[LineItem], result: &CalculationResult) {
    assert_eq!(
        items.len(),
        result.line_items.len(),
        "Expected {} persisted items, got {}",
        result.line_items.len(),
        items.len()
    );
    for (item, line) in items.iter().zip(&result.line_items) {
        assert_eq!(item.clause_id, line.clause_id);
        assert_eq!(item.calculated_amount, line.amount);
        assert_eq!(item.explanation, line.explanation);
    }
}

/// Asserts a claim status, naming both on failure
pub fn assert_status(actual: ClaimStatus, expected: ClaimStatus) {
    assert_eq!(actual, expected, "Expected claim status {}, got {}", expected, actual);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    use crate::builders::{ClauseBuilder, DiagnosisBuilder, ReceiptBuilder};
    use crate::fixtures::EngineFixtures;
    use core_kernel::ProductId;
    use domain_claims::ClaimFacts;

    #[test]
    fn test_assert_within_medical_cost() {
        let product_id = ProductId::new_v7();
        let clauses = vec![
            ClauseBuilder::new(product_id).with_per_unit(dec!(900000)).build(),
            ClauseBuilder::new(product_id).with_per_unit(dec!(600000)).build(),
        ];
        let facts = ClaimFacts::new(
            DiagnosisBuilder::new().build(),
            ReceiptBuilder::new().with_total_amount(1_000_000).build(),
        )
        .unwrap();

        let result = EngineFixtures::default_engine().calculate(&facts, &clauses).unwrap();
        assert_within_medical_cost(&result, &Money::from_minor(1_000_000, Currency::KRW));
        assert_line_amounts(&result, &[600_000, 400_000]);
    }

    #[test]
    #[should_panic(expected = "Expected 5 minor units")]
    fn test_assert_money_eq_fails() {
        assert_money_eq(&Money::from_minor(4, Currency::KRW), 5);
    }
}
