//! Unit tests for the Money module
//!
//! Tests cover money creation, checked arithmetic, rate application,
//! proportional allocation, and rendering.

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_from_minor_handles_krw_no_decimals() {
        let m = Money::from_minor(50000, Currency::KRW);
        assert_eq!(m.amount(), dec!(50000));
    }

    #[test]
    fn test_from_major_round_trips_whole_units() {
        let m = Money::from_major(dec!(1234.56), Currency::USD).unwrap();
        assert_eq!(m.minor_units(), 123456);
        assert_eq!(m.amount(), dec!(1234.56));
    }

    #[test]
    fn test_from_major_rounds_fractional_won() {
        let m = Money::from_major(dec!(0.5), Currency::KRW).unwrap();
        assert_eq!(m.minor_units(), 0);

        let m = Money::from_major(dec!(1.5), Currency::KRW).unwrap();
        assert_eq!(m.minor_units(), 2);
    }

    #[test]
    fn test_from_major_overflow() {
        let huge = dec!(79228162514264337593543950335);
        assert_eq!(Money::from_major(huge, Currency::USD), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::EUR);
        assert!(m.is_zero());
        assert!(!m.is_positive());
        assert_eq!(m.currency(), Currency::EUR);
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_and_sub() {
        let a = Money::from_minor(900_000, Currency::KRW);
        let b = Money::from_minor(600_000, Currency::KRW);

        assert_eq!(a.checked_add(&b).unwrap().minor_units(), 1_500_000);
        assert_eq!(b.checked_sub(&a).unwrap().minor_units(), -300_000);
    }

    #[test]
    fn test_checked_mul_by_days() {
        let per_day = Money::from_minor(50_000, Currency::KRW);
        assert_eq!(per_day.checked_mul(5).unwrap().minor_units(), 250_000);
    }

    #[test]
    fn test_min_picks_smaller() {
        let a = Money::from_minor(250_000, Currency::KRW);
        let b = Money::from_minor(900_000, Currency::KRW);
        assert_eq!(a.min(&b).unwrap(), a);
        assert_eq!(b.min(&a).unwrap(), a);
    }

    #[test]
    fn test_min_rejects_currency_mismatch() {
        let a = Money::from_minor(1, Currency::KRW);
        let b = Money::from_minor(1, Currency::USD);
        assert!(matches!(a.min(&b), Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total = Money::sum(&[], Currency::KRW).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_partial_ord_across_currencies_is_none() {
        let a = Money::from_minor(1, Currency::KRW);
        let b = Money::from_minor(1, Currency::USD);
        assert_eq!(a.partial_cmp(&b), None);
        assert!(Money::from_minor(2, Currency::KRW) > a);
    }
}

mod rates {
    use super::*;

    #[test]
    fn test_percentage_share() {
        let cost = Money::from_minor(100_000, Currency::KRW);
        let share = cost.apply_rate(&Rate::from_percentage(dec!(80))).unwrap();
        assert_eq!(share.minor_units(), 80_000);
    }

    #[test]
    fn test_share_rounds_half_even() {
        let cost = Money::from_minor(5, Currency::KRW);
        let share = cost.apply_rate(&Rate::from_percentage(dec!(50))).unwrap();
        assert_eq!(share.minor_units(), 2);

        let cost = Money::from_minor(7, Currency::KRW);
        let share = cost.apply_rate(&Rate::from_percentage(dec!(50))).unwrap();
        assert_eq!(share.minor_units(), 4);
    }

    #[test]
    fn test_ratio_of_zero_denominator() {
        let a = Money::from_minor(1, Currency::KRW);
        let zero = Money::zero(Currency::KRW);
        assert_eq!(Rate::ratio_of(&a, &zero), Err(MoneyError::DivisionByZero));
    }
}

mod allocation {
    use super::*;

    #[test]
    fn test_allocate_proportionally_sums_to_total() {
        let cap = Money::from_minor(1_000_001, Currency::KRW);
        let parts = cap.allocate_proportionally(&[333_333, 333_333, 333_334]).unwrap();

        let total: i64 = parts.iter().map(|p| p.minor_units()).sum();
        assert_eq!(total, 1_000_001);
    }

    #[test]
    fn test_ties_prefer_larger_weight() {
        // exact shares 10 * 3/4 = 7.5 and 10 * 1/4 = 2.5: equal remainders
        let cap = Money::from_minor(10, Currency::KRW);
        let parts = cap.allocate_proportionally(&[1, 3]).unwrap();

        assert_eq!(parts[0].minor_units(), 2);
        assert_eq!(parts[1].minor_units(), 8);
    }

    #[test]
    fn test_negative_weights_rejected() {
        let cap = Money::from_minor(10, Currency::KRW);
        assert!(matches!(
            cap.allocate_proportionally(&[5, -1]),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_empty_weights_rejected() {
        let cap = Money::from_minor(10, Currency::KRW);
        assert!(cap.allocate_proportionally(&[]).is_err());
    }
}

mod display {
    use super::*;

    #[test]
    fn test_display_includes_symbol_and_grouping() {
        assert_eq!(Money::from_minor(1_000_000, Currency::KRW).to_string(), "₩1,000,000");
        assert_eq!(Money::from_minor(100, Currency::USD).to_string(), "$1.00");
    }

    #[test]
    fn test_grouped_small_values() {
        assert_eq!(Money::from_minor(0, Currency::KRW).grouped(), "0");
        assert_eq!(Money::from_minor(999, Currency::KRW).grouped(), "999");
        assert_eq!(Money::from_minor(1000, Currency::KRW).grouped(), "1,000");
    }

    #[test]
    fn test_money_serializes_minor_units() {
        let json = serde_json::to_value(Money::from_minor(250_000, Currency::KRW)).unwrap();
        assert_eq!(json["minor"], 250_000);
        assert_eq!(json["currency"], "KRW");
    }
}
