//! Reconciliation of raw amounts against the actual medical cost
//!
//! When the raw lines add up to more than the receipt total, every line is
//! scaled by `cap / sum`. Scaling uses largest-remainder apportionment so the
//! reconciled lines sum to the cap exactly, with no rounding drift.

use core_kernel::{Money, MoneyError, Rate};

use crate::calculation::CalculatedLine;

/// Reconciled lines and the ratio applied, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub lines: Vec<CalculatedLine>,
    pub total: Money,
    pub reduction: Option<Rate>,
}

/// Scales line items down to a cap
#[derive(Debug, Clone, Copy, Default)]
pub struct CapReconciler;

impl CapReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Reconciles `lines` against `cap`
    ///
    /// Lines summing to zero, or to no more than the cap, are returned
    /// unchanged. The raw sum is taken in `i128`: clauses can each be valid
    /// while their sum exceeds `i64`, and the reconciled total never exceeds
    /// the cap anyway.
    pub fn reconcile(&self, lines: Vec<CalculatedLine>, cap: Money) -> Result<Reconciliation, MoneyError> {
        if let Some(line) = lines.iter().find(|line| line.amount.currency() != cap.currency()) {
            return Err(MoneyError::CurrencyMismatch(
                line.amount.currency().to_string(),
                cap.currency().to_string(),
            ));
        }

        let sum: i128 = lines.iter().map(|line| i128::from(line.amount.minor_units())).sum();

        if sum == 0 || sum <= i128::from(cap.minor_units()) {
            let total = i64::try_from(sum).map_err(|_| MoneyError::Overflow)?;
            return Ok(Reconciliation {
                lines,
                total: Money::from_minor(total, cap.currency()),
                reduction: None,
            });
        }

        let ratio = Rate::from_minor_ratio(i128::from(cap.minor_units()), sum)?;
        let weights: Vec<i64> = lines.iter().map(|line| line.amount.minor_units()).collect();
        let shares = cap.allocate_proportionally(&weights)?;

        let lines = lines
            .into_iter()
            .zip(shares)
            .map(|(mut line, share)| {
                line.explanation.push_str(&format!(
                    " → capped to medical cost: {} × {} = {}",
                    line.amount.grouped(),
                    ratio,
                    share.grouped()
                ));
                line.amount = share;
                line
            })
            .collect();

        Ok(Reconciliation {
            lines,
            total: cap,
            reduction: Some(ratio),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{ClauseId, Currency};

    use crate::clause::ClauseCategory;

    fn line(amount: i64) -> CalculatedLine {
        CalculatedLine {
            clause_id: ClauseId::new_v7(),
            clause_name: "Benefit".to_string(),
            category: ClauseCategory::Diagnosis,
            amount: Money::from_minor(amount, Currency::KRW),
            explanation: "raw".to_string(),
        }
    }

    fn krw(amount: i64) -> Money {
        Money::from_minor(amount, Currency::KRW)
    }

    #[test]
    fn test_under_cap_unchanged() {
        let lines = vec![line(250_000)];
        let result = CapReconciler::new().reconcile(lines.clone(), krw(800_000)).unwrap();

        assert_eq!(result.lines, lines);
        assert_eq!(result.total, krw(250_000));
        assert!(result.reduction.is_none());
    }

    #[test]
    fn test_exactly_at_cap_unchanged() {
        let result = CapReconciler::new()
            .reconcile(vec![line(500_000), line(300_000)], krw(800_000))
            .unwrap();
        assert!(result.reduction.is_none());
        assert_eq!(result.total, krw(800_000));
    }

    #[test]
    fn test_proportional_scale_down() {
        let result = CapReconciler::new()
            .reconcile(vec![line(900_000), line(600_000)], krw(1_000_000))
            .unwrap();

        let amounts: Vec<i64> = result.lines.iter().map(|l| l.amount.minor_units()).collect();
        assert_eq!(amounts, vec![600_000, 400_000]);
        assert_eq!(result.total, krw(1_000_000));
        assert_eq!(result.reduction.map(|r| r.to_string()), Some("66.67%".to_string()));
        assert_eq!(
            result.lines[0].explanation,
            "raw → capped to medical cost: 900,000 × 66.67% = 600,000"
        );
    }

    #[test]
    fn test_rounding_unit_assigned_deterministically() {
        let result = CapReconciler::new()
            .reconcile(vec![line(100), line(100), line(100)], krw(100))
            .unwrap();

        let amounts: Vec<i64> = result.lines.iter().map(|l| l.amount.minor_units()).collect();
        assert_eq!(amounts, vec![34, 33, 33]);
    }

    #[test]
    fn test_zero_sum_is_noop() {
        let result = CapReconciler::new().reconcile(vec![], krw(0)).unwrap();
        assert!(result.lines.is_empty());
        assert!(result.total.is_zero());
        assert!(result.reduction.is_none());
    }

    #[test]
    fn test_raw_sum_beyond_i64_still_reconciles() {
        let huge = 5_000_000_000_000_000_000;
        let result = CapReconciler::new()
            .reconcile(vec![line(huge), line(huge), line(100_000)], krw(1_000_000))
            .unwrap();

        let amounts: Vec<i64> = result.lines.iter().map(|l| l.amount.minor_units()).collect();
        assert_eq!(amounts, vec![500_000, 500_000, 0]);
        assert_eq!(result.total, krw(1_000_000));
        assert!(result.reduction.is_some());
    }

    #[test]
    fn test_foreign_currency_line_rejected() {
        let mut usd = line(100);
        usd.amount = Money::from_minor(100, Currency::USD);
        assert!(matches!(
            CapReconciler::new().reconcile(vec![usd], krw(1_000)),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_zero_cap_zeroes_everything() {
        let result = CapReconciler::new()
            .reconcile(vec![line(10_000), line(5_000)], krw(0))
            .unwrap();
        assert!(result.total.is_zero());
        assert!(result.lines.iter().all(|l| l.amount.is_zero()));
    }
}
