//! Insurance clauses and their validated payment terms
//!
//! A `Clause` is what the catalog hands us: loosely typed numbers straight
//! from an ingested policy document. Before a clause can take part in a
//! calculation it is converted into `ClauseTerms`, which carry amounts as
//! `Money` in the claim currency and percentages as a `Rate`. Clauses that
//! fail the conversion are reported as `SkippedClause` values rather than
//! errors, so one bad row never blocks the rest of a claim.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use core_kernel::{ClauseId, Currency, Money, MoneyError, ProductId, Rate};

/// Clause category as a closed taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseCategory {
    /// One-time benefit paid on diagnosis
    Diagnosis,
    /// Daily benefit while admitted
    Inpatient,
    /// Outpatient treatment benefit
    Outpatient,
    /// One-time surgery benefit
    Surgery,
    /// Anything keyed by diagnosis keywords (cancer, trauma, disease, ...)
    Other,
}

impl ClauseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseCategory::Diagnosis => "diagnosis",
            ClauseCategory::Inpatient => "inpatient",
            ClauseCategory::Outpatient => "outpatient",
            ClauseCategory::Surgery => "surgery",
            ClauseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ClauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClauseCategory {
    type Err = ClauseDefect;

    /// Parses catalog text, accepting the Korean labels used by ingested
    /// policy documents
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diagnosis" | "진단" => Ok(ClauseCategory::Diagnosis),
            "inpatient" | "입원" => Ok(ClauseCategory::Inpatient),
            "outpatient" | "외래" | "통원" | "외래진료" => Ok(ClauseCategory::Outpatient),
            "surgery" | "수술" => Ok(ClauseCategory::Surgery),
            "other" | "기타" | "의료비" | "실손" => Ok(ClauseCategory::Other),
            _ => Err(ClauseDefect::UnknownCategory(s.to_string())),
        }
    }
}

/// How `per_unit` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// `per_unit` is a currency amount
    Amount,
    /// `per_unit` is a percentage of the medical cost
    Percentage,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Amount => "amount",
            UnitType::Percentage => "percentage",
        }
    }
}

impl FromStr for UnitType {
    type Err = ClauseDefect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amount" | "정액" => Ok(UnitType::Amount),
            "percentage" | "percent" | "정률" => Ok(UnitType::Percentage),
            _ => Err(ClauseDefect::UnknownUnitType(s.to_string())),
        }
    }
}

/// An insurance clause as read from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub id: ClauseId,
    pub product_id: ProductId,
    pub name: String,
    pub category: ClauseCategory,
    pub unit_type: UnitType,
    /// Amount in major units, or a percentage in [0, 100]
    pub per_unit: Option<Decimal>,
    /// Payout ceiling in major units
    pub max_total: Option<Decimal>,
    /// Free text, informational only
    pub conditions: Option<String>,
}

impl Clause {
    /// Converts the raw catalog numbers into typed terms in `currency`
    pub fn terms(&self, currency: Currency) -> Result<ClauseTerms, ClauseDefect> {
        let per_unit = self.per_unit.ok_or(ClauseDefect::MissingPerUnit)?;

        let benefit = match self.unit_type {
            UnitType::Amount => {
                if per_unit < Decimal::ZERO {
                    return Err(ClauseDefect::NegativePerUnit(per_unit));
                }
                Benefit::Fixed(Money::from_major(per_unit, currency)?)
            }
            UnitType::Percentage => {
                if per_unit < Decimal::ZERO || per_unit > dec!(100) {
                    return Err(ClauseDefect::PercentageOutOfRange(per_unit));
                }
                Benefit::Share(Rate::from_percentage(per_unit))
            }
        };

        let max_total = match self.max_total {
            Some(max) if max < Decimal::ZERO => return Err(ClauseDefect::NegativeMaxTotal(max)),
            Some(max) => Some(Money::from_major(max, currency)?),
            None => None,
        };

        Ok(ClauseTerms { benefit, max_total })
    }

    /// Name and conditions, the text keyword rules look at
    pub fn searchable_text(&self) -> String {
        match &self.conditions {
            Some(conditions) => format!("{} {}", self.name, conditions),
            None => self.name.clone(),
        }
    }
}

/// What a clause pays per unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Benefit {
    /// A fixed amount per occurrence or per day
    Fixed(Money),
    /// A share of the medical cost
    Share(Rate),
}

/// Validated payment terms of a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseTerms {
    pub benefit: Benefit,
    pub max_total: Option<Money>,
}

/// Why a clause could not take part in a calculation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClauseDefect {
    #[error("per_unit is missing")]
    MissingPerUnit,

    #[error("per_unit {0} is negative")]
    NegativePerUnit(Decimal),

    #[error("percentage per_unit {0} is outside [0, 100]")]
    PercentageOutOfRange(Decimal),

    #[error("max_total {0} is negative")]
    NegativeMaxTotal(Decimal),

    #[error("unknown clause category '{0}'")]
    UnknownCategory(String),

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("{strategy} cannot pay a {unit_type} clause")]
    StrategyMismatch {
        strategy: &'static str,
        unit_type: &'static str,
    },

    #[error("arithmetic failure: {0}")]
    Arithmetic(#[from] MoneyError),
}

/// A clause excluded from a calculation because of a data-quality defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedClause {
    pub clause_id: ClauseId,
    pub clause_name: String,
    pub reason: String,
}

impl SkippedClause {
    pub fn new(clause: &Clause, defect: &ClauseDefect) -> Self {
        Self {
            clause_id: clause.id,
            clause_name: clause.name.clone(),
            reason: defect.to_string(),
        }
    }
}
