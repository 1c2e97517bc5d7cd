use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AutoLoanError;
use crate::AutoLoanResult;

/// All monetary values, in whole currency units. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as percentages (3.88 = 3.88%), matching the published rate sheets.
pub type Percent = Decimal;

/// Shortest supported loan tenor, in years.
pub const MIN_TENOR_YEARS: u32 = 1;
/// Longest supported loan tenor, in years.
pub const MAX_TENOR_YEARS: u32 = 7;

/// Largest price or fee amount accepted. Keeps every intermediate product of
/// the quote formula well inside `Decimal` range.
pub const MAX_AMOUNT: Money = rust_decimal_macros::dec!(1_000_000_000_000_000_000);

/// Loan duration in whole years, guaranteed to lie in 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Tenor(u32);

impl Tenor {
    /// Validate a tenor in years. Out-of-range values are rejected, never clamped.
    pub fn new(years: u32) -> AutoLoanResult<Self> {
        if (MIN_TENOR_YEARS..=MAX_TENOR_YEARS).contains(&years) {
            Ok(Tenor(years))
        } else {
            Err(AutoLoanError::UnsupportedTenor(years))
        }
    }

    /// Every supported tenor, ascending.
    pub fn all() -> impl Iterator<Item = Tenor> {
        (MIN_TENOR_YEARS..=MAX_TENOR_YEARS).map(Tenor)
    }

    pub fn years(self) -> u32 {
        self.0
    }

    pub fn months(self) -> u32 {
        self.0 * 12
    }

    /// Zero-based position in per-tenor rate arrays.
    pub fn index(self) -> usize {
        (self.0 - MIN_TENOR_YEARS) as usize
    }
}

impl TryFrom<u32> for Tenor {
    type Error = AutoLoanError;

    fn try_from(years: u32) -> Result<Self, Self::Error> {
        Tenor::new(years)
    }
}

impl From<Tenor> for u32 {
    fn from(tenor: Tenor) -> Self {
        tenor.0
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} years", self.0)
    }
}

/// Vehicle insurance plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    /// Comprehensive cover in the first years, total-loss-only afterwards ("kombinasi").
    #[default]
    #[serde(alias = "kombinasi")]
    Combined,
    /// Comprehensive cover for the whole tenor.
    #[serde(alias = "allrisk")]
    AllRisk,
    /// All-risk cover with extended perils (flood, riot, third-party liability).
    #[serde(alias = "allrisk_perluasan", alias = "allriskPerluasan")]
    AllRiskExtended,
}

impl InsuranceType {
    pub const ALL: [InsuranceType; 3] = [
        InsuranceType::Combined,
        InsuranceType::AllRisk,
        InsuranceType::AllRiskExtended,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InsuranceType::Combined => "Combined",
            InsuranceType::AllRisk => "All Risk",
            InsuranceType::AllRiskExtended => "All Risk Extended",
        }
    }
}

impl fmt::Display for InsuranceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
