//! Installment quote for a vehicle loan.
//!
//! Flat-rate consumer auto credit: interest is charged once on the full
//! financed amount for the whole tenor and spread evenly over the months.
//! The quote also builds the "total upfront payment" the buyer hands over at
//! signing: down payment, first installment, first-year insurance, admin
//! fees, TPI fee and credit protection.
//!
//! [`quote_with_tables`] is the only implementation of the formula; the tenor
//! comparison and the budget solver both call it.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AutoLoanError;
use crate::quote::settings::{QuoteSettings, DEFAULT_ADDITIONAL_ADMIN_FEE, MAX_PROVISION_RATE_PCT};
use crate::rates::tables::{RateTables, DEFAULT_PROVISION_RATE_PCT};
use crate::types::{with_metadata, ComputationOutput, InsuranceType, Money, Percent, Tenor, MAX_AMOUNT};
use crate::AutoLoanResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const HUNDRED: Decimal = dec!(100);
const MONTHS_PER_YEAR: u32 = 12;
/// Down-payment range the financing company normally accepts.
pub const MIN_USUAL_DP_PCT: Percent = dec!(20);
pub const MAX_USUAL_DP_PCT: Percent = dec!(90);

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

fn default_provision_rate() -> Percent {
    DEFAULT_PROVISION_RATE_PCT
}

fn default_additional_admin_fee() -> Money {
    DEFAULT_ADDITIONAL_ADMIN_FEE
}

/// Input for a single loan quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    /// On-the-road vehicle price.
    pub otr_price: Money,
    /// Down payment as a percentage of the OTR price (0-100).
    pub dp_percent: Percent,
    /// Loan tenor in years. Must be 1-7; never clamped.
    pub tenor_years: u32,
    #[serde(default)]
    pub insurance_type: InsuranceType,
    #[serde(default = "default_provision_rate")]
    pub provision_rate_pct: Percent,
    #[serde(default = "default_additional_admin_fee")]
    pub additional_admin_fee: Money,
}

impl LoanInput {
    pub fn new(
        otr_price: Money,
        dp_percent: Percent,
        tenor_years: u32,
        insurance_type: InsuranceType,
        settings: &QuoteSettings,
    ) -> Self {
        LoanInput {
            otr_price,
            dp_percent,
            tenor_years,
            insurance_type,
            provision_rate_pct: settings.provision_rate_pct,
            additional_admin_fee: settings.additional_admin_fee,
        }
    }

    /// Same loan with a different down payment.
    pub fn with_dp_percent(self, dp_percent: Percent) -> Self {
        LoanInput { dp_percent, ..self }
    }

    pub fn with_tenor(self, tenor_years: u32) -> Self {
        LoanInput {
            tenor_years,
            ..self
        }
    }

    pub fn settings(&self) -> QuoteSettings {
        QuoteSettings {
            provision_rate_pct: self.provision_rate_pct,
            additional_admin_fee: self.additional_admin_fee,
        }
    }
}

impl Default for LoanInput {
    /// The loan form's opening values.
    fn default() -> Self {
        LoanInput::new(
            dec!(300_000_000),
            dec!(30),
            4,
            InsuranceType::Combined,
            &QuoteSettings::default(),
        )
    }
}

/// Full cost breakdown of a loan.
///
/// Only `total_upfront_payment` is rounded (to whole currency units); every
/// other amount keeps full decimal precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub tenor_years: u32,
    pub tenor_months: u32,
    pub insurance_type: InsuranceType,
    pub dp_percent: Percent,
    pub dp_amount: Money,
    pub loan_principal: Money,
    pub provision_fee: Money,
    pub loan_principal_with_provision: Money,
    pub interest_rate_pct: Percent,
    /// Flat interest over the whole tenor.
    pub interest_amount: Money,
    pub total_loan_amount: Money,
    pub monthly_installment: Money,
    pub insurance_rate_pct: Percent,
    /// First-year premium on the OTR price.
    pub insurance_amount: Money,
    pub admin_fee: Money,
    pub total_admin_fee: Money,
    pub tpi_fee: Money,
    pub credit_protection_amount: Money,
    pub total_upfront_payment: Money,
}

impl LoanQuote {
    /// Sum of the upfront components before rounding.
    pub fn upfront_components_sum(&self) -> Money {
        self.dp_amount
            + self.monthly_installment
            + self.insurance_amount
            + self.total_admin_fee
            + self.tpi_fee
            + self.credit_protection_amount
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Quote a loan against the canonical rate sheet.
pub fn calculate_quote(input: &LoanInput) -> AutoLoanResult<ComputationOutput<LoanQuote>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let quote = quote_with_tables(RateTables::canonical(), input)?;

    if input.dp_percent < MIN_USUAL_DP_PCT || input.dp_percent > MAX_USUAL_DP_PCT {
        warnings.push(format!(
            "Down payment of {}% is outside the usual {}-{}% range",
            input.dp_percent, MIN_USUAL_DP_PCT, MAX_USUAL_DP_PCT
        ));
    }
    if input.otr_price.is_zero() {
        warnings.push("OTR price is zero; only fixed fees are payable".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat-rate vehicle installment quote with first-year insurance and upfront fees",
        &serde_json::json!({
            "otr_price": input.otr_price.to_string(),
            "dp_percent": input.dp_percent.to_string(),
            "tenor_years": input.tenor_years,
            "insurance_type": input.insurance_type,
            "provision_rate_pct": input.provision_rate_pct.to_string(),
            "additional_admin_fee": input.additional_admin_fee.to_string(),
            "rounding": "total_upfront_payment to whole units, half away from zero",
        }),
        warnings,
        elapsed,
        quote,
    ))
}

/// Quote a loan against an explicit rate sheet. No metadata envelope.
pub fn quote_with_tables(tables: &RateTables, input: &LoanInput) -> AutoLoanResult<LoanQuote> {
    let tenor = validate_loan_input(input)?;
    Ok(build_quote(tables, input, tenor))
}

/// Down payment amount for a percentage, rounded to whole currency units.
pub fn dp_amount_from_percent(otr_price: Money, dp_percent: Percent) -> AutoLoanResult<Money> {
    validate_amount("otr_price", otr_price)?;
    if dp_percent < Decimal::ZERO || dp_percent > HUNDRED {
        return Err(AutoLoanError::InvalidInput {
            field: "dp_percent".into(),
            reason: "Down payment percentage must be between 0 and 100".into(),
        });
    }
    Ok(round_currency(otr_price * dp_percent / HUNDRED))
}

/// Down payment percentage for an amount, rounded to two decimals.
/// Amounts above the OTR price are capped at 100%.
pub fn dp_percent_from_amount(otr_price: Money, dp_amount: Money) -> AutoLoanResult<Percent> {
    if otr_price <= Decimal::ZERO {
        return Err(AutoLoanError::InvalidInput {
            field: "otr_price".into(),
            reason: "OTR price must be positive to derive a down payment percentage".into(),
        });
    }
    validate_amount("otr_price", otr_price)?;
    if dp_amount < Decimal::ZERO {
        return Err(AutoLoanError::InvalidInput {
            field: "dp_amount".into(),
            reason: "Down payment amount cannot be negative".into(),
        });
    }
    let capped = dp_amount.min(otr_price);
    Ok((capped / otr_price * HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub(crate) fn validate_loan_input(input: &LoanInput) -> AutoLoanResult<Tenor> {
    let tenor = Tenor::new(input.tenor_years)?;
    validate_loan_terms(input)?;
    if input.dp_percent < Decimal::ZERO || input.dp_percent > HUNDRED {
        return Err(AutoLoanError::InvalidInput {
            field: "dp_percent".into(),
            reason: "Down payment percentage must be between 0 and 100".into(),
        });
    }
    Ok(tenor)
}

/// Checks shared by quoting and solving; the down payment is not part of these.
pub(crate) fn validate_loan_terms(input: &LoanInput) -> AutoLoanResult<()> {
    validate_amount("otr_price", input.otr_price)?;
    if input.provision_rate_pct < Decimal::ZERO || input.provision_rate_pct > MAX_PROVISION_RATE_PCT {
        return Err(AutoLoanError::InvalidInput {
            field: "provision_rate_pct".into(),
            reason: format!("Provision rate must be between 0 and {MAX_PROVISION_RATE_PCT}%"),
        });
    }
    validate_amount("additional_admin_fee", input.additional_admin_fee)
}

/// Non-negative and at most [`MAX_AMOUNT`].
pub(crate) fn validate_amount(field: &str, value: Money) -> AutoLoanResult<()> {
    if value < Decimal::ZERO {
        return Err(AutoLoanError::InvalidInput {
            field: field.into(),
            reason: "Amount cannot be negative".into(),
        });
    }
    if value > MAX_AMOUNT {
        return Err(AutoLoanError::InvalidInput {
            field: field.into(),
            reason: format!("Amount exceeds the supported maximum of {MAX_AMOUNT}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// The quote formula. Step order is fixed; callers must have validated `input`.
pub(crate) fn build_quote(tables: &RateTables, input: &LoanInput, tenor: Tenor) -> LoanQuote {
    let fixed = tables.fixed_fees();
    let years = Decimal::from(tenor.years());

    let dp_amount = input.otr_price * input.dp_percent / HUNDRED;
    let loan_principal = input.otr_price - dp_amount;
    let provision_fee = loan_principal * input.provision_rate_pct / HUNDRED;
    let loan_principal_with_provision = loan_principal + provision_fee;

    let interest_rate_pct = tables.interest_rate(tenor);
    let interest_amount = loan_principal_with_provision * interest_rate_pct / HUNDRED * years;
    let total_loan_amount = loan_principal_with_provision + interest_amount;
    let monthly_installment = total_loan_amount / Decimal::from(tenor.years() * MONTHS_PER_YEAR);

    let insurance_rate_pct = tables.insurance_rate(input.otr_price, input.insurance_type, tenor);
    let insurance_amount = input.otr_price * insurance_rate_pct / HUNDRED;

    let admin_fee = tables.admin_fee(tenor);
    let total_admin_fee = admin_fee + input.additional_admin_fee;

    let credit_protection_amount = loan_principal * fixed.credit_protection_rate_pct / HUNDRED;

    let mut quote = LoanQuote {
        tenor_years: tenor.years(),
        tenor_months: tenor.months(),
        insurance_type: input.insurance_type,
        dp_percent: input.dp_percent,
        dp_amount,
        loan_principal,
        provision_fee,
        loan_principal_with_provision,
        interest_rate_pct,
        interest_amount,
        total_loan_amount,
        monthly_installment,
        insurance_rate_pct,
        insurance_amount,
        admin_fee,
        total_admin_fee,
        tpi_fee: fixed.tpi_fee,
        credit_protection_amount,
        total_upfront_payment: Decimal::ZERO,
    };
    quote.total_upfront_payment = round_currency(quote.upfront_components_sum());
    quote
}

pub(crate) fn round_currency(value: Money) -> Money {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference_input() -> LoanInput {
        LoanInput {
            otr_price: dec!(300_000_000),
            dp_percent: dec!(20),
            tenor_years: 4,
            insurance_type: InsuranceType::Combined,
            provision_rate_pct: dec!(5),
            additional_admin_fee: dec!(5_000_000),
        }
    }

    #[test]
    fn test_reference_scenario_breakdown() {
        let q = quote_with_tables(RateTables::canonical(), &reference_input()).unwrap();

        assert_eq!(q.dp_amount, dec!(60_000_000));
        assert_eq!(q.loan_principal, dec!(240_000_000));
        assert_eq!(q.provision_fee, dec!(12_000_000));
        assert_eq!(q.loan_principal_with_provision, dec!(252_000_000));
        assert_eq!(q.interest_rate_pct, dec!(3.88));
        assert_eq!(q.interest_amount, dec!(39_110_400));
        assert_eq!(q.total_loan_amount, dec!(291_110_400));
        assert_eq!(q.monthly_installment, dec!(6_064_800));
        assert_eq!(q.tenor_months, 48);
    }

    #[test]
    fn test_reference_scenario_upfront_payment() {
        let q = quote_with_tables(RateTables::canonical(), &reference_input()).unwrap();

        // Combined, 200-400M band, tenor 4 => 3.22% of 300M = 9,660,000
        assert_eq!(q.insurance_rate_pct, dec!(3.22));
        assert_eq!(q.insurance_amount, dec!(9_660_000));
        assert_eq!(q.admin_fee, dec!(3_250_000));
        assert_eq!(q.total_admin_fee, dec!(8_250_000));
        assert_eq!(q.tpi_fee, dec!(500_000));
        assert_eq!(q.credit_protection_amount, Decimal::ZERO);
        // 60,000,000 + 6,064,800 + 9,660,000 + 8,250,000 + 500,000
        assert_eq!(q.total_upfront_payment, dec!(84_474_800));
        assert_eq!(q.total_upfront_payment, q.upfront_components_sum());
    }

    #[test]
    fn test_upfront_payment_rounds_half_away_from_zero() {
        // 7 / 12 years of a principal that does not divide evenly
        let input = LoanInput {
            otr_price: dec!(100_000_001),
            dp_percent: dec!(33.3),
            tenor_years: 7,
            ..reference_input()
        };
        let q = quote_with_tables(RateTables::canonical(), &input).unwrap();
        let sum = q.upfront_components_sum();
        assert_eq!(q.total_upfront_payment, sum.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero));
        assert!((q.total_upfront_payment - sum).abs() <= dec!(0.5));
        assert_eq!(q.total_upfront_payment.fract(), Decimal::ZERO);
    }

    #[test]
    fn test_unsupported_tenor_is_error() {
        for years in [0, 8, 30] {
            let input = reference_input().with_tenor(years);
            let err = quote_with_tables(RateTables::canonical(), &input).unwrap_err();
            assert!(
                matches!(err, AutoLoanError::UnsupportedTenor(y) if y == years),
                "tenor {years} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_negative_price_rejected() {
        let input = LoanInput {
            otr_price: dec!(-1),
            ..reference_input()
        };
        assert!(matches!(
            quote_with_tables(RateTables::canonical(), &input),
            Err(AutoLoanError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_amounts_beyond_supported_range_rejected() {
        let huge = dec!(1_000_000_000_000_000_000_000_000_000);
        let cases = [
            LoanInput {
                otr_price: huge,
                ..reference_input()
            }
            .with_dp_percent(dec!(90)),
            LoanInput {
                additional_admin_fee: huge,
                ..reference_input()
            },
            LoanInput {
                provision_rate_pct: huge,
                ..reference_input()
            },
        ];
        for input in cases {
            assert!(matches!(
                calculate_quote(&input),
                Err(AutoLoanError::InvalidInput { .. })
            ));
        }
        assert!(dp_amount_from_percent(huge, dec!(50)).is_err());
        assert!(dp_percent_from_amount(huge, dec!(1)).is_err());
    }

    #[test]
    fn test_largest_supported_amounts_quote() {
        let input = LoanInput {
            otr_price: MAX_AMOUNT,
            additional_admin_fee: MAX_AMOUNT,
            provision_rate_pct: MAX_PROVISION_RATE_PCT,
            ..reference_input()
        }
        .with_tenor(7)
        .with_dp_percent(Decimal::ZERO);
        assert!(calculate_quote(&input).is_ok());
    }

    #[test]
    fn test_dp_percent_out_of_range_rejected() {
        for dp in [dec!(-0.1), dec!(100.1)] {
            let input = reference_input().with_dp_percent(dp);
            assert!(quote_with_tables(RateTables::canonical(), &input).is_err());
        }
    }

    #[test]
    fn test_full_down_payment_leaves_only_fees() {
        let input = reference_input().with_dp_percent(dec!(100));
        let q = quote_with_tables(RateTables::canonical(), &input).unwrap();
        assert_eq!(q.loan_principal, Decimal::ZERO);
        assert_eq!(q.monthly_installment, Decimal::ZERO);
        assert_eq!(
            q.total_upfront_payment,
            dec!(300_000_000) + q.insurance_amount + q.total_admin_fee + q.tpi_fee
        );
    }

    #[test]
    fn test_calculate_quote_warns_outside_usual_dp_range() {
        let out = calculate_quote(&reference_input().with_dp_percent(dec!(10))).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("outside the usual"));

        let out = calculate_quote(&reference_input()).unwrap();
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_input_deserialize_defaults() {
        let input: LoanInput = serde_json::from_str(
            r#"{"otr_price": "250000000", "dp_percent": "25", "tenor_years": 3}"#,
        )
        .unwrap();
        assert_eq!(input.insurance_type, InsuranceType::Combined);
        assert_eq!(input.provision_rate_pct, dec!(5.0));
        assert_eq!(input.additional_admin_fee, dec!(5_000_000));
    }

    #[test]
    fn test_dp_amount_percent_conversions() {
        assert_eq!(dp_amount_from_percent(dec!(300_000_000), dec!(30)).unwrap(), dec!(90_000_000));
        assert_eq!(dp_amount_from_percent(dec!(123_456_789), dec!(12.5)).unwrap(), dec!(15_432_099));
        assert!(dp_amount_from_percent(dec!(300_000_000), dec!(101)).is_err());
        assert_eq!(
            dp_percent_from_amount(dec!(300_000_000), dec!(100_000_000)).unwrap(),
            dec!(33.33)
        );
        assert_eq!(
            dp_percent_from_amount(dec!(300_000_000), dec!(900_000_000)).unwrap(),
            dec!(100)
        );
        assert!(dp_percent_from_amount(Decimal::ZERO, dec!(1)).is_err());
        assert!(dp_percent_from_amount(dec!(1), dec!(-1)).is_err());
    }

    #[test]
    fn test_default_input_is_loan_form_defaults() {
        let input = LoanInput::default();
        assert_eq!(input.otr_price, dec!(300_000_000));
        assert_eq!(input.dp_percent, dec!(30));
        assert_eq!(input.tenor_years, 4);
        assert!(calculate_quote(&input).is_ok());
    }
}
