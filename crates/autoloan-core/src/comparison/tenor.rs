//! Side-by-side quotes for every supported tenor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::quote::calculator::{build_quote, validate_loan_input, LoanInput, LoanQuote};
use crate::quote::settings::QuoteSettings;
use crate::rates::tables::RateTables;
use crate::types::{with_metadata, ComputationOutput, InsuranceType, Money, Percent, Tenor};
use crate::AutoLoanResult;

/// Loan terms held fixed across the comparison; the tenor varies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub otr_price: Money,
    pub dp_percent: Percent,
    #[serde(default)]
    pub insurance_type: InsuranceType,
    #[serde(flatten)]
    pub settings: QuoteSettings,
}

impl ComparisonInput {
    fn loan_for(&self, tenor: Tenor) -> LoanInput {
        LoanInput::new(
            self.otr_price,
            self.dp_percent,
            tenor.years(),
            self.insurance_type,
            &self.settings,
        )
    }
}

/// Summary line for one tenor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorRow {
    pub tenor_years: u32,
    pub tenor_months: u32,
    pub total_upfront_payment: Money,
    pub monthly_installment: Money,
    pub interest_rate_pct: Percent,
    pub insurance_rate_pct: Percent,
    /// Tenor-band fee plus the additional admin fee.
    pub total_admin_fee: Money,
}

impl From<&LoanQuote> for TenorRow {
    fn from(q: &LoanQuote) -> Self {
        TenorRow {
            tenor_years: q.tenor_years,
            tenor_months: q.tenor_months,
            total_upfront_payment: q.total_upfront_payment,
            monthly_installment: q.monthly_installment,
            interest_rate_pct: q.interest_rate_pct,
            insurance_rate_pct: q.insurance_rate_pct,
            total_admin_fee: q.total_admin_fee,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenorComparison {
    /// Tenors 1..=7, ascending.
    pub rows: Vec<TenorRow>,
    pub quotes: Vec<LoanQuote>,
    /// Tenor with the smallest total upfront payment.
    pub lowest_upfront_tenor: u32,
    /// Tenor with the smallest monthly installment.
    pub lowest_installment_tenor: u32,
}

/// Quote every tenor from 1 to 7 years with the other terms fixed.
pub fn compare_tenors(input: &ComparisonInput) -> AutoLoanResult<ComputationOutput<TenorComparison>> {
    let start = Instant::now();
    let comparison = compare_tenors_with_tables(RateTables::canonical(), input)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tenor comparison: one flat-rate quote per tenor, 1 to 7 years",
        &serde_json::json!({
            "otr_price": input.otr_price.to_string(),
            "dp_percent": input.dp_percent.to_string(),
            "insurance_type": input.insurance_type,
            "provision_rate_pct": input.settings.provision_rate_pct.to_string(),
            "additional_admin_fee": input.settings.additional_admin_fee.to_string(),
        }),
        Vec::new(),
        elapsed,
        comparison,
    ))
}

pub fn compare_tenors_with_tables(
    tables: &RateTables,
    input: &ComparisonInput,
) -> AutoLoanResult<TenorComparison> {
    let mut quotes = Vec::with_capacity(Tenor::all().count());
    for tenor in Tenor::all() {
        let loan = input.loan_for(tenor);
        validate_loan_input(&loan)?;
        quotes.push(build_quote(tables, &loan, tenor));
    }

    let rows: Vec<TenorRow> = quotes.iter().map(TenorRow::from).collect();
    let lowest_upfront_tenor = lowest_by(&rows, |r| r.total_upfront_payment);
    let lowest_installment_tenor = lowest_by(&rows, |r| r.monthly_installment);

    Ok(TenorComparison {
        rows,
        quotes,
        lowest_upfront_tenor,
        lowest_installment_tenor,
    })
}

/// Earliest tenor achieving the minimum of `key`.
fn lowest_by(rows: &[TenorRow], key: impl Fn(&TenorRow) -> Decimal) -> u32 {
    let mut best: Option<(&TenorRow, Decimal)> = None;
    for row in rows {
        let value = key(row);
        if best.map_or(true, |(_, b)| value < b) {
            best = Some((row, value));
        }
    }
    best.map(|(r, _)| r.tenor_years).unwrap_or(1)
}
