//! Standalone first-year insurance premium estimate.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::quote::calculator::validate_amount;
use crate::rates::tables::RateTables;
use crate::types::{with_metadata, ComputationOutput, InsuranceType, Money, Percent, Tenor};
use crate::AutoLoanResult;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsuranceInput {
    pub otr_price: Money,
    pub tenor_years: u32,
    #[serde(default)]
    pub insurance_type: InsuranceType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceEstimate {
    pub insurance_type: InsuranceType,
    pub tenor_years: u32,
    pub otr_price: Money,
    pub rate_pct: Percent,
    pub premium: Money,
}

/// Rate and first-year premium for a price, plan and tenor.
pub fn estimate_insurance(input: &InsuranceInput) -> AutoLoanResult<ComputationOutput<InsuranceEstimate>> {
    let start = Instant::now();
    let estimate = estimate_insurance_with_tables(RateTables::canonical(), input)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "First-year vehicle insurance premium from the price-band rate table",
        &serde_json::json!({
            "otr_price": input.otr_price.to_string(),
            "tenor_years": input.tenor_years,
            "insurance_type": input.insurance_type,
        }),
        Vec::new(),
        elapsed,
        estimate,
    ))
}

pub fn estimate_insurance_with_tables(
    tables: &RateTables,
    input: &InsuranceInput,
) -> AutoLoanResult<InsuranceEstimate> {
    let tenor = Tenor::new(input.tenor_years)?;
    validate_amount("otr_price", input.otr_price)?;

    let rate_pct = tables.insurance_rate(input.otr_price, input.insurance_type, tenor);
    Ok(InsuranceEstimate {
        insurance_type: input.insurance_type,
        tenor_years: tenor.years(),
        otr_price: input.otr_price,
        rate_pct,
        premium: input.otr_price * rate_pct / dec!(100),
    })
}
