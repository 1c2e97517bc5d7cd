use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use autoloan_core::quote::{estimate_insurance, InsuranceInput};

use super::{load_or, PlanArg};

/// Arguments for a first-year insurance estimate
#[derive(Args)]
pub struct InsuranceArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// On-the-road vehicle price
    #[arg(long, alias = "otr")]
    pub otr_price: Option<Decimal>,

    /// Tenor in years (1-7)
    #[arg(long, alias = "tenor")]
    pub tenor_years: Option<u32>,

    /// Insurance plan
    #[arg(long, value_enum, alias = "plan")]
    pub insurance_type: Option<PlanArg>,
}

pub fn run_insurance(args: InsuranceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: InsuranceInput = load_or(&args.input, || {
        Ok(InsuranceInput {
            otr_price: args
                .otr_price
                .ok_or("--otr-price is required (or provide --input)")?,
            tenor_years: args
                .tenor_years
                .ok_or("--tenor-years is required (or provide --input)")?,
            insurance_type: args.insurance_type.map(Into::into).unwrap_or_default(),
        })
    })?;
    let result = estimate_insurance(&request)?;
    Ok(serde_json::to_value(result)?)
}
