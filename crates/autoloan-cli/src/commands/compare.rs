use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use autoloan_core::comparison::{compare_tenors, ComparisonInput};
use autoloan_core::quote::LoanInput;

use super::{load_or, PlanArg, SettingsArgs};

/// Arguments for the side-by-side tenor comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// On-the-road vehicle price
    #[arg(long, alias = "otr")]
    pub otr_price: Option<Decimal>,

    /// Down payment in percent of the OTR price
    #[arg(long, alias = "dp")]
    pub dp_percent: Option<Decimal>,

    /// Insurance plan
    #[arg(long, value_enum, alias = "plan")]
    pub insurance_type: Option<PlanArg>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ComparisonInput = load_or(&args.input, || {
        let defaults = LoanInput::default();
        Ok(ComparisonInput {
            otr_price: args.otr_price.unwrap_or(defaults.otr_price),
            dp_percent: args.dp_percent.unwrap_or(defaults.dp_percent),
            insurance_type: args.insurance_type.map(Into::into).unwrap_or(defaults.insurance_type),
            settings: args.settings.resolve()?,
        })
    })?;
    let result = compare_tenors(&request)?;
    Ok(serde_json::to_value(result)?)
}
