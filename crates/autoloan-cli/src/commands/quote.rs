use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use autoloan_core::quote::{calculate_quote, dp_percent_from_amount, LoanInput};

use super::{load_or, PlanArg, SettingsArgs};

/// Arguments for a single loan quote. Missing flags take the loan form defaults.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct QuoteArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// On-the-road vehicle price
    #[arg(long, alias = "otr")]
    pub otr_price: Option<Decimal>,

    /// Down payment in percent of the OTR price
    #[arg(long, alias = "dp", conflicts_with = "dp_amount")]
    pub dp_percent: Option<Decimal>,

    /// Down payment as an amount; converted to a percentage
    #[arg(long)]
    pub dp_amount: Option<Decimal>,

    /// Tenor in years (1-7)
    #[arg(long, alias = "tenor")]
    pub tenor_years: Option<u32>,

    /// Insurance plan
    #[arg(long, value_enum, alias = "plan")]
    pub insurance_type: Option<PlanArg>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanInput = load_or(&args.input, || loan_from_flags(&args))?;
    let result = calculate_quote(&loan)?;
    Ok(serde_json::to_value(result)?)
}

fn loan_from_flags(args: &QuoteArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    let defaults = LoanInput::default();
    let settings = args.settings.resolve()?;
    let otr_price = args.otr_price.unwrap_or(defaults.otr_price);
    let dp_percent = match (args.dp_percent, args.dp_amount) {
        (Some(pct), _) => pct,
        (None, Some(amount)) => dp_percent_from_amount(otr_price, amount)?,
        (None, None) => defaults.dp_percent,
    };
    Ok(LoanInput::new(
        otr_price,
        dp_percent,
        args.tenor_years.unwrap_or(defaults.tenor_years),
        args.insurance_type.map(Into::into).unwrap_or(defaults.insurance_type),
        &settings,
    ))
}
