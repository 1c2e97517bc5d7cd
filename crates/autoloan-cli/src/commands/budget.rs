use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use autoloan_core::budget::{solve_budget, BudgetInput, SearchStrategy, SolverConfig, TargetKind};
use autoloan_core::quote::LoanInput;

use super::{load_or, PlanArg, SettingsArgs};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetArg {
    /// Total upfront payment at signing
    #[value(alias = "tdp")]
    Upfront,
    /// Monthly installment
    Installment,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Exhaustive,
    Bisect,
}

/// Arguments for the down-payment budget solver
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BudgetArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Budget to match
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Quote field the budget is matched against
    #[arg(long, value_enum, default_value = "upfront")]
    pub target_kind: TargetArg,

    /// On-the-road vehicle price
    #[arg(long, alias = "otr")]
    pub otr_price: Option<Decimal>,

    /// Tenor in years (1-7)
    #[arg(long, alias = "tenor")]
    pub tenor_years: Option<u32>,

    /// Insurance plan
    #[arg(long, value_enum, alias = "plan")]
    pub insurance_type: Option<PlanArg>,

    /// Search strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Stop once within this many currency units of the target
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Exhaustive scan step, in percentage points
    #[arg(long)]
    pub step: Option<Decimal>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// File/stdin form: the budget plus optional solver tuning under `solver`.
#[derive(Deserialize)]
struct BudgetRequest {
    #[serde(flatten)]
    budget: BudgetInput,
    #[serde(default)]
    solver: SolverConfig,
}

pub fn run_budget(args: BudgetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: BudgetRequest = load_or(&args.input, || {
        let defaults = LoanInput::default();
        Ok(BudgetRequest {
            budget: BudgetInput {
                otr_price: args.otr_price.unwrap_or(defaults.otr_price),
                tenor_years: args.tenor_years.unwrap_or(defaults.tenor_years),
                insurance_type: args.insurance_type.map(Into::into).unwrap_or(defaults.insurance_type),
                settings: args.settings.resolve()?,
                target: args.target.ok_or("--target is required (or provide --input)")?,
                target_kind: match args.target_kind {
                    TargetArg::Upfront => TargetKind::TotalUpfrontPayment,
                    TargetArg::Installment => TargetKind::MonthlyInstallment,
                },
            },
            solver: SolverConfig::default(),
        })
    })?;

    let config = apply_overrides(request.solver, &args);
    let result = solve_budget(&request.budget, &config)?;
    Ok(serde_json::to_value(result)?)
}

fn apply_overrides(mut config: SolverConfig, args: &BudgetArgs) -> SolverConfig {
    if let Some(strategy) = args.strategy {
        config.strategy = match strategy {
            StrategyArg::Exhaustive => SearchStrategy::Exhaustive,
            StrategyArg::Bisect => SearchStrategy::ScanThenBisect,
        };
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(step) = args.step {
        config.step = step;
    }
    config
}
