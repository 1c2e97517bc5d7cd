//! Inverse quote: the down-payment percentage that hits a budget.
//!
//! Given the loan terms and a target (total upfront payment or monthly
//! installment), search `[dp_min, dp_max]` for the percentage whose quote is
//! closest to the target. Every trial runs the regular quote formula, so the
//! solution and the quote shown for it can never disagree.
//!
//! Two strategies:
//! - `Exhaustive`: fixed-step scan, early exit once within tolerance.
//! - `ScanThenBisect`: coarse scan; if the samples are monotone, bisect the
//!   bracketing interval, otherwise fall back to the exhaustive scan.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::AutoLoanError;
use crate::quote::calculator::{build_quote, validate_loan_terms, LoanInput, LoanQuote};
use crate::quote::settings::QuoteSettings;
use crate::rates::tables::RateTables;
use crate::types::{with_metadata, ComputationOutput, InsuranceType, Money, Percent, Tenor};
use crate::AutoLoanResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_DP_MIN_PCT: Percent = dec!(20);
pub const DEFAULT_DP_MAX_PCT: Percent = dec!(90);
/// Currency units; a trial this close to the target ends the search.
pub const DEFAULT_TOLERANCE: Money = dec!(1);
pub const DEFAULT_STEP_PCT: Percent = dec!(0.0001);
pub const DEFAULT_COARSE_STEP_PCT: Percent = dec!(1);
pub const DEFAULT_RESULT_DECIMALS: u32 = 5;
const DEFAULT_MAX_BISECTION_ITERATIONS: u32 = 200;
const MAX_RESULT_DECIMALS: u32 = 10;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Which quote field the budget is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[default]
    #[serde(alias = "tdp")]
    TotalUpfrontPayment,
    #[serde(alias = "installment")]
    MonthlyInstallment,
}

impl TargetKind {
    pub fn pick(self, quote: &LoanQuote) -> Money {
        match self {
            TargetKind::TotalUpfrontPayment => quote.total_upfront_payment,
            TargetKind::MonthlyInstallment => quote.monthly_installment,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Exhaustive,
    #[default]
    ScanThenBisect,
}

/// Tuning for the down-payment search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Stop as soon as a trial is closer than this to the target.
    pub tolerance: Money,
    /// Step of the exhaustive scan, in percentage points.
    pub step: Percent,
    /// Step of the monotonicity scan that precedes bisection.
    pub coarse_step: Percent,
    /// Decimal places of the returned percentage.
    pub decimals: u32,
    pub dp_min: Percent,
    pub dp_max: Percent,
    pub strategy: SearchStrategy,
    pub max_bisection_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            tolerance: DEFAULT_TOLERANCE,
            step: DEFAULT_STEP_PCT,
            coarse_step: DEFAULT_COARSE_STEP_PCT,
            decimals: DEFAULT_RESULT_DECIMALS,
            dp_min: DEFAULT_DP_MIN_PCT,
            dp_max: DEFAULT_DP_MAX_PCT,
            strategy: SearchStrategy::ScanThenBisect,
            max_bisection_iterations: DEFAULT_MAX_BISECTION_ITERATIONS,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> AutoLoanResult<()> {
        if self.dp_min < Decimal::ZERO || self.dp_max > dec!(100) || self.dp_min >= self.dp_max {
            return Err(AutoLoanError::InvalidInput {
                field: "dp_min/dp_max".into(),
                reason: "Search range must satisfy 0 <= dp_min < dp_max <= 100".into(),
            });
        }
        if self.step <= Decimal::ZERO || self.coarse_step <= Decimal::ZERO {
            return Err(AutoLoanError::InvalidInput {
                field: "step".into(),
                reason: "Scan steps must be positive".into(),
            });
        }
        if self.tolerance < Decimal::ZERO {
            return Err(AutoLoanError::InvalidInput {
                field: "tolerance".into(),
                reason: "Tolerance cannot be negative".into(),
            });
        }
        if self.decimals > MAX_RESULT_DECIMALS {
            return Err(AutoLoanError::InvalidInput {
                field: "decimals".into(),
                reason: format!("At most {MAX_RESULT_DECIMALS} decimal places are supported"),
            });
        }
        Ok(())
    }

    /// Interval width below which bisection stops: one digit finer than the result.
    fn resolution(&self) -> Decimal {
        Decimal::new(1, self.decimals + 1)
    }
}

/// Loan terms plus the budget to match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetInput {
    pub otr_price: Money,
    pub tenor_years: u32,
    #[serde(default)]
    pub insurance_type: InsuranceType,
    #[serde(flatten)]
    pub settings: QuoteSettings,
    /// Budget amount; must be positive.
    pub target: Money,
    #[serde(default)]
    pub target_kind: TargetKind,
}

impl BudgetInput {
    fn loan_at(&self, dp_percent: Percent) -> LoanInput {
        LoanInput::new(
            self.otr_price,
            dp_percent,
            self.tenor_years,
            self.insurance_type,
            &self.settings,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSolution {
    /// Solved down payment, rounded and inside the search range.
    pub dp_percent: Percent,
    pub target: Money,
    pub target_kind: TargetKind,
    /// Quote field value at `dp_percent`.
    pub achieved: Money,
    /// |achieved - target| at the rounded percentage.
    pub difference: Money,
    /// True when some trial came within tolerance of the target.
    pub converged: bool,
    /// False when the target lies outside what the search range can produce.
    pub target_attainable: bool,
    pub strategy_used: SearchStrategy,
    /// `Some(false)` when the coarse scan found the objective non-monotone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monotone: Option<bool>,
    pub evaluations: u64,
    /// Full quote at `dp_percent`.
    pub quote: LoanQuote,
}

/// Cooperative cancellation flag shared with a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve against the canonical rate sheet.
pub fn solve_budget(
    input: &BudgetInput,
    config: &SolverConfig,
) -> AutoLoanResult<ComputationOutput<BudgetSolution>> {
    let start = Instant::now();
    let solution = solve_budget_with_tables(RateTables::canonical(), input, config, None)?;
    Ok(envelope(input, config, solution, start))
}

/// Solve against the canonical rate sheet, aborting with
/// [`AutoLoanError::Cancelled`] once `cancel` is set.
pub fn solve_budget_cancellable(
    input: &BudgetInput,
    config: &SolverConfig,
    cancel: &CancelToken,
) -> AutoLoanResult<ComputationOutput<BudgetSolution>> {
    let start = Instant::now();
    let solution = solve_budget_with_tables(RateTables::canonical(), input, config, Some(cancel))?;
    Ok(envelope(input, config, solution, start))
}

pub fn solve_budget_with_tables(
    tables: &RateTables,
    input: &BudgetInput,
    config: &SolverConfig,
    cancel: Option<&CancelToken>,
) -> AutoLoanResult<BudgetSolution> {
    config.validate()?;
    if input.target <= Decimal::ZERO {
        return Err(AutoLoanError::InvalidInput {
            field: "target".into(),
            reason: "Budget target must be positive".into(),
        });
    }
    let tenor = Tenor::new(input.tenor_years)?;
    validate_loan_terms(&input.loan_at(config.dp_min))?;

    log::debug!(
        "budget solve: target {} ({:?}), tenor {}, strategy {:?}",
        input.target,
        input.target_kind,
        tenor,
        config.strategy
    );

    let objective = |dp: Percent| -> Money {
        input
            .target_kind
            .pick(&build_quote(tables, &input.loan_at(dp), tenor))
    };
    let outcome = Search::new(objective, input.target, config, cancel).run()?;

    let dp_percent = outcome
        .best
        .dp
        .round_dp_with_strategy(config.decimals, RoundingStrategy::MidpointAwayFromZero)
        .max(config.dp_min)
        .min(config.dp_max);
    let quote = build_quote(tables, &input.loan_at(dp_percent), tenor);
    let achieved = input.target_kind.pick(&quote);
    let difference = (achieved - input.target).abs();
    let converged = outcome.best.diff < config.tolerance;
    let at_boundary = dp_percent == config.dp_min || dp_percent == config.dp_max;
    let target_attainable = converged || !at_boundary;
    if !target_attainable {
        log::warn!(
            "budget target {} unreachable in [{}, {}]; returning boundary {}%",
            input.target,
            config.dp_min,
            config.dp_max,
            dp_percent
        );
    }

    log::debug!(
        "budget solve: dp {}% after {} evaluations (difference {})",
        dp_percent,
        outcome.evaluations,
        difference
    );

    Ok(BudgetSolution {
        dp_percent,
        target: input.target,
        target_kind: input.target_kind,
        achieved,
        difference,
        converged,
        target_attainable,
        strategy_used: outcome.strategy_used,
        monotone: outcome.monotone,
        evaluations: outcome.evaluations,
        quote,
    })
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Trial {
    dp: Percent,
    value: Money,
    diff: Money,
}

struct SearchOutcome {
    best: Trial,
    evaluations: u64,
    strategy_used: SearchStrategy,
    monotone: Option<bool>,
}

/// Down-payment search over an arbitrary objective `dp -> value`.
struct Search<'a, F> {
    objective: F,
    target: Money,
    config: &'a SolverConfig,
    cancel: Option<&'a CancelToken>,
    evaluations: u64,
    best: Option<Trial>,
}

impl<'a, F> Search<'a, F>
where
    F: FnMut(Percent) -> Money,
{
    fn new(objective: F, target: Money, config: &'a SolverConfig, cancel: Option<&'a CancelToken>) -> Self {
        Search {
            objective,
            target,
            config,
            cancel,
            evaluations: 0,
            best: None,
        }
    }

    fn run(mut self) -> AutoLoanResult<SearchOutcome> {
        let (strategy_used, monotone) = match self.config.strategy {
            SearchStrategy::Exhaustive => {
                self.exhaustive()?;
                (SearchStrategy::Exhaustive, None)
            }
            SearchStrategy::ScanThenBisect => self.scan_then_bisect()?,
        };

        match self.best {
            Some(best) => Ok(SearchOutcome {
                best,
                evaluations: self.evaluations,
                strategy_used,
                monotone,
            }),
            // Every strategy evaluates dp_min first
            None => Err(AutoLoanError::InvalidInput {
                field: "dp_min/dp_max".into(),
                reason: "Search range produced no trials".into(),
            }),
        }
    }

    fn evaluate(&mut self, dp: Percent) -> AutoLoanResult<Trial> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(AutoLoanError::Cancelled(format!(
                "budget search stopped after {} evaluations",
                self.evaluations
            )));
        }
        let value = (self.objective)(dp);
        self.evaluations += 1;
        let trial = Trial {
            dp,
            value,
            diff: (value - self.target).abs(),
        };
        // Strictly smaller only: ties keep the lower percentage.
        if self.best.map_or(true, |b| trial.diff < b.diff) {
            self.best = Some(trial);
        }
        Ok(trial)
    }

    fn converged(&self) -> bool {
        self.best.is_some_and(|b| b.diff < self.config.tolerance)
    }

    /// Grid from dp_min to dp_max inclusive. Points are `min + i * step`
    /// so there is no accumulated drift.
    fn grid(&self, step: Percent) -> impl Iterator<Item = Percent> {
        let (min, max) = (self.config.dp_min, self.config.dp_max);
        let mut i: u64 = 0;
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            let dp = min + step * Decimal::from(i);
            i += 1;
            if dp >= max {
                done = true;
                Some(max)
            } else {
                Some(dp)
            }
        })
    }

    fn exhaustive(&mut self) -> AutoLoanResult<()> {
        for dp in self.grid(self.config.step) {
            self.evaluate(dp)?;
            if self.converged() {
                break;
            }
        }
        Ok(())
    }

    fn scan_then_bisect(&mut self) -> AutoLoanResult<(SearchStrategy, Option<bool>)> {
        let mut samples: Vec<Trial> = Vec::new();
        for dp in self.grid(self.config.coarse_step) {
            samples.push(self.evaluate(dp)?);
            if self.converged() {
                return Ok((SearchStrategy::ScanThenBisect, None));
            }
        }

        let Some(direction) = direction(&samples) else {
            log::warn!(
                "budget objective is not monotone over [{}, {}]; falling back to exhaustive scan",
                self.config.dp_min,
                self.config.dp_max
            );
            self.exhaustive()?;
            return Ok((SearchStrategy::Exhaustive, Some(false)));
        };

        if direction != Ordering::Equal {
            let target = self.target;
            let bracket = samples.windows(2).find(|w| {
                let (a, b) = (w[0].value - target, w[1].value - target);
                a.is_zero() || b.is_zero() || a.is_sign_negative() != b.is_sign_negative()
            });
            if let Some(w) = bracket {
                self.bisect(w[0], w[1])?;
            }
            // No bracket: the target is out of range and the best sample is an endpoint.
        }
        Ok((SearchStrategy::ScanThenBisect, Some(true)))
    }

    fn bisect(&mut self, mut lo: Trial, mut hi: Trial) -> AutoLoanResult<()> {
        let resolution = self.config.resolution();
        let two = dec!(2);
        for _ in 0..self.config.max_bisection_iterations {
            if self.converged() || hi.dp - lo.dp <= resolution {
                break;
            }
            let mid = self.evaluate((lo.dp + hi.dp) / two)?;
            let lo_below = (lo.value - self.target).is_sign_negative();
            let mid_below = (mid.value - self.target).is_sign_negative();
            if mid_below == lo_below && !(mid.value - self.target).is_zero() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(())
    }
}

/// Common direction of consecutive samples, or `None` if they go both ways.
fn direction(samples: &[Trial]) -> Option<Ordering> {
    let mut dir = Ordering::Equal;
    for w in samples.windows(2) {
        match w[1].value.cmp(&w[0].value) {
            Ordering::Equal => {}
            step if dir == Ordering::Equal => dir = step,
            step if step != dir => return None,
            _ => {}
        }
    }
    Some(dir)
}

fn envelope(
    input: &BudgetInput,
    config: &SolverConfig,
    solution: BudgetSolution,
    start: Instant,
) -> ComputationOutput<BudgetSolution> {
    let mut warnings: Vec<String> = Vec::new();
    if !solution.target_attainable {
        warnings.push(format!(
            "Target {} is not attainable with a down payment between {}% and {}%; nearest boundary returned",
            input.target, config.dp_min, config.dp_max
        ));
    }
    if solution.monotone == Some(false) {
        warnings.push("Objective was not monotone; exhaustive scan used".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Down-payment search: coarse monotonicity scan with bisection refinement, exhaustive scan fallback",
        &serde_json::json!({
            "otr_price": input.otr_price.to_string(),
            "tenor_years": input.tenor_years,
            "insurance_type": input.insurance_type,
            "target": input.target.to_string(),
            "target_kind": input.target_kind,
            "strategy": config.strategy,
            "tolerance": config.tolerance.to_string(),
            "dp_range": [config.dp_min.to_string(), config.dp_max.to_string()],
            "decimals": config.decimals,
        }),
        warnings,
        elapsed,
        solution,
    )
}
