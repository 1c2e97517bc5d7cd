use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use autoloan_core::budget::{self, BudgetInput, SessionResult, SolverConfig};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_quote(input_json: String) -> NapiResult<String> {
    let input: autoloan_core::quote::LoanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = autoloan_core::quote::calculate_quote(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn estimate_insurance(input_json: String) -> NapiResult<String> {
    let input: autoloan_core::quote::InsuranceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = autoloan_core::quote::estimate_insurance(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Down payment percentage for an amount, as a decimal string.
#[napi]
pub fn dp_percent_from_amount(otr_price: String, dp_amount: String) -> NapiResult<String> {
    let otr: Decimal = otr_price.trim().parse().map_err(to_napi_error)?;
    let amount: Decimal = dp_amount.trim().parse().map_err(to_napi_error)?;
    autoloan_core::quote::dp_percent_from_amount(otr, amount)
        .map(|pct| pct.to_string())
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison & rates
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_tenors(input_json: String) -> NapiResult<String> {
    let input: autoloan_core::comparison::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = autoloan_core::comparison::compare_tenors(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rate_sheet() -> NapiResult<String> {
    serde_json::to_string(&autoloan_core::rates::rate_sheet()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

/// Budget request with optional solver tuning under `solver`.
#[derive(Deserialize)]
struct BudgetRequest {
    #[serde(flatten)]
    budget: BudgetInput,
    #[serde(default)]
    solver: SolverConfig,
}

#[napi]
pub fn solve_budget(input_json: String) -> NapiResult<String> {
    let request: BudgetRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = budget::solve_budget(&request.budget, &request.solver).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Background budget solver for interactive forms: each submit supersedes
/// the previous one and only the newest result is ever returned.
#[napi(js_name = "BudgetSession")]
pub struct JsBudgetSession {
    inner: budget::BudgetSession,
}

#[napi]
impl JsBudgetSession {
    #[napi(constructor)]
    pub fn new(config_json: Option<String>) -> napi::Result<Self> {
        let config: SolverConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
            None => SolverConfig::default(),
        };
        config.validate().map_err(to_napi_error)?;
        Ok(JsBudgetSession {
            inner: budget::BudgetSession::new(config),
        })
    }

    /// Start a solve; returns its generation number.
    #[napi]
    pub fn submit(&self, input_json: String) -> NapiResult<i64> {
        let input: BudgetInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
        i64::try_from(self.inner.submit(input)).map_err(to_napi_error)
    }

    /// Latest result for the current generation, or null if none is ready.
    #[napi]
    pub fn poll(&self) -> NapiResult<Option<String>> {
        self.inner.poll().map(result_json).transpose()
    }

    /// Block until the current solve finishes.
    #[napi]
    pub fn wait(&self) -> NapiResult<Option<String>> {
        self.inner.wait().map(result_json).transpose()
    }

    #[napi]
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    #[napi(getter)]
    pub fn running(&self) -> bool {
        self.inner.is_running()
    }
}

fn result_json(result: SessionResult) -> NapiResult<String> {
    let solution = result.outcome.map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({
        "generation": result.generation,
        "result": solution,
    }))
    .map_err(to_napi_error)
}
