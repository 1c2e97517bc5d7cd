use serde_json::Value;

use autoloan_core::rates::rate_sheet;

pub fn run_rates() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(rate_sheet())?)
}
