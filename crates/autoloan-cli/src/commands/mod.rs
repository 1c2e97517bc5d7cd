pub mod budget;
pub mod compare;
pub mod insurance;
pub mod quote;
pub mod rates;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use autoloan_core::quote::QuoteSettings;
use autoloan_core::InsuranceType;

use crate::input;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Insurance plan as typed on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlanArg {
    #[value(alias = "kombinasi")]
    Combined,
    #[value(alias = "allrisk")]
    AllRisk,
    #[value(alias = "allrisk-perluasan")]
    AllRiskExtended,
}

impl From<PlanArg> for InsuranceType {
    fn from(plan: PlanArg) -> Self {
        match plan {
            PlanArg::Combined => InsuranceType::Combined,
            PlanArg::AllRisk => InsuranceType::AllRisk,
            PlanArg::AllRiskExtended => InsuranceType::AllRiskExtended,
        }
    }
}

/// Dealer settings: an optional JSON/YAML file, then individual overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Path to a settings file (JSON or YAML)
    #[arg(long)]
    pub settings: Option<String>,

    /// Provision rate in percent (0-10)
    #[arg(long, alias = "provision")]
    pub provision_rate: Option<Decimal>,

    /// Additional admin fee added to the tenor admin fee
    #[arg(long)]
    pub additional_admin_fee: Option<Decimal>,
}

impl SettingsArgs {
    pub fn resolve(&self) -> CliResult<QuoteSettings> {
        let mut settings = match self.settings {
            Some(ref path) => input::file::read_input(path)?,
            None => QuoteSettings::default(),
        };
        if let Some(rate) = self.provision_rate {
            settings.provision_rate_pct = rate;
        }
        if let Some(fee) = self.additional_admin_fee {
            settings.additional_admin_fee = fee;
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// Load a request from `--input`, piped stdin, or fall back to flags.
fn load_or<T, F>(path: &Option<String>, from_flags: F) -> CliResult<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> CliResult<T>,
{
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        from_flags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flag_overrides_apply_over_defaults() {
        let args = SettingsArgs {
            provision_rate: Some(dec!(2.5)),
            ..SettingsArgs::default()
        };
        let s = args.resolve().unwrap();
        assert_eq!(s.provision_rate_pct, dec!(2.5));
        assert_eq!(s.additional_admin_fee, dec!(5_000_000));
    }

    #[test]
    fn test_out_of_range_override_rejected() {
        let args = SettingsArgs {
            provision_rate: Some(dec!(12)),
            ..SettingsArgs::default()
        };
        assert!(args.resolve().is_err());
    }
}
