use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AutoLoanError;
use crate::rates::tables::DEFAULT_PROVISION_RATE_PCT;
use crate::types::{Money, Percent};
use crate::AutoLoanResult;

/// Highest provision rate the settings screen accepts.
pub const MAX_PROVISION_RATE_PCT: Percent = dec!(10);
pub const DEFAULT_ADDITIONAL_ADMIN_FEE: Money = dec!(5_000_000);

/// Dealer-level overrides applied to every quote.
///
/// Passed explicitly into the calculator and solver; there is no global
/// settings state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    pub provision_rate_pct: Percent,
    /// Added on top of the tenor-band admin fee.
    pub additional_admin_fee: Money,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        QuoteSettings {
            provision_rate_pct: DEFAULT_PROVISION_RATE_PCT,
            additional_admin_fee: DEFAULT_ADDITIONAL_ADMIN_FEE,
        }
    }
}

impl QuoteSettings {
    pub fn validate(&self) -> AutoLoanResult<()> {
        if self.provision_rate_pct < Decimal::ZERO || self.provision_rate_pct > MAX_PROVISION_RATE_PCT {
            return Err(AutoLoanError::InvalidInput {
                field: "provision_rate_pct".into(),
                reason: format!("Provision rate must be between 0 and {MAX_PROVISION_RATE_PCT}%"),
            });
        }
        if self.additional_admin_fee < Decimal::ZERO {
            return Err(AutoLoanError::InvalidInput {
                field: "additional_admin_fee".into(),
                reason: "Additional admin fee cannot be negative".into(),
            });
        }
        Ok(())
    }

    /// Parse and validate settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> AutoLoanResult<Self> {
        let settings: QuoteSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_settings_screen() {
        let s = QuoteSettings::default();
        assert_eq!(s.provision_rate_pct, dec!(5.0));
        assert_eq!(s.additional_admin_fee, dec!(5_000_000));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = QuoteSettings::from_json_str(r#"{"provision_rate_pct": "3.5"}"#).unwrap();
        assert_eq!(s.provision_rate_pct, dec!(3.5));
        assert_eq!(s.additional_admin_fee, DEFAULT_ADDITIONAL_ADMIN_FEE);
    }

    #[test]
    fn test_provision_rate_upper_bound() {
        let s = QuoteSettings {
            provision_rate_pct: dec!(10.01),
            ..QuoteSettings::default()
        };
        assert!(matches!(s.validate(), Err(AutoLoanError::InvalidInput { .. })));
    }

    #[test]
    fn test_negative_admin_fee_rejected() {
        let s = QuoteSettings {
            additional_admin_fee: dec!(-1),
            ..QuoteSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = QuoteSettings::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, AutoLoanError::SerializationError(_)));
    }
}
