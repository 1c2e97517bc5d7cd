pub mod calculator;
pub mod insurance;
pub mod settings;

pub use calculator::{
    calculate_quote, dp_amount_from_percent, dp_percent_from_amount, quote_with_tables, LoanInput,
    LoanQuote,
};
pub use insurance::{estimate_insurance, InsuranceEstimate, InsuranceInput};
pub use settings::QuoteSettings;
