pub mod error;
pub mod rates;
pub mod types;
pub mod quote;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "budget")]
pub mod budget;

pub use error::AutoLoanError;
pub use types::*;

/// Standard result type for all auto-loan operations
pub type AutoLoanResult<T> = Result<T, AutoLoanError>;
