use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoLoanError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unsupported tenor: {0} years (supported range is 1-7)")]
    UnsupportedTenor(u32),

    #[error("Computation cancelled: {0}")]
    Cancelled(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AutoLoanError {
    fn from(e: serde_json::Error) -> Self {
        AutoLoanError::SerializationError(e.to_string())
    }
}
