// ⚠️ Error types for the lookup pipeline

use thiserror::Error;

/// Failure while decoding or reshaping the upstream document
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("missing field {0}")]
    MissingField(String),

    #[error("field {0} has an unexpected shape")]
    UnexpectedShape(String),

    #[error("field {field} is not a number: {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("field {field} is not a two-digit year: {value:?}")]
    InvalidYearSuffix { field: String, value: String },

    #[error("field {field} is not a MM/DD/YYYY date: {value:?}")]
    InvalidDate { field: String, value: String },
}

/// Outcome of a failed account lookup, mapped to an HTTP status at the boundary
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Invalid account number")]
    InvalidAccountNumber,

    #[error("Error connecting to TIPS API")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("Account not found")]
    AccountNotFound,

    #[error("TIPS API returned status {0}")]
    UpstreamStatus(u16),

    #[error("Unexpected response from TIPS API: {0}")]
    Normalization(#[from] NormalizeError),
}

impl LookupError {
    /// HTTP status reported to the caller
    pub fn status_code(&self) -> u16 {
        match self {
            LookupError::InvalidAccountNumber => 400,
            LookupError::UpstreamUnreachable(_) => 500,
            LookupError::AccountNotFound => 404,
            LookupError::UpstreamStatus(_) => 502,
            LookupError::Normalization(_) => 502,
        }
    }
}
