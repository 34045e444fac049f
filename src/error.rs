//! Gateway admin API error types

use thiserror::Error;

/// Errors returned by a [`GatewayAdmin`](crate::gateway::GatewayAdmin) client
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure talking to the admin API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The addressed entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success response from the admin API
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// The admin API endpoint is not a usable base URL
    #[error("Invalid admin URL: {0}")]
    InvalidUrl(String),

    /// Response body did not match the expected entity
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

/// Result type for gateway admin operations
pub type GatewayResult<T> = Result<T, GatewayError>;
