//! Error types for the YNAB client

use thiserror::Error;
use ynab_core::ExporterError;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, YnabError>;

/// Errors that can occur when calling the budgeting API
#[derive(Error, Debug)]
pub enum YnabError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Token was rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Budget does not exist or is not visible to the token
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Server error
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl YnabError {
    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            YnabError::Api { status, .. } | YnabError::Server { status, .. } => Some(*status),
            YnabError::Auth(_) => Some(401),
            YnabError::NotFound(_) => Some(404),
            YnabError::RateLimit(_) => Some(429),
            YnabError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<YnabError> for ExporterError {
    fn from(err: YnabError) -> Self {
        match err {
            YnabError::Url(_) | YnabError::Config(_) => ExporterError::Config(err.to_string()),
            _ => ExporterError::Fetch(err.to_string()),
        }
    }
}
