//! Error taxonomy for the exporter.

use thiserror::Error;

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Errors that can stop the exporter.
///
/// None of these are recovered from inside the process. They propagate to
/// `main`, which logs them and exits so a supervisor can restart it.
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The budgeting API could not be reached or answered with a failure
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The API response does not have the expected shape
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The metric registry rejected a write or removal
    #[error("Sink error: {0}")]
    Sink(String),
}

impl ExporterError {
    /// Short, stable name of the error class, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ExporterError::Config(_) => "config",
            ExporterError::Fetch(_) => "fetch",
            ExporterError::MalformedInput(_) => "malformed_input",
            ExporterError::Sink(_) => "sink",
        }
    }
}

impl From<config::ConfigError> for ExporterError {
    fn from(err: config::ConfigError) -> Self {
        ExporterError::Config(err.to_string())
    }
}
