pub mod metrics;

pub use metrics::{MetricsConfig, PrometheusSink};

use ynab_core::ExporterError;

#[derive(Debug, thiserror::Error)]
pub enum InfraError {
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, InfraError>;

impl From<InfraError> for ExporterError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Configuration(message) => ExporterError::Config(message),
            other => ExporterError::Sink(other.to_string()),
        }
    }
}
