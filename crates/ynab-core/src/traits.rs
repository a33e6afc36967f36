//! Seams between the refresh loop and its external collaborators.

use async_trait::async_trait;

use crate::error::Result;
use crate::projection::Observation;

/// Where raw category trees come from.
#[async_trait]
pub trait CategorySource: Send + Sync {
    /// Fetch the categories response for a budget as untyped JSON.
    ///
    /// Transport failures, non-success statuses and undecodable bodies are
    /// reported as [`ExporterError::Fetch`](crate::ExporterError::Fetch).
    async fn fetch_categories(&self, budget_id: &str) -> Result<serde_json::Value>;
}

/// A store of observations keyed by metric and label tuple.
///
/// Implementations must tolerate concurrent readers while one writer calls
/// `set` and `remove`.
pub trait MetricSink: Send + Sync {
    /// Insert or overwrite the value for the observation's label tuple.
    fn set(&self, observation: &Observation) -> Result<()>;

    /// Remove the observation's label tuple. The value is ignored.
    ///
    /// Removing a tuple that is not present is an error.
    fn remove(&self, observation: &Observation) -> Result<()>;
}
