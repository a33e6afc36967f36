//! Prometheus metrics for the exported budget data
//!
//! Holds one gauge family per [`MetricKind`](ynab_core::MetricKind) and
//! renders them in the text exposition format.

pub mod prometheus;

pub use self::prometheus::{MetricsConfig, PrometheusSink};
