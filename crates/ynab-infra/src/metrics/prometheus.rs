//! Prometheus sink implementation
//!
//! Observations are stored in labeled gauge families registered on a private
//! registry. The registry is safe to gather from while the refresh loop writes.

use std::collections::HashMap;

use ::prometheus::core::Collector;
use ::prometheus::proto::MetricFamily;
use ::prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;
use ynab_core::{MetricKind, MetricSink, Observation, NAMESPACE};

use crate::{InfraError, Result};

/// Configuration for metrics
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Namespace prepended to every metric name
    pub prefix: String,
    /// Constant labels added to every series
    pub default_labels: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            prefix: NAMESPACE.to_string(),
            default_labels: HashMap::new(),
        }
    }
}

impl MetricsConfig {
    /// Create a new config with a prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    /// Add a constant label
    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.default_labels.insert(name.to_string(), value.to_string());
        self
    }
}

/// Metric sink backed by a Prometheus registry
pub struct PrometheusSink {
    config: MetricsConfig,
    registry: Registry,
    gauges: HashMap<MetricKind, GaugeVec>,
}

impl PrometheusSink {
    /// Create the sink and register one gauge family per metric kind
    pub fn new(config: MetricsConfig) -> Result<Self> {
        if config.prefix.trim().is_empty() {
            return Err(InfraError::Configuration(
                "metrics prefix must not be empty".to_string(),
            ));
        }

        let registry = Registry::new();
        let mut gauges = HashMap::with_capacity(MetricKind::ALL.len());

        for kind in MetricKind::ALL {
            let opts = Opts::new(kind.name(), kind.help())
                .namespace(config.prefix.clone())
                .const_labels(config.default_labels.clone());
            let gauge = GaugeVec::new(opts, kind.label_names())?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.insert(kind, gauge);
        }

        Ok(Self {
            config,
            registry,
            gauges,
        })
    }

    /// Create with default configuration
    pub fn default_config() -> Result<Self> {
        Self::new(MetricsConfig::default())
    }

    fn gauge(&self, kind: MetricKind) -> Result<&GaugeVec> {
        self.gauges.get(&kind).ok_or_else(|| {
            InfraError::Configuration(format!("no gauge registered for {}", kind.name()))
        })
    }

    fn full_name(&self, kind: MetricKind) -> String {
        format!("{}_{}", self.config.prefix, kind.name())
    }

    /// Gather the current state of every family
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Number of label tuples currently stored across all families
    pub fn series_count(&self) -> usize {
        self.gauges
            .values()
            .flat_map(|gauge| gauge.collect())
            .map(|family| family.get_metric().len())
            .sum()
    }

    /// Current value stored for an observation's label tuple, if present
    pub fn value_of(&self, observation: &Observation) -> Option<f64> {
        let name = self.full_name(observation.metric);
        let wanted: HashMap<&str, &str> = observation
            .metric
            .label_names()
            .iter()
            .copied()
            .zip(observation.labels.iter().map(String::as_str))
            .collect();

        self.gather()
            .iter()
            .filter(|family| family.get_name() == name)
            .flat_map(|family| family.get_metric().iter())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .filter(|pair| !self.config.default_labels.contains_key(pair.get_name()))
                    .all(|pair| wanted.get(pair.get_name()) == Some(&pair.get_value()))
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Content type of [`render`](Self::render) output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl MetricSink for PrometheusSink {
    fn set(&self, observation: &Observation) -> ynab_core::Result<()> {
        let gauge = self.gauge(observation.metric)?;
        gauge
            .get_metric_with_label_values(&observation.label_values())
            .map_err(InfraError::from)?
            .set(observation.value);
        Ok(())
    }

    fn remove(&self, observation: &Observation) -> ynab_core::Result<()> {
        let gauge = self.gauge(observation.metric)?;
        gauge
            .remove_label_values(&observation.label_values())
            .map_err(|e| {
                debug!(metric = %observation.metric, labels = ?observation.labels, "Removal failed");
                InfraError::from(e)
            })?;
        Ok(())
    }
}
