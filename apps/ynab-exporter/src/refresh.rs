//! Refresh cycle controller
//!
//! One strictly sequential loop: fetch, publish, sleep, clear, repeat. The
//! clear phase re-derives its observations from the snapshot fetched at the
//! start of the same cycle, so it removes exactly what that cycle published
//! even if the budget changed upstream in the meantime.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};
use ynab_core::{parse, project_tree, CategorySource, MetricSink, Observation, Result};

/// Raw response captured at the start of a cycle
#[derive(Debug, Clone)]
pub struct Snapshot {
    raw: serde_json::Value,
    published: usize,
}

impl Snapshot {
    fn observations(&self) -> Result<Vec<Observation>> {
        let tree = parse(&self.raw)?;
        Ok(project_tree(&tree))
    }
}

/// Drives the fetch, publish, sleep, clear loop
pub struct RefreshController {
    source: Arc<dyn CategorySource>,
    sink: Arc<dyn MetricSink>,
    budget_id: String,
    interval: Duration,
}

impl RefreshController {
    pub fn new(
        source: Arc<dyn CategorySource>,
        sink: Arc<dyn MetricSink>,
        budget_id: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            budget_id: budget_id.into(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run cycles until one fails.
    ///
    /// Never returns `Ok`. Errors are not retried; the process is expected to
    /// exit and be restarted by its supervisor.
    pub async fn run(&self) -> Result<()> {
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            debug!(cycle, phase = "fetching", "Starting refresh cycle");
            let snapshot = self.fetch_and_publish().await?;

            debug!(
                cycle,
                phase = "idle",
                interval_secs = self.interval.as_secs(),
                "Waiting for next refresh"
            );
            tokio::time::sleep(self.interval).await;

            self.clear(&snapshot)?;
        }
    }

    /// Fetch the current tree and publish its observations.
    #[instrument(skip(self), fields(budget_id = %self.budget_id))]
    pub async fn fetch_and_publish(&self) -> Result<Snapshot> {
        info!("Pulling data and populating gauges");
        let raw = self.source.fetch_categories(&self.budget_id).await?;
        let published = self.publish(&raw)?;
        Ok(Snapshot { raw, published })
    }

    /// Parse and project a raw tree, then write every observation.
    ///
    /// Parsing and projection complete before the first write, so a
    /// malformed tree leaves the sink untouched.
    pub fn publish(&self, raw: &serde_json::Value) -> Result<usize> {
        let tree = parse(raw)?;
        let observations = project_tree(&tree);

        for observation in &observations {
            self.sink.set(observation)?;
        }

        info!(
            groups = tree.group_count(),
            categories = tree.flat_categories.len(),
            observations = observations.len(),
            "Published category metrics"
        );
        Ok(observations.len())
    }

    /// Remove every observation the snapshot published.
    pub fn clear(&self, snapshot: &Snapshot) -> Result<usize> {
        info!("Clearing gauges");
        let observations = snapshot.observations()?;

        for observation in &observations {
            self.sink.remove(observation)?;
        }

        debug!(
            published = snapshot.published,
            removed = observations.len(),
            "Cleared category metrics"
        );
        Ok(observations.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;
    use ynab_core::{ExporterError, MetricKind};
    use ynab_infra::PrometheusSink;

    type Key = (MetricKind, Vec<String>);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Set,
        Remove,
    }

    /// Sink that keeps live values and a log of every call
    #[derive(Default)]
    struct RecordingSink {
        live: Mutex<HashMap<Key, f64>>,
        log: Mutex<Vec<(Op, Key)>>,
    }

    impl RecordingSink {
        fn live_keys(&self) -> HashSet<Key> {
            self.live.lock().unwrap().keys().cloned().collect()
        }

        /// Consecutive runs of the same operation, as key sets
        fn phases(&self) -> Vec<(Op, HashSet<Key>)> {
            let mut phases: Vec<(Op, HashSet<Key>)> = Vec::new();
            for (op, key) in self.log.lock().unwrap().iter() {
                let continues = phases.last().map_or(false, |(last, _)| last == op);
                if continues {
                    phases.last_mut().unwrap().1.insert(key.clone());
                } else {
                    phases.push((*op, HashSet::from([key.clone()])));
                }
            }
            phases
        }
    }

    impl MetricSink for RecordingSink {
        fn set(&self, observation: &Observation) -> Result<()> {
            let key = (observation.metric, observation.labels.clone());
            self.live.lock().unwrap().insert(key.clone(), observation.value);
            self.log.lock().unwrap().push((Op::Set, key));
            Ok(())
        }

        fn remove(&self, observation: &Observation) -> Result<()> {
            let key = (observation.metric, observation.labels.clone());
            if self.live.lock().unwrap().remove(&key).is_none() {
                return Err(ExporterError::Sink(format!("{:?} not present", key)));
            }
            self.log.lock().unwrap().push((Op::Remove, key));
            Ok(())
        }
    }

    /// Source that replays canned responses, then fails
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Value>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl CategorySource for ScriptedSource {
        async fn fetch_categories(&self, _budget_id: &str) -> Result<Value> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExporterError::Fetch("connection refused".to_string())))
        }
    }

    fn tree(group_name: &str, category_name: &str, budgeted: i64) -> Value {
        json!({
            "data": {
                "category_groups": [{
                    "id": "g1",
                    "name": group_name,
                    "hidden": false,
                    "categories": [{
                        "id": "c1",
                        "name": category_name,
                        "hidden": false,
                        "budgeted": budgeted,
                        "activity": -budgeted,
                        "balance": 0
                    }]
                }]
            }
        })
    }

    fn controller(source: ScriptedSource, sink: Arc<RecordingSink>) -> RefreshController {
        RefreshController::new(Arc::new(source), sink, "budget-1", Duration::ZERO)
    }

    fn key(metric: MetricKind, labels: &[&str]) -> Key {
        (metric, labels.iter().map(|l| l.to_string()).collect())
    }

    #[tokio::test]
    async fn test_publish_single_cycle() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(
            ScriptedSource::new(vec![Ok(tree("Bills", "Rent", 500_000))]),
            sink.clone(),
        );

        let snapshot = controller.fetch_and_publish().await.unwrap();
        assert_eq!(snapshot.published, 5);

        let live = sink.live.lock().unwrap();
        assert_eq!(live.len(), 5);
        assert_eq!(live[&key(MetricKind::CategoryBudgeted, &["c1"])], 500.0);
        assert_eq!(live[&key(MetricKind::CategoryActivity, &["c1"])], -500.0);
        assert_eq!(live[&key(MetricKind::CategoryBalance, &["c1"])], 0.0);
        assert_eq!(
            live[&key(MetricKind::CategoryMetadata, &["c1", "Rent", "false", "g1"])],
            1.0
        );
        assert_eq!(
            live[&key(MetricKind::CategoryGroupMetadata, &["g1", "Bills", "false"])],
            1.0
        );
    }

    #[tokio::test]
    async fn test_clear_removes_exactly_what_was_published() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(
            ScriptedSource::new(vec![Ok(tree("Bills", "Rent", 500_000))]),
            sink.clone(),
        );

        let snapshot = controller.fetch_and_publish().await.unwrap();
        let published = sink.live_keys();

        let removed = controller.clear(&snapshot).unwrap();
        assert_eq!(removed, published.len());
        assert!(sink.live_keys().is_empty());
    }

    #[tokio::test]
    async fn test_cycles_do_not_overlap_when_data_changes() {
        let sink = Arc::new(RecordingSink::default());
        // Second fetch renames both the group and the category
        let controller = controller(
            ScriptedSource::new(vec![
                Ok(tree("Bills", "Rent", 500_000)),
                Ok(tree("Housing", "Mortgage", 750_000)),
            ]),
            sink.clone(),
        );

        let err = controller.run().await.unwrap_err();
        assert!(matches!(err, ExporterError::Fetch(_)));

        let phases = sink.phases();
        let ops: Vec<Op> = phases.iter().map(|(op, _)| *op).collect();
        assert_eq!(ops, vec![Op::Set, Op::Remove, Op::Set, Op::Remove]);

        // Each clear removes the tuples its own cycle published
        assert_eq!(phases[0].1, phases[1].1);
        assert_eq!(phases[2].1, phases[3].1);
        assert!(phases[0].1.contains(&key(
            MetricKind::CategoryMetadata,
            &["c1", "Rent", "false", "g1"]
        )));
        assert!(phases[2].1.contains(&key(
            MetricKind::CategoryMetadata,
            &["c1", "Mortgage", "false", "g1"]
        )));

        assert!(sink.live_keys().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_stops_loop_before_writing() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(
            ScriptedSource::new(vec![
                Ok(tree("Bills", "Rent", 500_000)),
                Ok(json!({"data": {}})),
            ]),
            sink.clone(),
        );

        let err = controller.run().await.unwrap_err();
        assert!(matches!(err, ExporterError::MalformedInput(_)));

        let ops: Vec<Op> = sink.phases().iter().map(|(op, _)| *op).collect();
        assert_eq!(ops, vec![Op::Set, Op::Remove]);
        assert!(sink.live_keys().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(ScriptedSource::new(vec![]), sink.clone());

        let err = controller.run().await.unwrap_err();
        assert!(matches!(err, ExporterError::Fetch(_)));
        assert!(sink.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycles_against_prometheus_registry() {
        let two_categories = json!({
            "data": {
                "category_groups": [{
                    "id": "g1",
                    "name": "Bills",
                    "hidden": false,
                    "categories": [
                        {"id": "c1", "name": "Rent", "hidden": false,
                         "budgeted": 500_000, "activity": -500_000, "balance": 0},
                        {"id": "c2", "name": "Power", "hidden": true,
                         "budgeted": 80_000, "activity": -62_500, "balance": 17_500}
                    ]
                }]
            }
        });
        let sink = Arc::new(PrometheusSink::default_config().unwrap());
        let controller = RefreshController::new(
            Arc::new(ScriptedSource::new(vec![
                Ok(two_categories.clone()),
                Ok(two_categories),
            ])),
            sink.clone(),
            "budget-1",
            Duration::ZERO,
        );

        // One group marker, plus a marker and three amounts per category
        let snapshot = controller.fetch_and_publish().await.unwrap();
        assert_eq!(snapshot.published, 9);
        assert_eq!(sink.series_count(), 9);
        assert_eq!(
            sink.value_of(&Observation::new(
                MetricKind::CategoryBalance,
                vec!["c2".to_string()],
                0.0
            )),
            Some(17.5)
        );

        assert_eq!(controller.clear(&snapshot).unwrap(), 9);
        assert_eq!(sink.series_count(), 0);

        let err = controller.run().await.unwrap_err();
        assert!(matches!(err, ExporterError::Fetch(_)));
        assert_eq!(sink.series_count(), 0);
    }

    #[test]
    fn test_publish_is_upsert() {
        let sink = Arc::new(RecordingSink::default());
        let controller = controller(ScriptedSource::new(vec![]), sink.clone());

        controller.publish(&tree("Bills", "Rent", 1_000)).unwrap();
        controller.publish(&tree("Bills", "Rent", 2_000)).unwrap();

        let live = sink.live.lock().unwrap();
        assert_eq!(live.len(), 5);
        assert_eq!(live[&key(MetricKind::CategoryBudgeted, &["c1"])], 2.0);
    }
}
