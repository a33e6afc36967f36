//! Metric projection
//!
//! Maps parsed categories and metadata onto labeled observations. Nothing is
//! written here; the refresh loop hands the result to a [`MetricSink`].
//!
//! [`MetricSink`]: crate::traits::MetricSink

use crate::parser::CategoryTree;
use crate::types::{Category, MetadataEntry, MetadataIndex};

/// Prefix of every exported metric name
pub const NAMESPACE: &str = "ynab";

/// Value of the metadata presence markers. The labels carry the information.
pub const PRESENCE_MARKER: f64 = 1.0;

const MILLIUNITS_PER_UNIT: f64 = 1000.0;

/// The five exported gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    CategoryBudgeted,
    CategoryActivity,
    CategoryBalance,
    CategoryMetadata,
    CategoryGroupMetadata,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::CategoryBudgeted,
        MetricKind::CategoryActivity,
        MetricKind::CategoryBalance,
        MetricKind::CategoryMetadata,
        MetricKind::CategoryGroupMetadata,
    ];

    /// Metric name without the namespace
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::CategoryBudgeted => "category_budgeted",
            MetricKind::CategoryActivity => "category_activity",
            MetricKind::CategoryBalance => "category_balance",
            MetricKind::CategoryMetadata => "category_metadata",
            MetricKind::CategoryGroupMetadata => "category_group_metadata",
        }
    }

    /// Metric name as scraped, e.g. `ynab_category_budgeted`
    pub fn qualified_name(&self) -> String {
        format!("{}_{}", NAMESPACE, self.name())
    }

    pub fn help(&self) -> &'static str {
        match self {
            MetricKind::CategoryBudgeted => "Money budgeted per category",
            MetricKind::CategoryActivity => "Money activity per category",
            MetricKind::CategoryBalance => "Money balance per category",
            MetricKind::CategoryMetadata => "Metadata about this category, including name",
            MetricKind::CategoryGroupMetadata => {
                "Metadata about this category group, including name"
            }
        }
    }

    /// Label names, in the order label values are supplied
    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            MetricKind::CategoryBudgeted
            | MetricKind::CategoryActivity
            | MetricKind::CategoryBalance => &["id"],
            MetricKind::CategoryMetadata => &["id", "name", "hidden", "group_id"],
            MetricKind::CategoryGroupMetadata => &["id", "name", "hidden"],
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

/// One data point: a metric, its label values and a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: MetricKind,
    pub labels: Vec<String>,
    pub value: f64,
}

impl Observation {
    pub fn new(metric: MetricKind, labels: Vec<String>, value: f64) -> Self {
        Self {
            metric,
            labels,
            value,
        }
    }

    /// Label values borrowed in the order the registry expects.
    pub fn label_values(&self) -> Vec<&str> {
        self.labels.iter().map(String::as_str).collect()
    }
}

/// Convert a milliunit amount to major currency units.
///
/// Plain floating-point division, no rounding.
pub fn milliunits_to_units(milliunits: i64) -> f64 {
    milliunits as f64 / MILLIUNITS_PER_UNIT
}

fn render_hidden(hidden: bool) -> String {
    hidden.to_string()
}

/// Observations for the metadata index: one presence marker per entry.
pub fn project_metadata(metadata_index: &MetadataIndex) -> Vec<Observation> {
    metadata_index
        .values()
        .map(|entry| match entry {
            MetadataEntry::Category(meta) => Observation::new(
                MetricKind::CategoryMetadata,
                vec![
                    meta.id.clone(),
                    meta.name.clone(),
                    render_hidden(meta.hidden),
                    meta.group_id.clone(),
                ],
                PRESENCE_MARKER,
            ),
            MetadataEntry::Group(meta) => Observation::new(
                MetricKind::CategoryGroupMetadata,
                vec![meta.id.clone(), meta.name.clone(), render_hidden(meta.hidden)],
                PRESENCE_MARKER,
            ),
        })
        .collect()
}

/// Observations for the category amounts: budgeted, activity and balance.
pub fn project_categories(categories: &[Category]) -> Vec<Observation> {
    categories
        .iter()
        .flat_map(|category| {
            [
                (MetricKind::CategoryBudgeted, category.budgeted),
                (MetricKind::CategoryActivity, category.activity),
                (MetricKind::CategoryBalance, category.balance),
            ]
            .into_iter()
            .map(move |(metric, amount)| {
                Observation::new(
                    metric,
                    vec![category.id.clone()],
                    milliunits_to_units(amount),
                )
            })
        })
        .collect()
}

/// Everything one snapshot publishes: metadata markers first, then amounts.
pub fn project(metadata_index: &MetadataIndex, flat_categories: &[Category]) -> Vec<Observation> {
    let mut observations = project_metadata(metadata_index);
    observations.extend(project_categories(flat_categories));
    observations
}

/// Shorthand for [`project`] over a parsed tree.
pub fn project_tree(tree: &CategoryTree) -> Vec<Observation> {
    project(&tree.metadata_index, &tree.flat_categories)
}
