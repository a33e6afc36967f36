//! Core types and transforms for the YNAB category exporter.
//!
//! The budgeting API returns categories nested inside category groups. This
//! crate flattens that tree ([`parser`]), maps the flat records onto labeled
//! observations ([`projection`]) and defines the seams the refresh loop talks
//! to ([`traits`]).

pub mod config;
pub mod error;
pub mod parser;
pub mod projection;
pub mod traits;
pub mod types;

pub use self::config::*;
pub use error::*;
pub use parser::{parse, CategoryTree};
pub use projection::{
    milliunits_to_units, project, project_tree, MetricKind, Observation, NAMESPACE, PRESENCE_MARKER,
};
pub use traits::{CategorySource, MetricSink};
pub use types::*;
