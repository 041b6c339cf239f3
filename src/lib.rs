//! Covdiff - coverage diff for pull requests
//!
//! Compares two coverage summary snapshots ("new" vs "old") and:
//! - Renders a per-file markdown change table
//! - Posts/updates the table as a PR comment
//! - Fails when any metric drops beyond a configured tolerance

pub mod comment;
pub mod config;
pub mod diff;
pub mod exec;
pub mod report;

pub use diff::{DiffChecker, FileDiff, Metric, MetricDiff};
pub use report::{CoverageSummary, FileSummary, MetricSummary};
