//! Coverage summary loading
//!
//! Reads the JSON summary format emitted by coverage tooling:
//! `{ [path]: { statements: {pct}, branches: {pct}, functions: {pct}, lines: {pct} } }`
//! with an optional `total` key. File key order in the document is
//! preserved, it drives the order of rendered diff rows.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::diff::Metric;

/// Percentage value for one metric of one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct MetricSummary {
    #[serde(default)]
    pub pct: f64,
}

/// The four metric percentages reported for one file.
///
/// Counters like `total`/`covered`/`skipped` in the source JSON are
/// ignored; a missing metric reads as 0%.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FileSummary {
    #[serde(default)]
    pub statements: MetricSummary,
    #[serde(default)]
    pub branches: MetricSummary,
    #[serde(default)]
    pub functions: MetricSummary,
    #[serde(default)]
    pub lines: MetricSummary,
}

impl FileSummary {
    pub fn metric_pct(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Statements => self.statements.pct,
            Metric::Branches => self.branches.pct,
            Metric::Functions => self.functions.pct,
            Metric::Lines => self.lines.pct,
        }
    }
}

/// One coverage snapshot: file path to per-metric percentages, in
/// document order
#[derive(Debug, Clone, Default)]
pub struct CoverageSummary {
    entries: Vec<(String, FileSummary)>,
}

impl CoverageSummary {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read coverage summary: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse coverage summary: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(content).context("Coverage summary is not a JSON object")?;

        let mut entries = Vec::with_capacity(raw.len());
        for (path, value) in raw {
            let summary: FileSummary = serde_json::from_value(value)
                .with_context(|| format!("Invalid coverage entry for '{}'", path))?;
            entries.push((path, summary));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<&FileSummary> {
        self.entries
            .iter()
            .find(|(entry_path, _)| entry_path == path)
            .map(|(_, summary)| summary)
    }

    /// File keys in document order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
