//! Coverage diff engine
//!
//! Provides:
//! - Diff construction from two coverage summaries
//! - Markdown row rendering per file
//! - Threshold validation against allowed coverage drops

mod checker;
mod threshold;

pub use checker::*;

/// Synthetic report key aggregating coverage across all files
pub const TOTAL_KEY: &str = "total";

/// Display label used in place of the `total` key
pub const TOTAL_LABEL: &str = "(Total of all files checked)";

/// The four coverage dimensions of a summary report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Statements,
    Branches,
    Functions,
    Lines,
}

impl Metric {
    /// Declared iteration order, used everywhere metrics are walked so
    /// output and violation reporting stay deterministic
    pub const ALL: [Metric; 4] = [
        Metric::Statements,
        Metric::Branches,
        Metric::Functions,
        Metric::Lines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Statements => "statements",
            Metric::Branches => "branches",
            Metric::Functions => "functions",
            Metric::Lines => "lines",
        }
    }
}

/// Old/new percentage pair for one metric of one file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricDiff {
    pub old_pct: f64,
    pub new_pct: f64,
}

impl MetricDiff {
    /// Change in percentage points, new minus old, rounded to 2 decimals.
    ///
    /// A small positive bias is added before rounding so values that
    /// float representation puts just below the midpoint still round up.
    pub fn delta(&self) -> f64 {
        let diff = self.new_pct - self.old_pct;
        ((diff + f64::EPSILON) * 100.0).round() / 100.0
    }

    pub fn is_unchanged(&self) -> bool {
        self.old_pct == self.new_pct
    }
}

/// Per-file comparison, exactly one entry per metric
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FileDiff {
    pub statements: MetricDiff,
    pub branches: MetricDiff,
    pub functions: MetricDiff,
    pub lines: MetricDiff,
}

impl FileDiff {
    pub fn metric(&self, metric: Metric) -> &MetricDiff {
        match metric {
            Metric::Statements => &self.statements,
            Metric::Branches => &self.branches,
            Metric::Functions => &self.functions,
            Metric::Lines => &self.lines,
        }
    }

    /// All four metrics identical between the two runs
    pub fn is_unchanged(&self) -> bool {
        Metric::ALL.iter().all(|m| self.metric(*m).is_unchanged())
    }

    /// No old coverage at all: the file gained coverage in this run
    pub fn is_new(&self) -> bool {
        Metric::ALL.iter().all(|m| self.metric(*m).old_pct == 0.0)
    }

    /// No new coverage at all: the file was deleted or renamed
    pub fn is_removed(&self) -> bool {
        Metric::ALL.iter().all(|m| self.metric(*m).new_pct == 0.0)
    }

    /// Sum of the four rounded per-metric deltas
    pub fn aggregate_delta(&self) -> f64 {
        Metric::ALL.iter().map(|m| self.metric(*m).delta()).sum()
    }
}
