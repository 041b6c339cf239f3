//! Diff report construction and markdown row rendering

use std::collections::HashSet;

use crate::report::{CoverageSummary, FileSummary};

use super::{FileDiff, Metric, MetricDiff, TOTAL_KEY, TOTAL_LABEL};

const INCREASED_COVERAGE_ICON: &str = ":green_apple:";
const DECREASED_COVERAGE_ICON: &str = ":apple:";
const NEW_COVERAGE_ICON: &str = ":new:";
const REMOVED_COVERAGE_ICON: &str = ":fire:";
const UNCHANGED_COVERAGE_ICON: &str = ":yellow_circle:";

/// Compares two coverage summaries file by file.
///
/// The diff report is built once at construction and never mutated:
/// its key set is the union of the two summaries' keys, new-report keys
/// first in their original order, then keys only the old report had.
pub struct DiffChecker {
    entries: Vec<(String, FileDiff)>,
}

impl DiffChecker {
    pub fn new(new_summary: &CoverageSummary, old_summary: &CoverageSummary) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut entries = Vec::new();

        for path in new_summary.paths().chain(old_summary.paths()) {
            if !seen.insert(path) {
                continue;
            }
            entries.push((
                path.to_string(),
                file_diff(new_summary.get(path), old_summary.get(path)),
            ));
        }

        Self { entries }
    }

    /// All files in the diff report, in report order
    pub fn files(&self) -> impl Iterator<Item = (&str, &FileDiff)> {
        self.entries.iter().map(|(path, diff)| (path.as_str(), diff))
    }

    /// Render one markdown table row per file.
    ///
    /// Unchanged files are omitted unless `full_diff` is set. `path_prefix`
    /// (typically the working directory) is stripped from displayed names;
    /// the `total` key gets a descriptive label instead.
    pub fn get_coverage_details(&self, full_diff: bool, path_prefix: &str) -> Vec<String> {
        let mut rows = Vec::new();

        for (path, diff) in self.files() {
            let name = display_name(path, path_prefix);
            if diff.is_unchanged() {
                if full_diff {
                    rows.push(unchanged_line(&name, diff));
                }
            } else {
                rows.push(diff_line(&name, diff));
            }
        }

        rows
    }
}

/// Missing file or metric in either summary reads as 0%, never an error
fn file_diff(new: Option<&FileSummary>, old: Option<&FileSummary>) -> FileDiff {
    let pct = |summary: Option<&FileSummary>, metric: Metric| {
        summary.map(|s| s.metric_pct(metric)).unwrap_or(0.0)
    };

    FileDiff {
        statements: MetricDiff {
            new_pct: pct(new, Metric::Statements),
            old_pct: pct(old, Metric::Statements),
        },
        branches: MetricDiff {
            new_pct: pct(new, Metric::Branches),
            old_pct: pct(old, Metric::Branches),
        },
        functions: MetricDiff {
            new_pct: pct(new, Metric::Functions),
            old_pct: pct(old, Metric::Functions),
        },
        lines: MetricDiff {
            new_pct: pct(new, Metric::Lines),
            old_pct: pct(old, Metric::Lines),
        },
    }
}

fn display_name(path: &str, prefix: &str) -> String {
    if path == TOTAL_KEY {
        return TOTAL_LABEL.to_string();
    }
    if prefix.is_empty() {
        return path.to_string();
    }
    path.replacen(prefix, "", 1)
}

fn diff_line(name: &str, diff: &FileDiff) -> String {
    if diff.is_new() {
        return format!(
            " {} | **{}** | **{}%** | **{}%** | **{}%** | **{}%**",
            NEW_COVERAGE_ICON,
            name,
            diff.statements.new_pct,
            diff.branches.new_pct,
            diff.functions.new_pct,
            diff.lines.new_pct,
        );
    }

    if diff.is_removed() {
        return format!(
            " {} | ~~{}~~ | ~~{}%~~ | ~~{}%~~ | ~~{}%~~ | ~~{}%~~",
            REMOVED_COVERAGE_ICON,
            name,
            diff.statements.old_pct,
            diff.branches.old_pct,
            diff.functions.old_pct,
            diff.lines.old_pct,
        );
    }

    // Coverage existed in both runs, show new value plus signed delta
    format!(
        " {} | {} | {} | {} | {} | {}",
        status_icon(diff),
        name,
        metric_cell(&diff.statements),
        metric_cell(&diff.branches),
        metric_cell(&diff.functions),
        metric_cell(&diff.lines),
    )
}

fn unchanged_line(name: &str, diff: &FileDiff) -> String {
    format!(
        " {} | {} | {}% | {}% | {}% | {}%",
        UNCHANGED_COVERAGE_ICON,
        name,
        diff.statements.new_pct,
        diff.branches.new_pct,
        diff.functions.new_pct,
        diff.lines.new_pct,
    )
}

fn metric_cell(metric: &MetricDiff) -> String {
    let delta = metric.delta();
    if delta == 0.0 {
        format!("{:.2}%", metric.new_pct)
    } else {
        format!("{:.2}% **({:+.2})**", metric.new_pct, delta)
    }
}

fn status_icon(diff: &FileDiff) -> &'static str {
    let aggregate = diff.aggregate_delta();
    if aggregate > 0.0 {
        INCREASED_COVERAGE_ICON
    } else if aggregate < 0.0 {
        DECREASED_COVERAGE_ICON
    } else {
        // Individual metrics moved but the sums cancel out
        UNCHANGED_COVERAGE_ICON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(json: &str) -> CoverageSummary {
        CoverageSummary::parse(json).unwrap()
    }

    #[test]
    fn test_identical_reports_produce_no_rows() {
        let report = r#"{
            "a.ts": {
                "statements": {"pct": 80},
                "branches": {"pct": 70},
                "functions": {"pct": 90},
                "lines": {"pct": 85}
            }
        }"#;

        let checker = DiffChecker::new(&summary(report), &summary(report));
        assert!(checker.get_coverage_details(false, "").is_empty());
    }

    #[test]
    fn test_changed_row_shows_delta() {
        let new = summary(
            r#"{"a.ts": {"statements": {"pct": 80}, "branches": {"pct": 70},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );
        let old = summary(
            r#"{"a.ts": {"statements": {"pct": 90}, "branches": {"pct": 70},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );

        let checker = DiffChecker::new(&new, &old);
        let rows = checker.get_coverage_details(false, "");

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            " :apple: | a.ts | 80.00% **(-10.00)** | 70.00% | 90.00% | 85.00%"
        );
    }

    #[test]
    fn test_new_file_row_is_bolded() {
        let new = summary(
            r#"{"b.ts": {"statements": {"pct": 50}, "branches": {"pct": 40},
                "functions": {"pct": 60}, "lines": {"pct": 55}}}"#,
        );
        let old = summary("{}");

        let checker = DiffChecker::new(&new, &old);
        let rows = checker.get_coverage_details(false, "");

        assert_eq!(
            rows,
            vec![" :new: | **b.ts** | **50%** | **40%** | **60%** | **55%**"]
        );
    }

    #[test]
    fn test_removed_file_row_is_struck_through() {
        let new = summary("{}");
        let old = summary(
            r#"{"gone.ts": {"statements": {"pct": 50}, "branches": {"pct": 40},
                "functions": {"pct": 60}, "lines": {"pct": 55}}}"#,
        );

        let checker = DiffChecker::new(&new, &old);
        let rows = checker.get_coverage_details(false, "");

        assert_eq!(
            rows,
            vec![" :fire: | ~~gone.ts~~ | ~~50%~~ | ~~40%~~ | ~~60%~~ | ~~55%~~"]
        );
    }

    #[test]
    fn test_cancelled_aggregate_uses_neutral_icon() {
        let new = summary(
            r#"{"a.ts": {"statements": {"pct": 85}, "branches": {"pct": 65},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );
        let old = summary(
            r#"{"a.ts": {"statements": {"pct": 80}, "branches": {"pct": 70},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );

        let checker = DiffChecker::new(&new, &old);
        let rows = checker.get_coverage_details(false, "");

        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with(" :yellow_circle: | a.ts |"));
    }

    #[test]
    fn test_improved_file_uses_increase_icon() {
        let new = summary(
            r#"{"a.ts": {"statements": {"pct": 92.5}, "branches": {"pct": 70},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );
        let old = summary(
            r#"{"a.ts": {"statements": {"pct": 91}, "branches": {"pct": 70},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );

        let checker = DiffChecker::new(&new, &old);
        let rows = checker.get_coverage_details(false, "");

        assert_eq!(
            rows,
            vec![" :green_apple: | a.ts | 92.50% **(+1.50)** | 70.00% | 90.00% | 85.00%"]
        );
    }

    #[test]
    fn test_full_diff_includes_unchanged_files() {
        let report = r#"{
            "a.ts": {
                "statements": {"pct": 80},
                "branches": {"pct": 70},
                "functions": {"pct": 90},
                "lines": {"pct": 85}
            }
        }"#;

        let checker = DiffChecker::new(&summary(report), &summary(report));
        let rows = checker.get_coverage_details(true, "");

        assert_eq!(rows, vec![" :yellow_circle: | a.ts | 80% | 70% | 90% | 85%"]);
    }

    #[test]
    fn test_union_key_order_new_report_first() {
        let new = summary(
            r#"{
                "a.ts": {"statements": {"pct": 10}, "branches": {"pct": 10},
                         "functions": {"pct": 10}, "lines": {"pct": 10}},
                "b.ts": {"statements": {"pct": 20}, "branches": {"pct": 20},
                         "functions": {"pct": 20}, "lines": {"pct": 20}}
            }"#,
        );
        let old = summary(
            r#"{
                "b.ts": {"statements": {"pct": 25}, "branches": {"pct": 20},
                         "functions": {"pct": 20}, "lines": {"pct": 20}},
                "c.ts": {"statements": {"pct": 30}, "branches": {"pct": 30},
                         "functions": {"pct": 30}, "lines": {"pct": 30}},
                "d.ts": {"statements": {"pct": 40}, "branches": {"pct": 40},
                         "functions": {"pct": 40}, "lines": {"pct": 40}}
            }"#,
        );

        let checker = DiffChecker::new(&new, &old);
        let order: Vec<&str> = checker.files().map(|(path, _)| path).collect();
        assert_eq!(order, vec!["a.ts", "b.ts", "c.ts", "d.ts"]);
    }

    #[test]
    fn test_path_prefix_is_stripped_once() {
        let new = summary(
            r#"{"/work/src/a.ts": {"statements": {"pct": 50}, "branches": {"pct": 40},
                "functions": {"pct": 60}, "lines": {"pct": 55}}}"#,
        );
        let old = summary("{}");

        let checker = DiffChecker::new(&new, &old);
        let rows = checker.get_coverage_details(false, "/work/");

        assert!(rows[0].contains("**src/a.ts**"));
    }

    #[test]
    fn test_total_key_gets_descriptive_label() {
        let new = summary(
            r#"{"total": {"statements": {"pct": 81}, "branches": {"pct": 70},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );
        let old = summary(
            r#"{"total": {"statements": {"pct": 80}, "branches": {"pct": 70},
                "functions": {"pct": 90}, "lines": {"pct": 85}}}"#,
        );

        let checker = DiffChecker::new(&new, &old);
        let rows = checker.get_coverage_details(false, "/work/");

        assert!(rows[0].contains("(Total of all files checked)"));
    }

    #[test]
    fn test_missing_metrics_default_to_zero() {
        let new = summary(r#"{"a.ts": {"lines": {"pct": 50}}}"#);
        let old = summary(r#"{"a.ts": {"lines": {"pct": 60}}}"#);

        let checker = DiffChecker::new(&new, &old);
        let (_, diff) = checker.files().next().unwrap();

        assert_eq!(diff.statements.new_pct, 0.0);
        assert_eq!(diff.statements.old_pct, 0.0);
        assert_eq!(diff.lines.new_pct, 50.0);
        assert_eq!(diff.lines.old_pct, 60.0);
    }
}
