//! Threshold validation for coverage drops

use anyhow::Result;
use colored::Colorize;

use super::{DiffChecker, Metric, TOTAL_KEY};

impl DiffChecker {
    /// Fail if any metric of any file dropped by more than the allowed
    /// tolerance.
    ///
    /// `delta` applies per file, `total_delta` to the `total` pseudo-file;
    /// `None` means no limit for that scope. Removed files never count as
    /// a regression. Increases never fail. The first violation found in
    /// report order is returned and evaluation stops there.
    pub fn check_if_coverage_falls_below_delta(
        &self,
        delta: Option<f64>,
        total_delta: Option<f64>,
    ) -> Result<()> {
        for (file, diff) in self.files() {
            if diff.is_removed() {
                println!(
                    "{}",
                    format!(
                        "{} : deleted or renamed and is not considered for coverage diff.",
                        file
                    )
                    .dimmed()
                );
                continue;
            }

            for metric in Metric::ALL {
                let metric_diff = diff.metric(metric);
                if metric_diff.is_unchanged() {
                    continue;
                }

                let tolerance = if file == TOTAL_KEY { total_delta } else { delta };
                let Some(tolerance) = tolerance else {
                    continue;
                };

                let change = metric_diff.delta();
                if -change > tolerance {
                    anyhow::bail!(
                        "Test coverage change of {}% is greater than max allowed ({}%) for {} in {}",
                        change,
                        tolerance,
                        metric.as_str(),
                        file
                    );
                }
            }
        }

        Ok(())
    }
}
