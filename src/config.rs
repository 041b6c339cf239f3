use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Optional `covdiff.toml` settings. Command-line flags override
/// anything set here.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coverage: CoverageConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoverageConfig {
    /// Command that produces the coverage summary file
    #[serde(default)]
    pub run_command: Option<String>,
    /// Command run before the second coverage run (e.g. switch branches)
    #[serde(default)]
    pub after_switch_command: Option<String>,
    /// Path of the summary file the run command writes
    #[serde(default)]
    pub summary_file: Option<String>,
    /// Maximum allowed per-file coverage drop, in percentage points
    #[serde(default)]
    pub delta: Option<f64>,
    /// Maximum allowed total coverage drop, in percentage points
    #[serde(default)]
    pub total_delta: Option<f64>,
    /// Include unchanged files in the diff table
    #[serde(default)]
    pub full_coverage_diff: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GithubConfig {
    /// Repository in `owner/name` form
    #[serde(default)]
    pub repo: Option<String>,
    /// Update the previous covdiff comment instead of posting a new one
    #[serde(default)]
    pub use_same_comment: bool,
    /// Link to the full coverage report, shown in the comment
    #[serde(default)]
    pub report_url: Option<String>,
    /// Expiry note for the report link
    #[serde(default)]
    pub report_expiry: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load an explicit config path, the default `covdiff.toml` when it
    /// exists, or built-in defaults otherwise
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new("covdiff.toml");
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(delta) = self.coverage.delta {
            if delta < 0.0 {
                anyhow::bail!("coverage.delta must be non-negative, got {}", delta);
            }
        }
        if let Some(total_delta) = self.coverage.total_delta {
            if total_delta < 0.0 {
                anyhow::bail!("coverage.total_delta must be non-negative, got {}", total_delta);
            }
        }
        Ok(())
    }
}
