use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use covdiff::comment::{self, GithubContext};
use covdiff::config::Config;
use covdiff::exec::run_command;
use covdiff::{CoverageSummary, DiffChecker};

const DEFAULT_SUMMARY_FILE: &str = "coverage-summary.json";

#[derive(Parser)]
#[command(name = "covdiff")]
#[command(about = "Compare coverage between two runs and flag regressions on a PR")]
#[command(version)]
struct Cli {
    /// Command that produces the coverage summary (e.g. "npm test -- --coverage")
    #[arg(long)]
    run_command: Option<String>,

    /// Command run before the second coverage run (e.g. "git checkout main")
    #[arg(long)]
    after_switch_command: Option<String>,

    /// Path of the summary file the run command writes
    #[arg(long)]
    summary_file: Option<PathBuf>,

    /// Compare against this summary file instead of re-running the command
    #[arg(long)]
    base_summary_file: Option<PathBuf>,

    /// Include unchanged files in the diff table
    #[arg(long)]
    full_coverage_diff: bool,

    /// Maximum allowed per-file coverage drop, in percentage points
    #[arg(long)]
    delta: Option<f64>,

    /// Maximum allowed total coverage drop, in percentage points
    #[arg(long)]
    total_delta: Option<f64>,

    /// Pull request number to comment on (prints the comment when unset)
    #[arg(long)]
    pr_number: Option<u64>,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: Option<String>,

    /// Commit SHA shown in the comment heading
    #[arg(long, env = "GITHUB_SHA")]
    commit_sha: Option<String>,

    /// Update the previous covdiff comment instead of posting a new one
    #[arg(long)]
    use_same_comment: bool,

    /// Link to the full coverage report, shown in the comment
    #[arg(long)]
    report_url: Option<String>,

    /// Expiry note for the full coverage report link
    #[arg(long)]
    report_expiry: Option<String>,

    /// Path to config file (default: covdiff.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_optional(cli.config.as_deref())?;

    let run_cmd = cli
        .run_command
        .or(config.coverage.run_command)
        .context("No coverage command given (--run-command or coverage.run_command in covdiff.toml)")?;
    let after_switch = cli
        .after_switch_command
        .or(config.coverage.after_switch_command);
    let summary_file = cli
        .summary_file
        .or(config.coverage.summary_file.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SUMMARY_FILE));

    let delta = cli.delta.or(config.coverage.delta);
    let total_delta = cli.total_delta.or(config.coverage.total_delta);
    validate_tolerance("delta", delta)?;
    validate_tolerance("total-delta", total_delta)?;

    let full_diff = cli.full_coverage_diff || config.coverage.full_coverage_diff;
    let use_same_comment = cli.use_same_comment || config.github.use_same_comment;
    let repo = cli.repo.or(config.github.repo);
    let report_url = cli.report_url.or(config.github.report_url);
    let report_expiry = cli.report_expiry.or(config.github.report_expiry);

    let base_dir = std::env::current_dir().context("Could not determine working directory")?;
    let summary_path = base_dir.join(&summary_file);

    // First run produces the "new" snapshot
    run_command(&run_cmd, &base_dir)?;
    let new_summary = CoverageSummary::load(&summary_path)?;

    // The "old" snapshot comes from a given base file, or from re-running
    // the command after the switch command has changed the checkout
    let old_summary = match cli.base_summary_file {
        Some(ref base) => CoverageSummary::load(base)?,
        None => {
            if let Some(ref cmd) = after_switch {
                run_command(cmd, &base_dir)?;
            }
            run_command(&run_cmd, &base_dir)?;
            CoverageSummary::load(&summary_path)?
        }
    };

    let checker = DiffChecker::new(&new_summary, &old_summary);

    let prefix = format!("{}/", base_dir.display());
    let details = checker.get_coverage_details(full_diff, &prefix);

    let commit_sha = cli.commit_sha.unwrap_or_else(|| "HEAD".to_string());
    let message = comment::build_comment(
        &commit_sha,
        report_url.as_deref(),
        report_expiry.as_deref(),
        &details,
    );

    // The diff is always published before the threshold check so a
    // failing run still shows what changed
    publish(&cli.pr_number, &cli.access_token, &repo, use_same_comment, &message).await?;

    checker.check_if_coverage_falls_below_delta(delta, total_delta)?;
    println!("{} Coverage within allowed thresholds", "✓".green());

    Ok(())
}

fn validate_tolerance(name: &str, value: Option<f64>) -> Result<()> {
    if let Some(value) = value {
        if value < 0.0 {
            anyhow::bail!("--{} must be non-negative, got {}", name, value);
        }
    }
    Ok(())
}

async fn publish(
    pr_number: &Option<u64>,
    token: &Option<String>,
    repo: &Option<String>,
    use_same_comment: bool,
    message: &str,
) -> Result<()> {
    let (Some(pr_number), Some(token), Some(repo)) = (pr_number, token, repo) else {
        // Not enough GitHub context to post, print the comment instead
        println!("\n{}\n", message);
        return Ok(());
    };

    let ctx = GithubContext {
        token: token.clone(),
        repo: repo.clone(),
        pr_number: *pr_number,
    };

    let comment_id = if use_same_comment {
        comment::find_comment(&ctx).await?
    } else {
        None
    };

    comment::post_comment(&ctx, comment_id, message).await?;
    println!(
        "{} Coverage comment {} on PR #{}",
        "✓".green(),
        if comment_id.is_some() { "updated" } else { "posted" },
        ctx.pr_number
    );

    Ok(())
}
