//! PR comment assembly and posting
//!
//! Builds the coverage-diff markdown message and posts it to a pull
//! request through the GitHub REST API. An invisible marker at the top
//! of the message lets a later run find and update its own comment
//! instead of posting a duplicate.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

/// Hidden marker used to recognize a previously posted coverage comment
pub const COMMENT_IDENTIFIER: &str = "<!-- codeCoverageDiffComment -->";

const GITHUB_API: &str = "https://api.github.com";

/// What the comment endpoints need to know about the PR
#[derive(Debug, Clone)]
pub struct GithubContext {
    pub token: String,
    /// Repository in `owner/name` form
    pub repo: String,
    pub pr_number: u64,
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

/// Assemble the full comment body around the rendered diff rows
pub fn build_comment(
    commit_sha: &str,
    report_url: Option<&str>,
    report_expiry: Option<&str>,
    rows: &[String],
) -> String {
    let mut message = format!(
        "{}\n## Test coverage for commit {}\n\n",
        COMMENT_IDENTIFIER, commit_sha
    );

    match report_url {
        Some(url) => {
            let expiry_note = report_expiry
                .map(|expiry| format!(" (expires {}; rerun all CI jobs to regenerate)", expiry))
                .unwrap_or_default();
            message.push_str(&format!("[Full coverage report download]({}){}\n", url, expiry_note));
        }
        None => message.push_str("(Full coverage report URL not set)\n"),
    }

    message.push_str("\n## Test coverage summary :test_tube:\n\n");

    if rows.is_empty() {
        message.push_str("No changes to code coverage.");
    } else {
        message.push_str("&nbsp; | File | Stmts | Brnches | Funcs | Lines\n");
        message.push_str(":-|:-|:-|:-|:-|:-\n");
        message.push_str(&rows.join("\n"));
    }

    message
}

/// Find an existing coverage comment on the PR, by its hidden marker
pub async fn find_comment(ctx: &GithubContext) -> Result<Option<u64>> {
    let url = format!(
        "{}/repos/{}/issues/{}/comments",
        GITHUB_API, ctx.repo, ctx.pr_number
    );

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header("Authorization", format!("token {}", ctx.token))
        .header("User-Agent", "covdiff")
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("Failed to list PR comments: {} - {}", status, text);
    }

    let comments: Vec<IssueComment> = response.json().await?;
    let found = comments
        .into_iter()
        .find(|comment| {
            comment
                .body
                .as_deref()
                .map_or(false, |body| body.starts_with(COMMENT_IDENTIFIER))
        })
        .map(|comment| comment.id);

    Ok(found)
}

/// Create a new PR comment, or update the one with the given id
pub async fn post_comment(
    ctx: &GithubContext,
    comment_id: Option<u64>,
    body: &str,
) -> Result<()> {
    let client = reqwest::Client::new();

    let request = match comment_id {
        Some(id) => client.patch(format!("{}/repos/{}/issues/comments/{}", GITHUB_API, ctx.repo, id)),
        None => client.post(format!(
            "{}/repos/{}/issues/{}/comments",
            GITHUB_API, ctx.repo, ctx.pr_number
        )),
    };

    let response = request
        .header("Authorization", format!("token {}", ctx.token))
        .header("User-Agent", "covdiff")
        .header("Accept", "application/vnd.github.v3+json")
        .json(&json!({ "body": body }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("Failed to post PR comment: {} - {}", status, text);
    }

    Ok(())
}
