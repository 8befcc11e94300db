use crate::github::{PullRequestSummary, Repository};
use crate::pipeline::ReviewResult;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a review result should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Terminal,
    Json,
}

/// Output a review result to the terminal (default), as JSON, or to a markdown file.
///
/// A markdown file is only written when the result carries feedback; errors
/// always go to the terminal.
#[instrument(skip(result), fields(ok = result.feedback().is_some()))]
pub fn output(
    title: &str,
    result: &ReviewResult,
    format: Format,
    output_path: Option<&Path>,
) -> Result<(), ReportError> {
    if format == Format::Json {
        debug!("writing result as JSON");
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    match (result, output_path) {
        (ReviewResult::Feedback(feedback), Some(path)) => {
            debug!(path = %path.display(), "writing feedback to file");
            write_markdown_report(title, feedback, path)?;
            println!("Review for {} written to {}", title, path.display());
            Ok(())
        }
        (ReviewResult::Feedback(feedback), None) => {
            debug!("writing feedback to terminal");
            print_terminal_feedback(title, feedback);
            Ok(())
        }
        (ReviewResult::Error(message), _) => {
            eprintln!("{} {}", "Review failed:".red().bold(), message);
            Ok(())
        }
    }
}

/// Collapse the model's output into paragraphs: trim every line and drop
/// blank ones, separating what remains with a single empty line.
pub fn normalize_feedback(feedback: &str) -> String {
    feedback
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn print_terminal_feedback(title: &str, feedback: &str) {
    println!();
    println!("═══ AI Review Feedback: {} ═══", title.bold());
    println!();
    for line in normalize_feedback(feedback).lines() {
        if line.starts_with('#') {
            println!("{}", line.cyan().bold());
        } else {
            println!("{}", line);
        }
    }
    println!();
    println!("{}", "Feedback posted as a comment on the pull request.".green());
    println!();
}

fn write_markdown_report(title: &str, feedback: &str, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!("# AI Review: {}\n\n", title));
    md.push_str(feedback.trim_end());
    md.push('\n');
    std::fs::write(path, md)?;
    Ok(())
}

/// Print one repository card, optionally followed by its open pull requests.
pub fn print_repository(repo: &Repository, pulls: Option<&[PullRequestSummary]>) {
    let visibility = if repo.private { "private" } else { "public" };
    println!("{} ({})", repo.full_name.bold(), visibility);
    if let Some(description) = &repo.description {
        println!("  {}", description);
    }

    let mut stats = format!(
        "  ★ {}  ⑂ {}  👁 {}",
        repo.stargazers_count, repo.forks_count, repo.watchers_count
    );
    if let Some(language) = &repo.language {
        stats.push_str(&format!("  [{}]", language));
    }
    if !repo.topics.is_empty() {
        let topics: Vec<&str> = repo.topics.iter().take(3).map(String::as_str).collect();
        stats.push_str(&format!("  #{}", topics.join(" #")));
    }
    println!("{}", stats.dimmed());
    println!("  {}", repo.html_url);

    if let Some(pulls) = pulls {
        print_pulls(pulls);
    }
    println!();
}

pub fn print_pulls(pulls: &[PullRequestSummary]) {
    println!("  Open Pull Requests ({})", pulls.len());
    if pulls.is_empty() {
        println!("    No open pull requests");
        return;
    }
    for pr in pulls {
        println!("{}", format_pull(pr));
    }
}

fn format_pull(pr: &PullRequestSummary) -> String {
    let state = if pr.state == "open" {
        pr.state.green()
    } else {
        pr.state.red()
    };
    let opened = pr.created_at.split('T').next().unwrap_or(&pr.created_at);
    format!(
        "    #{} - {} [{}] by {} on {}\n      {}",
        pr.number, pr.title, state, pr.user.login, opened, pr.html_url
    )
}
