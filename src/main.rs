mod auth;
mod config;
mod github;
mod pipeline;
mod report;
mod review;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use auth::{CredentialProvider, SessionCredentials};
use github::GitHubClient;
use pipeline::{Collaborators, ReviewInput};
use review::GeminiClient;

/// PR Reviewer: generate an AI code review for a GitHub Pull Request and post
/// it back as a comment. Also browses your repositories and their open PRs.
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Review a pull request and post the feedback as a comment
    Review {
        /// Repository owner (user or organization)
        #[arg(required_unless_present = "url")]
        owner: Option<String>,

        /// Repository name
        #[arg(required_unless_present = "url")]
        repo: Option<String>,

        /// Pull request number
        #[arg(required_unless_present = "url", allow_hyphen_values = true)]
        pr_number: Option<String>,

        /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
        #[arg(long, conflicts_with_all = ["owner", "repo", "pr_number"])]
        url: Option<String>,

        /// Optional output file path for the markdown feedback
        #[arg(short, long, conflicts_with = "json")]
        output: Option<PathBuf>,

        /// Print the result as JSON ({"feedback": ...} or {"error": ...})
        #[arg(long)]
        json: bool,
    },

    /// List your repositories, most recently updated first
    Repos {
        /// Also list up to five open pull requests per repository
        #[arg(long)]
        pulls: bool,
    },

    /// List open pull requests of a repository
    Pulls {
        owner: String,
        repo: String,

        /// Maximum number of pull requests to show
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=100))]
        limit: u8,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;
    let credentials = SessionCredentials::from_config(&config);
    let github = GitHubClient::new(config.github_api_base())?;

    match cli.command {
        Command::Review {
            owner,
            repo,
            pr_number,
            url,
            output,
            json,
        } => {
            let input = match url {
                Some(url) => ReviewInput::from_pr_url(&github::parse_pr_url(&url)?),
                None => ReviewInput::new(
                    owner.unwrap_or_default(),
                    repo.unwrap_or_default(),
                    pr_number.unwrap_or_default(),
                ),
            };
            let title = format!("{}/{}#{}", input.owner, input.repo, input.pr_number);
            let _main_span = info_span!("pr_review", pr = %title).entered();

            let generator = GeminiClient::from_config(&config)?;
            debug!(model = %config.model(), "using language model");
            let deps = Collaborators {
                credentials: &credentials,
                host: &github,
                generator: &generator,
            };

            info!("running review pipeline");
            let result = pipeline::review_pull_request(&input, &deps).await;

            let format = if json {
                report::Format::Json
            } else {
                report::Format::Terminal
            };
            report::output(&title, &result, format, output.as_deref())?;

            if result.error().is_some() {
                std::process::exit(1);
            }
        }
        Command::Repos { pulls } => {
            let credential = credentials.credential()?;
            info!("fetching repositories");
            let repos = github.list_repositories(&credential).await?;
            if repos.is_empty() {
                println!("No repositories found");
            }
            for repo in &repos {
                if pulls {
                    let open = github
                        .list_open_pulls(&repo.owner.login, &repo.name, 5, &credential)
                        .await;
                    match open {
                        Ok(open) => report::print_repository(repo, Some(open.as_slice())),
                        Err(err) => {
                            warn!(repo = %repo.full_name, error = %err, "failed to fetch pull requests");
                            report::print_repository(repo, None);
                        }
                    }
                } else {
                    report::print_repository(repo, None);
                }
            }
            info!(count = repos.len(), "done");
        }
        Command::Pulls { owner, repo, limit } => {
            let credential = credentials.credential()?;
            info!("fetching open pull requests");
            let open = github
                .list_open_pulls(&owner, &repo, limit, &credential)
                .await?;
            report::print_pulls(&open);
            info!(count = open.len(), "done");
        }
    }

    Ok(())
}
