pub mod diff;
pub mod types;

pub use types::{PrUrl, PullRequestSummary, Repository};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::Credential;
use crate::pipeline::ReviewRequest;

const USER_AGENT: &str = "pr-reviewer";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const V3_JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error: {status} {reason}")]
    Status { status: u16, reason: String },

    /// Network-level failure; carries the transport's own message.
    #[error("{0}")]
    Transport(String),

    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid GitHub API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// The code-host operations the review pipeline depends on.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Fetch the pull request as a unified diff.
    async fn fetch_diff(
        &self,
        request: &ReviewRequest,
        credential: &Credential,
    ) -> Result<String, GitHubError>;

    /// Post `body` as a new comment on the pull request's conversation thread.
    async fn post_comment(
        &self,
        request: &ReviewRequest,
        credential: &Credential,
        body: &str,
    ) -> Result<(), GitHubError>;
}

/// Parse a GitHub PR URL into its component parts.
///
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrUrl, GitHubError> {
    let invalid = || GitHubError::InvalidUrl(url.to_string());
    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;

    if parsed.host_str() != Some("github.com") {
        return Err(invalid());
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(invalid());
    }

    let pr_number = segments[3].parse::<u64>().map_err(|_| invalid())?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Thin REST client for the handful of GitHub endpoints this tool touches.
///
/// The client holds no token; every call is authenticated with the
/// credential the caller passes in.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(api_base: &str) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GitHubError::Client(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Join `segments` onto the API root, percent-encoding each one so a
    /// caller-supplied name can never add path components.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, GitHubError> {
        let invalid = || GitHubError::InvalidBaseUrl(self.api_base.clone());
        let mut url = reqwest::Url::parse(&self.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// List the authenticated user's repositories, most recently updated first.
    #[instrument(skip(self, credential))]
    pub async fn list_repositories(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Repository>, GitHubError> {
        let url = format!("{}/user/repos", self.api_base);
        let response = self
            .http
            .get(&url)
            .query(&[("sort", "updated"), ("direction", "desc"), ("per_page", "100")])
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(transport)?;

        let repos = check_status(response)?
            .json::<Vec<Repository>>()
            .await
            .map_err(|e| GitHubError::Decode(e.to_string()))?;
        debug!(count = repos.len(), "listed repositories");
        Ok(repos)
    }

    /// List up to `limit` open pull requests of a repository.
    #[instrument(skip(self, credential))]
    pub async fn list_open_pulls(
        &self,
        owner: &str,
        repo: &str,
        limit: u8,
        credential: &Credential,
    ) -> Result<Vec<PullRequestSummary>, GitHubError> {
        let url = self.endpoint(&["repos", owner, repo, "pulls"])?;
        let per_page = limit.to_string();
        let response = self
            .http
            .get(url)
            .query(&[("state", "open"), ("per_page", per_page.as_str())])
            .header(ACCEPT, V3_JSON_MEDIA_TYPE)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(transport)?;

        let pulls = check_status(response)?
            .json::<Vec<PullRequestSummary>>()
            .await
            .map_err(|e| GitHubError::Decode(e.to_string()))?;
        debug!(count = pulls.len(), "listed open pull requests");
        Ok(pulls)
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    #[instrument(skip(self, credential), fields(owner = %request.owner(), repo = %request.repo(), pr = request.pr_number()))]
    async fn fetch_diff(
        &self,
        request: &ReviewRequest,
        credential: &Credential,
    ) -> Result<String, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base,
            request.owner(),
            request.repo(),
            request.pr_number()
        );

        debug!("fetching PR diff from GitHub API");
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, DIFF_MEDIA_TYPE)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(transport)?;

        let diff_text = check_status(response)?.text().await.map_err(transport)?;
        debug!(diff_bytes = diff_text.len(), "received PR diff");
        Ok(diff_text)
    }

    #[instrument(skip(self, credential, body), fields(owner = %request.owner(), repo = %request.repo(), pr = request.pr_number()))]
    async fn post_comment(
        &self,
        request: &ReviewRequest,
        credential: &Credential,
        body: &str,
    ) -> Result<(), GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_base,
            request.owner(),
            request.repo(),
            request.pr_number()
        );

        debug!(body_bytes = body.len(), "posting review comment");
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .bearer_auth(credential.expose())
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(transport)?;

        check_status(response)?;
        debug!("review comment posted");
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> GitHubError {
    GitHubError::Transport(err.to_string())
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(GitHubError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}
