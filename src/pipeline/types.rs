use serde::Serialize;
use std::fmt;
use std::num::IntErrorKind;
use thiserror::Error;

use crate::github::PrUrl;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Repository owner is required")]
    MissingOwner,

    #[error("Repository name is required")]
    MissingRepo,

    #[error("Invalid repository owner: {0}")]
    InvalidOwner(String),

    #[error("Invalid repository name: {0}")]
    InvalidRepo(String),

    #[error("PR number must be an integer")]
    NotAnInteger,

    #[error("PR number must be positive")]
    NotPositive,

    #[error("PR number is too large")]
    TooLarge,
}

/// GitHub owner and repository names only use ASCII letters, digits, `.`, `_`
/// and `-`. Anything else would change the API path the name is spliced into.
fn is_valid_name(name: &str) -> bool {
    name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Untrusted review input exactly as the caller typed it.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub owner: String,
    pub repo: String,
    pub pr_number: String,
}

impl ReviewInput {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        pr_number: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            pr_number: pr_number.into(),
        }
    }

    pub fn from_pr_url(url: &PrUrl) -> Self {
        Self::new(url.owner.clone(), url.repo.clone(), url.pr_number.to_string())
    }

    /// Check the input's shape and turn it into a [`ReviewRequest`].
    pub fn validate(&self) -> Result<ReviewRequest, ValidationError> {
        let owner = self.owner.trim();
        if owner.is_empty() {
            return Err(ValidationError::MissingOwner);
        }
        if !is_valid_name(owner) {
            return Err(ValidationError::InvalidOwner(owner.to_string()));
        }
        let repo = self.repo.trim();
        if repo.is_empty() {
            return Err(ValidationError::MissingRepo);
        }
        if !is_valid_name(repo) {
            return Err(ValidationError::InvalidRepo(repo.to_string()));
        }
        let pr_number = match self.pr_number.trim().parse::<i64>() {
            Ok(n) if n > 0 => n as u64,
            Ok(_) => return Err(ValidationError::NotPositive),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => return Err(ValidationError::TooLarge),
                IntErrorKind::NegOverflow => return Err(ValidationError::NotPositive),
                _ => return Err(ValidationError::NotAnInteger),
            },
        };

        Ok(ReviewRequest {
            owner: owner.to_string(),
            repo: repo.to_string(),
            pr_number,
        })
    }
}

/// A validated review request. Only obtainable through [`ReviewInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    owner: String,
    repo: String,
    pr_number: u64,
}

impl ReviewRequest {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn pr_number(&self) -> u64 {
        self.pr_number
    }
}

impl fmt::Display for ReviewRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pr_number)
    }
}

/// Snapshot of the work done so far. Each stage consumes the previous
/// snapshot and returns a new one with its own field filled in.
#[derive(Debug, Clone)]
pub struct ReviewState {
    request: ReviewRequest,
    diff: Option<String>,
    feedback: Option<String>,
}

impl ReviewState {
    pub fn new(request: ReviewRequest) -> Self {
        Self {
            request,
            diff: None,
            feedback: None,
        }
    }

    pub fn request(&self) -> &ReviewRequest {
        &self.request
    }

    pub fn diff(&self) -> Option<&str> {
        self.diff.as_deref()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn with_diff(self, diff: String) -> Self {
        Self {
            diff: Some(diff),
            ..self
        }
    }

    pub fn with_feedback(self, feedback: String) -> Self {
        Self {
            feedback: Some(feedback),
            ..self
        }
    }

    pub fn into_feedback(self) -> Option<String> {
        self.feedback
    }
}

/// Where a review run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validated,
    DiffFetched,
    Reviewed,
    Published,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validated => "validated",
            Phase::DiffFetched => "diff_fetched",
            Phase::Reviewed => "reviewed",
            Phase::Published => "published",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome handed back to the caller: feedback text or an error message, never both.
///
/// Serializes as `{"feedback": "..."}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewResult {
    Feedback(String),
    Error(String),
}

impl ReviewResult {
    pub fn feedback(&self) -> Option<&str> {
        match self {
            ReviewResult::Feedback(text) => Some(text),
            ReviewResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ReviewResult::Feedback(_) => None,
            ReviewResult::Error(message) => Some(message),
        }
    }
}
