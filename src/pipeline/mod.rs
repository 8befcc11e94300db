pub mod types;

pub use types::{Phase, ReviewInput, ReviewRequest, ReviewResult, ReviewState, ValidationError};

use thiserror::Error;
use tracing::{debug, error, info, info_span, instrument, Instrument};

use crate::auth::{AuthError, Credential, CredentialProvider};
use crate::github::{diff, CodeHost, GitHubError};
use crate::review::{build_prompt, GenerationError, Generator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Authentication(#[from] AuthError),

    #[error("{0}")]
    Upstream(GitHubError),

    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("Could not post comment to GitHub: {0}")]
    Publish(GitHubError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// External capabilities a review run depends on, injected per invocation.
pub struct Collaborators<'a> {
    pub credentials: &'a dyn CredentialProvider,
    pub host: &'a dyn CodeHost,
    pub generator: &'a dyn Generator,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    FetchDiff,
    Analyze,
    Publish,
}

/// Stages in execution order. Each one needs the output of the one before.
const STAGES: [Stage; 3] = [Stage::FetchDiff, Stage::Analyze, Stage::Publish];

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::FetchDiff => "fetch_diff",
            Stage::Analyze => "analyze",
            Stage::Publish => "publish",
        }
    }

    fn completes(self) -> Phase {
        match self {
            Stage::FetchDiff => Phase::DiffFetched,
            Stage::Analyze => Phase::Reviewed,
            Stage::Publish => Phase::Published,
        }
    }

    async fn run(
        self,
        state: ReviewState,
        deps: &Collaborators<'_>,
        credential: &Credential,
    ) -> Result<ReviewState, PipelineError> {
        match self {
            Stage::FetchDiff => {
                let diff_text = deps
                    .host
                    .fetch_diff(state.request(), credential)
                    .await
                    .map_err(PipelineError::Upstream)?;
                let summary = diff::summarize(&diff_text);
                debug!(
                    files = summary.files,
                    additions = summary.additions,
                    deletions = summary.deletions,
                    "fetched diff"
                );
                Ok(state.with_diff(diff_text))
            }
            Stage::Analyze => {
                let diff_text = state
                    .diff()
                    .filter(|d| !d.trim().is_empty())
                    .ok_or_else(|| PipelineError::Internal("No diff to analyze".to_string()))?;
                let prompt = build_prompt(diff_text);
                debug!(model = deps.generator.model(), "requesting review");
                let feedback = deps.generator.generate(&prompt).await?;
                Ok(state.with_feedback(feedback))
            }
            Stage::Publish => {
                let feedback = state
                    .feedback()
                    .filter(|f| !f.trim().is_empty())
                    .ok_or_else(|| PipelineError::Internal("No feedback to publish".to_string()))?;
                deps.host
                    .post_comment(state.request(), credential, feedback)
                    .await
                    .map_err(PipelineError::Publish)?;
                Ok(state)
            }
        }
    }
}

/// Review a pull request end to end: validate, fetch the diff, ask the model
/// for feedback, post it as a comment.
///
/// Never fails: every error is folded into [`ReviewResult::Error`].
#[instrument(skip_all, fields(owner = %input.owner, repo = %input.repo, pr = %input.pr_number))]
pub async fn review_pull_request(input: &ReviewInput, deps: &Collaborators<'_>) -> ReviewResult {
    match run(input, deps).await {
        Ok(feedback) => {
            info!(phase = %Phase::Done, feedback_bytes = feedback.len(), "review complete");
            ReviewResult::Feedback(feedback)
        }
        Err(err) => {
            error!(phase = %Phase::Failed, error = %err, "review failed");
            ReviewResult::Error(err.to_string())
        }
    }
}

async fn run(input: &ReviewInput, deps: &Collaborators<'_>) -> Result<String, PipelineError> {
    let request = input.validate()?;
    info!(phase = %Phase::Validated, request = %request, "input validated");

    let credential = deps.credentials.credential()?;

    let mut state = ReviewState::new(request);
    for stage in STAGES {
        state = stage
            .run(state, deps, &credential)
            .instrument(info_span!("stage", name = stage.name()))
            .await?;
        info!(phase = %stage.completes(), "stage complete");
    }

    state
        .into_feedback()
        .ok_or_else(|| PipelineError::Internal("pipeline finished without feedback".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionCredentials;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    const THREE_LINE_DIFF: &str = "@@ -1 +1 @@\n-old\n+new";

    #[derive(Clone, Copy)]
    enum PublishFailure {
        Status(u16),
        Transport,
    }

    struct FakeHost {
        calls: CallLog,
        diff: Result<String, u16>,
        publish_failure: Option<PublishFailure>,
        posted: Mutex<Vec<String>>,
    }

    impl FakeHost {
        fn new(calls: &CallLog, diff: Result<&str, u16>) -> Self {
            Self {
                calls: Arc::clone(calls),
                diff: diff.map(str::to_string),
                publish_failure: None,
                posted: Mutex::new(Vec::new()),
            }
        }

        fn failing_publish(mut self, failure: PublishFailure) -> Self {
            self.publish_failure = Some(failure);
            self
        }
    }

    fn status_error(status: u16) -> GitHubError {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        GitHubError::Status {
            status,
            reason: reason.to_string(),
        }
    }

    #[async_trait]
    impl CodeHost for FakeHost {
        async fn fetch_diff(
            &self,
            _request: &ReviewRequest,
            credential: &Credential,
        ) -> Result<String, GitHubError> {
            assert_eq!(credential.expose(), "session-token");
            self.calls.lock().unwrap().push("fetch_diff");
            self.diff.clone().map_err(status_error)
        }

        async fn post_comment(
            &self,
            _request: &ReviewRequest,
            credential: &Credential,
            body: &str,
        ) -> Result<(), GitHubError> {
            assert_eq!(credential.expose(), "session-token");
            self.calls.lock().unwrap().push("post_comment");
            match self.publish_failure {
                Some(PublishFailure::Status(status)) => return Err(status_error(status)),
                Some(PublishFailure::Transport) => {
                    return Err(GitHubError::Transport("connection reset by peer".to_string()))
                }
                None => {}
            }
            self.posted.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    struct FakeGenerator {
        calls: CallLog,
        response: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(calls: &CallLog, response: Result<&str, &str>) -> Self {
            Self {
                calls: Arc::clone(calls),
                response: response.map(str::to_string).map_err(str::to_string),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        fn model(&self) -> &str {
            "fake-model"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.lock().unwrap().push("generate");
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.response.clone().map_err(GenerationError::Request)
        }
    }

    fn session() -> SessionCredentials {
        SessionCredentials::new(Some("session-token".to_string()))
    }

    fn input() -> ReviewInput {
        ReviewInput::new("octocat", "hello-world", "1")
    }

    #[tokio::test]
    async fn test_successful_run_calls_stages_in_order() {
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Ok(THREE_LINE_DIFF));
        let generator = FakeGenerator::new(&calls, Ok("## Style\n...\n## Security\n..."));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        assert_eq!(result.feedback(), Some("## Style\n...\n## Security\n..."));
        assert!(result.error().is_none());
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["fetch_diff", "generate", "post_comment"]
        );
        assert_eq!(
            *host.posted.lock().unwrap(),
            vec!["## Style\n...\n## Security\n...".to_string()]
        );
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(THREE_LINE_DIFF));
    }

    #[tokio::test]
    async fn test_invalid_pr_number_makes_no_calls() {
        for bad in ["0", "-1", "2.5", "two"] {
            let calls = CallLog::default();
            let host = FakeHost::new(&calls, Ok(THREE_LINE_DIFF));
            let generator = FakeGenerator::new(&calls, Ok("feedback"));
            let credentials = session();
            let deps = Collaborators {
                credentials: &credentials,
                host: &host,
                generator: &generator,
            };

            let result =
                review_pull_request(&ReviewInput::new("octocat", "hello-world", bad), &deps).await;

            assert!(result.error().is_some(), "expected error for {bad}");
            assert!(calls.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_calls() {
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Ok(THREE_LINE_DIFF));
        let generator = FakeGenerator::new(&calls, Ok("feedback"));
        let credentials = SessionCredentials::default();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        assert_eq!(
            result,
            ReviewResult::Error("no credential associated with this session".to_string())
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_diff_not_found_stops_pipeline() {
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Err(404));
        let generator = FakeGenerator::new(&calls, Ok("feedback"));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        assert_eq!(
            result,
            ReviewResult::Error("GitHub API error: 404 Not Found".to_string())
        );
        assert_eq!(*calls.lock().unwrap(), vec!["fetch_diff"]);
    }

    #[tokio::test]
    async fn test_empty_diff_is_not_sent_to_model() {
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Ok(""));
        let generator = FakeGenerator::new(&calls, Ok("feedback"));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        assert_eq!(
            result,
            ReviewResult::Error("Internal error: No diff to analyze".to_string())
        );
        assert_eq!(*calls.lock().unwrap(), vec!["fetch_diff"]);
    }

    #[tokio::test]
    async fn test_generation_failure_skips_publish() {
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Ok(THREE_LINE_DIFF));
        let generator = FakeGenerator::new(&calls, Err("quota exhausted"));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        let message = result.error().unwrap();
        assert!(message.contains("quota exhausted"));
        assert_eq!(*calls.lock().unwrap(), vec!["fetch_diff", "generate"]);
        assert!(host.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_discards_feedback() {
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Ok(THREE_LINE_DIFF)).failing_publish(PublishFailure::Status(403));
        let generator = FakeGenerator::new(&calls, Ok("## Design\nSplit this module."));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        assert!(result.feedback().is_none());
        assert_eq!(
            result.error(),
            Some("Could not post comment to GitHub: GitHub API error: 403 Forbidden")
        );
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["fetch_diff", "generate", "post_comment"]
        );
    }

    #[tokio::test]
    async fn test_publish_transport_failure_discards_feedback() {
        let calls = CallLog::default();
        let host =
            FakeHost::new(&calls, Ok(THREE_LINE_DIFF)).failing_publish(PublishFailure::Transport);
        let generator = FakeGenerator::new(&calls, Ok("## Performance\nCache this."));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        assert_eq!(
            result,
            ReviewResult::Error(
                "Could not post comment to GitHub: connection reset by peer".to_string()
            )
        );
        assert!(result.feedback().is_none());
        assert!(host.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_altering_repo_makes_no_calls() {
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Ok(THREE_LINE_DIFF));
        let generator = FakeGenerator::new(&calls, Ok("feedback"));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let bad = ReviewInput::new("octocat", "hello-world/issues/2/comments?", "1");
        let result = review_pull_request(&bad, &deps).await;

        assert!(result.error().unwrap().starts_with("Invalid repository name"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_diff_reaches_model_verbatim() {
        let fixture = include_str!("../../tests/fixtures/sample_diff.patch");
        let calls = CallLog::default();
        let host = FakeHost::new(&calls, Ok(fixture));
        let generator = FakeGenerator::new(&calls, Ok("## Security\nHardcoded token."));
        let credentials = session();
        let deps = Collaborators {
            credentials: &credentials,
            host: &host,
            generator: &generator,
        };

        let result = review_pull_request(&input(), &deps).await;

        assert_eq!(result.feedback(), Some("## Security\nHardcoded token."));
        assert!(generator.prompts.lock().unwrap()[0].contains(fixture));
    }
}
