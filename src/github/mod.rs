pub mod retry;
pub mod types;

use crate::commits::CommitRecord;
use crate::config::{Config, non_empty};
use crate::error::{PipelineError, Upstream};
use crate::github::retry::{RetryPolicy, retry_transient};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT_VALUE: &str = concat!("commit-diary/", env!("CARGO_PKG_VERSION"));

/// Reads the first page of a repository's commit listing.
pub struct GitHubClient {
    http: Client,
    owner: String,
    repo: String,
    endpoint: Url,
    authorization: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GitHubClient {
    pub fn from_config(http: Client, config: &Config) -> Result<Self, PipelineError> {
        let token = non_empty(config.github_token.as_deref()).ok_or_else(|| {
            PipelineError::Configuration(
                "GitHub token is missing. Set GITHUB_TOKEN or `commit-diary config set github.token <TOKEN>`."
                    .to_string(),
            )
        })?;
        let owner = non_empty(Some(config.github_owner.as_str())).ok_or_else(|| {
            PipelineError::Configuration(
                "GitHub owner is not configured. Run `commit-diary config set github.owner <OWNER>`."
                    .to_string(),
            )
        })?;
        let repo = non_empty(Some(config.github_repo.as_str())).ok_or_else(|| {
            PipelineError::Configuration(
                "GitHub repository is not configured. Run `commit-diary config set github.repo <REPO>`."
                    .to_string(),
            )
        })?;

        Ok(Self {
            http,
            owner: owner.to_string(),
            repo: repo.to_string(),
            endpoint: commits_endpoint(&config.github_api_base_url, owner, repo)?,
            authorization: config.github_auth_scheme.header_value(token),
            timeout: Duration::from_secs(config.github_timeout_seconds.max(1)),
            retry: RetryPolicy {
                max_attempts: config.github_max_attempts.max(1),
                initial_interval: Duration::from_millis(config.github_retry_initial_ms),
            },
        })
    }

    pub async fn fetch_commits(&self) -> Result<Vec<CommitRecord>, PipelineError> {
        info!(owner = %self.owner, repo = %self.repo, "fetching commits");

        let commits = retry_transient(self.retry, || self.fetch_once()).await?;

        info!(
            owner = %self.owner,
            repo = %self.repo,
            count = commits.len(),
            "commits fetched"
        );
        Ok(commits)
    }

    async fn fetch_once(&self) -> Result<Vec<CommitRecord>, PipelineError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| PipelineError::transport(Upstream::GitHub, error))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| PipelineError::transport(Upstream::GitHub, error))?;

        debug!(status = %status, body = %body, "GitHub commit listing response");

        if !status.is_success() {
            warn!(status = %status, body = %body, "GitHub API returned an error status");
            return Err(PipelineError::upstream_status(Upstream::GitHub, status, body));
        }

        types::decode_commits(&body)
    }
}

fn commits_endpoint(base_url: &str, owner: &str, repo: &str) -> Result<Url, PipelineError> {
    let invalid = || PipelineError::Configuration(format!("Invalid GitHub API base URL: {base_url}"));

    let mut url = Url::parse(base_url.trim()).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(["repos", owner, repo, "commits"]);

    Ok(url)
}
