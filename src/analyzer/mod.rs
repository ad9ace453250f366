pub mod report;

use crate::ai::GeminiClient;
use crate::analyzer::report::ReportResult;
use crate::commits::CommitRecord;
use crate::commits::filter::commits_on_date;
use crate::config::Config;
use crate::error::PipelineError;
use crate::github::GitHubClient;
use chrono::NaiveDate;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const SNAPSHOT_FILE: &str = "today_commits.json";
pub const DUMP_FILE: &str = "commits.json";

/// Result of a fetch-filter-persist run.
#[derive(Debug)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub count: usize,
    pub path: PathBuf,
}

/// The fetch → filter → synthesize → assemble chain.
///
/// Holds only read-only state, so one instance can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    http: Client,
}

impl Pipeline {
    pub fn new(config: Arc<Config>, http: Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches the first page of commits, optionally narrowed to one day.
    pub async fn fetch(&self, date: Option<NaiveDate>) -> Result<Vec<CommitRecord>, PipelineError> {
        let github = GitHubClient::from_config(self.http.clone(), &self.config)?;
        let commits = github.fetch_commits().await?;

        Ok(match date {
            Some(date) => {
                let filtered = commits_on_date(commits, date);
                info!(date = %date, count = filtered.len(), "commits filtered by date");
                filtered
            }
            None => commits,
        })
    }

    pub async fn analyze(&self, date: Option<NaiveDate>) -> Result<ReportResult, PipelineError> {
        // Resolve the model credentials first so a missing key fails before
        // any network traffic.
        let gemini = GeminiClient::from_config(self.http.clone(), &self.config)?;
        let commits = self.fetch(date).await?;
        let analysis = gemini.synthesize_report(&commits).await?;

        Ok(report::assemble(analysis, commits))
    }

    /// Fetches the commits of `date` and overwrites the snapshot file with them.
    pub async fn snapshot_day(&self, date: NaiveDate) -> Result<Snapshot, PipelineError> {
        let commits = self.fetch(Some(date)).await?;
        let path = self.config.output_dir.join(SNAPSHOT_FILE);
        report::write_commits_json(&path, &commits)?;

        info!(date = %date, count = commits.len(), path = %path.display(), "commit snapshot saved");

        Ok(Snapshot {
            date,
            count: commits.len(),
            path,
        })
    }

    pub async fn dump(&self, date: Option<NaiveDate>, path: &Path) -> Result<usize, PipelineError> {
        let commits = self.fetch(date).await?;
        report::write_commits_json(path, &commits)?;

        info!(count = commits.len(), path = %path.display(), "commits dumped");
        Ok(commits.len())
    }
}
