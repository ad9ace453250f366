use crate::commits::CommitRecord;
use crate::error::{PipelineError, Upstream};
use serde::Deserialize;

// `sha` is the only field the host must send; everything under `commit`
// falls back to an empty string when absent or null.
#[derive(Debug, Deserialize)]
struct HostCommit {
    sha: String,
    commit: Option<HostCommitDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct HostCommitDetail {
    message: Option<String>,
    author: Option<HostAuthor>,
}

#[derive(Debug, Default, Deserialize)]
struct HostAuthor {
    name: Option<String>,
    email: Option<String>,
    date: Option<String>,
}

impl From<HostCommit> for CommitRecord {
    fn from(value: HostCommit) -> Self {
        let detail = value.commit.unwrap_or_default();
        let author = detail.author.unwrap_or_default();

        CommitRecord {
            id: value.sha,
            message: detail.message.unwrap_or_default(),
            author_name: author.name.unwrap_or_default(),
            author_email: author.email.unwrap_or_default(),
            authored_at: author.date.unwrap_or_default(),
        }
    }
}

/// Decodes a commit-listing response body, keeping the host's order.
pub fn decode_commits(body: &str) -> Result<Vec<CommitRecord>, PipelineError> {
    let commits: Vec<HostCommit> =
        serde_json::from_str(body).map_err(|error| PipelineError::decode(Upstream::GitHub, error))?;

    Ok(commits.into_iter().map(CommitRecord::from).collect())
}
