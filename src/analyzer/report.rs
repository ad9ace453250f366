use crate::commits::CommitRecord;
use crate::error::PipelineError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Model-written report plus the exact commits it was written from.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResult {
    #[serde(rename = "analysis")]
    pub analysis_text: String,
    #[serde(rename = "commitData")]
    pub commits: Vec<CommitRecord>,
}

#[derive(Debug)]
pub struct SavedReport {
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
}

pub fn assemble(analysis_text: String, commits: Vec<CommitRecord>) -> ReportResult {
    ReportResult {
        analysis_text,
        commits,
    }
}

pub fn render_markdown(report: &ReportResult, label: &str) -> String {
    let commit_rows = if report.commits.is_empty() {
        "- No commits".to_string()
    } else {
        report
            .commits
            .iter()
            .map(|commit| {
                let short_id = commit.id.get(..7).unwrap_or(commit.id.as_str());
                let subject = commit.message.lines().next().unwrap_or_default();
                format!(
                    "- `{}` {} ({}, {})",
                    short_id, subject, commit.author_name, commit.authored_at
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# Daily Report - {}\n\n{}\n\n## Commits ({})\n{}\n",
        label,
        report.analysis_text.trim_end(),
        report.commits.len(),
        commit_rows
    )
}

pub fn save_report_files(
    report: &ReportResult,
    report_dir: &Path,
    label: &str,
) -> Result<SavedReport, PipelineError> {
    fs::create_dir_all(report_dir).map_err(|source| PipelineError::Storage {
        path: report_dir.to_path_buf(),
        source,
    })?;

    let markdown_path = report_dir.join(format!("{label}.md"));
    let json_path = report_dir.join(format!("{label}.json"));

    write_file(&markdown_path, render_markdown(report, label).as_bytes())?;
    write_json(&json_path, report)?;

    Ok(SavedReport {
        markdown_path,
        json_path,
    })
}

/// Overwrites `path` with the commits as pretty JSON.
pub fn write_commits_json(path: &Path, commits: &[CommitRecord]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Storage {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    write_json(path, commits)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let content = serde_json::to_vec_pretty(value).map_err(|error| PipelineError::Storage {
        path: path.to_path_buf(),
        source: error.into(),
    })?;

    write_file(path, &content)
}

// Writes go to a temp file in the target directory and are renamed into
// place, so concurrent writers never leave an interleaved file behind.
fn write_file(path: &Path, content: &[u8]) -> Result<(), PipelineError> {
    let storage_error = |source| PipelineError::Storage {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(storage_error)?;
    temp.write_all(content).map_err(storage_error)?;
    temp.persist(path)
        .map_err(|error| storage_error(error.error))?;

    Ok(())
}
