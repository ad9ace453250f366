use crate::analyzer::Pipeline;
use crate::analyzer::report::ReportResult;
use crate::error::PipelineError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Pipeline,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/analyze-commits", get(analyze_commits))
        .route("/api/status", get(status))
        .route("/commits", get(today_commits))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Debug, Serialize)]
struct SnapshotPayload {
    message: String,
    date: String,
    count: usize,
    path: String,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    owner: String,
    repo: String,
    model: String,
    github_token_configured: bool,
    ai_api_key_configured: bool,
}

async fn analyze_commits(
    State(state): State<ApiState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<ReportResult>> {
    let date = query.date.as_deref().map(parse_date).transpose()?;
    let report = state.pipeline.analyze(date).await?;

    Ok(Json(report))
}

async fn today_commits(
    State(state): State<ApiState>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<SnapshotPayload>> {
    let date = query
        .date
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| Local::now().date_naive());

    let snapshot = state.pipeline.snapshot_day(date).await?;

    Ok(Json(SnapshotPayload {
        message: format!("Commits for {} saved successfully", snapshot.date),
        date: snapshot.date.format("%Y-%m-%d").to_string(),
        count: snapshot.count,
        path: snapshot.path.display().to_string(),
    }))
}

async fn status(State(state): State<ApiState>) -> Json<StatusPayload> {
    let config = state.pipeline.config();

    Json(StatusPayload {
        owner: config.github_owner.clone(),
        repo: config.github_repo.clone(),
        model: config.ai_model.clone(),
        github_token_configured: config.has_github_token(),
        ai_api_key_configured: config.has_ai_api_key(),
    })
}

fn parse_date(input: &str) -> Result<NaiveDate, PipelineError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        PipelineError::InvalidInput(format!("Invalid date format: {input}. Example: 2024-01-31"))
    })
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(value: PipelineError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::Transport {
                timed_out: true, ..
            } => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Transport { .. } | PipelineError::Decode { .. } => {
                StatusCode::BAD_GATEWAY
            }
            PipelineError::Configuration(_) | PipelineError::Storage { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(
                status = %status,
                upstream_status = ?self.0.status(),
                error = %self.0,
                "request failed"
            );
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
