pub mod prompt;

use crate::commits::CommitRecord;
use crate::config::{Config, MIN_AI_TIMEOUT_SECONDS, non_empty};
use crate::error::{PipelineError, Upstream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl ContentPart {
    fn render(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => Value::Object(self.other.clone()).to_string(),
        }
    }
}

/// Single-shot client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn from_config(http: Client, config: &Config) -> Result<Self, PipelineError> {
        let api_key = non_empty(config.ai_api_key.as_deref()).ok_or_else(|| {
            PipelineError::Configuration(
                "Gemini API key is missing. Set GEMINI_API_KEY or `commit-diary config set ai.api_key <KEY>`."
                    .to_string(),
            )
        })?;
        let model = non_empty(Some(config.ai_model.as_str()))
            .map(|model| model.trim_start_matches("models/").to_string())
            .ok_or_else(|| PipelineError::Configuration("ai_model is empty".to_string()))?;

        Ok(Self {
            http,
            endpoint: generate_endpoint(&config.ai_api_base_url, &model)?,
            api_key: api_key.to_string(),
            model,
            timeout: Duration::from_secs(config.ai_timeout_seconds.max(MIN_AI_TIMEOUT_SECONDS)),
        })
    }

    /// Builds the daily-report prompt for `commits` and returns the model's text.
    pub async fn synthesize_report(&self, commits: &[CommitRecord]) -> Result<String, PipelineError> {
        let prompt = prompt::daily_report_prompt(commits);
        info!(model = %self.model, commits = commits.len(), "requesting daily report");

        let report = self.generate(&prompt).await?;

        info!(model = %self.model, chars = report.chars().count(), "daily report generated");
        Ok(report)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let request = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        // The key travels in the query string, so reqwest errors are stripped
        // of their URL before they can reach logs or API responses.
        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|error| PipelineError::transport(Upstream::Gemini, error.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| PipelineError::transport(Upstream::Gemini, error.without_url()))?;

        debug!(status = %status, body = %body, "Gemini response");

        if !status.is_success() {
            warn!(status = %status, body = %body, "Gemini API returned an error status");
            return Err(PipelineError::upstream_status(Upstream::Gemini, status, body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|error| PipelineError::decode(Upstream::Gemini, error))?;

        Ok(extract_text(&parsed))
    }
}

/// Every part of every candidate, each followed by a newline, in response order.
pub fn extract_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .map(|part| format!("{}\n", part.render()))
        .collect()
}

pub async fn test_connection(http: Client, config: &Config) -> Result<String, PipelineError> {
    let client = GeminiClient::from_config(http, config)?;
    let reply = client
        .generate("Reply with exactly one short sentence confirming the API connection works.")
        .await?;

    Ok(reply.trim().to_string())
}

fn generate_endpoint(base_url: &str, model: &str) -> Result<Url, PipelineError> {
    let invalid = || PipelineError::Configuration(format!("Invalid AI API base URL: {base_url}"));

    let mut url = Url::parse(base_url.trim()).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(["models", &format!("{model}:generateContent")]);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::{GeminiClient, GenerateContentResponse, extract_text, generate_endpoint};
    use crate::commits::sample;
    use crate::config::Config;
    use crate::error::PipelineError;
    use mockito::Matcher;

    fn gemini_config(base_url: &str) -> Config {
        Config {
            ai_api_base_url: base_url.to_string(),
            ai_api_key: Some("gm-test".to_string()),
            ai_model: "gemini-test".to_string(),
            ..Config::default()
        }
    }

    fn parse(body: &str) -> GenerateContentResponse {
        serde_json::from_str(body).expect("response json")
    }

    #[test]
    fn concatenates_candidates_and_parts_in_order() {
        let response = parse(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"Hello"}],"role":"model"}},
                {"content":{"parts":[{"text":"World"}],"role":"model"}}
            ]}"#,
        );

        assert_eq!(extract_text(&response), "Hello\nWorld\n");
    }

    #[test]
    fn multiple_parts_each_get_a_newline() {
        let response = parse(r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#);
        assert_eq!(extract_text(&response), "a\nb\n");
    }

    #[test]
    fn no_candidates_yields_empty_text() {
        assert_eq!(extract_text(&parse(r#"{"candidates":[]}"#)), "");
        assert_eq!(extract_text(&parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)), "");
    }

    #[test]
    fn candidate_without_content_contributes_nothing() {
        let response = parse(
            r#"{"candidates":[{"finishReason":"SAFETY"},{"content":{"parts":[{"text":"ok"}]}}]}"#,
        );
        assert_eq!(extract_text(&response), "ok\n");
    }

    #[test]
    fn non_text_parts_are_rendered_as_json() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"functionCall":{"name":"f"}}]}}]}"#,
        );
        assert_eq!(extract_text(&response), "{\"functionCall\":{\"name\":\"f\"}}\n");
    }

    #[test]
    fn endpoint_targets_generate_content() {
        let url = generate_endpoint(
            "https://generativelanguage.googleapis.com/v1beta/",
            "gemini-2.0-flash",
        )
        .expect("url");

        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let config = Config {
            ai_api_key: None,
            ..gemini_config("http://127.0.0.1:9")
        };

        assert!(matches!(
            GeminiClient::from_config(reqwest::Client::new(), &config),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn sends_prompt_and_extracts_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::UrlEncoded("key".to_string(), "gm-test".to_string()))
            .match_body(Matcher::Regex("コミット: commit abc".to_string()))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}]}},{"content":{"parts":[{"text":"World"}]}}]}"#,
            )
            .create_async()
            .await;

        let client = GeminiClient::from_config(reqwest::Client::new(), &gemini_config(&server.url()))
            .expect("client");
        let report = client
            .synthesize_report(&[sample("abc", "2024-01-01T10:00:00Z")])
            .await
            .expect("report");

        mock.assert_async().await;
        assert_eq!(report, "Hello\nWorld\n");
    }

    #[tokio::test]
    async fn error_status_is_a_transport_error_without_the_key() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::from_config(reqwest::Client::new(), &gemini_config(&server.url()))
            .expect("client");
        let error = client.generate("hi").await.expect_err("403");

        assert_eq!(error.status(), Some(403));
        assert!(!error.to_string().contains("gm-test"));
    }

    #[tokio::test]
    async fn malformed_reply_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = GeminiClient::from_config(reqwest::Client::new(), &gemini_config(&server.url()))
            .expect("client");

        assert!(matches!(
            client.generate("hi").await,
            Err(PipelineError::Decode { .. })
        ));
    }
}
