use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Upstream service a request was talking to when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    GitHub,
    Gemini,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::GitHub => f.write_str("GitHub API"),
            Upstream::Gemini => f.write_str("Gemini API"),
        }
    }
}

/// Errors raised by the fetch → filter → synthesize → assemble chain.
///
/// Every stage hands its error straight back to the caller; nothing in the
/// pipeline produces partial results.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{service} request failed: {message}")]
    Transport {
        service: Upstream,
        message: String,
        status: Option<u16>,
        body: Option<String>,
        timed_out: bool,
    },

    #[error("Failed to decode {service} response: {message}")]
    Decode { service: Upstream, message: String },

    #[error("Failed to write {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Wraps a reqwest failure that happened before any status was received.
    pub fn transport(service: Upstream, error: reqwest::Error) -> Self {
        Self::Transport {
            service,
            timed_out: error.is_timeout(),
            message: error.to_string(),
            status: None,
            body: None,
        }
    }

    /// A non-2xx answer; the raw body is kept for diagnosis.
    pub fn upstream_status(service: Upstream, status: reqwest::StatusCode, body: String) -> Self {
        Self::Transport {
            service,
            message: format!("{status}: {body}"),
            status: Some(status.as_u16()),
            body: Some(body),
            timed_out: false,
        }
    }

    pub fn decode(service: Upstream, error: serde_json::Error) -> Self {
        Self::Decode {
            service,
            message: error.to_string(),
        }
    }

    /// Upstream HTTP status carried by a transport error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether a commit-host call that failed this way may be attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status: None, .. } => true,
            Self::Transport {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineError, Upstream};

    fn with_status(code: u16) -> PipelineError {
        PipelineError::Transport {
            service: Upstream::GitHub,
            message: String::new(),
            status: Some(code),
            body: None,
            timed_out: false,
        }
    }

    #[test]
    fn only_server_side_and_throttling_statuses_are_retryable() {
        assert!(with_status(500).is_retryable());
        assert!(with_status(503).is_retryable());
        assert!(with_status(429).is_retryable());
        assert!(!with_status(401).is_retryable());
        assert!(!with_status(404).is_retryable());
    }

    #[test]
    fn failures_without_a_status_are_retryable() {
        let refused = PipelineError::Transport {
            service: Upstream::GitHub,
            message: "connection refused".to_string(),
            status: None,
            body: None,
            timed_out: false,
        };
        let timed_out = PipelineError::Transport {
            service: Upstream::GitHub,
            message: "operation timed out".to_string(),
            status: None,
            body: None,
            timed_out: true,
        };

        assert!(refused.is_retryable());
        assert!(timed_out.is_retryable());
        assert_eq!(timed_out.status(), None);
    }

    #[test]
    fn decode_and_configuration_errors_are_terminal() {
        assert!(!PipelineError::Configuration("missing".to_string()).is_retryable());
        let decode = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        assert!(!PipelineError::decode(Upstream::GitHub, decode).is_retryable());
    }

    #[test]
    fn upstream_status_message_includes_body() {
        let error = PipelineError::upstream_status(
            Upstream::GitHub,
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"message":"Bad credentials"}"#.to_string(),
        );

        assert_eq!(error.status(), Some(401));
        assert!(error.to_string().contains("Bad credentials"));
        assert!(error.to_string().starts_with("GitHub API request failed"));
    }
}
