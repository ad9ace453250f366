use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".commit-diary";
const CONFIG_FILE: &str = "config.json";
pub const MIN_AI_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    Bearer,
    Token,
}

impl AuthScheme {
    pub fn header_value(self, token: &str) -> String {
        match self {
            AuthScheme::Bearer => format!("Bearer {token}"),
            AuthScheme::Token => format!("token {token}"),
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "bearer" => Ok(AuthScheme::Bearer),
            "token" => Ok(AuthScheme::Token),
            _ => bail!("github_auth_scheme must be bearer or token"),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            AuthScheme::Bearer => "bearer",
            AuthScheme::Token => "token",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github_api_base_url: String,
    pub github_owner: String,
    pub github_repo: String,
    pub github_token: Option<String>,
    pub github_auth_scheme: AuthScheme,
    pub github_timeout_seconds: u64,
    pub github_max_attempts: u32,
    pub github_retry_initial_ms: u64,
    pub ai_api_base_url: String,
    pub ai_model: String,
    pub ai_api_key: Option<String>,
    pub ai_timeout_seconds: u64,
    pub api_port: u16,
    pub allowed_origins: Vec<String>,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_api_base_url: "https://api.github.com".to_string(),
            github_owner: String::new(),
            github_repo: String::new(),
            github_token: None,
            github_auth_scheme: AuthScheme::Bearer,
            github_timeout_seconds: 15,
            github_max_attempts: 3,
            github_retry_initial_ms: 500,
            ai_api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ai_model: "gemini-2.0-flash".to_string(),
            ai_api_key: None,
            ai_timeout_seconds: 60,
            api_port: 8080,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(&config_path)?;

        Ok(())
    }

    /// Folds credentials and repository identifiers from the process
    /// environment into the config. Called once at startup; nothing else
    /// reads the environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        if let Some(token) = first_set(&["COMMIT_DIARY_GITHUB_TOKEN", "GITHUB_TOKEN"]) {
            self.github_token = Some(token);
        }
        if let Some(key) = first_set(&["COMMIT_DIARY_AI_API_KEY", "GEMINI_API_KEY", "GEMINI_APIKEY"])
        {
            self.ai_api_key = Some(key);
        }
        if let Some(owner) = first_set(&["COMMIT_DIARY_OWNER"]) {
            self.github_owner = owner;
        }
        if let Some(repo) = first_set(&["COMMIT_DIARY_REPO"]) {
            self.github_repo = repo;
        }

        self
    }

    pub fn has_github_token(&self) -> bool {
        non_empty(self.github_token.as_deref()).is_some()
    }

    pub fn has_ai_api_key(&self) -> bool {
        non_empty(self.ai_api_key.as_deref()).is_some()
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.output_dir.join("reports")
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match normalize_config_key(key) {
            "github_api_base_url" => {
                self.github_api_base_url = value.trim().trim_end_matches('/').to_string();
            }
            "github_owner" => {
                self.github_owner = value.trim().to_string();
            }
            "github_repo" => {
                self.github_repo = value.trim().to_string();
            }
            "github_token" => {
                self.github_token = (!value.trim().is_empty()).then(|| value.trim().to_string());
            }
            "github_auth_scheme" => {
                self.github_auth_scheme = AuthScheme::parse(value)?;
            }
            "github_timeout_seconds" => {
                self.github_timeout_seconds = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("github_timeout_seconds must be a number"))?
                    .max(1);
            }
            "github_max_attempts" => {
                self.github_max_attempts = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("github_max_attempts must be a number"))?
                    .max(1);
            }
            "github_retry_initial_ms" => {
                self.github_retry_initial_ms = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("github_retry_initial_ms must be a number"))?;
            }
            "ai_api_base_url" => {
                self.ai_api_base_url = value.trim().trim_end_matches('/').to_string();
            }
            "ai_model" => {
                self.ai_model = value.trim().to_string();
            }
            "ai_api_key" => {
                self.ai_api_key = (!value.trim().is_empty()).then(|| value.trim().to_string());
            }
            "ai_timeout_seconds" => {
                self.ai_timeout_seconds = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("ai_timeout_seconds must be a number"))?
                    .max(MIN_AI_TIMEOUT_SECONDS);
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "allowed_origins" => {
                self.allowed_origins = value
                    .split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(ToOwned::to_owned)
                    .collect();
            }
            "output_dir" => {
                self.output_dir = expand_home(value.trim());
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: github.base_url, github.owner, github.repo, github.token, github.auth_scheme, github.timeout_seconds, github.max_attempts, github.retry_initial_ms, ai.base_url, ai.model, ai.api_key, ai.timeout_seconds, api.port, api.allowed_origins, output.dir"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "github_api_base_url" => Some(self.github_api_base_url.clone()),
            "github_owner" => Some(self.github_owner.clone()),
            "github_repo" => Some(self.github_repo.clone()),
            "github_token" => Some(mask_secret(self.github_token.as_deref())),
            "github_auth_scheme" => Some(self.github_auth_scheme.as_str().to_string()),
            "github_timeout_seconds" => Some(self.github_timeout_seconds.to_string()),
            "github_max_attempts" => Some(self.github_max_attempts.to_string()),
            "github_retry_initial_ms" => Some(self.github_retry_initial_ms.to_string()),
            "ai_api_base_url" => Some(self.ai_api_base_url.clone()),
            "ai_model" => Some(self.ai_model.clone()),
            "ai_api_key" => Some(mask_secret(self.ai_api_key.as_deref())),
            "ai_timeout_seconds" => Some(self.ai_timeout_seconds.to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "allowed_origins" => Some(self.allowed_origins.join(",")),
            "output_dir" => Some(self.output_dir.display().to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "github_api_base_url" | "github.base_url" => "github_api_base_url",
        "github_owner" | "github.owner" => "github_owner",
        "github_repo" | "github.repo" => "github_repo",
        "github_token" | "github.token" => "github_token",
        "github_auth_scheme" | "github.auth_scheme" => "github_auth_scheme",
        "github_timeout_seconds" | "github.timeout_seconds" => "github_timeout_seconds",
        "github_max_attempts" | "github.max_attempts" => "github_max_attempts",
        "github_retry_initial_ms" | "github.retry_initial_ms" => "github_retry_initial_ms",
        "ai_api_base_url" | "ai.base_url" => "ai_api_base_url",
        "ai_model" | "ai.model" => "ai_model",
        "ai_api_key" | "ai.api_key" => "ai_api_key",
        "ai_timeout_seconds" | "ai.timeout_seconds" => "ai_timeout_seconds",
        "api_port" | "api.port" => "api_port",
        "allowed_origins" | "api.allowed_origins" => "allowed_origins",
        "output_dir" | "output.dir" => "output_dir",
        _ => key,
    }
}

pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn mask_secret(value: Option<&str>) -> String {
    non_empty(value)
        .map(|_| "***set***".to_string())
        .unwrap_or_else(|| "not_set".to_string())
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

pub fn default_output_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("commit-diary")
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}
