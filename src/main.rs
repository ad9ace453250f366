mod ai;
mod analyzer;
mod api;
mod cli;
mod commits;
mod config;
mod error;
mod github;

use crate::analyzer::{DUMP_FILE, Pipeline};
use crate::cli::onboard::run_onboarding;
use crate::cli::{AiCommands, Cli, Commands, ConfigCommands};
use crate::config::Config;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding(load_or_default_config()?)?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Doctor => handle_doctor(),
        Commands::Serve => {
            let pipeline = build_pipeline(runtime_config()?)?;
            api::run_server(pipeline).await
        }
        Commands::Fetch {
            date,
            today,
            output,
        } => handle_fetch(date, today, output).await,
        Commands::Report { date } => handle_report(date).await,
        Commands::Ai { command } => handle_ai_command(command).await,
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.save()?;

            let masked = if key.contains("token") || key.contains("api_key") {
                "***hidden***".to_string()
            } else {
                value
            };
            println!("Config saved: {key} = {masked}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_or_default_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing");
    }

    let config = runtime_config()?;

    if config.github_owner.trim().is_empty() || config.github_repo.trim().is_empty() {
        println!("[WARN] repository is not configured (github.owner / github.repo)");
        issues.push("repository missing");
    } else {
        println!(
            "[OK] repository: {}/{}",
            config.github_owner, config.github_repo
        );
    }

    if config.has_github_token() {
        println!("[OK] GitHub token is configured");
    } else {
        println!("[WARN] GitHub token is missing (GITHUB_TOKEN or github.token)");
        issues.push("github token missing");
    }

    if config.has_ai_api_key() {
        println!("[OK] Gemini API key is configured (model: {})", config.ai_model);
    } else {
        println!("[WARN] Gemini API key is missing (GEMINI_API_KEY or ai.api_key)");
        issues.push("ai api key missing");
    }

    if config.output_dir.exists() {
        println!("[OK] output dir exists: {}", config.output_dir.display());
    } else {
        println!(
            "[OK] output dir will be created on first write: {}",
            config.output_dir.display()
        );
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

async fn handle_fetch(date: Option<String>, today: bool, output: Option<PathBuf>) -> Result<()> {
    let pipeline = build_pipeline(runtime_config()?)?;
    let date = if today {
        Some(Local::now().date_naive())
    } else {
        parse_optional_date(date)?
    };
    let path = output.unwrap_or_else(|| pipeline.config().output_dir.join(DUMP_FILE));

    let count = pipeline.dump(date, &path).await?;

    println!("Saved {count} commit(s) to {}", path.display());
    Ok(())
}

async fn handle_report(date: Option<String>) -> Result<()> {
    let pipeline = build_pipeline(runtime_config()?)?;
    let date = parse_optional_date(date)?;

    let report = pipeline.analyze(date).await?;
    let label = date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "all".to_string());
    let saved =
        analyzer::report::save_report_files(&report, &pipeline.config().reports_dir(), &label)?;

    println!("{}", report.analysis_text.trim_end());
    println!();
    println!("Report generated: {label} ({} commit(s))", report.commits.len());
    println!("- Markdown: {}", saved.markdown_path.display());
    println!("- JSON: {}", saved.json_path.display());

    Ok(())
}

async fn handle_ai_command(command: AiCommands) -> Result<()> {
    match command {
        AiCommands::Test {
            key,
            base_url,
            model,
        } => {
            let mut config = runtime_config()?;

            if let Some(value) = key {
                config.ai_api_key = Some(value);
            }
            if let Some(value) = base_url {
                config.ai_api_base_url = value;
            }
            if let Some(value) = model {
                config.ai_model = value;
            }

            let response = ai::test_connection(build_http_client()?, &config).await?;
            println!("AI API connection successful");
            println!("{response}");

            Ok(())
        }
    }
}

fn build_pipeline(config: Config) -> Result<Pipeline> {
    Ok(Pipeline::new(Arc::new(config), build_http_client()?))
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")
}

fn parse_optional_date(input: Option<String>) -> Result<Option<NaiveDate>> {
    input
        .as_deref()
        .map(|date| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date format: {date}. Example: 2024-01-31"))
        })
        .transpose()
}

/// `RUST_LOG` when it is set and valid, `info` otherwise.
fn log_filter(raw: Option<String>) -> EnvFilter {
    raw.filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn runtime_config() -> Result<Config> {
    Ok(load_or_default_config()?.with_env_overrides())
}

fn load_or_default_config() -> Result<Config> {
    if Config::config_path()?.exists() {
        Config::load()
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::log_filter;
    use tracing::Level;

    fn debug_enabled(raw: Option<&str>) -> bool {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(log_filter(raw.map(ToOwned::to_owned)))
            .finish();

        tracing::subscriber::with_default(subscriber, || tracing::enabled!(Level::DEBUG))
    }

    #[test]
    fn rust_log_debug_enables_debug_events() {
        assert!(debug_enabled(Some("debug")));
    }

    #[test]
    fn defaults_to_info_when_unset_blank_or_invalid() {
        assert!(!debug_enabled(None));
        assert!(!debug_enabled(Some("  ")));
        assert!(!debug_enabled(Some("commit_diary=verbose")));
    }
}
