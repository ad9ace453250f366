use crate::config::{Config, expand_home};
use anyhow::{Context, Result};
use dialoguer::{Input, Password, theme::ColorfulTheme};

pub fn run_onboarding(existing: Config) -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to commit-diary onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();

    println!("\n[1/4] Repository");
    let github_owner: String = Input::with_theme(&theme)
        .with_prompt("  GitHub owner (user or organization)")
        .with_initial_text(existing.github_owner.clone())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            (!input.trim().is_empty())
                .then_some(())
                .ok_or("Owner must not be empty")
        })
        .interact_text()
        .context("Failed to read GitHub owner")?;
    let github_repo: String = Input::with_theme(&theme)
        .with_prompt("  Repository name")
        .with_initial_text(existing.github_repo.clone())
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            (!input.trim().is_empty())
                .then_some(())
                .ok_or("Repository must not be empty")
        })
        .interact_text()
        .context("Failed to read repository name")?;

    println!("\n[2/4] Credentials (leave empty to keep the current value or use env vars)");
    let github_token = Password::with_theme(&theme)
        .with_prompt("  GitHub token")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read GitHub token")?;
    let ai_api_key = Password::with_theme(&theme)
        .with_prompt("  Gemini API key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read Gemini API key")?;

    println!("\n[3/4] Model");
    let ai_model: String = Input::with_theme(&theme)
        .with_prompt("  Gemini model")
        .default(existing.ai_model.clone())
        .interact_text()
        .context("Failed to read model name")?;

    println!("\n[4/4] Output directory");
    let output_dir_input: String = Input::with_theme(&theme)
        .with_prompt("  Folder for commit dumps and reports")
        .default(existing.output_dir.display().to_string())
        .interact_text()
        .context("Failed to read output directory")?;

    let config = Config {
        github_owner: github_owner.trim().to_string(),
        github_repo: github_repo.trim().to_string(),
        github_token: keep_or_replace(existing.github_token.clone(), &github_token),
        ai_api_key: keep_or_replace(existing.ai_api_key.clone(), &ai_api_key),
        ai_model: ai_model.trim().to_string(),
        output_dir: expand_home(output_dir_input.trim()),
        ..existing
    };

    config.save()?;

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Run `commit-diary doctor` to verify, then `commit-diary serve`.");
    println!("──────────────────────────────────────────");

    Ok(config)
}

fn keep_or_replace(current: Option<String>, entered: &str) -> Option<String> {
    let entered = entered.trim();
    if entered.is_empty() {
        current
    } else {
        Some(entered.to_string())
    }
}
