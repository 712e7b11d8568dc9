use clap::Subcommand;
use std::fs;

use crate::cli::i18n::{current_language, Language};
use crate::cli::ui::{error, highlight, info, success, to_json};
use crate::error::AppError;
use crate::settings::{get_settings, update_settings, AppSettings, Connection};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current settings
    Show,
    /// Show settings file path
    Path,
    /// Update persisted settings
    Set {
        /// Backend base URL (example: http://localhost:8082)
        #[arg(long)]
        api_url: Option<String>,

        /// Backend access token
        #[arg(long)]
        token: Option<String>,

        /// Interface language code
        #[arg(long)]
        language: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

pub fn execute(cmd: ConfigCommand) -> Result<(), AppError> {
    match cmd {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Path => show_path(),
        ConfigCommand::Set {
            api_url,
            token,
            language,
            timeout,
        } => set_config(api_url, token, language, timeout),
    }
}

fn redacted(settings: &AppSettings) -> AppSettings {
    let mut shown = settings.clone();
    if shown.token.is_some() {
        shown.token = Some("********".to_string());
    }
    shown
}

fn show_config() -> Result<(), AppError> {
    let settings = get_settings();

    println!("{}", highlight("Current Settings"));
    println!("{}", "=".repeat(50));
    println!();

    let json = to_json(&redacted(&settings)).map_err(|e| AppError::JsonSerialize { source: e })?;
    println!("{json}");
    println!();
    println!("Interface language: {}", current_language());

    Ok(())
}

fn show_path() -> Result<(), AppError> {
    let path = AppSettings::settings_path();

    println!("{}", highlight("Settings Path"));
    println!("{}", "=".repeat(50));
    println!("Settings file: {}", path.display());

    if path.exists() {
        println!("\n{} Settings file exists", success("✓"));
        if let Ok(metadata) = fs::metadata(&path) {
            println!("File size:     {} bytes", metadata.len());
        }
    } else {
        println!("\n{} Settings file does not exist", error("✗"));
        println!("{}", info("Defaults are in use until `config set` writes one."));
    }

    Ok(())
}

fn apply_changes(
    mut settings: AppSettings,
    api_url: Option<String>,
    token: Option<String>,
    language: Option<String>,
    timeout: Option<u64>,
) -> Result<AppSettings, AppError> {
    if let Some(url) = api_url {
        Connection::resolve(&settings, Some(&url), None)?;
        settings.api_url = url;
    }
    if let Some(token) = token {
        settings.token = Some(token);
    }
    if let Some(code) = language {
        let lang = Language::from_code(&code)
            .ok_or_else(|| AppError::InvalidInput(format!("unsupported language '{code}'")))?;
        settings.language = Some(lang.code().to_string());
    }
    if let Some(secs) = timeout {
        if secs == 0 {
            return Err(AppError::InvalidInput(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        settings.request_timeout_secs = secs;
    }
    Ok(settings)
}

fn set_config(
    api_url: Option<String>,
    token: Option<String>,
    language: Option<String>,
    timeout: Option<u64>,
) -> Result<(), AppError> {
    let settings = apply_changes(get_settings(), api_url, token, language, timeout)?;
    update_settings(settings)?;
    println!(
        "{}",
        success(&format!(
            "✓ Settings saved to {}",
            AppSettings::settings_path().display()
        ))
    );
    Ok(())
}
