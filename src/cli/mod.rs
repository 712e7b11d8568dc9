use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod commands;
pub mod i18n;
pub mod tui;
pub mod ui;

#[derive(Parser)]
#[command(
    name = "dbb-settings",
    version,
    about = "Device settings for the Digital Bitbox hardware wallet",
    long_about = "Inspect and manage a connected Digital Bitbox through the local backend API.\n\nRun without arguments to open the settings view for the connected device."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend base URL (overrides the settings file)
    #[arg(long, global = true, env = "DBB_API_URL")]
    pub api_url: Option<String>,

    /// Backend access token (overrides the settings file)
    #[arg(long, global = true, env = "DBB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the device settings view
    #[command(alias = "ui")]
    Settings {
        /// Device ID; defaults to the only connected device
        device_id: Option<String>,
    },

    /// Print firmware version, lock state and SD card presence
    Info {
        /// Device ID; defaults to the only connected device
        device_id: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List devices registered with the backend
    Devices,

    /// Resolve a localization key
    Translate(commands::locale::TranslateCommand),

    /// Check that every localization key resolves
    CheckLocales,

    /// Manage settings (show, path, set)
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_settings_view() {
        let cli = Cli::try_parse_from(["dbb-settings"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn translate_collects_params() {
        let cli = Cli::try_parse_from([
            "dbb-settings",
            "translate",
            "dbb.error.109_touch",
            "-p",
            "remainingAttempts=2",
        ])
        .expect("parse");
        match cli.command {
            Some(Commands::Translate(cmd)) => {
                assert_eq!(cmd.key, "dbb.error.109_touch");
                assert_eq!(
                    cmd.params,
                    vec![("remainingAttempts".to_string(), "2".to_string())]
                );
            }
            _ => panic!("expected translate command"),
        }
    }

    #[test]
    fn ui_alias_and_global_flags() {
        let cli = Cli::try_parse_from([
            "dbb-settings",
            "ui",
            "abc",
            "--api-url",
            "http://127.0.0.1:1",
        ])
        .expect("parse");
        assert_eq!(cli.api_url.as_deref(), Some("http://127.0.0.1:1"));
        assert!(matches!(
            cli.command,
            Some(Commands::Settings { device_id: Some(ref id) }) if id == "abc"
        ));
    }
}
