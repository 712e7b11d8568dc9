use clap::Parser;
use dbb_settings_lib::cli::commands::{config, device, locale};
use dbb_settings_lib::cli::{Cli, Commands};
use dbb_settings_lib::{get_settings, AppError, Connection};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Keep the TUI and command output clean unless asked for details.
    let log_level = if cli.verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let Cli {
        api_url,
        token,
        command,
        ..
    } = cli;
    let connection =
        || Connection::resolve(&get_settings(), api_url.as_deref(), token.as_deref());

    match command {
        // Default to the settings view if no command is provided
        None => device::execute_settings(&connection()?, None),
        Some(Commands::Settings { device_id }) => {
            device::execute_settings(&connection()?, device_id.as_deref())
        }
        Some(Commands::Info { device_id, json }) => {
            device::execute_info(&connection()?, device_id.as_deref(), json)
        }
        Some(Commands::Devices) => device::execute_devices(&connection()?),
        Some(Commands::Translate(cmd)) => locale::execute_translate(cmd),
        Some(Commands::CheckLocales) => locale::execute_check(),
        Some(Commands::Config(cmd)) => config::execute(cmd),
        Some(Commands::Completions { shell }) => {
            dbb_settings_lib::cli::generate_completions(shell);
            Ok(())
        }
    }
}
