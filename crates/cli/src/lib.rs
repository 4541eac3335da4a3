pub mod commands;
pub mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use switchboard_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "switchboard",
    about = "Switchboard operator CLI",
    long_about = "Route natural-language requests to calendar, team chat and company API integrations.",
    after_help = "Examples:\n  switchboard ask \"what is on my calendar this week?\"\n  switchboard repl\n  switchboard doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a switchboard.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Handle one natural-language request and print the result")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Request text")]
        text: Vec<String>,
        #[arg(long, help = "Emit the raw result envelope as JSON")]
        json: bool,
    },
    #[command(about = "Interactive session; type exit, quit or sair to leave")]
    Repl,
    #[command(about = "List the actions the router accepts")]
    Actions {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and report which integrations are ready")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let load = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Ask { text, json } => commands::ask::run(load, &text.join(" "), json),
        Command::Repl => commands::repl::run(load),
        Command::Actions { json } => commands::actions::run(json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(load) }
        }
        Command::Doctor { json } => commands::doctor::run(load, json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber once; later calls are no-ops. Logs go to
/// stderr so stdout stays parseable.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
