pub mod actions;
pub mod ask;
pub mod config;
pub mod doctor;
pub mod repl;

use serde::Serialize;
use switchboard_core::config::{AppConfig, LoadOptions};
use tokio::runtime::Runtime;

pub const EXIT_OK: u8 = 0;
pub const EXIT_RUNTIME_FAILURE: u8 = 1;
pub const EXIT_CONFIG_FAILURE: u8 = 2;
pub const EXIT_REQUEST_FAILED: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads and validates configuration, mapping failure to the shared
/// config-validation outcome.
pub(crate) fn load_config(command: &str, load: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(load).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG_FAILURE)
    })
}

/// Requests are handled one at a time, so a current-thread runtime is enough.
pub(crate) fn current_thread_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME_FAILURE,
        )
    })
}
