use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use switchboard_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Report<'a> {
    lines: Vec<String>,
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl Report<'_> {
    fn push(&mut self, key: &str, value: &str, env_keys: &[&str]) {
        let source = self.source(key, env_keys);
        self.lines.push(render_line(key, value, source));
    }

    /// Env wins over file, file over default. Legacy env names are listed
    /// after the primary one.
    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) =
            env_keys.iter().find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
        {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

pub fn run(load: LoadOptions) -> String {
    let explicit_path = load.config_path.clone();
    let config = match AppConfig::load(load) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let mut report = Report {
        lines: vec!["effective config (source precedence: env > file > default):".to_string()],
        doc: config_file_doc.as_ref(),
        path: config_file_path.as_deref(),
    };

    let llm = &config.llm;
    report.push(
        "llm.provider",
        &format!("{:?}", llm.provider),
        &["SWITCHBOARD_LLM_PROVIDER"],
    );
    report.push("llm.model", &llm.model, &["SWITCHBOARD_LLM_MODEL"]);
    report.push("llm.base_url", llm.effective_base_url(), &["SWITCHBOARD_LLM_BASE_URL"]);
    report.push(
        "llm.api_key",
        &redact_secret(llm.api_key.as_ref()),
        &["SWITCHBOARD_LLM_API_KEY", "OPENAI_API_KEY"],
    );
    report.push(
        "llm.temperature",
        &llm.temperature.to_string(),
        &["SWITCHBOARD_LLM_TEMPERATURE"],
    );
    report.push(
        "llm.timeout_secs",
        &llm.timeout_secs.to_string(),
        &["SWITCHBOARD_LLM_TIMEOUT_SECS"],
    );
    report.push(
        "llm.corrective_reprompt",
        &llm.corrective_reprompt.to_string(),
        &["SWITCHBOARD_LLM_CORRECTIVE_REPROMPT"],
    );

    let calendar = &config.calendar;
    report.push(
        "calendar.client_id",
        plain(calendar.client_id.as_deref()),
        &["SWITCHBOARD_CALENDAR_CLIENT_ID", "GOOGLE_CLIENT_ID"],
    );
    report.push(
        "calendar.client_secret",
        &redact_secret(calendar.client_secret.as_ref()),
        &["SWITCHBOARD_CALENDAR_CLIENT_SECRET", "GOOGLE_CLIENT_SECRET"],
    );
    report.push(
        "calendar.refresh_token",
        &redact_secret(calendar.refresh_token.as_ref()),
        &["SWITCHBOARD_CALENDAR_REFRESH_TOKEN", "GOOGLE_REFRESH_TOKEN"],
    );

    let chat = &config.chat;
    report.push(
        "chat.tenant_id",
        plain(chat.tenant_id.as_deref()),
        &["SWITCHBOARD_CHAT_TENANT_ID", "TEAMS_TENANT_ID"],
    );
    report.push(
        "chat.client_id",
        plain(chat.client_id.as_deref()),
        &["SWITCHBOARD_CHAT_CLIENT_ID", "TEAMS_CLIENT_ID"],
    );
    report.push(
        "chat.client_secret",
        &redact_secret(chat.client_secret.as_ref()),
        &["SWITCHBOARD_CHAT_CLIENT_SECRET", "TEAMS_CLIENT_SECRET"],
    );

    let internal_api = &config.internal_api;
    report.push(
        "internal_api.base_url",
        plain(internal_api.base_url.as_deref()),
        &["SWITCHBOARD_INTERNAL_API_BASE_URL", "INTERNAL_API_URL"],
    );
    report.push(
        "internal_api.api_key",
        &redact_secret(internal_api.api_key.as_ref()),
        &["SWITCHBOARD_INTERNAL_API_KEY", "INTERNAL_API_KEY"],
    );

    let retry = &config.retry;
    report.push(
        "retry.max_attempts",
        &retry.max_attempts.to_string(),
        &["SWITCHBOARD_RETRY_MAX_ATTEMPTS"],
    );
    report.push(
        "retry.base_delay_ms",
        &retry.base_delay_ms.to_string(),
        &["SWITCHBOARD_RETRY_BASE_DELAY_MS"],
    );
    report.push(
        "retry.max_jitter_ms",
        &retry.max_jitter_ms.to_string(),
        &["SWITCHBOARD_RETRY_MAX_JITTER_MS"],
    );
    report.push(
        "retry.attempt_timeout_secs",
        &optional_number(retry.attempt_timeout_secs),
        &["SWITCHBOARD_RETRY_ATTEMPT_TIMEOUT_SECS"],
    );
    report.push(
        "retry.deadline_secs",
        &optional_number(retry.deadline_secs),
        &["SWITCHBOARD_RETRY_DEADLINE_SECS"],
    );

    report.push(
        "http.timeout_secs",
        &config.http.timeout_secs.to_string(),
        &["SWITCHBOARD_HTTP_TIMEOUT_SECS"],
    );

    report.push(
        "logging.level",
        &config.logging.level,
        &["SWITCHBOARD_LOGGING_LEVEL", "SWITCHBOARD_LOG_LEVEL"],
    );
    report.push(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["SWITCHBOARD_LOGGING_FORMAT", "SWITCHBOARD_LOG_FORMAT"],
    );

    report.lines.join("\n")
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("switchboard.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/switchboard.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn plain(value: Option<&str>) -> &str {
    value.filter(|value| !value.trim().is_empty()).unwrap_or("<unset>")
}

fn optional_number(value: Option<u64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_else(|| "<none>".to_string())
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    }
}

/// Keeps a recognizable key prefix such as `sk-` and nothing else.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        if prefix.len() <= 4 {
            return format!("{prefix}-***");
        }
    }

    "<redacted>".to_string()
}
