use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub calendar: CalendarConfig,
    pub chat: ChatConfig,
    pub internal_api: InternalApiConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub corrective_reprompt: bool,
}

/// Google Calendar OAuth client plus a long-lived refresh token.
#[derive(Clone, Debug, Default)]
pub struct CalendarConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
}

/// Microsoft Graph app registration used for the team-chat integration.
#[derive(Clone, Debug, Default)]
pub struct ChatConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
}

#[derive(Clone, Debug, Default)]
pub struct InternalApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
    pub attempt_timeout_secs: Option<u64>,
    pub deadline_secs: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub retry_max_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub internal_api_base_url: Option<String>,
    pub internal_api_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: None,
                model: "gpt-3.5-turbo".to_string(),
                temperature: 0.2,
                timeout_secs: 30,
                corrective_reprompt: true,
            },
            calendar: CalendarConfig::default(),
            chat: ChatConfig::default(),
            internal_api: InternalApiConfig::default(),
            retry: RetryConfig {
                max_attempts: 3,
                base_delay_ms: 1_000,
                max_jitter_ms: 1_000,
                attempt_timeout_secs: None,
                deadline_secs: Some(120),
            },
            http: HttpConfig { timeout_secs: 30 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl LlmConfig {
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_else(|| self.provider.default_base_url())
    }
}

impl CalendarConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.client_id.as_deref()) {
            missing.push("calendar.client_id");
        }
        if is_blank_secret(self.client_secret.as_ref()) {
            missing.push("calendar.client_secret");
        }
        if is_blank_secret(self.refresh_token.as_ref()) {
            missing.push("calendar.refresh_token");
        }
        missing
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl ChatConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.tenant_id.as_deref()) {
            missing.push("chat.tenant_id");
        }
        if is_blank(self.client_id.as_deref()) {
            missing.push("chat.client_id");
        }
        if is_blank_secret(self.client_secret.as_ref()) {
            missing.push("chat.client_secret");
        }
        missing
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl InternalApiConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.base_url.as_deref()) {
            missing.push("internal_api.base_url");
        }
        if is_blank_secret(self.api_key.as_ref()) {
            missing.push("internal_api.api_key");
        }
        missing
    }

    /// A malformed base URL disables the integration instead of failing the
    /// whole configuration.
    pub fn has_http_base_url(&self) -> bool {
        self.base_url
            .as_deref()
            .map(str::trim)
            .is_some_and(|url| url.starts_with("http://") || url.starts_with("https://"))
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty() && self.has_http_base_url()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|value| value.trim().is_empty()).unwrap_or(true)
}

fn is_blank_secret(value: Option<&SecretString>) -> bool {
    value.map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true)
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("switchboard.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(corrective_reprompt) = llm.corrective_reprompt {
                self.llm.corrective_reprompt = corrective_reprompt;
            }
        }

        if let Some(calendar) = patch.calendar {
            if let Some(client_id) = calendar.client_id {
                self.calendar.client_id = Some(client_id);
            }
            if let Some(client_secret) = calendar.client_secret {
                self.calendar.client_secret = Some(secret_value(client_secret));
            }
            if let Some(refresh_token) = calendar.refresh_token {
                self.calendar.refresh_token = Some(secret_value(refresh_token));
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(tenant_id) = chat.tenant_id {
                self.chat.tenant_id = Some(tenant_id);
            }
            if let Some(client_id) = chat.client_id {
                self.chat.client_id = Some(client_id);
            }
            if let Some(client_secret) = chat.client_secret {
                self.chat.client_secret = Some(secret_value(client_secret));
            }
        }

        if let Some(internal_api) = patch.internal_api {
            if let Some(base_url) = internal_api.base_url {
                self.internal_api.base_url = Some(base_url);
            }
            if let Some(api_key) = internal_api.api_key {
                self.internal_api.api_key = Some(secret_value(api_key));
            }
        }

        if let Some(retry) = patch.retry {
            if let Some(max_attempts) = retry.max_attempts {
                self.retry.max_attempts = max_attempts;
            }
            if let Some(base_delay_ms) = retry.base_delay_ms {
                self.retry.base_delay_ms = base_delay_ms;
            }
            if let Some(max_jitter_ms) = retry.max_jitter_ms {
                self.retry.max_jitter_ms = max_jitter_ms;
            }
            if let Some(attempt_timeout_secs) = retry.attempt_timeout_secs {
                self.retry.attempt_timeout_secs = Some(attempt_timeout_secs);
            }
            if let Some(deadline_secs) = retry.deadline_secs {
                self.retry.deadline_secs = Some(deadline_secs);
            }
        }

        if let Some(http) = patch.http {
            if let Some(timeout_secs) = http.timeout_secs {
                self.http.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SWITCHBOARD_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env_or_legacy("SWITCHBOARD_LLM_API_KEY", "OPENAI_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SWITCHBOARD_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("SWITCHBOARD_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("SWITCHBOARD_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("SWITCHBOARD_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("SWITCHBOARD_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SWITCHBOARD_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SWITCHBOARD_LLM_CORRECTIVE_REPROMPT") {
            self.llm.corrective_reprompt =
                parse_bool("SWITCHBOARD_LLM_CORRECTIVE_REPROMPT", &value)?;
        }

        if let Some(value) = read_env_or_legacy("SWITCHBOARD_CALENDAR_CLIENT_ID", "GOOGLE_CLIENT_ID")
        {
            self.calendar.client_id = Some(value);
        }
        if let Some(value) =
            read_env_or_legacy("SWITCHBOARD_CALENDAR_CLIENT_SECRET", "GOOGLE_CLIENT_SECRET")
        {
            self.calendar.client_secret = Some(secret_value(value));
        }
        if let Some(value) =
            read_env_or_legacy("SWITCHBOARD_CALENDAR_REFRESH_TOKEN", "GOOGLE_REFRESH_TOKEN")
        {
            self.calendar.refresh_token = Some(secret_value(value));
        }

        if let Some(value) = read_env_or_legacy("SWITCHBOARD_CHAT_TENANT_ID", "TEAMS_TENANT_ID") {
            self.chat.tenant_id = Some(value);
        }
        if let Some(value) = read_env_or_legacy("SWITCHBOARD_CHAT_CLIENT_ID", "TEAMS_CLIENT_ID") {
            self.chat.client_id = Some(value);
        }
        if let Some(value) =
            read_env_or_legacy("SWITCHBOARD_CHAT_CLIENT_SECRET", "TEAMS_CLIENT_SECRET")
        {
            self.chat.client_secret = Some(secret_value(value));
        }

        if let Some(value) =
            read_env_or_legacy("SWITCHBOARD_INTERNAL_API_BASE_URL", "INTERNAL_API_URL")
        {
            self.internal_api.base_url = Some(value);
        }
        if let Some(value) = read_env_or_legacy("SWITCHBOARD_INTERNAL_API_KEY", "INTERNAL_API_KEY")
        {
            self.internal_api.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("SWITCHBOARD_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_u32("SWITCHBOARD_RETRY_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("SWITCHBOARD_RETRY_BASE_DELAY_MS") {
            self.retry.base_delay_ms = parse_u64("SWITCHBOARD_RETRY_BASE_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("SWITCHBOARD_RETRY_MAX_JITTER_MS") {
            self.retry.max_jitter_ms = parse_u64("SWITCHBOARD_RETRY_MAX_JITTER_MS", &value)?;
        }
        if let Some(value) = read_env("SWITCHBOARD_RETRY_ATTEMPT_TIMEOUT_SECS") {
            self.retry.attempt_timeout_secs =
                Some(parse_u64("SWITCHBOARD_RETRY_ATTEMPT_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = read_env("SWITCHBOARD_RETRY_DEADLINE_SECS") {
            self.retry.deadline_secs = Some(parse_u64("SWITCHBOARD_RETRY_DEADLINE_SECS", &value)?);
        }

        if let Some(value) = read_env("SWITCHBOARD_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = parse_u64("SWITCHBOARD_HTTP_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("SWITCHBOARD_LOGGING_LEVEL").or_else(|| read_env("SWITCHBOARD_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SWITCHBOARD_LOGGING_FORMAT").or_else(|| read_env("SWITCHBOARD_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(llm_base_url);
        }
        if let Some(max_attempts) = overrides.retry_max_attempts {
            self.retry.max_attempts = max_attempts;
        }
        if let Some(base_delay_ms) = overrides.retry_base_delay_ms {
            self.retry.base_delay_ms = base_delay_ms;
        }
        if let Some(base_url) = overrides.internal_api_base_url {
            self.internal_api.base_url = Some(base_url);
        }
        if let Some(api_key) = overrides.internal_api_key {
            self.internal_api.api_key = Some(secret_value(api_key));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_retry(&self.retry)?;
        validate_http(&self.http)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("switchboard.toml"), PathBuf::from("config/switchboard.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if let Some(base_url) = &llm.base_url {
        validate_http_url("llm.base_url", base_url)?;
    }

    if llm.provider == LlmProvider::OpenAi && is_blank_secret(llm.api_key.as_ref()) {
        return Err(ConfigError::Validation(
            "llm.api_key is required for the openai provider (set SWITCHBOARD_LLM_API_KEY or OPENAI_API_KEY)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_retry(retry: &RetryConfig) -> Result<(), ConfigError> {
    if retry.max_attempts == 0 || retry.max_attempts > 10 {
        return Err(ConfigError::Validation(
            "retry.max_attempts must be in range 1..=10".to_string(),
        ));
    }

    if retry.base_delay_ms > 60_000 || retry.max_jitter_ms > 60_000 {
        return Err(ConfigError::Validation(
            "retry.base_delay_ms and retry.max_jitter_ms must not exceed 60000".to_string(),
        ));
    }

    if matches!(retry.attempt_timeout_secs, Some(0)) || matches!(retry.deadline_secs, Some(0)) {
        return Err(ConfigError::Validation(
            "retry.attempt_timeout_secs and retry.deadline_secs must be greater than zero"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.timeout_secs == 0 || http.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "http.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_or_legacy(key: &str, legacy_key: &str) -> Option<String> {
    read_env(key).or_else(|| read_env(legacy_key))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    calendar: Option<CalendarPatch>,
    chat: Option<ChatPatch>,
    internal_api: Option<InternalApiPatch>,
    retry: Option<RetryPatch>,
    http: Option<HttpPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    corrective_reprompt: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarPatch {
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InternalApiPatch {
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RetryPatch {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_jitter_ms: Option<u64>,
    attempt_timeout_secs: Option<u64>,
    deadline_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

/// Every environment variable the loader reads, for test isolation and the
/// CLI's source attribution.
pub const ENV_KEYS: &[&str] = &[
    "SWITCHBOARD_LLM_PROVIDER",
    "SWITCHBOARD_LLM_API_KEY",
    "OPENAI_API_KEY",
    "SWITCHBOARD_LLM_BASE_URL",
    "SWITCHBOARD_LLM_MODEL",
    "SWITCHBOARD_LLM_TEMPERATURE",
    "SWITCHBOARD_LLM_TIMEOUT_SECS",
    "SWITCHBOARD_LLM_CORRECTIVE_REPROMPT",
    "SWITCHBOARD_CALENDAR_CLIENT_ID",
    "GOOGLE_CLIENT_ID",
    "SWITCHBOARD_CALENDAR_CLIENT_SECRET",
    "GOOGLE_CLIENT_SECRET",
    "SWITCHBOARD_CALENDAR_REFRESH_TOKEN",
    "GOOGLE_REFRESH_TOKEN",
    "SWITCHBOARD_CHAT_TENANT_ID",
    "TEAMS_TENANT_ID",
    "SWITCHBOARD_CHAT_CLIENT_ID",
    "TEAMS_CLIENT_ID",
    "SWITCHBOARD_CHAT_CLIENT_SECRET",
    "TEAMS_CLIENT_SECRET",
    "SWITCHBOARD_INTERNAL_API_BASE_URL",
    "INTERNAL_API_URL",
    "SWITCHBOARD_INTERNAL_API_KEY",
    "INTERNAL_API_KEY",
    "SWITCHBOARD_RETRY_MAX_ATTEMPTS",
    "SWITCHBOARD_RETRY_BASE_DELAY_MS",
    "SWITCHBOARD_RETRY_MAX_JITTER_MS",
    "SWITCHBOARD_RETRY_ATTEMPT_TIMEOUT_SECS",
    "SWITCHBOARD_RETRY_DEADLINE_SECS",
    "SWITCHBOARD_HTTP_TIMEOUT_SECS",
    "SWITCHBOARD_LOGGING_LEVEL",
    "SWITCHBOARD_LOG_LEVEL",
    "SWITCHBOARD_LOGGING_FORMAT",
    "SWITCHBOARD_LOG_FORMAT",
];
