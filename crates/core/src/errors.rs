use std::time::Duration;

use thiserror::Error;

use crate::instruction::ServiceTag;
use crate::retry::Transient;

/// Failure of an outbound call to the language model or an integration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("remote operation failed: {message}")]
    Rejected { status: Option<u16>, message: String },
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl ServiceError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected { status: None, message: message.into() }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    /// One-line text that is safe to show an end user. Transport details
    /// stay in the logs.
    pub fn user_message(&self, service: ServiceTag) -> String {
        match self {
            Self::Configuration(_) => format!("service not configured: {service}"),
            Self::Unavailable(_) | Self::DeadlineExceeded(_) => {
                format!("{service} is temporarily unavailable; please retry shortly")
            }
            Self::Rejected { message, .. } => format!("{service} rejected the request: {message}"),
            Self::InvalidParameter { name, reason } => {
                format!("invalid parameter {name}: {reason}")
            }
        }
    }
}

impl Transient for ServiceError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::DeadlineExceeded(_))
    }

    fn deadline_exceeded(limit: Duration) -> Self {
        Self::DeadlineExceeded(limit)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),
    #[error("prompt rendering failed: {0}")]
    Prompt(String),
    #[error(transparent)]
    Upstream(#[from] ServiceError),
}

/// Validation failures inside the router. Display strings are the exact
/// user-facing envelope messages.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("unknown action for {service}: {action}")]
    UnknownAction { service: ServiceTag, action: String },
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    #[error("service not configured: {0}")]
    ServiceNotConfigured(ServiceTag),
}

impl DispatchError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::UnknownService(_) => "unknown_service",
            Self::UnknownAction { .. } => "unknown_action",
            Self::MissingParameter(_) => "missing_parameter",
            Self::ServiceNotConfigured(_) => "service_not_configured",
        }
    }
}
