//! Shared HTTP plumbing: client construction and mapping of remote
//! responses onto [`ServiceError`].

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use switchboard_core::errors::ServiceError;
use switchboard_core::services::Record;
use tracing::debug;

pub fn build_client(timeout: Duration) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("switchboard/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| ServiceError::Configuration(format!("http client build failed: {error}")))
}

pub fn transport_error(error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::Unavailable(format!("request timed out: {error}"))
    } else {
        ServiceError::Unavailable(format!("transport failure: {error}"))
    }
}

/// Reads the body and returns it as JSON when the status is 2xx.
///
/// Empty success bodies (204 and friends) come back as `Value::Null`.
pub async fn check_response(response: Response) -> Result<Value, ServiceError> {
    let status = response.status();
    let raw = response.text().await.map_err(transport_error)?;
    let body = if raw.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => value,
            Err(_) if status.is_success() => {
                return Err(ServiceError::Rejected {
                    status: Some(status.as_u16()),
                    message: "response body was not valid JSON".to_string(),
                })
            }
            Err(_) => Value::String(raw),
        }
    };

    if status.is_success() {
        return Ok(body);
    }

    debug!(
        event_name = "integration.http.error_status",
        status = status.as_u16(),
        "remote returned an error status"
    );
    Err(classify_status(status, &body))
}

pub fn classify_status(status: StatusCode, body: &Value) -> ServiceError {
    let code = status.as_u16();
    if code == 408 || code == 429 || status.is_server_error() {
        return ServiceError::Unavailable(format!("remote returned {status}"));
    }

    let message = remote_error_message(body).unwrap_or_else(|| {
        status.canonical_reason().map(str::to_string).unwrap_or_else(|| format!("status {code}"))
    });
    ServiceError::Rejected { status: Some(code), message }
}

fn remote_error_message(body: &Value) -> Option<String> {
    let non_blank = |value: Option<&Value>| {
        value.and_then(Value::as_str).map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
    };

    match body {
        Value::Object(map) => non_blank(map.get("error").and_then(|error| error.get("message")))
            .or_else(|| non_blank(map.get("error_description")))
            .or_else(|| non_blank(map.get("error")))
            .or_else(|| non_blank(map.get("message"))),
        Value::String(text) if !text.trim().is_empty() => {
            Some(text.trim().chars().take(200).collect())
        }
        _ => None,
    }
}

pub fn record_from(value: Value) -> Result<Record, ServiceError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ServiceError::rejected("unexpected response shape")),
    }
}

/// Pulls the record list out of a bare array or an object field named `key`.
/// A missing field is an empty list.
pub fn list_from(value: Value, key: &str) -> Result<Vec<Record>, ServiceError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(ServiceError::rejected("unexpected response shape")),
        },
        Value::Null => Vec::new(),
        _ => return Err(ServiceError::rejected("unexpected response shape")),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

pub(crate) fn required_setting(
    value: Option<&str>,
    name: &'static str,
) -> Result<String, ServiceError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::Configuration(format!("missing {name}")))
}
