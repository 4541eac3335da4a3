//! Non-interactive OAuth 2.0 token exchange with an in-memory cache.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use switchboard_core::errors::ServiceError;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::http::{check_response, transport_error};

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_LIFETIME_SECS: u64 = 3600;

pub fn microsoft_token_url(tenant_id: &str) -> String {
    format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token")
}

#[derive(Clone, Debug)]
pub enum Grant {
    RefreshToken { client_id: String, client_secret: SecretString, refresh_token: SecretString },
    ClientCredentials { client_id: String, client_secret: SecretString, scope: String },
}

impl Grant {
    fn kind(&self) -> &'static str {
        match self {
            Self::RefreshToken { .. } => "refresh_token",
            Self::ClientCredentials { .. } => "client_credentials",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: SecretString,
    refresh_at: Instant,
}

pub struct OAuthTokenSource {
    http: Client,
    token_url: String,
    grant: Grant,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuthTokenSource {
    pub fn new(http: Client, token_url: impl Into<String>, grant: Grant) -> Self {
        Self { http, token_url: token_url.into(), grant, cached: Mutex::new(None) }
    }

    /// Returns a cached access token, exchanging a new one when the cache is
    /// empty or within a minute of expiry.
    pub async fn access_token(&self) -> Result<SecretString, ServiceError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let response = self.exchange().await?;
        let lifetime = Duration::from_secs(response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS));
        let access_token: SecretString = response.access_token.into();
        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });
        debug!(
            event_name = "integration.oauth.token_refreshed",
            grant = self.grant.kind(),
            lifetime_secs = lifetime.as_secs(),
            "access token refreshed"
        );
        Ok(access_token)
    }

    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Sends the request produced by `build` with the current bearer token.
    /// A 401 means the cached token was revoked: it is dropped and the
    /// request goes out once more with a freshly exchanged token.
    pub async fn send_authorized<F>(&self, build: F) -> Result<Value, ServiceError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.access_token().await?;
        let response = build(token.expose_secret()).send().await.map_err(transport_error)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_response(response).await;
        }

        warn!(
            event_name = "integration.oauth.token_rejected",
            grant = self.grant.kind(),
            "cached access token rejected; exchanging a new one"
        );
        self.invalidate().await;
        let token = self.access_token().await?;
        let response = build(token.expose_secret()).send().await.map_err(transport_error)?;
        check_response(response).await
    }

    async fn exchange(&self) -> Result<TokenResponse, ServiceError> {
        let request = self.http.post(&self.token_url);
        let request = match &self.grant {
            Grant::RefreshToken { client_id, client_secret, refresh_token } => request.form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.expose_secret()),
                ("refresh_token", refresh_token.expose_secret()),
            ]),
            Grant::ClientCredentials { client_id, client_secret, scope } => request.form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.expose_secret()),
                ("scope", scope.as_str()),
            ]),
        };

        let response = request.send().await.map_err(|error| {
            warn!(
                event_name = "integration.oauth.exchange_failed",
                grant = self.grant.kind(),
                error = %error,
                "token exchange request failed"
            );
            transport_error(error)
        })?;
        let body = check_response(response).await?;

        let token: TokenResponse = serde_json::from_value(body).map_err(|error| {
            ServiceError::rejected(format!("failed to decode token response: {error}"))
        })?;
        if token.access_token.trim().is_empty() {
            return Err(ServiceError::rejected("token endpoint returned empty access token"));
        }
        Ok(token)
    }
}
