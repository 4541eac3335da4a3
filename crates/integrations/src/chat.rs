use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use reqwest::{Client, Url};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use switchboard_core::config::ChatConfig;
use switchboard_core::errors::ServiceError;
use switchboard_core::services::{
    ChatService, ChatTarget, ListChannelsRequest, Record, ResolveChannelRequest,
    SendMessageRequest, SendReminderRequest,
};
use tracing::{debug, warn};

use crate::http::{list_from, record_from, required_setting};
use crate::oauth::{microsoft_token_url, Grant, OAuthTokenSource, GRAPH_DEFAULT_SCOPE};

pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
const REMINDER_PREFIX: &str = "⏰ REMINDER:";
const REMINDER_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Microsoft Teams over the Graph API.
pub struct TeamsChatClient {
    http: Client,
    tokens: OAuthTokenSource,
    api_base: String,
}

impl TeamsChatClient {
    pub fn new(http: Client, tokens: OAuthTokenSource, api_base: impl Into<String>) -> Self {
        Self { http, tokens, api_base: api_base.into().trim_end_matches('/').to_string() }
    }

    pub fn from_config(config: &ChatConfig, http: Client) -> Result<Self, ServiceError> {
        let tenant_id = required_setting(config.tenant_id.as_deref(), "chat.tenant_id")?;
        let client_id = required_setting(config.client_id.as_deref(), "chat.client_id")?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|secret| !secret.expose_secret().trim().is_empty())
            .ok_or_else(|| ServiceError::Configuration("missing chat.client_secret".into()))?;

        let tokens = OAuthTokenSource::new(
            http.clone(),
            microsoft_token_url(&tenant_id),
            Grant::ClientCredentials {
                client_id,
                client_secret,
                scope: GRAPH_DEFAULT_SCOPE.to_string(),
            },
        );
        Ok(Self::new(http, tokens, GRAPH_API_BASE))
    }

    /// Joins percent-encoded segments onto the API base.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.api_base).map_err(|error| {
            ServiceError::Configuration(format!(
                "invalid chat api base `{}`: {error}",
                self.api_base
            ))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ServiceError::Configuration(format!("chat api base `{}` has no path", self.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, segments: &[&str]) -> Result<Value, ServiceError> {
        let url = self.endpoint(segments)?;
        self.tokens.send_authorized(|token| self.http.get(url.clone()).bearer_auth(token)).await
    }

    async fn post(&self, segments: &[&str], body: &Value) -> Result<Value, ServiceError> {
        let url = self.endpoint(segments)?;
        self.tokens
            .send_authorized(|token| self.http.post(url.clone()).bearer_auth(token).json(body))
            .await
    }

    async fn team_channels(&self, team_id: &str) -> Result<Vec<Record>, ServiceError> {
        let team_id = path_id("team_id", team_id)?;
        list_from(self.get(&["teams", team_id, "channels"]).await?, "value")
    }
}

/// Identifiers that end up in a Graph path must be a single opaque segment.
pub(crate) fn path_id<'a>(name: &str, value: &'a str) -> Result<&'a str, ServiceError> {
    let value = value.trim();
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value == "." || value == ".." {
        Some("must not be a relative path segment")
    } else if value.contains(['/', '\\', '?', '#', '%']) {
        Some("must not contain `/`, `\\`, `?`, `#` or `%`")
    } else if value.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            warn!(
                event_name = "integration.chat.invalid_id",
                parameter = name,
                reason,
                "identifier rejected before request"
            );
            Err(ServiceError::invalid_parameter(name, reason))
        }
        None => Ok(value),
    }
}

fn text_body(content: String) -> Value {
    json!({ "body": { "content": content, "contentType": "text" } })
}

pub(crate) fn parse_reminder_time(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, REMINDER_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw).map(|parsed| parsed.with_timezone(&Utc)).map_err(|_| {
        ServiceError::invalid_parameter("timestamp", "expected `YYYY-MM-DD HH:MM` or RFC 3339")
    })
}

fn string_field(record: &Record, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl ChatService for TeamsChatClient {
    async fn send_message(&self, request: &SendMessageRequest) -> Result<Record, ServiceError> {
        let body = text_body(request.text.clone());
        let sent = match &request.target {
            ChatTarget::Channel { team_id, channel_id } => {
                let team_id = path_id("channel", team_id)?;
                let channel_id = path_id("channel", channel_id)?;
                self.post(&["teams", team_id, "channels", channel_id, "messages"], &body).await?
            }
            ChatTarget::Chat { chat_id } => {
                let chat_id = path_id("channel", chat_id)?;
                self.post(&["chats", chat_id, "messages"], &body).await?
            }
        };
        record_from(sent)
    }

    async fn list_channels(
        &self,
        request: &ListChannelsRequest,
    ) -> Result<Vec<Record>, ServiceError> {
        if let Some(team_id) = &request.team_id {
            return self.team_channels(team_id).await;
        }

        let mut channels = Vec::new();
        for team in self.list_teams().await? {
            let Some(team_id) = string_field(&team, "id") else {
                continue;
            };
            let team_name = string_field(&team, "displayName").unwrap_or_default();
            let team_channels = self.team_channels(&team_id).await?;
            debug!(
                event_name = "integration.chat.team_channels",
                team_id = %team_id,
                channels = team_channels.len(),
                "listed team channels"
            );
            for mut channel in team_channels {
                channel.insert("teamName".to_string(), json!(team_name));
                channel.insert("teamId".to_string(), json!(team_id));
                channels.push(channel);
            }
        }
        Ok(channels)
    }

    async fn list_teams(&self) -> Result<Vec<Record>, ServiceError> {
        list_from(self.get(&["me", "joinedTeams"]).await?, "value")
    }

    async fn send_reminder(&self, request: &SendReminderRequest) -> Result<Record, ServiceError> {
        let user = path_id("user", &request.user)?;
        let scheduled = parse_reminder_time(&request.timestamp)?;
        let mut body = text_body(format!("{REMINDER_PREFIX} {}", request.text));
        body["scheduledDateTime"] = json!(scheduled.to_rfc3339_opts(SecondsFormat::Secs, true));

        record_from(self.post(&["chats", user, "messages"], &body).await?)
    }

    async fn resolve_channel(
        &self,
        request: &ResolveChannelRequest,
    ) -> Result<Record, ServiceError> {
        let wanted = request.channel_name.trim().to_lowercase();
        let channels = self.team_channels(&request.team_id).await?;

        let found = channels.into_iter().find(|channel| {
            string_field(channel, "displayName")
                .map(|name| name.trim().to_lowercase() == wanted)
                .unwrap_or(false)
        });

        match found {
            Some(channel) => {
                let mut record = Record::new();
                record.insert("team_id".to_string(), json!(request.team_id));
                record.insert("channel_id".to_string(), json!(string_field(&channel, "id")));
                record.insert(
                    "display_name".to_string(),
                    json!(string_field(&channel, "displayName")),
                );
                Ok(record)
            }
            None => Err(ServiceError::rejected(format!(
                "channel not found: {}",
                request.channel_name.trim()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchboard_core::errors::ServiceError;
    use switchboard_core::services::{
        ChatService, ChatTarget, ListChannelsRequest, ResolveChannelRequest, SendMessageRequest,
        SendReminderRequest,
    };
    use wiremock::matchers::{body_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{parse_reminder_time, path_id, TeamsChatClient};
    use crate::oauth::{Grant, OAuthTokenSource, GRAPH_DEFAULT_SCOPE};

    async fn client_for(server: &MockServer) -> TeamsChatClient {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "graph-token", "expires_in": 3600})),
            )
            .mount(server)
            .await;

        let http = reqwest::Client::new();
        let tokens = OAuthTokenSource::new(
            http.clone(),
            format!("{}/token", server.uri()),
            Grant::ClientCredentials {
                client_id: "app".to_string(),
                client_secret: "secret".to_string().into(),
                scope: GRAPH_DEFAULT_SCOPE.to_string(),
            },
        );
        TeamsChatClient::new(http, tokens, server.uri())
    }

    async fn mount_teams(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/me/joinedTeams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"id": "team-a", "displayName": "Engineering"},
                    {"id": "team-b", "displayName": "Sales"}
                ]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/teams/team-a/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": "19:general-a", "displayName": "General"}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/teams/team-b/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"id": "19:general-b", "displayName": "General"},
                    {"id": "19:deals", "displayName": "Deals"}
                ]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn reminder_time_accepts_local_format_and_rfc3339() {
        let short = parse_reminder_time("2024-05-01 09:30").expect("short format");
        assert_eq!(short.to_rfc3339(), "2024-05-01T09:30:00+00:00");

        let full = parse_reminder_time("2024-05-01T11:30:00+02:00").expect("rfc3339");
        assert_eq!(full, short);

        assert!(matches!(
            parse_reminder_time("tomorrow morning"),
            Err(ServiceError::InvalidParameter { name, .. }) if name == "timestamp"
        ));
    }

    #[tokio::test]
    async fn channel_message_posts_to_team_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/teams/team-a/channels/19:general-a/messages"))
            .and(body_json(json!({"body": {"content": "deploy done", "contentType": "text"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "msg-1"})))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let sent = client
            .send_message(&SendMessageRequest {
                target: ChatTarget::Channel {
                    team_id: "team-a".to_string(),
                    channel_id: "19:general-a".to_string(),
                },
                text: "deploy done".to_string(),
            })
            .await
            .expect("sent");

        assert_eq!(sent["id"], json!("msg-1"));
    }

    #[tokio::test]
    async fn listing_without_team_walks_every_joined_team() {
        let server = MockServer::start().await;
        mount_teams(&server).await;
        let client = client_for(&server).await;

        let channels =
            client.list_channels(&ListChannelsRequest::default()).await.expect("channels");

        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0]["teamName"], json!("Engineering"));
        assert_eq!(channels[2]["teamId"], json!("team-b"));
        assert_eq!(channels[2]["displayName"], json!("Deals"));
    }

    #[tokio::test]
    async fn reminder_is_prefixed_and_scheduled_in_utc() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chats/user-42/messages"))
            .and(body_json(json!({
                "body": {"content": "⏰ REMINDER: submit report", "contentType": "text"},
                "scheduledDateTime": "2024-05-01T09:30:00Z"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "msg-2"})))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        client
            .send_reminder(&SendReminderRequest {
                user: "user-42".to_string(),
                text: "submit report".to_string(),
                timestamp: "2024-05-01 09:30".to_string(),
            })
            .await
            .expect("reminder");
    }

    #[tokio::test]
    async fn resolve_channel_matches_display_name_case_insensitively() {
        let server = MockServer::start().await;
        mount_teams(&server).await;
        let client = client_for(&server).await;

        let resolved = client
            .resolve_channel(&ResolveChannelRequest {
                team_id: "team-b".to_string(),
                channel_name: "deals".to_string(),
            })
            .await
            .expect("resolved");
        assert_eq!(resolved["channel_id"], json!("19:deals"));

        let missing = client
            .resolve_channel(&ResolveChannelRequest {
                team_id: "team-b".to_string(),
                channel_name: "random".to_string(),
            })
            .await;
        assert_eq!(missing, Err(ServiceError::rejected("channel not found: random")));
    }

    #[test]
    fn path_ids_must_be_a_single_segment() {
        assert_eq!(path_id("user", " user-42 "), Ok("user-42"));
        assert_eq!(path_id("channel", "19:abc@thread.tacv2"), Ok("19:abc@thread.tacv2"));

        for hostile in ["..", ".", "", "a/b", "chat?x=1", "chat#frag", "%2e%2e", "a\\b", "a\nb"] {
            assert!(
                matches!(path_id("user", hostile), Err(ServiceError::InvalidParameter { .. })),
                "accepted {hostile:?}"
            );
        }
    }

    #[tokio::test]
    async fn traversal_in_model_supplied_ids_never_reaches_graph() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex("/messages$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "hijacked"})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("/channels$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(0)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let reminder = client
            .send_reminder(&SendReminderRequest {
                user: "../teams/secret-team/channels/general".to_string(),
                text: "hi".to_string(),
                timestamp: "2024-05-01 09:30".to_string(),
            })
            .await;
        assert!(matches!(
            reminder,
            Err(ServiceError::InvalidParameter { ref name, .. }) if name == "user"
        ));

        let message = client
            .send_message(&SendMessageRequest {
                target: ChatTarget::Chat { chat_id: "..".to_string() },
                text: "hi".to_string(),
            })
            .await;
        assert!(matches!(
            message,
            Err(ServiceError::InvalidParameter { ref name, .. }) if name == "channel"
        ));

        let channels = client
            .list_channels(&ListChannelsRequest { team_id: Some("team-a?$top=999".to_string()) })
            .await;
        assert!(matches!(
            channels,
            Err(ServiceError::InvalidParameter { ref name, .. }) if name == "team_id"
        ));
    }

    #[tokio::test]
    async fn chat_ids_are_percent_encoded_as_one_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chats/19:meeting%20room@thread.v2/messages"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "msg-3"})))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let sent = client
            .send_message(&SendMessageRequest {
                target: ChatTarget::Chat { chat_id: "19:meeting room@thread.v2".to_string() },
                text: "hi".to_string(),
            })
            .await
            .expect("sent");

        assert_eq!(sent["id"], json!("msg-3"));
    }
}
