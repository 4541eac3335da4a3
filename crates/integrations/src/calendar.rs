use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::{json, Map, Value};
use switchboard_core::config::CalendarConfig;
use switchboard_core::errors::ServiceError;
use switchboard_core::services::{CalendarService, CreateEventRequest, ListEventsRequest, Record};

use crate::http::{list_from, record_from, required_setting};
use crate::oauth::{Grant, OAuthTokenSource, GOOGLE_TOKEN_URL};

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const PRIMARY_CALENDAR: &str = "primary";
const DEFAULT_WINDOW_DAYS: i64 = 7;

pub struct GoogleCalendarClient {
    http: Client,
    tokens: OAuthTokenSource,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(http: Client, tokens: OAuthTokenSource, api_base: impl Into<String>) -> Self {
        Self { http, tokens, api_base: api_base.into().trim_end_matches('/').to_string() }
    }

    pub fn from_config(config: &CalendarConfig, http: Client) -> Result<Self, ServiceError> {
        let client_id = required_setting(config.client_id.as_deref(), "calendar.client_id")?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|secret| !secret.expose_secret().trim().is_empty())
            .ok_or_else(|| ServiceError::Configuration("missing calendar.client_secret".into()))?;
        let refresh_token = config
            .refresh_token
            .clone()
            .filter(|token| !token.expose_secret().trim().is_empty())
            .ok_or_else(|| ServiceError::Configuration("missing calendar.refresh_token".into()))?;

        let tokens = OAuthTokenSource::new(
            http.clone(),
            GOOGLE_TOKEN_URL,
            Grant::RefreshToken { client_id, client_secret, refresh_token },
        );
        Ok(Self::new(http, tokens, CALENDAR_API_BASE))
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{PRIMARY_CALENDAR}/events", self.api_base)
    }
}

fn rfc3339_now_plus(days: i64) -> String {
    (Utc::now() + ChronoDuration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn event_body(request: &CreateEventRequest) -> Value {
    let mut body = Map::new();
    body.insert("summary".to_string(), json!(request.title));
    body.insert("start".to_string(), json!({"dateTime": request.start, "timeZone": "UTC"}));
    body.insert("end".to_string(), json!({"dateTime": request.end, "timeZone": "UTC"}));
    if let Some(description) = &request.description {
        body.insert("description".to_string(), json!(description));
    }
    if !request.attendees.is_empty() {
        let attendees =
            request.attendees.iter().map(|email| json!({ "email": email })).collect::<Vec<_>>();
        body.insert("attendees".to_string(), Value::Array(attendees));
    }
    Value::Object(body)
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn list_events(&self, request: &ListEventsRequest) -> Result<Vec<Record>, ServiceError> {
        let time_min = request.time_min.clone().unwrap_or_else(|| rfc3339_now_plus(0));
        let time_max =
            request.time_max.clone().unwrap_or_else(|| rfc3339_now_plus(DEFAULT_WINDOW_DAYS));
        let max_results = request.max_results.to_string();
        let url = self.events_url();

        let body = self
            .tokens
            .send_authorized(|token| {
                self.http.get(&url).bearer_auth(token).query(&[
                    ("timeMin", time_min.as_str()),
                    ("timeMax", time_max.as_str()),
                    ("maxResults", max_results.as_str()),
                    ("singleEvents", "true"),
                    ("orderBy", "startTime"),
                ])
            })
            .await?;

        list_from(body, "items")
    }

    async fn create_event(&self, request: &CreateEventRequest) -> Result<Record, ServiceError> {
        let url = self.events_url();
        let event = event_body(request);

        let body = self
            .tokens
            .send_authorized(|token| {
                self.http
                    .post(&url)
                    .bearer_auth(token)
                    .query(&[("sendUpdates", "all")])
                    .json(&event)
            })
            .await?;

        record_from(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchboard_core::config::CalendarConfig;
    use switchboard_core::errors::ServiceError;
    use switchboard_core::services::{CalendarService, CreateEventRequest, ListEventsRequest};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{event_body, GoogleCalendarClient};
    use crate::oauth::{Grant, OAuthTokenSource};

    async fn client_for(server: &MockServer) -> GoogleCalendarClient {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "cal-token", "expires_in": 3600})),
            )
            .mount(server)
            .await;

        let http = reqwest::Client::new();
        let tokens = OAuthTokenSource::new(
            http.clone(),
            format!("{}/token", server.uri()),
            Grant::RefreshToken {
                client_id: "client".to_string(),
                client_secret: "secret".to_string().into(),
                refresh_token: "refresh".to_string().into(),
            },
        );
        GoogleCalendarClient::new(http, tokens, server.uri())
    }

    #[test]
    fn from_config_requires_every_credential() {
        let config = CalendarConfig {
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string().into()),
            refresh_token: None,
        };

        assert!(matches!(
            GoogleCalendarClient::from_config(&config, reqwest::Client::new()),
            Err(ServiceError::Configuration(message)) if message.contains("refresh_token")
        ));
    }

    #[test]
    fn event_body_uses_utc_and_attendee_objects() {
        let body = event_body(&CreateEventRequest {
            title: "Planning".to_string(),
            start: "2024-05-02T14:00:00".to_string(),
            end: "2024-05-02T15:00:00".to_string(),
            description: None,
            attendees: vec!["ana@example.com".to_string()],
        });

        assert_eq!(body["start"], json!({"dateTime": "2024-05-02T14:00:00", "timeZone": "UTC"}));
        assert_eq!(body["attendees"], json!([{"email": "ana@example.com"}]));
        assert!(body.get("description").is_none());
    }

    #[tokio::test]
    async fn list_events_sends_window_and_returns_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer cal-token"))
            .and(query_param("maxResults", "5"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("timeMin", "2024-05-01T00:00:00Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"summary": "Standup", "start": {"dateTime": "2024-05-01T09:00:00Z"}}]
            })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let events = client
            .list_events(&ListEventsRequest {
                max_results: 5,
                time_min: Some("2024-05-01T00:00:00Z".to_string()),
                time_max: None,
            })
            .await
            .expect("events");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["summary"], json!("Standup"));
    }

    #[tokio::test]
    async fn create_event_notifies_attendees() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(query_param("sendUpdates", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "evt-1",
                "summary": "Planning",
                "htmlLink": "https://calendar.google.com/event?eid=evt-1"
            })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let created = client
            .create_event(&CreateEventRequest {
                title: "Planning".to_string(),
                start: "2024-05-02T14:00:00".to_string(),
                end: "2024-05-02T15:00:00".to_string(),
                ..CreateEventRequest::default()
            })
            .await
            .expect("created");

        assert_eq!(created["id"], json!("evt-1"));
    }

    #[tokio::test]
    async fn server_errors_are_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        assert!(matches!(
            client.list_events(&ListEventsRequest::default()).await,
            Err(ServiceError::Unavailable(_))
        ));
    }
}
