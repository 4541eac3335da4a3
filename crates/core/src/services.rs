//! Capability interfaces over the external integrations.
//!
//! Each trait is a closed set of operations. Implementations make a single
//! outbound attempt per call and report failures as [`ServiceError`]; the
//! router owns retries.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// One record as returned by a remote service.
pub type Record = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEventsRequest {
    pub max_results: u32,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
}

impl Default for ListEventsRequest {
    fn default() -> Self {
        Self { max_results: 10, time_min: None, time_max: None }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateEventRequest {
    pub title: String,
    pub start: String,
    pub end: String,
    pub description: Option<String>,
    pub attendees: Vec<String>,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn list_events(&self, request: &ListEventsRequest) -> Result<Vec<Record>, ServiceError>;
    async fn create_event(&self, request: &CreateEventRequest) -> Result<Record, ServiceError>;
}

/// Destination of a chat message: `team_id/channel_id` or a bare chat id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatTarget {
    Channel { team_id: String, channel_id: String },
    Chat { chat_id: String },
}

impl ChatTarget {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let raw = raw.trim();
        match raw.split_once('/') {
            Some((team_id, channel_id)) => {
                let team_id = team_id.trim();
                let channel_id = channel_id.trim();
                if team_id.is_empty() || channel_id.is_empty() || channel_id.contains('/') {
                    return Err(ServiceError::invalid_parameter(
                        "channel",
                        "expected `<team_id>/<channel_id>` or a chat id",
                    ));
                }
                Ok(Self::Channel { team_id: team_id.to_owned(), channel_id: channel_id.to_owned() })
            }
            None if raw.is_empty() => {
                Err(ServiceError::invalid_parameter("channel", "target must not be empty"))
            }
            None => Ok(Self::Chat { chat_id: raw.to_owned() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub target: ChatTarget,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListChannelsRequest {
    pub team_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendReminderRequest {
    pub user: String,
    pub text: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveChannelRequest {
    pub team_id: String,
    pub channel_name: String,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send_message(&self, request: &SendMessageRequest) -> Result<Record, ServiceError>;
    async fn list_channels(
        &self,
        request: &ListChannelsRequest,
    ) -> Result<Vec<Record>, ServiceError>;
    async fn list_teams(&self) -> Result<Vec<Record>, ServiceError>;
    async fn send_reminder(&self, request: &SendReminderRequest) -> Result<Record, ServiceError>;
    async fn resolve_channel(
        &self,
        request: &ResolveChannelRequest,
    ) -> Result<Record, ServiceError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindProjectsRequest {
    pub status: Option<String>,
    pub department: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindEmployeeRequest {
    pub id: Option<Value>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTaskRequest {
    pub project_id: Value,
    pub title: String,
    pub description: String,
    pub assignee_id: Value,
    pub due_date: String,
}

#[async_trait]
pub trait InternalApiService: Send + Sync {
    async fn find_projects(
        &self,
        request: &FindProjectsRequest,
    ) -> Result<Vec<Record>, ServiceError>;
    async fn find_employee(&self, request: &FindEmployeeRequest) -> Result<Record, ServiceError>;
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Record, ServiceError>;
}
