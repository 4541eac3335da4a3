//! HTTP-backed implementations of the service capability traits.

pub mod calendar;
pub mod chat;
pub mod http;
pub mod internal_api;
pub mod oauth;

use std::sync::Arc;
use std::time::Duration;

use switchboard_core::config::AppConfig;
use switchboard_core::errors::ServiceError;
use switchboard_core::instruction::ServiceTag;
use switchboard_core::services::{CalendarService, ChatService, InternalApiService};
use tracing::{info, warn};

pub use calendar::GoogleCalendarClient;
pub use chat::TeamsChatClient;
pub use internal_api::InternalApiClient;

/// The integrations available to the router. Absent entries are services
/// whose credentials were not configured.
#[derive(Clone, Default)]
pub struct ServiceClients {
    pub calendar: Option<Arc<dyn CalendarService>>,
    pub chat: Option<Arc<dyn ChatService>>,
    pub internal_api: Option<Arc<dyn InternalApiService>>,
}

impl ServiceClients {
    /// Builds every integration whose credentials are present. Missing
    /// credentials disable that integration only.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let http = http::build_client(Duration::from_secs(config.http.timeout_secs))?;
        let mut clients = Self::default();

        match GoogleCalendarClient::from_config(&config.calendar, http.clone()) {
            Ok(client) => clients.calendar = Some(Arc::new(client)),
            Err(error) => skipped(ServiceTag::Calendar, &error),
        }
        match TeamsChatClient::from_config(&config.chat, http.clone()) {
            Ok(client) => clients.chat = Some(Arc::new(client)),
            Err(error) => skipped(ServiceTag::Chat, &error),
        }
        match InternalApiClient::from_config(&config.internal_api, http) {
            Ok(client) => clients.internal_api = Some(Arc::new(client)),
            Err(error) => skipped(ServiceTag::InternalApi, &error),
        }

        info!(
            event_name = "integration.clients.ready",
            configured = ?clients.configured(),
            "service clients initialized"
        );
        Ok(clients)
    }

    pub fn with_calendar(mut self, client: Arc<dyn CalendarService>) -> Self {
        self.calendar = Some(client);
        self
    }

    pub fn with_chat(mut self, client: Arc<dyn ChatService>) -> Self {
        self.chat = Some(client);
        self
    }

    pub fn with_internal_api(mut self, client: Arc<dyn InternalApiService>) -> Self {
        self.internal_api = Some(client);
        self
    }

    pub fn is_configured(&self, service: ServiceTag) -> bool {
        match service {
            ServiceTag::Calendar => self.calendar.is_some(),
            ServiceTag::Chat => self.chat.is_some(),
            ServiceTag::InternalApi => self.internal_api.is_some(),
        }
    }

    pub fn configured(&self) -> Vec<ServiceTag> {
        ServiceTag::ALL.into_iter().filter(|service| self.is_configured(*service)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.configured().is_empty()
    }
}

fn skipped(service: ServiceTag, error: &ServiceError) {
    warn!(
        event_name = "integration.clients.skipped",
        service = %service,
        reason = %error,
        "integration disabled"
    );
}
