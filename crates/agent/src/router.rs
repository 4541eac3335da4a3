use std::str::FromStr;

use switchboard_core::envelope::ResultEnvelope;
use switchboard_core::errors::DispatchError;
use switchboard_core::instruction::{Instruction, ServiceTag};
use switchboard_core::retry::RetryPolicy;
use switchboard_integrations::ServiceClients;
use tracing::{info, warn};

use crate::actions::{is_missing, ActionArgs, ActionSpec, ActionTable};

pub struct Router {
    table: ActionTable,
    clients: ServiceClients,
    retry: RetryPolicy,
}

impl Router {
    pub fn new(table: ActionTable, clients: ServiceClients, retry: RetryPolicy) -> Self {
        Self { table, clients, retry }
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    pub fn clients(&self) -> &ServiceClients {
        &self.clients
    }

    fn validate(&self, instruction: &Instruction) -> Result<&'static ActionSpec, DispatchError> {
        let service = ServiceTag::from_str(&instruction.service)
            .map_err(|_| DispatchError::UnknownService(instruction.service.trim().to_string()))?;

        let spec = self.table.lookup(service, &instruction.action).ok_or_else(|| {
            DispatchError::UnknownAction { service, action: instruction.action.trim().to_string() }
        })?;

        if !self.clients.is_configured(service) {
            return Err(DispatchError::ServiceNotConfigured(service));
        }

        if let Some(name) =
            spec.required.iter().find(|name| is_missing(&instruction.parameters, name))
        {
            return Err(DispatchError::MissingParameter((*name).to_string()));
        }

        Ok(spec)
    }

    /// Validates and executes one instruction. Never fails: every outcome is
    /// an envelope.
    pub async fn dispatch(&self, instruction: &Instruction) -> ResultEnvelope {
        let spec = match self.validate(instruction) {
            Ok(spec) => spec,
            Err(error) => {
                warn!(
                    event_name = "dispatch.failed",
                    service = %instruction.service,
                    action = %instruction.action,
                    reason = error.reason_code(),
                    error = %error,
                    "instruction rejected before execution"
                );
                return ResultEnvelope::failure(error.to_string());
            }
        };

        let mut parameters = instruction.parameters.clone();
        for optional in spec.optional {
            if is_missing(&parameters, optional.name) {
                if let Some(default) = optional.default.to_value() {
                    parameters.insert(optional.name.to_string(), default);
                }
            }
        }
        let args = ActionArgs::new(parameters);

        let operation = format!("{}.{}", spec.service, spec.name);
        match self.retry.run(&operation, || (spec.handler)(&self.clients, &args)).await {
            Ok(data) => {
                info!(
                    event_name = "dispatch.completed",
                    service = %spec.service,
                    action = spec.name,
                    result_kind = spec.result_kind,
                    "instruction executed"
                );
                ResultEnvelope::success(spec.result_kind, data)
            }
            Err(error) => {
                warn!(
                    event_name = "dispatch.failed",
                    service = %spec.service,
                    action = spec.name,
                    reason = "service_error",
                    error = %error,
                    "instruction execution failed"
                );
                ResultEnvelope::failure(error.user_message(spec.service))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use switchboard_core::envelope::ResultEnvelope;
    use switchboard_core::errors::ServiceError;
    use switchboard_core::instruction::Instruction;
    use switchboard_core::retry::RetryPolicy;
    use switchboard_core::services::{
        CalendarService, ChatService, ChatTarget, CreateEventRequest, ListChannelsRequest,
        ListEventsRequest, Record, ResolveChannelRequest, SendMessageRequest,
        SendReminderRequest,
    };
    use switchboard_integrations::ServiceClients;

    use super::Router;
    use crate::actions::ActionTable;

    #[derive(Default)]
    struct RecordingCalendar {
        calls: AtomicU32,
        list_requests: Mutex<Vec<ListEventsRequest>>,
        failures_before_success: u32,
    }

    #[async_trait]
    impl CalendarService for RecordingCalendar {
        async fn list_events(
            &self,
            request: &ListEventsRequest,
        ) -> Result<Vec<Record>, ServiceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.list_requests.lock() {
                requests.push(request.clone());
            }
            if call < self.failures_before_success {
                return Err(ServiceError::Unavailable("503".into()));
            }
            let mut event = Map::new();
            event.insert("summary".to_string(), json!("Standup"));
            Ok(vec![event])
        }

        async fn create_event(&self, _: &CreateEventRequest) -> Result<Record, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::Rejected {
                status: Some(400),
                message: "The specified time range is empty.".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingChat {
        calls: AtomicU32,
        sent: Mutex<Vec<SendMessageRequest>>,
    }

    #[async_trait]
    impl ChatService for RecordingChat {
        async fn send_message(&self, request: &SendMessageRequest) -> Result<Record, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(request.clone());
            }
            Ok(Map::new())
        }

        async fn list_channels(
            &self,
            _: &ListChannelsRequest,
        ) -> Result<Vec<Record>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn list_teams(&self) -> Result<Vec<Record>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::Unavailable("connection reset by 10.1.2.3".into()))
        }

        async fn send_reminder(&self, _: &SendReminderRequest) -> Result<Record, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Map::new())
        }

        async fn resolve_channel(
            &self,
            _: &ResolveChannelRequest,
        ) -> Result<Record, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Map::new())
        }
    }

    fn instruction(service: &str, action: &str, parameters: Value) -> Instruction {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Instruction::new(service, action, parameters)
    }

    fn router(calendar: Arc<RecordingCalendar>, chat: Option<Arc<RecordingChat>>) -> Router {
        let mut clients = ServiceClients::default().with_calendar(calendar);
        if let Some(chat) = chat {
            clients = clients.with_chat(chat);
        }
        Router::new(ActionTable::standard(), clients, RetryPolicy::immediate(3))
    }

    #[tokio::test]
    async fn list_events_applies_default_max_results() {
        let calendar = Arc::new(RecordingCalendar::default());
        let envelope = router(calendar.clone(), None)
            .dispatch(&instruction("calendar", "list_events", json!({})))
            .await;

        assert_eq!(
            envelope,
            ResultEnvelope::success("events_list", json!([{"summary": "Standup"}]))
        );
        let requests = calendar.list_requests.lock().expect("requests").clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_results, 10);
    }

    #[tokio::test]
    async fn missing_parameter_stops_before_any_client_call() {
        let chat = Arc::new(RecordingChat::default());
        let envelope = router(Arc::new(RecordingCalendar::default()), Some(chat.clone()))
            .dispatch(&instruction("chat", "send_message", json!({"text": "hello"})))
            .await;

        assert_eq!(envelope, ResultEnvelope::failure("missing parameter: channel"));
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn required_parameters_are_reported_in_declared_order() {
        let chat = Arc::new(RecordingChat::default());
        let envelope = router(Arc::new(RecordingCalendar::default()), Some(chat.clone()))
            .dispatch(&instruction("chat", "send_reminder", json!({"timestamp": "", "text": null})))
            .await;

        assert_eq!(envelope, ResultEnvelope::failure("missing parameter: user"));
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_service_and_action_are_failures() {
        let router = router(Arc::new(RecordingCalendar::default()), None);

        assert_eq!(
            router.dispatch(&instruction("payroll", "run", json!({}))).await,
            ResultEnvelope::failure("unknown service: payroll")
        );
        assert_eq!(
            router.dispatch(&instruction("calendar", "delete_everything", json!({}))).await,
            ResultEnvelope::failure("unknown action for calendar: delete_everything")
        );
    }

    #[tokio::test]
    async fn unconfigured_service_is_reported_without_calls() {
        let envelope = router(Arc::new(RecordingCalendar::default()), None)
            .dispatch(&instruction("teams", "list_teams", json!({})))
            .await;

        assert_eq!(envelope, ResultEnvelope::failure("service not configured: chat"));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calendar =
            Arc::new(RecordingCalendar { failures_before_success: 1, ..Default::default() });
        let envelope = router(calendar.clone(), None)
            .dispatch(&instruction("calendar", "list_events", json!({"max_results": 3})))
            .await;

        assert!(envelope.is_success());
        assert_eq!(calendar.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_hide_transport_detail() {
        let chat = Arc::new(RecordingChat::default());
        let envelope = router(Arc::new(RecordingCalendar::default()), Some(chat.clone()))
            .dispatch(&instruction("chat", "list_teams", json!({})))
            .await;

        assert_eq!(
            envelope,
            ResultEnvelope::failure("chat is temporarily unavailable; please retry shortly")
        );
        assert_eq!(chat.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejected_operation_is_not_retried() {
        let calendar = Arc::new(RecordingCalendar::default());
        let envelope = router(calendar.clone(), None)
            .dispatch(&instruction(
                "calendar",
                "create_event",
                json!({
                    "title": "Sync",
                    "start": "2024-05-02T15:00:00",
                    "end": "2024-05-02T14:00:00"
                }),
            ))
            .await;

        assert_eq!(
            envelope,
            ResultEnvelope::failure(
                "calendar rejected the request: The specified time range is empty."
            )
        );
        assert_eq!(calendar.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_channel_is_an_invalid_parameter_without_calls() {
        let chat = Arc::new(RecordingChat::default());
        let envelope = router(Arc::new(RecordingCalendar::default()), Some(chat.clone()))
            .dispatch(&instruction(
                "chat",
                "send_message",
                json!({"channel": "team/", "text": "hi"}),
            ))
            .await;

        assert_eq!(
            envelope.message(),
            Some("invalid parameter channel: expected `<team_id>/<channel_id>` or a chat id")
        );
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn channel_targets_reach_the_client_parsed() {
        let chat = Arc::new(RecordingChat::default());
        let envelope = router(Arc::new(RecordingCalendar::default()), Some(chat.clone()))
            .dispatch(&instruction(
                "chat",
                "send_message",
                json!({"channel": "team-a/19:general", "text": "release is out"}),
            ))
            .await;

        assert_eq!(envelope.result_kind(), Some("message_sent"));
        let sent = chat.sent.lock().expect("sent").clone();
        assert_eq!(
            sent[0].target,
            ChatTarget::Channel { team_id: "team-a".into(), channel_id: "19:general".into() }
        );
    }
}
