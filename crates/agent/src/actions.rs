//! The closed catalog of `(service, action)` pairs the router accepts.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::{json, Value};
use switchboard_core::errors::ServiceError;
use switchboard_core::instruction::{Parameters, ServiceTag};
use switchboard_core::services::{
    CalendarService, ChatService, ChatTarget, CreateEventRequest, CreateTaskRequest,
    FindEmployeeRequest, FindProjectsRequest, InternalApiService, ListChannelsRequest,
    ListEventsRequest, Record, ResolveChannelRequest, SendMessageRequest, SendReminderRequest,
};
use switchboard_integrations::ServiceClients;

pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ServiceError>> + Send + 'a>>;
pub type ActionHandler = for<'a> fn(&'a ServiceClients, &'a ActionArgs) -> ActionFuture<'a>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamDefault {
    None,
    Integer(i64),
}

impl ParamDefault {
    pub fn to_value(self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Integer(value) => Some(json!(value)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OptionalParam {
    pub name: &'static str,
    pub default: ParamDefault,
}

const fn optional(name: &'static str) -> OptionalParam {
    OptionalParam { name, default: ParamDefault::None }
}

pub struct ActionSpec {
    pub service: ServiceTag,
    pub name: &'static str,
    /// Checked in this order; the first missing one is reported.
    pub required: &'static [&'static str],
    pub optional: &'static [OptionalParam],
    pub result_kind: &'static str,
    pub summary: &'static str,
    pub handler: ActionHandler,
}

impl std::fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSpec")
            .field("service", &self.service)
            .field("name", &self.name)
            .field("result_kind", &self.result_kind)
            .finish_non_exhaustive()
    }
}

/// Serializable view of one action, used for the prompt and the CLI listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub service: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
    pub required: Vec<&'static str>,
    pub optional: Vec<String>,
    pub result_kind: &'static str,
}

static STANDARD_ACTIONS: [ActionSpec; 10] = [
    ActionSpec {
        service: ServiceTag::Calendar,
        name: "list_events",
        required: &[],
        optional: &[
            OptionalParam { name: "max_results", default: ParamDefault::Integer(10) },
            optional("time_min"),
            optional("time_max"),
        ],
        result_kind: "events_list",
        summary: "list upcoming calendar events (defaults to the next 7 days)",
        handler: list_events,
    },
    ActionSpec {
        service: ServiceTag::Calendar,
        name: "create_event",
        required: &["title", "start", "end"],
        optional: &[optional("description"), optional("attendees")],
        result_kind: "event_created",
        summary: "create a calendar event; start and end in ISO 8601, attendees as emails",
        handler: create_event,
    },
    ActionSpec {
        service: ServiceTag::Chat,
        name: "send_message",
        required: &["channel", "text"],
        optional: &[],
        result_kind: "message_sent",
        summary: "post a message; channel is `team_id/channel_id` or a chat id",
        handler: send_message,
    },
    ActionSpec {
        service: ServiceTag::Chat,
        name: "list_channels",
        required: &[],
        optional: &[optional("team_id")],
        result_kind: "channels_list",
        summary: "list channels of one team, or of every joined team",
        handler: list_channels,
    },
    ActionSpec {
        service: ServiceTag::Chat,
        name: "list_teams",
        required: &[],
        optional: &[],
        result_kind: "teams_list",
        summary: "list the teams the account belongs to",
        handler: list_teams,
    },
    ActionSpec {
        service: ServiceTag::Chat,
        name: "send_reminder",
        required: &["user", "text", "timestamp"],
        optional: &[],
        result_kind: "reminder_sent",
        summary: "schedule a reminder to a user; timestamp as YYYY-MM-DD HH:MM (UTC)",
        handler: send_reminder,
    },
    ActionSpec {
        service: ServiceTag::Chat,
        name: "resolve_channel",
        required: &["team_id", "channel_name"],
        optional: &[],
        result_kind: "channel_resolved",
        summary: "find a channel id by its display name within a team",
        handler: resolve_channel,
    },
    ActionSpec {
        service: ServiceTag::InternalApi,
        name: "find_projects",
        required: &[],
        optional: &[optional("status"), optional("department")],
        result_kind: "projects_list",
        summary: "search company projects by status and department",
        handler: find_projects,
    },
    ActionSpec {
        service: ServiceTag::InternalApi,
        name: "find_employee",
        required: &[],
        optional: &[optional("id"), optional("email")],
        result_kind: "employee_record",
        summary: "look up an employee by id or email",
        handler: find_employee,
    },
    ActionSpec {
        service: ServiceTag::InternalApi,
        name: "create_task",
        required: &["project_id", "title", "description", "assignee_id", "due_date"],
        optional: &[],
        result_kind: "task_created",
        summary: "create a task in a project; due_date as YYYY-MM-DD",
        handler: create_task,
    },
];

pub struct ActionTable {
    specs: &'static [ActionSpec],
    index: HashMap<ServiceTag, HashMap<&'static str, &'static ActionSpec>>,
}

impl ActionTable {
    pub fn standard() -> Self {
        Self::from_specs(&STANDARD_ACTIONS)
    }

    pub fn from_specs(specs: &'static [ActionSpec]) -> Self {
        let mut index: HashMap<ServiceTag, HashMap<&'static str, &'static ActionSpec>> =
            HashMap::new();
        for spec in specs {
            index.entry(spec.service).or_default().insert(spec.name, spec);
        }
        Self { specs, index }
    }

    pub fn lookup(&self, service: ServiceTag, action: &str) -> Option<&'static ActionSpec> {
        self.index.get(&service).and_then(|actions| actions.get(action.trim())).copied()
    }

    pub fn specs(&self) -> &'static [ActionSpec] {
        self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.specs
            .iter()
            .map(|spec| CatalogEntry {
                service: spec.service.as_str(),
                name: spec.name,
                summary: spec.summary,
                required: spec.required.to_vec(),
                optional: spec
                    .optional
                    .iter()
                    .map(|param| match param.default.to_value() {
                        Some(default) => format!("{} (default {default})", param.name),
                        None => param.name.to_string(),
                    })
                    .collect(),
                result_kind: spec.result_kind,
            })
            .collect()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// `null`, blank strings and absent keys all count as missing.
pub fn is_missing(parameters: &Parameters, name: &str) -> bool {
    match parameters.get(name) {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Typed view over an instruction's parameters after defaults are merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionArgs {
    parameters: Parameters,
}

impl ActionArgs {
    pub fn new(parameters: Parameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        if is_missing(&self.parameters, name) {
            None
        } else {
            self.parameters.get(name)
        }
    }

    pub fn string(&self, name: &str) -> Result<Option<String>, ServiceError> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.trim().to_string())),
            Some(Value::Number(number)) => Ok(Some(number.to_string())),
            Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
            Some(_) => Err(ServiceError::invalid_parameter(name, "expected a string")),
        }
    }

    pub fn required_string(&self, name: &str) -> Result<String, ServiceError> {
        self.string(name)?.ok_or_else(|| ServiceError::invalid_parameter(name, "value is required"))
    }

    pub fn required_value(&self, name: &str) -> Result<Value, ServiceError> {
        self.value(name)
            .cloned()
            .ok_or_else(|| ServiceError::invalid_parameter(name, "value is required"))
    }

    pub fn u32_or(&self, name: &str, default: u32) -> Result<u32, ServiceError> {
        let parsed = match self.value(name) {
            None => return Ok(default),
            Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(Value::String(text)) => text.trim().parse::<u32>().ok(),
            Some(_) => None,
        };
        match parsed {
            Some(0) | None => Err(ServiceError::invalid_parameter(name, "expected a positive integer")),
            Some(value) => Ok(value),
        }
    }

    /// Accepts a JSON array of strings or one comma-separated string.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ServiceError> {
        match self.value(name) {
            None => Ok(Vec::new()),
            Some(Value::String(text)) => Ok(text
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Ok(text.trim().to_string()),
                    _ => Err(ServiceError::invalid_parameter(name, "expected a list of strings")),
                })
                .filter(|item| item.as_ref().map(|text| !text.is_empty()).unwrap_or(true))
                .collect(),
            Some(_) => Err(ServiceError::invalid_parameter(name, "expected a list of strings")),
        }
    }
}

fn calendar(clients: &ServiceClients) -> Result<&dyn CalendarService, ServiceError> {
    clients
        .calendar
        .as_deref()
        .ok_or_else(|| ServiceError::Configuration("calendar client is not configured".into()))
}

fn chat(clients: &ServiceClients) -> Result<&dyn ChatService, ServiceError> {
    clients
        .chat
        .as_deref()
        .ok_or_else(|| ServiceError::Configuration("chat client is not configured".into()))
}

fn internal_api(clients: &ServiceClients) -> Result<&dyn InternalApiService, ServiceError> {
    clients
        .internal_api
        .as_deref()
        .ok_or_else(|| ServiceError::Configuration("internal api client is not configured".into()))
}

fn records(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

fn list_events<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = ListEventsRequest {
            max_results: args.u32_or("max_results", 10)?,
            time_min: args.string("time_min")?,
            time_max: args.string("time_max")?,
        };
        Ok(records(calendar(clients)?.list_events(&request).await?))
    })
}

fn create_event<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = CreateEventRequest {
            title: args.required_string("title")?,
            start: args.required_string("start")?,
            end: args.required_string("end")?,
            description: args.string("description")?,
            attendees: args.string_list("attendees")?,
        };
        Ok(Value::Object(calendar(clients)?.create_event(&request).await?))
    })
}

fn send_message<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = SendMessageRequest {
            target: ChatTarget::parse(&args.required_string("channel")?)?,
            text: args.required_string("text")?,
        };
        Ok(Value::Object(chat(clients)?.send_message(&request).await?))
    })
}

fn list_channels<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = ListChannelsRequest { team_id: args.string("team_id")? };
        Ok(records(chat(clients)?.list_channels(&request).await?))
    })
}

fn list_teams<'a>(clients: &'a ServiceClients, _args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move { Ok(records(chat(clients)?.list_teams().await?)) })
}

fn send_reminder<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = SendReminderRequest {
            user: args.required_string("user")?,
            text: args.required_string("text")?,
            timestamp: args.required_string("timestamp")?,
        };
        Ok(Value::Object(chat(clients)?.send_reminder(&request).await?))
    })
}

fn resolve_channel<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = ResolveChannelRequest {
            team_id: args.required_string("team_id")?,
            channel_name: args.required_string("channel_name")?,
        };
        Ok(Value::Object(chat(clients)?.resolve_channel(&request).await?))
    })
}

fn find_projects<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = FindProjectsRequest {
            status: args.string("status")?,
            department: args.string("department")?,
        };
        Ok(records(internal_api(clients)?.find_projects(&request).await?))
    })
}

fn find_employee<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request =
            FindEmployeeRequest { id: args.value("id").cloned(), email: args.string("email")? };
        Ok(Value::Object(internal_api(clients)?.find_employee(&request).await?))
    })
}

fn create_task<'a>(clients: &'a ServiceClients, args: &'a ActionArgs) -> ActionFuture<'a> {
    Box::pin(async move {
        let request = CreateTaskRequest {
            project_id: args.required_value("project_id")?,
            title: args.required_string("title")?,
            description: args.required_string("description")?,
            assignee_id: args.required_value("assignee_id")?,
            due_date: args.required_string("due_date")?,
        };
        Ok(Value::Object(internal_api(clients)?.create_task(&request).await?))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};
    use switchboard_core::errors::ServiceError;
    use switchboard_core::instruction::ServiceTag;

    use super::{is_missing, ActionArgs, ActionTable};

    fn args(value: Value) -> ActionArgs {
        match value {
            Value::Object(map) => ActionArgs::new(map),
            _ => ActionArgs::new(Map::new()),
        }
    }

    #[test]
    fn standard_table_indexes_every_pair() {
        let table = ActionTable::standard();
        assert_eq!(table.len(), 10);

        for spec in table.specs() {
            let found = table.lookup(spec.service, spec.name).expect("indexed");
            assert_eq!(found.result_kind, spec.result_kind);
        }

        assert!(table.lookup(ServiceTag::Calendar, "send_message").is_none());
        assert_eq!(
            table.lookup(ServiceTag::Chat, "send_reminder").map(|spec| spec.required),
            Some(&["user", "text", "timestamp"][..])
        );
    }

    #[test]
    fn catalog_shows_defaults() {
        let catalog = ActionTable::standard().catalog();
        let list_events = catalog
            .iter()
            .find(|entry| entry.name == "list_events")
            .expect("list_events in catalog");

        assert_eq!(list_events.service, "calendar");
        assert_eq!(list_events.optional[0], "max_results (default 10)");
    }

    #[test]
    fn null_and_blank_values_count_as_missing() {
        let parameters = args(json!({"a": null, "b": "  ", "c": 0, "d": "x"}));
        let map = parameters.parameters();

        assert!(is_missing(map, "a"));
        assert!(is_missing(map, "b"));
        assert!(!is_missing(map, "c"));
        assert!(!is_missing(map, "d"));
        assert!(is_missing(map, "absent"));
    }

    #[test]
    fn typed_accessors_reject_wrong_shapes() {
        let parameters = args(json!({
            "max_results": "25",
            "bad_count": -3,
            "attendees": "ana@example.com, bo@example.com",
            "tags": [1, 2],
            "title": {"nested": true}
        }));

        assert_eq!(parameters.u32_or("max_results", 10), Ok(25));
        assert_eq!(parameters.u32_or("absent", 10), Ok(10));
        assert!(matches!(
            parameters.u32_or("bad_count", 10),
            Err(ServiceError::InvalidParameter { .. })
        ));
        assert_eq!(
            parameters.string_list("attendees"),
            Ok(vec!["ana@example.com".to_string(), "bo@example.com".to_string()])
        );
        assert!(parameters.string_list("tags").is_err());
        assert!(parameters.required_string("title").is_err());
    }
}
