pub mod config;
pub mod envelope;
pub mod errors;
pub mod instruction;
pub mod retry;
pub mod services;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use envelope::ResultEnvelope;
pub use errors::{DispatchError, ParseError, ServiceError};
pub use instruction::{Instruction, Parameters, ServiceTag};
pub use retry::{with_retry, RetryPolicy, Transient};
pub use services::{
    CalendarService, ChatService, ChatTarget, CreateEventRequest, CreateTaskRequest,
    FindEmployeeRequest, FindProjectsRequest, InternalApiService, ListChannelsRequest,
    ListEventsRequest, Record, ResolveChannelRequest, SendMessageRequest, SendReminderRequest,
};
