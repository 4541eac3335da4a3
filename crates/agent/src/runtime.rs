use std::sync::Arc;

use anyhow::{Context, Result};
use switchboard_core::config::AppConfig;
use switchboard_core::envelope::ResultEnvelope;
use switchboard_core::errors::ParseError;
use switchboard_core::retry::RetryPolicy;
use switchboard_integrations::ServiceClients;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::actions::ActionTable;
use crate::llm::{LlmClient, OpenAiCompatClient};
use crate::parser::InstructionParser;
use crate::router::Router;

pub const NO_INTEGRATIONS_MESSAGE: &str = "no integrations are configured; check credentials";
pub const EMPTY_REQUEST_MESSAGE: &str = "empty request";
pub const UNINTERPRETABLE_MESSAGE: &str = "could not interpret request";
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "language model is unavailable; please retry shortly";

/// Entry point for one natural-language request: parse, then dispatch.
pub struct AgentRuntime {
    parser: InstructionParser,
    router: Router,
}

impl AgentRuntime {
    pub fn new(parser: InstructionParser, router: Router) -> Self {
        Self { parser, router }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let retry = RetryPolicy::from(&config.retry);
        let llm: Arc<dyn LlmClient> = Arc::new(
            OpenAiCompatClient::from_config(&config.llm)
                .context("failed to build language model client")?,
        );
        let clients =
            ServiceClients::from_config(config).context("failed to build service clients")?;

        let table = ActionTable::standard();
        let parser = InstructionParser::new(llm, &table, retry.clone())
            .context("failed to compile instruction prompt")?
            .with_corrective_reprompt(config.llm.corrective_reprompt);
        let router = Router::new(table, clients, retry);

        info!(
            event_name = "agent.runtime.ready",
            provider = ?config.llm.provider,
            model = %config.llm.model,
            services = ?router.clients().configured(),
            "agent runtime initialized"
        );
        Ok(Self::new(parser, router))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub async fn handle_request(&self, text: &str) -> ResultEnvelope {
        let correlation_id = Uuid::new_v4();
        let span = info_span!("agent.request", correlation_id = %correlation_id);
        self.handle(text).instrument(span).await
    }

    async fn handle(&self, text: &str) -> ResultEnvelope {
        if self.router.clients().is_empty() {
            warn!(event_name = "agent.request.no_integrations", "no integration is configured");
            return ResultEnvelope::failure(NO_INTEGRATIONS_MESSAGE);
        }

        if text.trim().is_empty() {
            return ResultEnvelope::failure(EMPTY_REQUEST_MESSAGE);
        }

        let instruction = match self.parser.parse(text).await {
            Ok(instruction) => instruction,
            Err(ParseError::MalformedModelOutput(reason)) => {
                warn!(
                    event_name = "agent.request.uninterpretable",
                    reason = %reason,
                    "request not understood"
                );
                return ResultEnvelope::failure(UNINTERPRETABLE_MESSAGE);
            }
            Err(ParseError::Prompt(reason)) => {
                error!(
                    event_name = "agent.request.prompt_failed",
                    reason = %reason,
                    "prompt rendering failed"
                );
                return ResultEnvelope::failure(UNINTERPRETABLE_MESSAGE);
            }
            Err(ParseError::Upstream(upstream)) => {
                warn!(
                    event_name = "agent.request.model_unavailable",
                    error = %upstream,
                    "language model call failed"
                );
                return ResultEnvelope::failure(MODEL_UNAVAILABLE_MESSAGE);
            }
        };

        self.router.dispatch(&instruction).await
    }
}
