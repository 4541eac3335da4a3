use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use switchboard_core::errors::ParseError;
use switchboard_core::instruction::Instruction;
use switchboard_core::retry::RetryPolicy;
use tera::{Context, Tera};
use tracing::{debug, warn};

use crate::actions::{ActionTable, CatalogEntry};
use crate::llm::LlmClient;

pub const MAX_REQUEST_CHARS: usize = 1000;
const STRIPPED_CHARS: [char; 7] = ['<', '>', '"', '\'', ';', '\\', '&'];

const INSTRUCTION_PROMPT: &str = "instruction_prompt";
const CORRECTIVE_PROMPT: &str = "corrective_prompt";

const INSTRUCTION_TEMPLATE: &str = r#"You turn a workplace request into exactly one command for an assistant that can reach a calendar, a team chat and the company API.

Available commands:
{% for action in actions -%}
- servico "{{ action.service }}", acao "{{ action.name }}": {{ action.summary }}. Required: {% if action.required | length > 0 %}{{ action.required | join(sep=", ") }}{% else %}none{% endif %}. Optional: {% if action.optional | length > 0 %}{{ action.optional | join(sep=", ") }}{% else %}none{% endif %}.
{% endfor %}
Today is {{ today }} (UTC). Use ISO 8601 for dates and times.

Answer with only a JSON object, no prose:
{% raw %}{"servico": "<service>", "acao": "<action>", "parametros": {"<name>": "<value>"}}{% endraw %}

Request: {{ request }}
"#;

const CORRECTIVE_TEMPLATE: &str = r#"Your previous answer could not be used ({{ problem }}).

Previous answer:
{{ reply }}

Answer again with only one JSON object of the form
{% raw %}{"servico": "<service>", "acao": "<action>", "parametros": {"<name>": "<value>"}}{% endraw %}
using one of the commands listed before, for this request: {{ request }}
"#;

/// Truncates to [`MAX_REQUEST_CHARS`] and drops characters that could break
/// out of the prompt or a downstream query.
pub fn sanitize_input(text: &str) -> String {
    text.chars()
        .take(MAX_REQUEST_CHARS)
        .filter(|ch| !STRIPPED_CHARS.contains(ch))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Returns the first complete JSON object embedded in a model reply: bare,
/// inside a fenced block, or surrounded by prose. Trailing text is ignored
/// even when it contains more braces.
pub fn extract_json(reply: &str) -> Option<&str> {
    reply.match_indices('{').find_map(|(start, _)| {
        let tail = &reply[start..];
        let mut stream = serde_json::Deserializer::from_str(tail).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(_))) => Some(&tail[..stream.byte_offset()]),
            _ => None,
        }
    })
}

pub fn decode_instruction(reply: &str) -> Result<Instruction, ParseError> {
    let raw = extract_json(reply)
        .ok_or_else(|| ParseError::MalformedModelOutput("no JSON object in reply".to_string()))?;
    let instruction: Instruction = serde_json::from_str(raw)
        .map_err(|error| ParseError::MalformedModelOutput(error.to_string()))?;

    if instruction.service.trim().is_empty() || instruction.action.trim().is_empty() {
        return Err(ParseError::MalformedModelOutput("service or action is empty".to_string()));
    }
    Ok(instruction)
}

pub struct InstructionParser {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    templates: Tera,
    catalog: Vec<CatalogEntry>,
    corrective_reprompt: bool,
}

impl InstructionParser {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        table: &ActionTable,
        retry: RetryPolicy,
    ) -> Result<Self, tera::Error> {
        let mut templates = Tera::default();
        templates.add_raw_template(INSTRUCTION_PROMPT, INSTRUCTION_TEMPLATE)?;
        templates.add_raw_template(CORRECTIVE_PROMPT, CORRECTIVE_TEMPLATE)?;

        Ok(Self { llm, retry, templates, catalog: table.catalog(), corrective_reprompt: true })
    }

    pub fn with_corrective_reprompt(mut self, enabled: bool) -> Self {
        self.corrective_reprompt = enabled;
        self
    }

    pub fn render_prompt(&self, request: &str) -> Result<String, ParseError> {
        let mut context = Context::new();
        context.insert("actions", &self.catalog);
        context.insert("today", &Utc::now().format("%Y-%m-%d").to_string());
        context.insert("request", request);
        self.templates
            .render(INSTRUCTION_PROMPT, &context)
            .map_err(|error| ParseError::Prompt(error.to_string()))
    }

    fn render_corrective_prompt(
        &self,
        request: &str,
        reply: &str,
        problem: &ParseError,
    ) -> Result<String, ParseError> {
        let mut context = Context::new();
        context.insert("request", request);
        context.insert("reply", reply);
        context.insert("problem", &problem.to_string());
        self.templates
            .render(CORRECTIVE_PROMPT, &context)
            .map_err(|error| ParseError::Prompt(error.to_string()))
    }

    async fn ask_model(&self, prompt: &str) -> Result<String, ParseError> {
        Ok(self.retry.run("llm.complete", || self.llm.complete(prompt)).await?)
    }

    /// Turns free text into an [`Instruction`]. Whether the named service
    /// and action exist is the router's concern.
    pub async fn parse(&self, text: &str) -> Result<Instruction, ParseError> {
        let request = sanitize_input(text);
        let first_prompt = self.render_prompt(&request)?;
        let reply = self.ask_model(&first_prompt).await?;

        let problem = match decode_instruction(&reply) {
            Ok(instruction) => {
                debug!(
                    event_name = "agent.parse.completed",
                    service = %instruction.service,
                    action = %instruction.action,
                    "instruction extracted"
                );
                return Ok(instruction);
            }
            Err(problem) => problem,
        };

        if !self.corrective_reprompt {
            warn!(event_name = "agent.parse.malformed", error = %problem, "model reply unusable");
            return Err(problem);
        }

        warn!(
            event_name = "agent.parse.reprompt",
            error = %problem,
            "model reply unusable; asking once more"
        );
        let corrective_prompt = self.render_corrective_prompt(&request, &reply, &problem)?;
        let second_reply = self.ask_model(&corrective_prompt).await?;
        decode_instruction(&second_reply).map_err(|error| {
            warn!(event_name = "agent.parse.malformed", error = %error, "model reply unusable");
            error
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use switchboard_core::errors::{ParseError, ServiceError};
    use switchboard_core::retry::RetryPolicy;
    use tokio::sync::Mutex;

    use super::{decode_instruction, extract_json, sanitize_input, InstructionParser};
    use crate::actions::ActionTable;
    use crate::llm::LlmClient;

    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String, ServiceError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<&str, ServiceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies.into_iter().map(|reply| reply.map(str::to_string)).collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            })
        }

        async fn prompts(&self) -> Vec<String> {
            self.prompts.lock().await.clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
            self.prompts.lock().await.push(prompt.to_string());
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(ServiceError::Unavailable("script exhausted".into())))
        }
    }

    fn parser(llm: Arc<ScriptedLlm>) -> InstructionParser {
        InstructionParser::new(llm, &ActionTable::standard(), RetryPolicy::immediate(3))
            .expect("templates compile")
    }

    #[test]
    fn sanitize_strips_markup_and_truncates() {
        assert_eq!(sanitize_input("  <b>list</b> 'events'; & more  "), "blist/b events  more");
        assert_eq!(sanitize_input(&"x".repeat(1500)).chars().count(), 1000);
    }

    #[test]
    fn extracts_json_from_fences_and_prose() {
        let fenced = "```json\n{\"servico\": \"chat\", \"acao\": \"list_teams\"}\n```";
        assert_eq!(extract_json(fenced), Some("{\"servico\": \"chat\", \"acao\": \"list_teams\"}"));

        let prose = "Sure! Here it is: {\"servico\": \"calendar\", \"acao\": \"list_events\"} Done.";
        assert!(decode_instruction(prose).is_ok());

        assert_eq!(extract_json("no braces here"), None);
    }

    #[test]
    fn trailing_brace_groups_after_the_object_are_ignored() {
        let reply = r#"{"servico": "chat", "acao": "list_teams"} Note: fill {team} with {id}."#;
        assert_eq!(extract_json(reply), Some(r#"{"servico": "chat", "acao": "list_teams"}"#));
        assert!(decode_instruction(reply).is_ok());

        let leading = r#"Use {placeholders} sparingly: {"servico": "calendar", "acao": "list_events"}"#;
        let instruction = decode_instruction(leading).expect("second group is the object");
        assert_eq!(instruction.action, "list_events");
    }

    #[test]
    fn empty_service_or_action_is_malformed() {
        let result = decode_instruction(r#"{"servico": "", "acao": "list_events"}"#);
        assert!(matches!(result, Err(ParseError::MalformedModelOutput(_))));
    }

    #[test]
    fn prompt_lists_catalog_and_request() {
        let prompt = parser(ScriptedLlm::new(vec![])).render_prompt("list my teams").expect("prompt");

        assert!(prompt.contains(r#"servico "chat", acao "list_teams""#));
        assert!(prompt.contains("max_results (default 10)"));
        assert!(prompt.contains(r#"{"servico": "<service>""#));
        assert!(prompt.trim_end().ends_with("Request: list my teams"));
    }

    #[tokio::test]
    async fn well_formed_reply_is_decoded() {
        let llm = ScriptedLlm::new(vec![Ok(
            r#"{"servico": "calendar", "acao": "list_events", "parametros": {"max_results": 5}}"#,
        )]);

        let instruction = parser(llm.clone()).parse("what's on my calendar?").await.expect("ok");

        assert_eq!(instruction.service, "calendar");
        assert_eq!(instruction.parameters["max_results"], json!(5));
        assert_eq!(llm.prompts().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_reply_gets_one_corrective_reprompt() {
        let llm = ScriptedLlm::new(vec![
            Ok("I think you want the calendar."),
            Ok(r#"{"servico": "calendar", "acao": "list_events", "parametros": {}}"#),
        ]);

        let instruction = parser(llm.clone()).parse("my agenda").await.expect("second reply ok");

        assert_eq!(instruction.action, "list_events");
        let prompts = llm.prompts().await;
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("I think you want the calendar."));
    }

    #[tokio::test]
    async fn second_malformed_reply_is_final() {
        let llm = ScriptedLlm::new(vec![Ok("nope"), Ok("still nope"), Ok("{}")]);

        let result = parser(llm.clone()).parse("my agenda").await;

        assert!(matches!(result, Err(ParseError::MalformedModelOutput(_))));
        assert_eq!(llm.prompts().await.len(), 2);
    }

    #[tokio::test]
    async fn reprompt_can_be_disabled() {
        let llm = ScriptedLlm::new(vec![Ok("nope")]);

        let result = parser(llm.clone()).with_corrective_reprompt(false).parse("agenda").await;

        assert!(matches!(result, Err(ParseError::MalformedModelOutput(_))));
        assert_eq!(llm.prompts().await.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_model_is_retried_then_reported_upstream() {
        let llm = ScriptedLlm::new(vec![
            Err(ServiceError::Unavailable("503".into())),
            Err(ServiceError::Unavailable("503".into())),
            Err(ServiceError::Unavailable("503".into())),
        ]);

        let result = parser(llm.clone()).parse("list my teams").await;

        assert!(matches!(result, Err(ParseError::Upstream(ServiceError::Unavailable(_)))));
        assert_eq!(llm.prompts().await.len(), 3);
    }
}
