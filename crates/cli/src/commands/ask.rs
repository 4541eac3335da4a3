use switchboard_agent::AgentRuntime;
use switchboard_core::config::LoadOptions;
use switchboard_core::envelope::ResultEnvelope;

use crate::commands::{
    current_thread_runtime, load_config, CommandResult, EXIT_OK, EXIT_REQUEST_FAILED,
    EXIT_RUNTIME_FAILURE,
};
use crate::init_logging;
use crate::render::render_envelope;

pub fn run(load: LoadOptions, text: &str, json_output: bool) -> CommandResult {
    let config = match load_config("ask", load) {
        Ok(config) => config,
        Err(result) => return result,
    };
    init_logging(&config);

    let runtime = match current_thread_runtime("ask") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let agent = match AgentRuntime::from_config(&config) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("ask", "startup", format!("{error:#}"), EXIT_RUNTIME_FAILURE)
        }
    };

    let envelope = runtime.block_on(agent.handle_request(text));
    outcome(&envelope, json_output)
}

pub fn outcome(envelope: &ResultEnvelope, json_output: bool) -> CommandResult {
    let exit_code = if envelope.is_success() { EXIT_OK } else { EXIT_REQUEST_FAILED };
    let output = if json_output {
        serde_json::to_string_pretty(envelope).unwrap_or_else(|error| {
            format!(
                "{{\"success\":false,\"message\":\"envelope serialization failed: {}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_envelope(envelope)
    };
    CommandResult { exit_code, output }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchboard_core::envelope::ResultEnvelope;

    use super::outcome;

    #[test]
    fn failure_envelopes_exit_with_request_failed_code() {
        let result = outcome(&ResultEnvelope::failure("missing parameter: channel"), false);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.output, "error: missing parameter: channel");
    }

    #[test]
    fn json_output_is_the_envelope() {
        let result = outcome(&ResultEnvelope::success("teams_list", json!([])), true);
        assert_eq!(result.exit_code, 0);

        let payload: serde_json::Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload, json!({"success": true, "result_kind": "teams_list", "data": []}));
    }
}
