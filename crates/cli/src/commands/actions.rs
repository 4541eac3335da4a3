use switchboard_agent::ActionTable;

use crate::commands::{CommandResult, EXIT_OK};

pub fn run(json_output: bool) -> CommandResult {
    let catalog = ActionTable::standard().catalog();

    let output = if json_output {
        serde_json::to_string_pretty(&catalog).unwrap_or_else(|error| {
            format!("{{\"error\":\"catalog serialization failed: {error}\"}}")
        })
    } else {
        let mut lines = vec![format!("{} actions:", catalog.len())];
        for entry in &catalog {
            let required =
                if entry.required.is_empty() { "none".to_string() } else { entry.required.join(", ") };
            let optional =
                if entry.optional.is_empty() { "none".to_string() } else { entry.optional.join(", ") };
            lines.push(format!("- {}.{} -> {}", entry.service, entry.name, entry.result_kind));
            lines.push(format!("    {}", entry.summary));
            lines.push(format!("    required: {required}; optional: {optional}"));
        }
        lines.join("\n")
    };

    CommandResult { exit_code: EXIT_OK, output }
}
