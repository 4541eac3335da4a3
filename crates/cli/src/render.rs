//! Human-readable rendering of result envelopes for the terminal.

use chrono::DateTime;
use serde_json::Value;
use switchboard_core::envelope::ResultEnvelope;

pub fn render_envelope(envelope: &ResultEnvelope) -> String {
    match envelope {
        ResultEnvelope::Failure { message } => format!("error: {message}"),
        ResultEnvelope::Success { result_kind, data } => render_success(result_kind, data),
    }
}

fn render_success(result_kind: &str, data: &Value) -> String {
    let items = data.as_array().map(Vec::as_slice).unwrap_or_default();

    match result_kind {
        "events_list" if items.is_empty() => "no upcoming events".to_string(),
        "events_list" => titled("events:", items.iter().map(format_event)),
        "event_created" => {
            let summary = text(data, "summary").unwrap_or("(untitled)");
            let link = text(data, "htmlLink").unwrap_or("n/a");
            format!("event created: {summary}\nlink: {link}")
        }
        "channels_list" => titled(
            "channels:",
            items.iter().map(|channel| {
                let name = text(channel, "displayName").unwrap_or("(unnamed)");
                match text(channel, "teamName") {
                    Some(team) => format!("{team}: {name}"),
                    None => name.to_string(),
                }
            }),
        ),
        "teams_list" => titled(
            "teams:",
            items.iter().map(|team| {
                format!(
                    "{} (ID: {})",
                    text(team, "displayName").unwrap_or("(unnamed)"),
                    text(team, "id").unwrap_or("?")
                )
            }),
        ),
        "projects_list" => titled(
            &format!("projects found: {}", items.len()),
            items.iter().map(|project| {
                let name = text(project, "nome").or_else(|| text(project, "name")).unwrap_or("?");
                let status = text(project, "status").unwrap_or("?");
                format!("{name} ({status})")
            }),
        ),
        "message_sent" => "message sent".to_string(),
        "reminder_sent" => "reminder scheduled".to_string(),
        other => {
            let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            format!("{other}:\n{pretty}")
        }
    }
}

fn titled(title: &str, lines: impl Iterator<Item = String>) -> String {
    let mut output = vec![title.to_string()];
    output.extend(lines.map(|line| format!("- {line}")));
    output.join("\n")
}

fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// `dd/mm/YYYY HH:MM - summary` for timed events; all-day events keep their
/// date as sent.
pub fn format_event(event: &Value) -> String {
    let summary = text(event, "summary").unwrap_or("(untitled)");
    let start = event.get("start");
    let when = match start.and_then(|start| text(start, "dateTime")) {
        Some(date_time) => DateTime::parse_from_rfc3339(date_time)
            .map(|parsed| parsed.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_else(|_| date_time.to_string()),
        None => start.and_then(|start| text(start, "date")).unwrap_or("?").to_string(),
    };
    format!("{when} - {summary}")
}
