use std::io::{self, BufRead, Write};

use switchboard_agent::AgentRuntime;
use switchboard_core::config::LoadOptions;
use tokio::runtime::Runtime;

use crate::commands::{
    current_thread_runtime, load_config, CommandResult, EXIT_OK, EXIT_RUNTIME_FAILURE,
};
use crate::init_logging;
use crate::render::render_envelope;

const BANNER: &str = "switchboard: ask in plain language, for example\n  - what is on my calendar this week?\n  - list the teams I belong to\n  - create a task in project 123 due next friday\ntype exit, quit or sair to leave";
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "sair"];

pub fn run(load: LoadOptions) -> CommandResult {
    let config = match load_config("repl", load) {
        Ok(config) => config,
        Err(result) => return result,
    };
    init_logging(&config);

    let runtime = match current_thread_runtime("repl") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let agent = match AgentRuntime::from_config(&config) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("repl", "startup", format!("{error:#}"), EXIT_RUNTIME_FAILURE)
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match session(&runtime, &agent, stdin.lock(), &mut stdout.lock()) {
        Ok(_) => CommandResult { exit_code: EXIT_OK, output: String::new() },
        Err(error) => CommandResult::failure(
            "repl",
            "io",
            format!("terminal i/o failed: {error}"),
            EXIT_RUNTIME_FAILURE,
        ),
    }
}

/// Reads requests line by line until an exit word or end of input. Returns
/// the number of requests handled.
pub fn session<R, W>(
    runtime: &Runtime,
    agent: &AgentRuntime,
    input: R,
    output: &mut W,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{BANNER}")?;
    let mut handled = 0;
    let mut lines = input.lines();

    loop {
        write!(output, "\n> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&request.to_lowercase().as_str()) {
            break;
        }

        let envelope = runtime.block_on(agent.handle_request(request));
        writeln!(output, "{}", render_envelope(&envelope))?;
        handled += 1;
    }

    writeln!(output, "bye")?;
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use switchboard_agent::AgentRuntime;
    use switchboard_core::config::AppConfig;

    use super::session;

    fn agent_without_integrations() -> AgentRuntime {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-test".to_string().into());
        AgentRuntime::from_config(&config).expect("agent")
    }

    #[test]
    fn exit_word_ends_the_session() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let agent = agent_without_integrations();
        let mut output = Vec::new();

        let handled = session(
            &runtime,
            &agent,
            Cursor::new("list my teams\n\nSAIR\nnever handled\n"),
            &mut output,
        )
        .expect("session");

        let transcript = String::from_utf8(output).expect("utf8");
        assert_eq!(handled, 1);
        assert!(transcript.contains("error: no integrations are configured; check credentials"));
        assert!(transcript.trim_end().ends_with("bye"));
    }

    #[test]
    fn end_of_input_ends_the_session() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let agent = agent_without_integrations();
        let mut output = Vec::new();

        let handled = session(&runtime, &agent, Cursor::new(""), &mut output).expect("session");

        assert_eq!(handled, 0);
    }
}
