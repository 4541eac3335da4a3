use std::process::ExitCode;

fn main() -> ExitCode {
    switchboard_cli::run()
}
