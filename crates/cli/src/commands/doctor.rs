use serde::Serialize;
use switchboard_core::config::{AppConfig, LoadOptions};

use crate::commands::{CommandResult, EXIT_CONFIG_FAILURE, EXIT_OK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const INTEGRATION_CHECKS: [&str; 3] = ["calendar_readiness", "chat_readiness", "internal_api_readiness"];

pub fn run(load: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(load);
    let exit_code =
        if report.overall_status == CheckStatus::Pass { EXIT_OK } else { EXIT_CONFIG_FAILURE };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(load: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(load) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm(&config));
            checks.push(check_integration(
                INTEGRATION_CHECKS[0],
                config.calendar.missing_fields(),
            ));
            checks.push(check_integration(INTEGRATION_CHECKS[1], config.chat.missing_fields()));
            checks.push(check_internal_api(&config));
            checks.push(check_any_integration(&checks));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_readiness"].into_iter().chain(INTEGRATION_CHECKS) {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm(config: &AppConfig) -> DoctorCheck {
    DoctorCheck {
        name: "llm_readiness",
        status: CheckStatus::Pass,
        details: format!(
            "{:?} model `{}` at {}",
            config.llm.provider,
            config.llm.model,
            config.llm.effective_base_url()
        ),
    }
}

/// Missing credentials disable an integration rather than failing startup.
fn check_integration(name: &'static str, missing: Vec<&'static str>) -> DoctorCheck {
    if missing.is_empty() {
        DoctorCheck { name, status: CheckStatus::Pass, details: "credentials present".to_string() }
    } else {
        DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: format!("disabled; missing {}", missing.join(", ")),
        }
    }
}

fn check_internal_api(config: &AppConfig) -> DoctorCheck {
    let missing = config.internal_api.missing_fields();
    if missing.is_empty() && !config.internal_api.has_http_base_url() {
        return DoctorCheck {
            name: INTEGRATION_CHECKS[2],
            status: CheckStatus::Skipped,
            details: "disabled; internal_api.base_url must start with http:// or https://"
                .to_string(),
        };
    }
    check_integration(INTEGRATION_CHECKS[2], missing)
}

fn check_any_integration(checks: &[DoctorCheck]) -> DoctorCheck {
    let ready = checks
        .iter()
        .filter(|check| {
            INTEGRATION_CHECKS.contains(&check.name) && check.status == CheckStatus::Pass
        })
        .count();

    if ready == 0 {
        DoctorCheck {
            name: "integrations_available",
            status: CheckStatus::Fail,
            details: "no integration is configured; every request would fail".to_string(),
        }
    } else {
        DoctorCheck {
            name: "integrations_available",
            status: CheckStatus::Pass,
            details: format!("{ready} of {} integrations ready", INTEGRATION_CHECKS.len()),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
