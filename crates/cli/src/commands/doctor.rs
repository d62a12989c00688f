use orcamento_core::config::{is_in_memory_url, AppConfig, LoadOptions};
use orcamento_db::{open_store, QuoteStore};
use serde::Serialize;

use crate::commands::CommandResult;
use crate::render::QuoteRenderer;

const EXIT_CHECKS_FAILED: u8 = 1;

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

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CHECKS_FAILED };

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

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_company_defaults(&config));
            checks.push(check_storage(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["company_defaults", "storage_writable"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }
    checks.push(check_template());

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// An unnamed issuer is allowed, but every new quote will need it filled in.
fn check_company_defaults(config: &AppConfig) -> DoctorCheck {
    if config.company.name.trim().is_empty() {
        return DoctorCheck {
            name: "company_defaults",
            status: CheckStatus::Fail,
            details: "company.name is not configured; new quotes start without an issuer"
                .to_string(),
        };
    }

    DoctorCheck {
        name: "company_defaults",
        status: CheckStatus::Pass,
        details: format!("new quotes are issued by `{}`", config.company.name),
    }
}

fn check_storage(config: &AppConfig) -> DoctorCheck {
    let store = match open_store(&config.database) {
        Ok(store) => QuoteStore::new(store),
        Err(error) => {
            return DoctorCheck {
                name: "storage_writable",
                status: CheckStatus::Fail,
                details: format!("failed to open storage: {error}"),
            };
        }
    };

    if !store.is_available() {
        return DoctorCheck {
            name: "storage_writable",
            status: CheckStatus::Fail,
            details: format!("storage at `{}` rejected a test write", config.database.url),
        };
    }

    let backend = if is_in_memory_url(&config.database.url) { "memory" } else { "sqlite" };
    DoctorCheck {
        name: "storage_writable",
        status: CheckStatus::Pass,
        details: format!("{backend} storage at `{}` is writable", config.database.url),
    }
}

fn check_template() -> DoctorCheck {
    match QuoteRenderer::with_embedded_template() {
        Ok(_) => DoctorCheck {
            name: "template_ready",
            status: CheckStatus::Pass,
            details: "embedded quote template compiled".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "template_ready",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
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
