use roster_agent::ollama::{OllamaServer, DEFAULT_PROGRAM};
use roster_agent::OllamaClient;
use roster_core::config::{AppConfig, LoadOptions};
use roster_db::connect_with_settings;
use serde::Serialize;

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

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_backend_binary(&config));
            match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => {
                    checks.push(runtime.block_on(check_database_connectivity(&config)));
                    checks.push(runtime.block_on(check_backend_reachability(&config)));
                }
                Err(error) => {
                    let reason = format!("the async runtime failed to start: {error}");
                    checks.push(DoctorCheck::skipped("database_connectivity", &reason));
                    checks.push(DoctorCheck::skipped("llm_backend", &reason));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            let reason = "configuration did not load";
            checks.push(DoctorCheck::skipped("ollama_binary", reason));
            checks.push(DoctorCheck::skipped("database_connectivity", reason));
            checks.push(DoctorCheck::skipped("llm_backend", reason));
        }
    }

    // Skipped checks do not fail the report; only explicit failures do.
    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_backend_binary(config: &AppConfig) -> DoctorCheck {
    if !config.llm.manage_server {
        return DoctorCheck::skipped("ollama_binary", "llm.manage_server is false");
    }

    match OllamaServer::locate(DEFAULT_PROGRAM) {
        Ok(path) => DoctorCheck {
            name: "ollama_binary",
            status: CheckStatus::Pass,
            details: format!("found `{}`", path.display()),
        },
        Err(error) => {
            DoctorCheck { name: "ollama_binary", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

async fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let result = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await;

    match result {
        Ok(pool) => {
            pool.close().await;
            DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Pass,
                details: format!("connected using `{}`", config.database.url),
            }
        }
        Err(error) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Fail,
            details: format!("failed to connect to database: {error}"),
        },
    }
}

async fn check_backend_reachability(config: &AppConfig) -> DoctorCheck {
    let client = match OllamaClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "llm_backend",
                status: CheckStatus::Fail,
                details: format!("failed to build http client: {error}"),
            };
        }
    };

    match client.ping().await {
        Ok(()) => DoctorCheck {
            name: "llm_backend",
            status: CheckStatus::Pass,
            details: format!("reachable at `{}` (model `{}`)", config.llm.base_url, client.model()),
        },
        // A managed server is only started by `chat`, so being down here is expected.
        Err(_) if config.llm.manage_server => DoctorCheck::skipped(
            "llm_backend",
            "the server is started on demand by `roster chat`",
        ),
        Err(error) => {
            DoctorCheck { name: "llm_backend", status: CheckStatus::Fail, details: format!("{error:#}") }
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
