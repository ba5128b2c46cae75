use roster_agent::extract::{extract_email, extract_parameters, extract_user_id, ExtractedParams};
use roster_agent::{classify, OperationKind, OperationRequest};
use roster_core::domain::user::UserId;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ParseReport {
    input: String,
    operation: Option<OperationKind>,
    fields: ExtractedParams,
    user_id: Option<UserId>,
    lookup_email: Option<String>,
    request: Option<OperationRequest>,
    error_class: Option<&'static str>,
    error: Option<String>,
}

/// Classify and extract only. Nothing is read from or written to the store.
pub fn run(text: &str, json_output: bool) -> CommandResult {
    let report = build_report(text);
    let exit_code = if report.request.is_some() { 0 } else { 6 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!("{{\"error_class\":\"serialization\",\"error\":\"{}\"}}", escape_json(&error.to_string()))
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(text: &str) -> ParseReport {
    let (request, error_class, error) = match OperationRequest::parse(text) {
        Ok(request) => (Some(request), None, None),
        Err(error) => (None, Some(error.error_class()), Some(error.to_string())),
    };

    ParseReport {
        input: text.to_string(),
        operation: classify(text),
        fields: extract_parameters(text),
        user_id: extract_user_id(text),
        lookup_email: extract_email(text),
        request,
        error_class,
        error,
    }
}

fn render_human(report: &ParseReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "operation: {}",
        report.operation.map(OperationKind::as_str).unwrap_or("<unrecognized>")
    ));

    let fields = report
        .fields
        .entries()
        .into_iter()
        .map(|(field, value)| format!("{field}={value}"))
        .collect::<Vec<_>>();
    lines.push(format!(
        "fields: {}",
        if fields.is_empty() { "<none>".to_string() } else { fields.join(", ") }
    ));
    if let Some(id) = report.user_id {
        lines.push(format!("id: {id}"));
    }
    if let Some(email) = &report.lookup_email {
        lines.push(format!("lookup email: {email}"));
    }

    match (&report.request, &report.error) {
        (Some(request), _) => lines.push(format!(
            "request: {}",
            serde_json::to_string(request).unwrap_or_else(|_| format!("{request:?}"))
        )),
        (None, Some(error)) => lines.push(format!(
            "error ({}): {error}",
            report.error_class.unwrap_or("unknown")
        )),
        (None, None) => {}
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
