//! Display formatting for CLI output
//!
//! Pure functions that format orchestration results for the terminal.

use crate::runtime::health::ServiceHealth;
use crate::runtime::orchestrator::{SetupReport, StartReport, StopReport};
use crate::runtime::supervisor::StopOutcome;

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No resources found.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            output.push_str("   ");
        }
        output.push_str(&format!(
            "{:width$}",
            header.to_uppercase(),
            width = widths[i]
        ));
    }
    output.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                output.push_str("   ");
            }
            if i < widths.len() {
                output.push_str(&format!("{:width$}", cell, width = widths[i]));
            } else {
                output.push_str(cell);
            }
        }
        output.push('\n');
    }

    output
}

/// Format the health snapshot for `status`
pub fn format_status(snapshot: &[ServiceHealth]) -> String {
    let headers = &["SERVICE", "ENDPOINT", "STATUS"];
    let rows: Vec<Vec<String>> = snapshot
        .iter()
        .map(|h| {
            let status = if h.reachable {
                "reachable".to_string()
            } else {
                match &h.detail {
                    Some(detail) => format!("unreachable ({})", detail),
                    None => "unreachable".to_string(),
                }
            };
            vec![h.name.to_string(), h.url.clone(), status]
        })
        .collect();

    format_table(headers, rows)
}

/// Format the native process line appended to `status` output
pub fn format_native_line(running: bool) -> String {
    if running {
        "Native inference process: running\n".to_string()
    } else {
        "Native inference process: not running\n".to_string()
    }
}

/// Format the result of `setup`
pub fn format_setup(report: &SetupReport) -> String {
    if report.downloaded == 0 {
        format!("All {} model assets already present.\n", report.total)
    } else {
        format!(
            "Downloaded {} of {} model assets.\n",
            report.downloaded, report.total
        )
    }
}

/// Format the result of `start`
pub fn format_start(report: &StartReport) -> String {
    match report {
        StartReport::Container => "Stack started in container mode.\n".to_string(),
        StartReport::Native { pid, reused: true } => format!(
            "Stack started in native mode (inference process {} was already running).\n",
            pid
        ),
        StartReport::Native { pid, reused: false } => format!(
            "Stack started in native mode (inference process {}).\n",
            pid
        ),
    }
}

/// Format the result of `stop`
pub fn format_stop(report: &StopReport) -> String {
    let native = match report.native {
        StopOutcome::Stopped { pid } => format!("Stopped inference process {}.", pid),
        StopOutcome::AlreadyStopped => "Inference process was already stopped.".to_string(),
        StopOutcome::StoppedUntracked { pid } => {
            format!("Stopped untracked listener {} on the inference port.", pid)
        }
        StopOutcome::NothingRunning => "No native inference process was running.".to_string(),
    };

    let mut output = format!("Container groups torn down. {}\n", native);
    for failure in &report.failures {
        output.push_str(&format!("Warning: {}\n", failure));
    }
    output
}
