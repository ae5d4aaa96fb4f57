//! Plain-text rendering of run results.

use std::fmt::Write;

use taskweave_agent::{CriticalityPolicy, OrchestrationReport, SequentialRunResult};
use taskweave_kernel::{HandlerRegistry, OutcomeStatus, SubTaskOutcome};

/// Human-readable report: status line, summary, then skipped intents.
pub fn report(report: &OrchestrationReport) -> String {
    let mut out = String::new();
    if !report.original_query.is_empty() {
        let _ = writeln!(out, "Request: {}", report.original_query);
    }
    let _ = writeln!(out, "Status: {}", report.overall_status);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", report.summary);
    skipped_section(&mut out, &report.outcomes);
    out
}

pub fn sequential(result: &SequentialRunResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.summary);
    skipped_section(&mut out, &result.outcomes);
    out
}

/// One line per intent: `<intent>  critical|best-effort`.
pub fn intents(registry: &HandlerRegistry, criticality: &CriticalityPolicy) -> String {
    let intents = registry.intents();
    let width = intents.iter().map(|i| i.len()).max().unwrap_or(0);

    let mut out = String::new();
    for intent in intents {
        let kind = if criticality.is_critical(intent) {
            "critical"
        } else {
            "best-effort"
        };
        let _ = writeln!(out, "{intent:<width$}  {kind}");
    }
    out
}

fn skipped_section(out: &mut String, outcomes: &[SubTaskOutcome]) {
    let skipped: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.status == OutcomeStatus::Skipped)
        .map(|o| o.intent())
        .collect();
    if !skipped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Not supported: {}", skipped.join(", "));
    }
}
