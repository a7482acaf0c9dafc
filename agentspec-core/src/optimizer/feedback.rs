//! Feedback Formatting
//!
//! Turns a [`ResultReport`] into the bounded text sections of an
//! improvement request.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::executor::{CapturedResponse, ResultReport, TaskState};
use crate::utils::truncate;

/// Maximum characters of driving input echoed back
pub const PROMPT_LIMIT: usize = 200;
/// Maximum characters of agent response echoed back
pub const RESPONSE_LIMIT: usize = 500;
/// Maximum characters of system prompt echoed back
pub const SYSTEM_ECHO_LIMIT: usize = 100;
/// Maximum characters of an error message
pub const ERROR_LIMIT: usize = 500;
/// Stack lines kept per error
pub const STACK_LINES: usize = 3;

/// How test results are presented to the improving model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackStrategy {
    /// Pass rate, per-case state and error excerpts
    #[default]
    ErrorFocused,
    /// Agent responses and judge feedback per case
    CompletionFocused,
}

impl FeedbackStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ErrorFocused => "error-focused",
            Self::CompletionFocused => "completion-focused",
        }
    }

    /// Parse a strategy name; separators and case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "errorfocused" | "error" | "errors" => Some(Self::ErrorFocused),
            "completionfocused" | "completion" | "completions" => Some(Self::CompletionFocused),
            _ => None,
        }
    }

    /// Resolve a configured value, falling back to error-focused.
    pub fn resolve(name: Option<&str>) -> Self {
        match name {
            None => Self::default(),
            Some(name) => Self::from_name(name).unwrap_or_else(|| {
                tracing::warn!(
                    strategy = name,
                    "Unknown feedback strategy, using error-focused"
                );
                Self::ErrorFocused
            }),
        }
    }
}

/// Formatted sections of an improvement request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackDocument {
    pub test_results: String,
    pub response_data: String,
}

/// Format `report` with the given strategy.
pub fn format_feedback(strategy: FeedbackStrategy, report: &ResultReport) -> FeedbackDocument {
    match strategy {
        FeedbackStrategy::ErrorFocused => FeedbackDocument {
            test_results: error_summary(report),
            response_data: response_data(&report.responses),
        },
        FeedbackStrategy::CompletionFocused => FeedbackDocument {
            test_results: completion_summary(report),
            response_data: system_echo(&report.responses),
        },
    }
}

fn headline(report: &ResultReport) -> String {
    let summary = report.summary();
    let counted = summary.counted(report.skip_policy);
    format!(
        "Pass rate: {:.1}% ({}/{} passed)",
        report.pass_percent(),
        summary.passed,
        counted
    )
}

fn stack_excerpt(stack: &str) -> String {
    stack
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(STACK_LINES)
        .collect::<Vec<_>>()
        .join("\n      ")
}

fn error_summary(report: &ResultReport) -> String {
    let mut out = headline(report);
    out.push('\n');

    if report.fatal {
        for error in &report.errors {
            let _ = write!(out, "\nExecution failed: {}", truncate(&error.message, ERROR_LIMIT));
        }
        return out;
    }

    for outcome in &report.outcomes {
        let _ = write!(out, "\n- [{}] {}", outcome.state.as_str(), outcome.name);
        if let Some(error) = &outcome.error {
            let _ = write!(out, "\n    Error: {}", truncate(error.message.trim(), ERROR_LIMIT));
            if let Some(stack) = &error.stack {
                let excerpt = stack_excerpt(stack);
                if !excerpt.is_empty() {
                    let _ = write!(out, "\n    Stack:\n      {}", excerpt);
                }
            }
        }
    }
    out
}

fn completion_summary(report: &ResultReport) -> String {
    let mut out = headline(report);
    out.push('\n');

    for outcome in &report.outcomes {
        let _ = write!(out, "\n### {} ({})", outcome.name, outcome.state.as_str());
        match &outcome.response {
            Some(response) => {
                let _ = write!(out, "\nInput: {}", truncate(&response.prompt, PROMPT_LIMIT));
                let _ = write!(
                    out,
                    "\nResponse: {}",
                    truncate(&response.response, RESPONSE_LIMIT)
                );
                if let Some(feedback) = &response.feedback {
                    let _ = write!(out, "\nJudge: {}", truncate(feedback, ERROR_LIMIT));
                }
            }
            None if outcome.state != TaskState::Passed => {
                if let Some(error) = &outcome.error {
                    let _ = write!(out, "\nNo response captured: {}", truncate(&error.message, ERROR_LIMIT));
                }
            }
            None => {}
        }
        out.push('\n');
    }
    out
}

fn response_data(responses: &[CapturedResponse]) -> String {
    if responses.is_empty() {
        return "No responses were captured.".to_string();
    }

    let mut out = String::new();
    for response in responses {
        let _ = write!(out, "Case: {}", response.case);
        let _ = write!(out, "\n  Input: {}", truncate(&response.prompt, PROMPT_LIMIT));
        let _ = write!(
            out,
            "\n  System prompt: {}",
            truncate(&response.system_prompt, SYSTEM_ECHO_LIMIT)
        );
        let _ = write!(
            out,
            "\n  Response: {}",
            truncate(&response.response, RESPONSE_LIMIT)
        );
        if let Some(feedback) = &response.feedback {
            let _ = write!(out, "\n  Judge feedback: {}", truncate(feedback, ERROR_LIMIT));
        }
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

fn system_echo(responses: &[CapturedResponse]) -> String {
    if responses.is_empty() {
        return "No responses were captured.".to_string();
    }
    responses
        .iter()
        .map(|r| {
            format!(
                "{}: ran with system prompt \"{}\"",
                r.case,
                truncate(&r.system_prompt, SYSTEM_ECHO_LIMIT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{normalize, SkipPolicy};
    use crate::host::{HostError, HostReport, HostState, HostUnitReport};
    use serde_json::json;

    fn failing_report() -> ResultReport {
        let long_response = "x".repeat(800);
        let long_prompt = "p".repeat(300);
        let long_system = "s".repeat(150);
        normalize(
            HostReport {
                success: false,
                units: vec![
                    HostUnitReport::new("greets user", HostState::Pass).with_meta(json!({
                        "response": { "prompt": "hi", "systemPrompt": "be nice", "text": "Hello!" }
                    })),
                    HostUnitReport::new("reports weather", HostState::Fail)
                        .with_error(HostError {
                            message: "AssertionError: too verbose".into(),
                            stack: Some("at a.ts:1\n at b.ts:2\n at c.ts:3\n at d.ts:4".into()),
                        })
                        .with_meta(json!({
                            "response": {
                                "prompt": long_prompt,
                                "systemPrompt": long_system,
                                "text": long_response
                            },
                            "verdict": { "passed": false, "feedback": "too verbose" }
                        })),
                ],
            },
            SkipPolicy::default(),
        )
    }

    #[test]
    fn test_strategy_resolution() {
        assert_eq!(FeedbackStrategy::resolve(None), FeedbackStrategy::ErrorFocused);
        assert_eq!(
            FeedbackStrategy::resolve(Some("completion-focused")),
            FeedbackStrategy::CompletionFocused
        );
        assert_eq!(
            FeedbackStrategy::resolve(Some("CompletionFocused")),
            FeedbackStrategy::CompletionFocused
        );
        assert_eq!(
            FeedbackStrategy::resolve(Some("vibes")),
            FeedbackStrategy::ErrorFocused
        );
    }

    #[test]
    fn test_error_focused() {
        let doc = format_feedback(FeedbackStrategy::ErrorFocused, &failing_report());

        assert!(doc.test_results.starts_with("Pass rate: 50.0% (1/2 passed)"));
        assert!(doc.test_results.contains("- [passed] greets user"));
        assert!(doc.test_results.contains("- [failed] reports weather"));
        assert!(doc.test_results.contains("Error: AssertionError: too verbose"));
        assert!(doc.test_results.contains("at c.ts:3"));
        assert!(!doc.test_results.contains("at d.ts:4"));
    }

    #[test]
    fn test_response_data_is_truncated() {
        let doc = format_feedback(FeedbackStrategy::ErrorFocused, &failing_report());

        let expected_response = format!("Response: {}...", "x".repeat(RESPONSE_LIMIT));
        assert!(doc.response_data.contains(&expected_response));
        assert!(!doc.response_data.contains(&"x".repeat(RESPONSE_LIMIT + 1)));

        let expected_prompt = format!("Input: {}...", "p".repeat(PROMPT_LIMIT));
        assert!(doc.response_data.contains(&expected_prompt));

        let expected_system = format!("System prompt: {}...", "s".repeat(SYSTEM_ECHO_LIMIT));
        assert!(doc.response_data.contains(&expected_system));

        assert!(doc.response_data.contains("Input: hi\n"));
        assert!(doc.response_data.contains("Judge feedback: too verbose"));
    }

    #[test]
    fn test_completion_focused() {
        let doc = format_feedback(FeedbackStrategy::CompletionFocused, &failing_report());

        assert!(doc.test_results.contains("### reports weather (failed)"));
        assert!(doc.test_results.contains("Response: Hello!"));
        assert!(doc.test_results.contains("Judge: too verbose"));
        assert!(!doc.test_results.contains("AssertionError"));
        assert!(doc.response_data.contains("greets user: ran with system prompt \"be nice\""));
    }

    #[test]
    fn test_empty_and_fatal_reports() {
        let fatal = ResultReport::fatal("host unavailable", SkipPolicy::default());
        let doc = format_feedback(FeedbackStrategy::ErrorFocused, &fatal);
        assert!(doc.test_results.contains("Execution failed: host unavailable"));
        assert_eq!(doc.response_data, "No responses were captured.");
    }
}
