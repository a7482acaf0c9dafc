//! Command implementations for agentspec CLI.

pub mod compile;
pub mod execute;
pub mod optimize;
pub mod validate;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use agentspec_core::config::EngineConfig;
use agentspec_core::executor::{ResultReport, TaskState};
use agentspec_core::host::{MockHost, TestHost, VitestHost};
use agentspec_core::provider::{CommandProvider, InferenceProvider, MockProvider};
use agentspec_core::spec::{load_specification, Specification};

/// Reply used by the dry-run provider; the current prompt is kept unchanged.
const DRY_RUN_REPLY: &str = "";

/// Load and validate a specification, with the path in the error chain.
pub fn load_spec(path: &Path) -> Result<Specification> {
    load_specification(path).with_context(|| format!("Failed to load specification {}", path.display()))
}

/// Select the test host for a run.
pub fn build_host(config: &EngineConfig, dry_run: bool) -> Box<dyn TestHost> {
    if dry_run {
        tracing::info!("Dry run: using the mock test host");
        Box::new(MockHost::all_pass())
    } else {
        Box::new(VitestHost::new(config.host.clone()))
    }
}

/// Select the inference provider for a run.
pub fn build_provider(config: &EngineConfig, dry_run: bool) -> Box<dyn InferenceProvider> {
    if dry_run {
        Box::new(MockProvider::always(DRY_RUN_REPLY))
    } else {
        Box::new(CommandProvider::new(config.provider.clone()))
    }
}

/// Spinner shown while a long step runs.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn state_label(state: TaskState) -> String {
    match state {
        TaskState::Passed => "✓ pass".green().to_string(),
        TaskState::Failed => "✗ fail".red().to_string(),
        TaskState::Skipped => "- skip".yellow().to_string(),
        TaskState::Errored => "! error".red().bold().to_string(),
    }
}

/// Print a result report as a table.
pub fn print_report(report: &ResultReport) {
    if report.fatal {
        println!("{}", "Run failed before any case was scored".red().bold());
        for error in &report.errors {
            println!("  {}", error.message.red());
        }
        return;
    }

    println!("{:<10} {:<40} {:>10}", "STATE", "CASE", "DURATION");
    println!("{}", "─".repeat(62));
    for outcome in &report.outcomes {
        println!(
            "{:<10} {:<40} {:>8}ms",
            state_label(outcome.state),
            truncate_name(&outcome.name, 40),
            outcome.duration_ms
        );
        if outcome.state != TaskState::Passed {
            if let Some(error) = &outcome.error {
                println!("           {}", error.message.lines().next().unwrap_or("").dimmed());
            }
        }
    }
    println!();

    let summary = report.summary();
    let rate = format!("{:.1}%", report.pass_percent());
    println!(
        "{} {} passed, {} failed, {} skipped, {} errored ({})",
        "Summary:".cyan().bold(),
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.errored,
        if report.success { rate.green() } else { rate.yellow() }
    );
}

fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let kept: String = name.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
pub(crate) const GREETER_SPEC: &str = r#"
metadata:
  name: greeter
  version: 1.0.0
schemas:
  Verdict:
    type: object
    properties:
      passed:
        type: boolean
      feedback:
        type: string
agent:
  model: gpt-4o-mini
  systemPrompt: You greet users.
benchmarks:
  - name: says hello
    messages:
      - role: user
        content: hi
    judge:
      prompt: Did it greet the user?
      schema: Verdict
  - name: says goodbye
    messages:
      - role: user
        content: bye
    judge:
      prompt: Did it say goodbye?
      schema: Verdict
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short", 40), "short");
        assert_eq!(truncate_name("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_dry_run_selection() {
        let config = EngineConfig::default();
        assert_eq!(build_host(&config, true).name(), "mock");
        assert_eq!(build_host(&config, false).name(), "vitest");
        assert_eq!(build_provider(&config, true).name(), "mock");
        assert_eq!(build_provider(&config, false).name(), "command");
    }
}
