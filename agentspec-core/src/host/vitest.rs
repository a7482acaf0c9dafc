//! Vitest-backed test host.
//!
//! Writes each compiled unit to its own `.test.ts` file, runs the configured
//! command with the JSON reporter and maps the jest-compatible report back
//! onto the submitted units.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{HostError, HostReport, HostState, HostUnitReport, Submission, TestHost};
use crate::compiler::PROVIDED_VALUES_ENV;
use crate::config::HostConfig;
use crate::utils::{run_command, CommandOptions};
use crate::{Error, Result};

/// Separator between an assertion message and its stack in jest failure
/// messages.
const STACK_SEPARATOR: &str = "\n    at ";

/// Test host that runs units through vitest.
pub struct VitestHost {
    config: HostConfig,
}

impl VitestHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Path the unit at `index` is written to for this submission.
    pub fn unit_path(&self, submission: &Submission, index: usize) -> PathBuf {
        let stem = submission
            .units
            .get(index)
            .map(|unit| unit.file_stem.as_str())
            .unwrap_or("unit");
        self.config
            .work_dir
            .join(format!("agentspec-{}-{}.test.ts", submission.id, stem))
    }

    /// Path of the JSON report for this submission.
    pub fn report_path(&self, submission: &Submission) -> PathBuf {
        self.config
            .work_dir
            .join(format!("agentspec-{}-report.json", submission.id))
    }

    fn command_line(&self, files: &[PathBuf], report: &Path) -> Vec<String> {
        let report = report.display().to_string();
        let mut argv = Vec::with_capacity(self.config.command.len() + files.len());
        for arg in &self.config.command {
            if arg == "{files}" {
                argv.extend(files.iter().map(|f| f.display().to_string()));
            } else {
                let joined = files
                    .iter()
                    .map(|f| f.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                argv.push(arg.replace("{files}", &joined).replace("{report}", &report));
            }
        }
        argv
    }
}

#[async_trait]
impl TestHost for VitestHost {
    fn name(&self) -> &str {
        "vitest"
    }

    async fn run(&self, submission: &Submission) -> Result<HostReport> {
        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| {
                Error::host_submission(format!(
                    "cannot create work dir {}: {}",
                    self.config.work_dir.display(),
                    e
                ))
            })?;

        let mut files = Vec::with_capacity(submission.units.len());
        for (index, unit) in submission.units.iter().enumerate() {
            let path = self.unit_path(submission, index);
            tokio::fs::write(&path, &unit.source).await.map_err(|e| {
                Error::host_submission(format!("cannot write {}: {}", path.display(), e))
            })?;
            tracing::debug!(unit = %unit.name, path = %path.display(), "Wrote compiled unit");
            files.push(path);
        }

        let report_path = self.report_path(submission);
        let argv = self.command_line(&files, &report_path);

        let output = run_command(
            &argv,
            CommandOptions {
                env: vec![(PROVIDED_VALUES_ENV, submission.provided.to_json())],
                timeout_secs: self.config.timeout_secs,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| Error::host_submission(format!("{:#}", e)))?;

        tracing::debug!(
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "Test host finished"
        );

        let text = match tokio::fs::read_to_string(&report_path).await {
            Ok(text) => text,
            Err(e) => {
                return Err(Error::host_submission(format!(
                    "no report at {} ({}); exit code {}: {}",
                    report_path.display(),
                    e,
                    output.exit_code,
                    output.stderr.trim()
                )));
            }
        };

        let file_names: Vec<String> = files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect();
        let unit_names: Vec<&str> = submission.units.iter().map(|u| u.name.as_str()).collect();

        parse_report(&text, &file_names, &unit_names)
    }

    async fn cleanup(&self, submission: &Submission) -> Result<()> {
        if self.config.keep_artifacts {
            tracing::debug!(id = %submission.id, "Keeping host artifacts");
            return Ok(());
        }

        let mut paths: Vec<PathBuf> = (0..submission.units.len())
            .map(|index| self.unit_path(submission, index))
            .collect();
        paths.push(self.report_path(submission));

        for path in paths {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Report parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    test_results: Vec<JsonFileResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonFileResult {
    name: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    assertion_results: Vec<JsonAssertion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonAssertion {
    title: String,
    status: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    failure_messages: Vec<String>,
    #[serde(default)]
    meta: Option<Value>,
}

fn map_status(status: &str) -> HostState {
    match status {
        "passed" => HostState::Pass,
        "failed" => HostState::Fail,
        "skipped" | "pending" | "todo" | "disabled" => HostState::Skip,
        _ => HostState::Unknown,
    }
}

fn split_failure(message: &str) -> HostError {
    match message.split_once(STACK_SEPARATOR) {
        Some((head, stack)) => HostError {
            message: head.to_string(),
            stack: Some(format!("at {}", stack)),
        },
        None => HostError::new(message),
    }
}

/// Map a jest-compatible JSON report onto the submitted units.
///
/// `file_names` and `unit_names` are parallel: the unit written to
/// `file_names[i]` is named `unit_names[i]`. Units the report does not
/// mention, or whose file produced no assertions (e.g. it failed to load),
/// are reported as [`HostState::Unknown`].
pub(crate) fn parse_report(
    text: &str,
    file_names: &[String],
    unit_names: &[&str],
) -> Result<HostReport> {
    let report: JsonReport = serde_json::from_str(text)
        .map_err(|e| Error::host_submission(format!("unreadable host report: {}", e)))?;

    let mut units = Vec::new();
    for (file_name, unit_name) in file_names.iter().zip(unit_names) {
        let Some(file) = report
            .test_results
            .iter()
            .find(|result| result.name.ends_with(file_name.as_str()))
        else {
            units.push(
                HostUnitReport::new(*unit_name, HostState::Unknown)
                    .with_error(HostError::new("unit missing from host report")),
            );
            continue;
        };

        if file.assertion_results.is_empty() {
            let mut unit = HostUnitReport::new(*unit_name, HostState::Unknown);
            if !file.message.trim().is_empty() {
                unit = unit.with_error(split_failure(file.message.trim()));
            }
            units.push(unit);
            continue;
        }

        for assertion in &file.assertion_results {
            units.push(HostUnitReport {
                name: assertion.title.clone(),
                state: map_status(&assertion.status),
                duration_ms: assertion.duration.unwrap_or(0.0).max(0.0).round() as u64,
                errors: assertion
                    .failure_messages
                    .iter()
                    .map(|m| split_failure(m))
                    .collect(),
                meta: assertion.meta.clone().filter(|m| !m.is_null()),
            });
        }
    }

    Ok(HostReport {
        success: report.success,
        units,
    })
}
