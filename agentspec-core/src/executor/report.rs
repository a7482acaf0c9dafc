//! Result Report
//!
//! The uniform result model for one execution pass, and the normalization
//! from a host's raw report into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::{HostReport, HostState, HostUnitReport};

/// Message used when a host reports a failure without any error.
pub const SYNTHESIZED_FAILURE: &str = "test failed without reporting an error";
/// Message used when a host cannot say how a unit ended.
pub const SYNTHESIZED_UNKNOWN: &str = "test host reported no terminal state";

/// Terminal state of one compiled unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Passed,
    Failed,
    Skipped,
    Errored,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Errored => "errored",
        }
    }
}

impl From<HostState> for TaskState {
    fn from(state: HostState) -> Self {
        match state {
            HostState::Pass => Self::Passed,
            HostState::Fail => Self::Failed,
            HostState::Skip => Self::Skipped,
            HostState::Unknown => Self::Errored,
        }
    }
}

/// Whether skipped cases stay in the pass-rate denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPolicy {
    /// Skipped cases count as not passing
    #[default]
    CountAsFailure,
    /// Skipped cases are left out of the ratio entirely
    Exclude,
}

/// An error captured from a unit (or from the submission itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedError {
    /// Case the error belongs to; `None` for submission failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// The agent response a unit attached to its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub case: String,
    /// Driving input sent to the agent
    #[serde(default)]
    pub prompt: String,
    /// Effective system prompt used for the run
    #[serde(default)]
    pub system_prompt: String,
    /// Raw agent output
    #[serde(default)]
    pub response: String,
    /// Judge feedback, when a verdict was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Normalized result of one compiled unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub name: String,
    pub state: TaskState,
    pub duration_ms: u64,
    /// Always present for failed and errored outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CapturedError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<CapturedResponse>,
}

/// Per-state counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl ReportSummary {
    /// Outcomes that count toward the pass rate under `policy`.
    pub fn counted(&self, policy: SkipPolicy) -> usize {
        match policy {
            SkipPolicy::CountAsFailure => self.total,
            SkipPolicy::Exclude => self.total - self.skipped,
        }
    }
}

/// Aggregate over one execution of one compiled unit set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultReport {
    pub success: bool,
    pub outcomes: Vec<TaskOutcome>,
    pub errors: Vec<CapturedError>,
    pub responses: Vec<CapturedResponse>,
    /// Passed / counted outcomes, in `[0, 1]`
    pub pass_rate: f64,
    pub skip_policy: SkipPolicy,
    /// The submission itself failed; the outcomes carry no feedback
    #[serde(default)]
    pub fatal: bool,
    /// SHA-256 over the executed unit sources
    #[serde(default)]
    pub program_digest: String,
    #[serde(default)]
    pub duration_ms: u64,
}

impl ResultReport {
    /// A report for a submission that never produced outcomes.
    pub fn fatal(message: impl Into<String>, skip_policy: SkipPolicy) -> Self {
        Self {
            success: false,
            outcomes: Vec::new(),
            errors: vec![CapturedError {
                case: None,
                message: message.into(),
                stack: None,
            }],
            responses: Vec::new(),
            pass_rate: 0.0,
            skip_policy,
            fatal: true,
            program_digest: String::new(),
            duration_ms: 0,
        }
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.program_digest = digest.into();
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.outcomes.len(),
            ..ReportSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome.state {
                TaskState::Passed => summary.passed += 1,
                TaskState::Failed => summary.failed += 1,
                TaskState::Skipped => summary.skipped += 1,
                TaskState::Errored => summary.errored += 1,
            }
        }
        summary
    }

    /// Pass rate as a percentage.
    pub fn pass_percent(&self) -> f64 {
        self.pass_rate * 100.0
    }

    /// Whether the pass rate reaches `min_pass_rate` percent (inclusive).
    ///
    /// Compared on counts so that e.g. 4 of 5 meets 80 exactly. A fatal
    /// report never meets a threshold.
    pub fn meets_threshold(&self, min_pass_rate: f64) -> bool {
        if self.fatal {
            return false;
        }
        let summary = self.summary();
        let counted = summary.counted(self.skip_policy);
        if counted == 0 {
            return min_pass_rate <= 0.0;
        }
        (summary.passed as f64) * 100.0 >= min_pass_rate * (counted as f64)
    }
}

/// Pass rate for the given outcomes under `policy`; 0 when nothing counts.
pub fn pass_rate(outcomes: &[TaskOutcome], policy: SkipPolicy) -> f64 {
    let passed = outcomes
        .iter()
        .filter(|o| o.state == TaskState::Passed)
        .count();
    let counted = outcomes
        .iter()
        .filter(|o| policy == SkipPolicy::CountAsFailure || o.state != TaskState::Skipped)
        .count();
    if counted == 0 {
        0.0
    } else {
        passed as f64 / counted as f64
    }
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Extract the captured response from unit metadata, if one was attached.
fn captured_response(case: &str, meta: &Value) -> Option<CapturedResponse> {
    let response = meta.get("response").filter(|r| r.is_object())?;
    let feedback = meta
        .get("verdict")
        .and_then(|verdict| string_at(verdict, "feedback"))
        .filter(|f| !f.is_empty());

    Some(CapturedResponse {
        case: case.to_string(),
        prompt: string_at(response, "prompt").unwrap_or_default(),
        system_prompt: string_at(response, "systemPrompt").unwrap_or_default(),
        response: string_at(response, "text").unwrap_or_default(),
        feedback,
    })
}

fn outcome(unit: HostUnitReport, errors: &mut Vec<CapturedError>) -> TaskOutcome {
    let state = TaskState::from(unit.state);

    let mut unit_errors: Vec<CapturedError> = unit
        .errors
        .into_iter()
        .map(|e| CapturedError {
            case: Some(unit.name.clone()),
            message: e.message,
            stack: e.stack,
        })
        .collect();

    if unit_errors.is_empty() && matches!(state, TaskState::Failed | TaskState::Errored) {
        let message = if state == TaskState::Failed {
            SYNTHESIZED_FAILURE
        } else {
            SYNTHESIZED_UNKNOWN
        };
        unit_errors.push(CapturedError {
            case: Some(unit.name.clone()),
            message: message.to_string(),
            stack: None,
        });
    }

    let response = unit
        .meta
        .as_ref()
        .and_then(|meta| captured_response(&unit.name, meta));

    let first = unit_errors.first().cloned();
    errors.extend(unit_errors);

    TaskOutcome {
        name: unit.name,
        state,
        duration_ms: unit.duration_ms,
        error: first,
        response,
    }
}

/// Normalize a host report into a [`ResultReport`].
///
/// Every failed or errored outcome ends up with an error, synthesized when
/// the host supplied none.
pub fn normalize(report: HostReport, skip_policy: SkipPolicy) -> ResultReport {
    let mut errors = Vec::new();
    let outcomes: Vec<TaskOutcome> = report
        .units
        .into_iter()
        .map(|unit| outcome(unit, &mut errors))
        .collect();

    let responses = outcomes
        .iter()
        .filter_map(|o| o.response.clone())
        .collect();

    let all_counted_pass = outcomes.iter().all(|o| {
        o.state == TaskState::Passed
            || (o.state == TaskState::Skipped && skip_policy == SkipPolicy::Exclude)
    });

    ResultReport {
        success: report.success && all_counted_pass,
        pass_rate: pass_rate(&outcomes, skip_policy),
        outcomes,
        errors,
        responses,
        skip_policy,
        fatal: false,
        program_digest: String::new(),
        duration_ms: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn host_report(states: &[HostState]) -> HostReport {
        HostReport {
            success: states.iter().all(|s| *s == HostState::Pass),
            units: states
                .iter()
                .enumerate()
                .map(|(i, s)| HostUnitReport::new(format!("case {}", i), *s))
                .collect(),
        }
    }

    #[test]
    fn test_failure_without_error_is_synthesized() {
        let report = normalize(
            host_report(&[HostState::Fail, HostState::Unknown]),
            SkipPolicy::default(),
        );
        assert_eq!(
            report.outcomes[0].error.as_ref().unwrap().message,
            SYNTHESIZED_FAILURE
        );
        assert_eq!(report.outcomes[1].state, TaskState::Errored);
        assert_eq!(
            report.outcomes[1].error.as_ref().unwrap().message,
            SYNTHESIZED_UNKNOWN
        );
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_every_failed_outcome_has_an_error() {
        let mut raw = host_report(&[HostState::Fail, HostState::Fail, HostState::Pass]);
        raw.units[0] = raw.units[0]
            .clone()
            .with_error(HostError::new("one"))
            .with_error(HostError::new("two"));

        let report = normalize(raw, SkipPolicy::default());
        for outcome in &report.outcomes {
            if outcome.state == TaskState::Failed {
                assert!(outcome.error.is_some());
            }
        }
        assert_eq!(report.outcomes[0].error.as_ref().unwrap().message, "one");
        assert_eq!(report.errors.len(), 3);
        assert!(report.outcomes[2].error.is_none());
    }

    #[test]
    fn test_pass_rate() {
        let report = normalize(
            host_report(&[HostState::Pass, HostState::Pass, HostState::Fail, HostState::Skip]),
            SkipPolicy::CountAsFailure,
        );
        assert_eq!(report.pass_rate, 0.5);
        assert!(!report.success);

        let report = normalize(host_report(&[]), SkipPolicy::CountAsFailure);
        assert_eq!(report.pass_rate, 0.0);
    }

    #[test]
    fn test_skip_policy_exclude() {
        let report = normalize(
            host_report(&[HostState::Pass, HostState::Skip]),
            SkipPolicy::Exclude,
        );
        assert_eq!(report.pass_rate, 1.0);
        assert!(report.meets_threshold(100.0));

        let report = normalize(
            host_report(&[HostState::Pass, HostState::Skip]),
            SkipPolicy::CountAsFailure,
        );
        assert_eq!(report.pass_rate, 0.5);
        assert!(!report.meets_threshold(100.0));

        let report = normalize(host_report(&[HostState::Skip]), SkipPolicy::Exclude);
        assert_eq!(report.pass_rate, 0.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let report = normalize(
            host_report(&[
                HostState::Pass,
                HostState::Pass,
                HostState::Pass,
                HostState::Pass,
                HostState::Fail,
            ]),
            SkipPolicy::default(),
        );
        assert!(report.meets_threshold(80.0));
        assert!(!report.meets_threshold(80.1));
        assert_eq!(report.summary().passed, 4);
    }

    #[test]
    fn test_fatal_report() {
        let report = ResultReport::fatal("host unavailable", SkipPolicy::default());
        assert!(!report.success);
        assert!(report.fatal);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.pass_rate, 0.0);
        assert!(!report.meets_threshold(0.0));
    }

    #[test]
    fn test_captured_response() {
        let mut raw = host_report(&[HostState::Fail]);
        raw.units[0] = raw.units[0].clone().with_meta(json!({
            "response": { "prompt": "weather?", "systemPrompt": "be nice", "text": "It is sunny." },
            "verdict": { "passed": false, "feedback": "too verbose" }
        }));

        let report = normalize(raw, SkipPolicy::default());
        assert_eq!(
            report.responses,
            vec![CapturedResponse {
                case: "case 0".into(),
                prompt: "weather?".into(),
                system_prompt: "be nice".into(),
                response: "It is sunny.".into(),
                feedback: Some("too verbose".into()),
            }]
        );
        assert_eq!(report.outcomes[0].response, Some(report.responses[0].clone()));
    }

    #[test]
    fn test_meta_without_response_is_ignored() {
        let mut raw = host_report(&[HostState::Pass]);
        raw.units[0] = raw.units[0].clone().with_meta(json!({ "other": 1 }));
        assert!(normalize(raw, SkipPolicy::default()).responses.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let report = normalize(
            host_report(&[HostState::Pass, HostState::Fail, HostState::Skip, HostState::Unknown]),
            SkipPolicy::Exclude,
        );
        let summary = report.summary();
        assert_eq!(
            summary,
            ReportSummary {
                total: 4,
                passed: 1,
                failed: 1,
                skipped: 1,
                errored: 1,
            }
        );
        assert_eq!(summary.counted(SkipPolicy::Exclude), 3);
    }
}
