//! Mock test host for testing and dry runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::{HostError, HostReport, HostState, HostUnitReport, Submission, TestHost};
use crate::{Error, Result};

enum Behavior {
    /// Every unit gets the same state; failures carry the message
    Uniform { state: HostState, message: String },
    /// Unit `i` gets `states[i % len]`
    Pattern(Vec<HostState>),
    /// Reports (or submission failures) handed out in order
    Scripted(VecDeque<std::result::Result<HostReport, String>>),
    /// Every submission fails
    Unavailable(String),
}

/// A test host that never spawns anything.
///
/// Synthesized unit reports carry the same `meta.response` payload a compiled
/// program would attach, with the provided system prompt echoed back.
pub struct MockHost {
    behavior: Mutex<Behavior>,
    submissions: Mutex<Vec<Submission>>,
    cleanups: Mutex<Vec<String>>,
}

impl MockHost {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            submissions: Mutex::new(Vec::new()),
            cleanups: Mutex::new(Vec::new()),
        }
    }

    /// Every unit passes
    pub fn all_pass() -> Self {
        Self::with_behavior(Behavior::Uniform {
            state: HostState::Pass,
            message: String::new(),
        })
    }

    /// Every unit fails with the given judge feedback
    pub fn all_fail(feedback: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Uniform {
            state: HostState::Fail,
            message: feedback.into(),
        })
    }

    /// Unit states follow a repeating pattern, failures without errors
    pub fn pattern(states: Vec<HostState>) -> Self {
        Self::with_behavior(Behavior::Pattern(states))
    }

    /// Hand out the given results in order; `Err` entries become submission
    /// failures. Runs past the end of the script fail.
    pub fn scripted(results: Vec<std::result::Result<HostReport, String>>) -> Self {
        Self::with_behavior(Behavior::Scripted(results.into()))
    }

    /// Every submission fails as if the host could not be reached
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Unavailable(message.into()))
    }

    /// Submissions received so far
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Ids of the submissions cleaned up so far
    pub fn cleanups(&self) -> Vec<String> {
        self.cleanups.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn unit_report(submission: &Submission, name: &str, state: HostState, message: &str) -> HostUnitReport {
        let system_prompt = submission.provided.system_prompt().unwrap_or_default();
        let passed = state == HostState::Pass;

        let mut unit = HostUnitReport::new(name, state).with_meta(json!({
            "response": {
                "prompt": name,
                "systemPrompt": system_prompt,
                "text": format!("mock response for {}", name),
            },
            "verdict": { "passed": passed, "feedback": message },
        }));
        if state == HostState::Fail && !message.is_empty() {
            unit = unit.with_error(HostError::new(message));
        }
        unit
    }
}

#[async_trait]
impl TestHost for MockHost {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, submission: &Submission) -> Result<HostReport> {
        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push(submission.clone());
        }

        let mut behavior = self
            .behavior
            .lock()
            .map_err(|_| Error::host_submission("mock host state poisoned"))?;

        match &mut *behavior {
            Behavior::Uniform { state, message } => {
                let units: Vec<HostUnitReport> = submission
                    .units
                    .iter()
                    .map(|u| Self::unit_report(submission, &u.name, *state, message))
                    .collect();
                Ok(HostReport {
                    success: units.iter().all(|u| u.state == HostState::Pass),
                    units,
                })
            }
            Behavior::Pattern(states) => {
                let units: Vec<HostUnitReport> = submission
                    .units
                    .iter()
                    .enumerate()
                    .map(|(i, u)| {
                        let state = if states.is_empty() {
                            HostState::Unknown
                        } else {
                            states[i % states.len()]
                        };
                        Self::unit_report(submission, &u.name, state, "")
                    })
                    .collect();
                Ok(HostReport {
                    success: units.iter().all(|u| u.state == HostState::Pass),
                    units,
                })
            }
            Behavior::Scripted(queue) => match queue.pop_front() {
                Some(Ok(report)) => Ok(report),
                Some(Err(message)) => Err(Error::host_submission(message)),
                None => Err(Error::host_submission("mock host script exhausted")),
            },
            Behavior::Unavailable(message) => Err(Error::host_submission(message.clone())),
        }
    }

    async fn cleanup(&self, submission: &Submission) -> Result<()> {
        if let Ok(mut cleanups) = self.cleanups.lock() {
            cleanups.push(submission.id.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompiledUnit;
    use crate::host::ProvidedValues;

    fn submission(count: usize) -> Submission {
        let units = (0..count)
            .map(|i| CompiledUnit {
                name: format!("case {}", i),
                file_stem: format!("{:03}_case_{}", i + 1, i),
                source: String::new(),
            })
            .collect();
        Submission::new(units, ProvidedValues::new().with("systemPrompt", "be brief"))
    }

    #[tokio::test]
    async fn test_all_pass() {
        let host = MockHost::all_pass();
        let report = host.run(&submission(2)).await.unwrap();
        assert!(report.success);
        assert_eq!(report.units.len(), 2);
        let meta = report.units[0].meta.as_ref().unwrap();
        assert_eq!(meta["response"]["systemPrompt"], "be brief");
        assert_eq!(host.submissions().len(), 1);
    }

    #[test]
    fn test_all_fail_carries_feedback() {
        let host = MockHost::all_fail("too verbose");
        let report = tokio_test::block_on(host.run(&submission(1))).unwrap();
        assert!(!report.success);
        assert_eq!(report.units[0].state, HostState::Fail);
        assert_eq!(report.units[0].errors[0].message, "too verbose");
    }

    #[tokio::test]
    async fn test_pattern() {
        let host = MockHost::pattern(vec![HostState::Pass, HostState::Fail]);
        let report = host.run(&submission(3)).await.unwrap();
        let states: Vec<HostState> = report.units.iter().map(|u| u.state).collect();
        assert_eq!(states, vec![HostState::Pass, HostState::Fail, HostState::Pass]);
        assert!(report.units[1].errors.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_and_unavailable() {
        let host = MockHost::scripted(vec![Ok(HostReport::default()), Err("down".into())]);
        assert!(host.run(&submission(1)).await.is_ok());
        assert!(host.run(&submission(1)).await.unwrap_err().is_host_submission());
        assert!(host.run(&submission(1)).await.is_err());

        let host = MockHost::unavailable("connection refused");
        let err = host.run(&submission(1)).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_cleanup_is_recorded() {
        let host = MockHost::all_pass();
        let submission = submission(1);
        host.cleanup(&submission).await.unwrap();
        assert_eq!(host.cleanups(), vec![submission.id]);
    }
}
