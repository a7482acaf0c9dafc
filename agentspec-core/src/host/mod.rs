//! Test Host
//!
//! The external engine that runs compiled units and reports per-unit
//! outcomes. [`VitestHost`] drives a real vitest process; [`MockHost`]
//! returns scripted reports for tests and dry runs.

mod mock;
mod vitest;

pub use mock::MockHost;
pub use vitest::VitestHost;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compiler::CompiledUnit;
use crate::spec::Specification;
use crate::utils::{now_utc, run_stamp};
use crate::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Submission
// ─────────────────────────────────────────────────────────────────────────────

/// Named values injected into a compiled program at run time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvidedValues(IndexMap<String, Value>);

impl ProvidedValues {
    /// Key holding the effective system prompt
    pub const SYSTEM_PROMPT: &'static str = "systemPrompt";
    /// Key holding the agent model id
    pub const MODEL: &'static str = "model";

    pub fn new() -> Self {
        Self::default()
    }

    /// Values derived from a specification's agent block.
    pub fn from_spec(spec: &Specification) -> Self {
        Self::new()
            .with(Self::SYSTEM_PROMPT, spec.agent.system_prompt.clone())
            .with(Self::MODEL, spec.agent.model.clone())
    }

    /// Add or replace a value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The provided system prompt, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.get(Self::SYSTEM_PROMPT).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize as a JSON object string.
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone().into_iter().collect()).to_string()
    }
}

/// One request to a test host: the units to run and the values to inject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Unique per submission; hosts derive artifact names from it
    pub id: String,
    pub units: Vec<CompiledUnit>,
    pub provided: ProvidedValues,
}

impl Submission {
    pub fn new(units: Vec<CompiledUnit>, provided: ProvidedValues) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: format!("{}-{}", run_stamp(&now_utc()), &suffix[..8]),
            units,
            provided,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host report
// ─────────────────────────────────────────────────────────────────────────────

/// Raw per-unit state as reported by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostState {
    Pass,
    Fail,
    Skip,
    Unknown,
}

/// An error attached to a unit by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }
}

/// Raw per-unit report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostUnitReport {
    pub name: String,
    pub state: HostState,
    pub duration_ms: u64,
    #[serde(default)]
    pub errors: Vec<HostError>,
    /// Metadata the unit attached while running (captured response, verdict)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl HostUnitReport {
    pub fn new(name: impl Into<String>, state: HostState) -> Self {
        Self {
            name: name.into(),
            state,
            duration_ms: 0,
            errors: Vec::new(),
            meta: None,
        }
    }

    pub fn with_error(mut self, error: HostError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// A host's report for a whole submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostReport {
    pub success: bool,
    pub units: Vec<HostUnitReport>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// An engine that executes compiled units.
///
/// `run` blocks until every unit has finished. An `Err` means the
/// submission itself failed (host unavailable, crashed, timed out); failing
/// cases are reported inside the [`HostReport`].
#[async_trait]
pub trait TestHost: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Run every unit of the submission and report the outcomes.
    async fn run(&self, submission: &Submission) -> Result<HostReport>;

    /// Remove any artifacts written for the submission.
    async fn cleanup(&self, submission: &Submission) -> Result<()>;
}

#[async_trait]
impl<T: TestHost + ?Sized> TestHost for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn run(&self, submission: &Submission) -> Result<HostReport> {
        (**self).run(submission).await
    }

    async fn cleanup(&self, submission: &Submission) -> Result<()> {
        (**self).cleanup(submission).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{parse_specification, DocumentFormat};

    #[test]
    fn test_provided_values_from_spec() {
        let spec = parse_specification(
            r#"
metadata: { name: demo }
agent: { model: gpt-4o, systemPrompt: "Say \"hi\"" }
"#,
            DocumentFormat::Yaml,
        )
        .unwrap();

        let provided = ProvidedValues::from_spec(&spec);
        assert_eq!(provided.system_prompt(), Some("Say \"hi\""));
        assert_eq!(provided.len(), 2);

        let parsed: Value = serde_json::from_str(&provided.to_json()).unwrap();
        assert_eq!(parsed["systemPrompt"], "Say \"hi\"");
        assert_eq!(parsed["model"], "gpt-4o");
    }

    #[test]
    fn test_submission_ids_are_unique() {
        let a = Submission::new(Vec::new(), ProvidedValues::new());
        let b = Submission::new(Vec::new(), ProvidedValues::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_host_state_serialization() {
        assert_eq!(serde_json::to_string(&HostState::Unknown).unwrap(), "\"unknown\"");
        let state: HostState = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(state, HostState::Skip);
    }
}
