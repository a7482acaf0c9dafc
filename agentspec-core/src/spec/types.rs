//! Specification Type Definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::property::PropertyType;

/// Declarative definition of an agent, its tools and its benchmark cases.
///
/// Specifications are values: the optimizer produces a new one with
/// [`Specification::with_system_prompt`] instead of mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    pub metadata: Metadata,
    #[serde(default)]
    pub schemas: IndexMap<String, PropertyType>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub generators: IndexMap<String, Generator>,
    pub agent: AgentBlock,
    #[serde(default)]
    pub tools: IndexMap<String, ToolDef>,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// The agent under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentBlock {
    /// Model identifier, optionally provider-qualified (`openai:gpt-4o`)
    pub model: String,
    /// System prompt text, kept verbatim
    pub system_prompt: String,
    #[serde(default)]
    pub tool_choice: ToolChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
            ToolChoice::None => "none",
        }
    }
}

/// A simulated tool. Its output is synthesized by the inference provider
/// against the `output` schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    pub description: String,
    #[serde(default)]
    pub input: IndexMap<String, PropertyType>,
    /// Name of an entry in [`Specification::schemas`]
    pub output: String,
    /// Name of an entry in [`Specification::generators`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

/// Prompt template used to synthesize tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One named benchmark scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCase {
    pub name: String,
    pub messages: Vec<Message>,
    /// Tools the case may use
    #[serde(default)]
    pub tools: Vec<String>,
    pub judge: Judge,
}

impl BenchmarkCase {
    /// The first user-role message, which drives the agent.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// How a case's outcome is judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Judge {
    /// Evaluation prompt template
    pub prompt: String,
    /// Name of the expected-outcome schema, e.g. `{passed, feedback}`
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    /// Judge model; defaults to the agent model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// `optimizer` block of a specification document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_prompt: Option<String>,
    /// Minimum acceptable pass rate, in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pass_rate: Option<f64>,
}

impl Specification {
    /// Current system prompt of the agent
    pub fn system_prompt(&self) -> &str {
        &self.agent.system_prompt
    }

    /// A copy of this specification with only the system prompt replaced.
    pub fn with_system_prompt(&self, system_prompt: impl Into<String>) -> Specification {
        let mut next = self.clone();
        next.agent.system_prompt = system_prompt.into();
        next
    }

    /// Look up a benchmark case by name
    pub fn benchmark(&self, name: &str) -> Option<&BenchmarkCase> {
        self.benchmarks.iter().find(|b| b.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> Specification {
        Specification {
            metadata: Metadata {
                name: "support-bot".into(),
                version: "1.0.0".into(),
                description: None,
            },
            schemas: IndexMap::new(),
            generators: IndexMap::new(),
            agent: AgentBlock {
                model: "openai:gpt-4o-mini".into(),
                system_prompt: "You are a helpful support agent.".into(),
                tool_choice: ToolChoice::Auto,
                max_steps: Some(5),
            },
            tools: IndexMap::new(),
            benchmarks: vec![BenchmarkCase {
                name: "greeting".into(),
                messages: vec![
                    Message {
                        role: Role::System,
                        content: "context".into(),
                    },
                    Message::user("Hello there"),
                ],
                tools: Vec::new(),
                judge: Judge {
                    prompt: "Was the reply polite?".into(),
                    schema: "Verdict".into(),
                    min_score: None,
                    model: None,
                },
            }],
            optimizer: None,
        }
    }

    #[test]
    fn test_with_system_prompt_replaces_only_prompt() {
        let spec = sample_spec();
        let next = spec.with_system_prompt("Be concise.");

        assert_eq!(next.system_prompt(), "Be concise.");
        assert_eq!(spec.system_prompt(), "You are a helpful support agent.");
        assert_eq!(next.agent.model, spec.agent.model);
        assert_eq!(next.benchmarks, spec.benchmarks);
    }

    #[test]
    fn test_first_user_message_skips_other_roles() {
        let spec = sample_spec();
        let case = spec.benchmark("greeting").unwrap();
        assert_eq!(case.first_user_message(), Some("Hello there"));
        assert!(spec.benchmark("missing").is_none());
    }

    #[test]
    fn test_camel_case_keys() {
        let spec = sample_spec();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["agent"]["systemPrompt"], "You are a helpful support agent.");
        assert_eq!(json["agent"]["toolChoice"], "auto");
        assert_eq!(json["agent"]["maxSteps"], 5);
        assert!(json.get("optimizer").is_none());
    }
}
