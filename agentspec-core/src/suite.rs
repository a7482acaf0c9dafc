//! Suite Builder
//!
//! Programmatic construction of specifications. A suite is an owned builder
//! value: nothing is registered globally, so any number of suites can be
//! built and run side by side.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentspec_core::suite::{run_suite, Scenario, SuiteBuilder};
//!
//! let spec = SuiteBuilder::define("greeter")
//!     .agent("gpt-4o-mini", "You greet users.")
//!     .scenario(Scenario::new("says hello").user("hi").judge("Did it greet the user?"))
//!     .build()?;
//!
//! let report = run_suite(&spec, &orchestrator).await?;
//! ```

use indexmap::IndexMap;

use crate::compiler::compile;
use crate::executor::{Orchestrator, ResultReport};
use crate::host::{ProvidedValues, TestHost};
use crate::spec::{
    AgentBlock, BenchmarkCase, Generator, Judge, Message, Metadata, OptimizerBlock,
    PropertyType, Role, Specification, ToolChoice, ToolDef,
};
use crate::Result;

/// Judge schema used by scenarios that do not name one.
pub const DEFAULT_VERDICT_SCHEMA: &str = "Verdict";

/// `{passed: boolean, feedback: string, score: number}`
pub fn verdict_schema() -> PropertyType {
    PropertyType::object([
        ("passed", PropertyType::Boolean),
        ("feedback", PropertyType::String),
        ("score", PropertyType::Number),
    ])
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for one benchmark case.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    messages: Vec<Message>,
    tools: Vec<String>,
    judge_prompt: String,
    judge_schema: String,
    min_score: Option<f64>,
    judge_model: Option<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
            tools: Vec::new(),
            judge_prompt: String::new(),
            judge_schema: DEFAULT_VERDICT_SCHEMA.to_string(),
            min_score: None,
            judge_model: None,
        }
    }

    /// Append a user turn
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Append a turn with any role
    pub fn message(mut self, role: Role, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    /// Permit a declared tool
    pub fn tool(mut self, name: impl Into<String>) -> Self {
        self.tools.push(name.into());
        self
    }

    /// Evaluation prompt for the judge
    pub fn judge(mut self, prompt: impl Into<String>) -> Self {
        self.judge_prompt = prompt.into();
        self
    }

    /// Expected-outcome schema for the judge
    pub fn judge_schema(mut self, schema: impl Into<String>) -> Self {
        self.judge_schema = schema.into();
        self
    }

    pub fn judge_model(mut self, model: impl Into<String>) -> Self {
        self.judge_model = Some(model.into());
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    fn into_case(self) -> BenchmarkCase {
        BenchmarkCase {
            name: self.name,
            messages: self.messages,
            tools: self.tools,
            judge: Judge {
                prompt: self.judge_prompt,
                schema: self.judge_schema,
                min_score: self.min_score,
                model: self.judge_model,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Suite
// ─────────────────────────────────────────────────────────────────────────────

/// Owned builder for a whole specification.
#[derive(Debug, Clone)]
pub struct SuiteBuilder {
    metadata: Metadata,
    agent: Option<AgentBlock>,
    schemas: IndexMap<String, PropertyType>,
    generators: IndexMap<String, Generator>,
    tools: IndexMap<String, ToolDef>,
    scenarios: Vec<Scenario>,
    optimizer: Option<OptimizerBlock>,
}

impl SuiteBuilder {
    /// Start a new suite
    pub fn define(name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata {
                name: name.into(),
                version: "0.1.0".to_string(),
                description: None,
            },
            agent: None,
            schemas: IndexMap::new(),
            generators: IndexMap::new(),
            tools: IndexMap::new(),
            scenarios: Vec::new(),
            optimizer: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.metadata.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Set the agent under test
    pub fn agent(mut self, model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        self.agent = Some(AgentBlock {
            model: model.into(),
            system_prompt: system_prompt.into(),
            tool_choice: ToolChoice::default(),
            max_steps: None,
        });
        self
    }

    /// Set the tool selection policy; call after [`SuiteBuilder::agent`]
    pub fn tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        if let Some(agent) = self.agent.as_mut() {
            agent.tool_choice = tool_choice;
        }
        self
    }

    /// Set the step budget; call after [`SuiteBuilder::agent`]
    pub fn max_steps(mut self, max_steps: u32) -> Self {
        if let Some(agent) = self.agent.as_mut() {
            agent.max_steps = Some(max_steps);
        }
        self
    }

    pub fn schema(mut self, name: impl Into<String>, schema: PropertyType) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    pub fn generator(mut self, name: impl Into<String>, generator: Generator) -> Self {
        self.generators.insert(name.into(), generator);
        self
    }

    pub fn tool(mut self, name: impl Into<String>, tool: ToolDef) -> Self {
        self.tools.insert(name.into(), tool);
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerBlock) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Validate and produce the specification.
    ///
    /// The default verdict schema is declared automatically when a scenario
    /// relies on it.
    pub fn build(self) -> Result<Specification> {
        let SuiteBuilder {
            metadata,
            agent,
            mut schemas,
            generators,
            tools,
            scenarios,
            optimizer,
        } = self;

        let uses_default_verdict = scenarios
            .iter()
            .any(|s| s.judge_schema == DEFAULT_VERDICT_SCHEMA);
        if uses_default_verdict && !schemas.contains_key(DEFAULT_VERDICT_SCHEMA) {
            schemas.insert(DEFAULT_VERDICT_SCHEMA.to_string(), verdict_schema());
        }

        let agent = agent.unwrap_or(AgentBlock {
            model: String::new(),
            system_prompt: String::new(),
            tool_choice: ToolChoice::default(),
            max_steps: None,
        });

        let spec = Specification {
            metadata,
            schemas,
            generators,
            agent,
            tools,
            benchmarks: scenarios.into_iter().map(Scenario::into_case).collect(),
            optimizer,
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Compile a suite and execute it once with its own system prompt.
pub async fn run_suite<H: TestHost>(
    spec: &Specification,
    orchestrator: &Orchestrator<H>,
) -> Result<ResultReport> {
    let program = compile(spec)?;
    Ok(orchestrator
        .execute(&program.units, &ProvidedValues::from_spec(spec))
        .await)
}
