//! Specification Validation
//!
//! Reference and range checks applied when a document is loaded and before
//! a suite is built.

use std::collections::HashSet;

use thiserror::Error;

use super::types::Specification;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field required: {0}")]
    Required(String),

    #[error("benchmark '{benchmark}' references unknown tool '{tool}'")]
    UnknownTool { benchmark: String, tool: String },

    #[error("{owner} references unknown schema '{schema}'")]
    UnknownSchema { owner: String, schema: String },

    #[error("tool '{tool}' references unknown generator '{generator}'")]
    UnknownGenerator { tool: String, generator: String },

    #[error("duplicate benchmark name: {0}")]
    DuplicateBenchmark(String),

    #[error("benchmark '{0}' has no user message")]
    MissingUserMessage(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl Specification {
    /// Validate the specification, returning the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Every validation problem in the specification, in document order.
    pub fn problems(&self) -> Vec<ValidationError> {
        let mut problems = Vec::new();

        if self.metadata.name.trim().is_empty() {
            problems.push(ValidationError::Required("metadata.name".into()));
        }
        if self.agent.model.trim().is_empty() {
            problems.push(ValidationError::Required("agent.model".into()));
        }
        if self.agent.system_prompt.trim().is_empty() {
            problems.push(ValidationError::Required("agent.systemPrompt".into()));
        }

        for (name, tool) in &self.tools {
            if !self.schemas.contains_key(&tool.output) {
                problems.push(ValidationError::UnknownSchema {
                    owner: format!("tool '{}'", name),
                    schema: tool.output.clone(),
                });
            }
            if let Some(generator) = &tool.generator {
                if !self.generators.contains_key(generator) {
                    problems.push(ValidationError::UnknownGenerator {
                        tool: name.clone(),
                        generator: generator.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for case in &self.benchmarks {
            if !seen.insert(case.name.as_str()) {
                problems.push(ValidationError::DuplicateBenchmark(case.name.clone()));
            }
            if case.first_user_message().is_none() {
                problems.push(ValidationError::MissingUserMessage(case.name.clone()));
            }
            for tool in &case.tools {
                if !self.tools.contains_key(tool) {
                    problems.push(ValidationError::UnknownTool {
                        benchmark: case.name.clone(),
                        tool: tool.clone(),
                    });
                }
            }
            if !self.schemas.contains_key(&case.judge.schema) {
                problems.push(ValidationError::UnknownSchema {
                    owner: format!("benchmark '{}'", case.name),
                    schema: case.judge.schema.clone(),
                });
            }
            if let Some(min_score) = case.judge.min_score {
                if !(0.0..=1.0).contains(&min_score) {
                    problems.push(ValidationError::OutOfRange(format!(
                        "benchmark '{}' minScore {} must be between 0 and 1",
                        case.name, min_score
                    )));
                }
            }
        }

        if let Some(optimizer) = &self.optimizer {
            if let Some(rate) = optimizer.min_pass_rate {
                if !(0.0..=100.0).contains(&rate) {
                    problems.push(ValidationError::OutOfRange(format!(
                        "optimizer.minPassRate {} must be between 0 and 100",
                        rate
                    )));
                }
            }
            if optimizer.iterations == Some(0) {
                problems.push(ValidationError::OutOfRange(
                    "optimizer.iterations must be at least 1".into(),
                ));
            }
        }

        problems
    }
}
