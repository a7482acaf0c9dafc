//! Optimization Controller
//!
//! Runs compile → execute → score repeatedly, asking an
//! [`InferenceProvider`] for an improved system prompt after every
//! iteration that falls short of the pass-rate threshold.
//!
//! # Architecture
//!
//! - [`step`] - Pure loop transition over [`LoopState`]
//! - [`format_feedback`] - Report → bounded feedback sections
//! - [`improvement_request`] - Feedback → improvement prompt
//! - [`Optimizer`] - Drives the loop and keeps the iteration history
//!
//! # Example
//!
//! ```rust,ignore
//! use agentspec_core::optimizer::{Optimizer, OptimizerConfig, OptimizerOverrides};
//!
//! let config = OptimizerConfig::resolve(&spec, &OptimizerOverrides::default())?;
//! let optimizer = Optimizer::new(orchestrator, provider, config);
//! match optimizer.optimize(&spec).await {
//!     Ok(outcome) => println!("{} after {} iterations", outcome.state.name(), outcome.history.len()),
//!     Err(aborted) => eprintln!("{} ({} iterations kept)", aborted.error, aborted.history.len()),
//! }
//! ```

mod feedback;
mod prompt;
mod state;

pub use feedback::{
    format_feedback, FeedbackDocument, FeedbackStrategy, ERROR_LIMIT, PROMPT_LIMIT,
    RESPONSE_LIMIT, STACK_LINES, SYSTEM_ECHO_LIMIT,
};
pub use prompt::{improvement_request, DEFAULT_IMPROVEMENT_TEMPLATE, IMPROVER_SYSTEM_PROMPT};
pub use state::{step, LoopState, StopPolicy};

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compiler::compile;
use crate::config::ConfigValidationError;
use crate::executor::{Orchestrator, ResultReport};
use crate::host::{ProvidedValues, TestHost};
use crate::provider::{InferenceProvider, TextRequest};
use crate::spec::{save_specification, Specification};
use crate::utils::strip_code_fences;
use crate::Error;

/// Iteration budget when none is configured
pub const DEFAULT_ITERATIONS: usize = 3;
/// Pass-rate threshold (percent) when none is configured
pub const DEFAULT_MIN_PASS_RATE: f64 = 100.0;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for one optimization run. Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Model asked for improved prompts
    pub model: String,
    pub iterations: usize,
    /// Minimum pass rate in percent, inclusive
    pub min_pass_rate: f64,
    pub strategy: FeedbackStrategy,
    /// Replaces [`DEFAULT_IMPROVEMENT_TEMPLATE`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_prompt: Option<String>,
    /// Where the latest specification is written during the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// Caller-supplied values that take precedence over the document's
/// `optimizer` block.
#[derive(Debug, Clone, Default)]
pub struct OptimizerOverrides {
    pub model: Option<String>,
    pub iterations: Option<usize>,
    pub min_pass_rate: Option<f64>,
    pub strategy: Option<String>,
    pub feedback_prompt: Option<String>,
    pub snapshot_path: Option<PathBuf>,
}

impl OptimizerConfig {
    /// Resolve the run settings from a specification and overrides.
    pub fn resolve(
        spec: &Specification,
        overrides: &OptimizerOverrides,
    ) -> Result<Self, ConfigValidationError> {
        let block = spec.optimizer.clone().unwrap_or_default();

        let strategy = overrides.strategy.as_deref().or(block.strategy.as_deref());

        let config = Self {
            model: overrides
                .model
                .clone()
                .or(block.model)
                .unwrap_or_else(|| spec.agent.model.clone()),
            iterations: overrides
                .iterations
                .or(block.iterations)
                .unwrap_or(DEFAULT_ITERATIONS),
            min_pass_rate: overrides
                .min_pass_rate
                .or(block.min_pass_rate)
                .unwrap_or(DEFAULT_MIN_PASS_RATE),
            strategy: FeedbackStrategy::resolve(strategy),
            feedback_prompt: overrides.feedback_prompt.clone().or(block.feedback_prompt),
            snapshot_path: overrides.snapshot_path.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.model.trim().is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "optimizer.model".into(),
                message: "must not be empty".into(),
            });
        }
        if self.iterations == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "optimizer.iterations".into(),
                message: "must be at least 1".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.min_pass_rate) {
            return Err(ConfigValidationError::InvalidValue {
                field: "optimizer.minPassRate".into(),
                message: format!("{} is not a percentage between 0 and 100", self.min_pass_rate),
            });
        }
        Ok(())
    }

    pub fn stop_policy(&self) -> StopPolicy {
        StopPolicy {
            max_iterations: self.iterations,
            min_pass_rate: self.min_pass_rate,
        }
    }

    fn template(&self) -> &str {
        self.feedback_prompt
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_IMPROVEMENT_TEMPLATE)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// One finished iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based
    pub iteration: usize,
    /// System prompt the iteration ran with
    pub system_prompt: String,
    pub report: ResultReport,
    /// Loop state after this iteration
    pub state: LoopState,
}

/// A completed optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// The last specification tried
    pub specification: Specification,
    pub history: Vec<IterationRecord>,
    pub state: LoopState,
    pub run_id: String,
    pub duration_ms: u64,
}

impl OptimizationOutcome {
    pub fn converged(&self) -> bool {
        matches!(self.state, LoopState::Converged { .. })
    }

    pub fn final_report(&self) -> Option<&ResultReport> {
        self.history.last().map(|record| &record.report)
    }

    /// Pass rate per iteration, in percent
    pub fn score_history(&self) -> Vec<f64> {
        self.history
            .iter()
            .map(|record| record.report.pass_percent())
            .collect()
    }
}

/// An aborted run. The iterations finished before the failure are kept.
#[derive(Debug, thiserror::Error)]
#[error("optimization aborted after {} iteration(s): {error}", .history.len())]
pub struct OptimizationError {
    pub error: Error,
    pub history: Vec<IterationRecord>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Optimizer
// ─────────────────────────────────────────────────────────────────────────────

/// Drives the compile → execute → improve loop.
pub struct Optimizer<H, P> {
    orchestrator: Orchestrator<H>,
    provider: P,
    config: OptimizerConfig,
}

impl<H: TestHost, P: InferenceProvider> Optimizer<H, P> {
    pub fn new(orchestrator: Orchestrator<H>, provider: P, config: OptimizerConfig) -> Self {
        Self {
            orchestrator,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator<H> {
        &self.orchestrator
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Optimize the system prompt of `spec`.
    ///
    /// Iterations run strictly one after another. The returned specification
    /// is always the last one tried, never an earlier better-scoring one.
    pub async fn optimize(&self, spec: &Specification) -> Result<OptimizationOutcome, OptimizationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let policy = self.config.stop_policy();

        info!(
            run_id = %run_id,
            spec = %spec.metadata.name,
            model = %self.config.model,
            iterations = self.config.iterations,
            min_pass_rate = self.config.min_pass_rate,
            strategy = self.config.strategy.as_str(),
            "Starting optimization"
        );

        let mut current = spec.clone();
        let mut state = LoopState::initial();
        let mut history: Vec<IterationRecord> = Vec::new();

        while let LoopState::Running { completed } = state {
            let iteration = completed + 1;

            let program = match compile(&current) {
                Ok(program) => program,
                Err(e) => return Err(OptimizationError { error: e.into(), history }),
            };

            let report = self
                .orchestrator
                .execute(&program.units, &ProvidedValues::from_spec(&current))
                .await;
            state = step(state, &report, &policy);

            info!(
                run_id = %run_id,
                iteration,
                pass_rate = report.pass_percent(),
                fatal = report.fatal,
                state = state.name(),
                "Iteration finished"
            );

            history.push(IterationRecord {
                iteration,
                system_prompt: current.agent.system_prompt.clone(),
                report: report.clone(),
                state,
            });

            if state.is_terminal() {
                break;
            }

            if report.fatal {
                warn!(
                    run_id = %run_id,
                    iteration,
                    "No feedback from a failed submission, retrying the same prompt"
                );
                continue;
            }

            let improved = match self.improve(current.system_prompt(), &report).await {
                Ok(improved) => improved,
                Err(error) => return Err(OptimizationError { error, history }),
            };

            if improved != current.agent.system_prompt {
                current = current.with_system_prompt(improved);
                if let Err(error) = self.snapshot(&current) {
                    return Err(OptimizationError { error, history });
                }
            }
        }

        if let Err(error) = self.snapshot(&current) {
            return Err(OptimizationError { error, history });
        }

        let outcome = OptimizationOutcome {
            specification: current,
            history,
            state,
            run_id,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            run_id = %outcome.run_id,
            state = outcome.state.name(),
            iterations = outcome.history.len(),
            duration_ms = outcome.duration_ms,
            "Optimization finished"
        );
        Ok(outcome)
    }

    /// Ask the provider for an improved prompt. Empty replies keep the
    /// current prompt.
    async fn improve(&self, current_prompt: &str, report: &ResultReport) -> Result<String, Error> {
        let feedback = format_feedback(self.config.strategy, report);
        let request = TextRequest::new(
            self.config.model.clone(),
            improvement_request(self.config.template(), current_prompt, &feedback),
        )
        .with_system(IMPROVER_SYSTEM_PROMPT);

        let response = self.provider.generate_text(&request).await?;
        let improved = strip_code_fences(&response.text);

        if improved.is_empty() {
            warn!(
                provider = self.provider.name(),
                "Provider returned an empty prompt, keeping the current one"
            );
            return Ok(current_prompt.to_string());
        }

        tracing::debug!(
            tokens = response.usage.total(),
            chars = improved.chars().count(),
            "Received improved prompt"
        );
        Ok(improved.to_string())
    }

    fn snapshot(&self, spec: &Specification) -> Result<(), Error> {
        match &self.config.snapshot_path {
            Some(path) => save_specification(path, spec),
            None => Ok(()),
        }
    }
}
