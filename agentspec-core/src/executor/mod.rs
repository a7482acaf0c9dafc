//! Execution Orchestrator
//!
//! Submits compiled units to a [`TestHost`], waits for completion and
//! normalizes the raw host report into a [`ResultReport`]. Host artifacts
//! are cleaned up on both the success and failure paths.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentspec_core::executor::Orchestrator;
//! use agentspec_core::host::{MockHost, ProvidedValues};
//!
//! let orchestrator = Orchestrator::new(MockHost::all_pass());
//! let report = orchestrator
//!     .execute(&program.units, &ProvidedValues::from_spec(&spec))
//!     .await;
//! println!("pass rate: {:.0}%", report.pass_percent());
//! ```

mod report;

pub use report::{
    normalize, pass_rate, CapturedError, CapturedResponse, ReportSummary, ResultReport,
    SkipPolicy, TaskOutcome, TaskState, SYNTHESIZED_FAILURE, SYNTHESIZED_UNKNOWN,
};

use std::time::Instant;

use crate::compiler::{digest_units, CompiledUnit};
use crate::host::{ProvidedValues, Submission, TestHost};

/// Runs compiled units through a test host.
pub struct Orchestrator<H> {
    host: H,
    skip_policy: SkipPolicy,
}

impl<H: TestHost> Orchestrator<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            skip_policy: SkipPolicy::default(),
        }
    }

    pub fn with_skip_policy(mut self, skip_policy: SkipPolicy) -> Self {
        self.skip_policy = skip_policy;
        self
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        self.skip_policy
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Execute `units` with `provided` injected and report the outcomes.
    ///
    /// Never fails: a submission the host cannot run yields a fatal report
    /// with a single captured error and no outcomes.
    pub async fn execute(&self, units: &[CompiledUnit], provided: &ProvidedValues) -> ResultReport {
        let start = Instant::now();
        let digest = digest_units(units);
        let submission = Submission::new(units.to_vec(), provided.clone());

        tracing::debug!(
            host = self.host.name(),
            id = %submission.id,
            units = units.len(),
            "Submitting units to test host"
        );

        let result = self.host.run(&submission).await;

        if let Err(e) = self.host.cleanup(&submission).await {
            tracing::warn!(id = %submission.id, error = %e, "Failed to clean up host artifacts");
        }

        let report = match result {
            Ok(host_report) => normalize(host_report, self.skip_policy),
            Err(e) => {
                tracing::warn!(host = self.host.name(), error = %e, "Test host submission failed");
                ResultReport::fatal(e.to_string(), self.skip_policy)
            }
        };

        let report = report
            .with_digest(digest)
            .with_duration(start.elapsed().as_millis() as u64);

        tracing::debug!(
            pass_rate = report.pass_rate,
            outcomes = report.outcomes.len(),
            fatal = report.fatal,
            "Execution finished"
        );
        report
    }
}
