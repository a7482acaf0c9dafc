//! Loop state machine.
//!
//! `Running` → `Converged` | `Exhausted`. Both terminal states absorb every
//! further report.

use serde::{Deserialize, Serialize};

use crate::executor::ResultReport;

/// State of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoopState {
    /// Still iterating; `completed` iterations are done
    Running { completed: usize },
    /// The pass-rate threshold was met
    Converged { iterations: usize },
    /// The iteration budget ran out first
    Exhausted { iterations: usize },
}

impl LoopState {
    pub fn initial() -> Self {
        Self::Running { completed: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running { .. })
    }

    /// Iterations completed so far
    pub fn iterations(&self) -> usize {
        match *self {
            Self::Running { completed } => completed,
            Self::Converged { iterations } | Self::Exhausted { iterations } => iterations,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Running { .. } => "running",
            Self::Converged { .. } => "converged",
            Self::Exhausted { .. } => "exhausted",
        }
    }
}

/// When a run stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopPolicy {
    /// Iteration budget, at least 1
    pub max_iterations: usize,
    /// Minimum pass rate in percent, inclusive
    pub min_pass_rate: f64,
}

/// Advance the loop by one finished iteration.
///
/// Convergence is checked before the budget, so a run that meets the
/// threshold on its last permitted iteration converges.
pub fn step(state: LoopState, report: &ResultReport, policy: &StopPolicy) -> LoopState {
    match state {
        LoopState::Running { completed } => {
            let done = completed + 1;
            if report.meets_threshold(policy.min_pass_rate) {
                LoopState::Converged { iterations: done }
            } else if done >= policy.max_iterations {
                LoopState::Exhausted { iterations: done }
            } else {
                LoopState::Running { completed: done }
            }
        }
        terminal => terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{normalize, SkipPolicy};
    use crate::host::{HostReport, HostState, HostUnitReport};

    fn report(states: &[HostState]) -> ResultReport {
        normalize(
            HostReport {
                success: true,
                units: states
                    .iter()
                    .enumerate()
                    .map(|(i, s)| HostUnitReport::new(format!("case {}", i), *s))
                    .collect(),
            },
            SkipPolicy::default(),
        )
    }

    fn policy(max_iterations: usize, min_pass_rate: f64) -> StopPolicy {
        StopPolicy {
            max_iterations,
            min_pass_rate,
        }
    }

    #[test]
    fn test_converges_when_threshold_met() {
        let next = step(LoopState::initial(), &report(&[HostState::Pass]), &policy(3, 100.0));
        assert_eq!(next, LoopState::Converged { iterations: 1 });
        assert!(next.is_terminal());
    }

    #[test]
    fn test_keeps_running_within_budget() {
        let failing = report(&[HostState::Fail]);
        let p = policy(3, 100.0);

        let s1 = step(LoopState::initial(), &failing, &p);
        assert_eq!(s1, LoopState::Running { completed: 1 });
        let s2 = step(s1, &failing, &p);
        assert_eq!(s2, LoopState::Running { completed: 2 });
        let s3 = step(s2, &failing, &p);
        assert_eq!(s3, LoopState::Exhausted { iterations: 3 });
    }

    #[test]
    fn test_last_iteration_can_still_converge() {
        let p = policy(1, 100.0);
        assert_eq!(
            step(LoopState::initial(), &report(&[HostState::Pass]), &p),
            LoopState::Converged { iterations: 1 }
        );
        assert_eq!(
            step(LoopState::initial(), &report(&[HostState::Fail]), &p),
            LoopState::Exhausted { iterations: 1 }
        );
    }

    #[test]
    fn test_terminal_states_absorb() {
        let passing = report(&[HostState::Pass]);
        let p = policy(3, 0.0);
        let exhausted = LoopState::Exhausted { iterations: 3 };
        assert_eq!(step(exhausted, &passing, &p), exhausted);
        let converged = LoopState::Converged { iterations: 2 };
        assert_eq!(step(converged, &report(&[HostState::Fail]), &p), converged);
    }

    #[test]
    fn test_fatal_report_never_converges() {
        let fatal = ResultReport::fatal("host down", SkipPolicy::default());
        let next = step(LoopState::initial(), &fatal, &policy(2, 0.0));
        assert_eq!(next, LoopState::Running { completed: 1 });
    }

    #[test]
    fn test_four_of_five_meets_eighty() {
        let r = report(&[
            HostState::Pass,
            HostState::Pass,
            HostState::Fail,
            HostState::Pass,
            HostState::Pass,
        ]);
        assert_eq!(
            step(LoopState::initial(), &r, &policy(3, 80.0)),
            LoopState::Converged { iterations: 1 }
        );
    }

    #[test]
    fn test_state_accessors() {
        assert_eq!(LoopState::initial().iterations(), 0);
        assert_eq!(LoopState::Exhausted { iterations: 3 }.name(), "exhausted");
        let json = serde_json::to_value(LoopState::Converged { iterations: 2 }).unwrap();
        assert_eq!(json["state"], "converged");
        assert_eq!(json["iterations"], 2);
    }
}
