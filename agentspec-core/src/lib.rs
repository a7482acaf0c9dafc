//! agentspec core - Declarative Agent Specifications
//!
//! Describe an AI agent (model, system prompt, simulated tools and judged
//! benchmark cases) as a document, compile it into a test program, run it
//! through a test host and iteratively rewrite the system prompt until the
//! benchmarks pass.
//!
//! # Modules
//!
//! - **spec** - Specification model, document I/O and validation
//! - **compiler** - Specification → vitest program, pure and deterministic
//! - **host** - Test host seam (`TestHost`) with vitest and mock hosts
//! - **provider** - Inference provider seam with command and mock providers
//! - **executor** - Execution orchestrator and the result report model
//! - **optimizer** - compile → execute → improve loop
//! - **suite** - Programmatic suite builder
//!
//! # Example
//!
//! ```rust,no_run
//! use agentspec_core::config::EngineConfig;
//! use agentspec_core::executor::Orchestrator;
//! use agentspec_core::host::VitestHost;
//! use agentspec_core::optimizer::{Optimizer, OptimizerConfig, OptimizerOverrides};
//! use agentspec_core::provider::CommandProvider;
//! use agentspec_core::spec::load_specification;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let engine = EngineConfig::default();
//!     let spec = load_specification("agent.yaml")?;
//!
//!     let orchestrator = Orchestrator::new(VitestHost::new(engine.host.clone()))
//!         .with_skip_policy(engine.execution.skip_policy);
//!     let config = OptimizerConfig::resolve(&spec, &OptimizerOverrides::default())?;
//!     let optimizer = Optimizer::new(orchestrator, CommandProvider::new(engine.provider), config);
//!
//!     let outcome = optimizer.optimize(&spec).await?;
//!     println!("{} after {} iterations", outcome.state.name(), outcome.history.len());
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod config;
pub mod executor;
pub mod host;
pub mod optimizer;
pub mod provider;
pub mod spec;
pub mod suite;
pub mod utils;

mod error;

pub use compiler::{compile, CompileError, CompiledUnit, SourceProgram};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use executor::{Orchestrator, ResultReport, SkipPolicy, TaskOutcome, TaskState};
pub use optimizer::{LoopState, OptimizationError, OptimizationOutcome, Optimizer, OptimizerConfig};
pub use spec::{load_specification, save_specification, Specification};
pub use suite::{run_suite, Scenario, SuiteBuilder};
