//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Compile, run and optimize declarative agent specifications
#[derive(Parser, Debug)]
#[command(name = "agentspec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "AGENTSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a specification into a test program
    Compile(CompileArgs),

    /// Run a specification's benchmarks once
    Execute(ExecuteArgs),

    /// Iteratively improve the system prompt until the benchmarks pass
    Optimize(OptimizeArgs),

    /// Check a specification document for problems
    Validate {
        /// Specification document (.yaml, .yml or .json)
        spec: PathBuf,
    },

    /// Show version
    Version,
}

#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Specification document (.yaml, .yml or .json)
    pub spec: PathBuf,

    /// Write the combined program here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Also write one `<stem>.test.ts` file per benchmark into this directory
    #[arg(long)]
    pub units: Option<PathBuf>,
}

/// Test host options shared by `execute` and `optimize`
#[derive(Args, Debug, Default)]
pub struct HostArgs {
    /// Use the mock host (every case passes) instead of running vitest
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for generated units and reports
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Keep generated units and reports after the run
    #[arg(long)]
    pub keep_artifacts: bool,

    /// Host timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Exclude skipped cases from the pass rate
    #[arg(long)]
    pub exclude_skipped: bool,
}

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Specification document (.yaml, .yml or .json)
    pub spec: PathBuf,

    /// Print the result report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub host: HostArgs,
}

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Specification document (.yaml, .yml or .json)
    pub spec: PathBuf,

    /// Where to write the optimized specification (defaults to the input)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Maximum iterations
    #[arg(short = 'i', long)]
    pub iterations: Option<usize>,

    /// Minimum pass rate in percent (0-100)
    #[arg(short = 'p', long)]
    pub min_pass_rate: Option<f64>,

    /// Feedback strategy (error-focused, completion-focused)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Model used to improve the prompt (defaults to the agent model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Write the iteration history as JSON
    #[arg(long)]
    pub history: Option<PathBuf>,

    #[command(flatten)]
    pub host: HostArgs,
}
