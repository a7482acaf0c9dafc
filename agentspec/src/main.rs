//! agentspec - Declarative Agent Specifications CLI
//!
//! Compile agent specifications into test programs, run their benchmarks
//! and optimize the system prompt against them.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so program and report output stay clean
    let filter = EnvFilter::from_default_env().add_directive("agentspec=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    // Load configuration
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compile(args) => commands::compile::execute(args),
        Commands::Execute(args) => commands::execute::execute(args, &config).await,
        Commands::Optimize(args) => commands::optimize::execute(args, &config).await,
        Commands::Validate { spec } => commands::validate::execute(&spec),
        Commands::Version => {
            println!("agentspec {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
