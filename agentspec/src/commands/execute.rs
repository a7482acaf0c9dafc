//! Execute command: run the benchmarks once with the specification's prompt.

use anyhow::{Context, Result};

use agentspec_core::config::EngineConfig;
use agentspec_core::executor::{Orchestrator, ResultReport};
use agentspec_core::suite::run_suite;

use super::{build_host, load_spec, print_report, spinner};
use crate::cli::ExecuteArgs;
use crate::config::apply_host_args;

pub async fn execute(args: ExecuteArgs, config: &EngineConfig) -> Result<()> {
    let config = apply_host_args(config.clone(), &args.host);
    let spec = load_spec(&args.spec)?;

    let orchestrator = Orchestrator::new(build_host(&config, args.host.dry_run))
        .with_skip_policy(config.execution.skip_policy);

    let pb = (!args.json).then(|| {
        spinner(format!(
            "Running {} case(s) of {}",
            spec.benchmarks.len(),
            spec.metadata.name
        ))
    });
    let report = run_suite(&spec, &orchestrator).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let report = report.context("Failed to run specification")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    check(&report)
}

/// Exit status for a finished run.
fn check(report: &ResultReport) -> Result<()> {
    if report.fatal {
        anyhow::bail!("test host failed to run the program");
    }
    if !report.success {
        let summary = report.summary();
        anyhow::bail!(
            "{} of {} case(s) did not pass",
            summary.total - summary.passed,
            summary.total
        );
    }
    Ok(())
}
