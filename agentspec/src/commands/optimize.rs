//! Optimize command: run the compile → execute → improve loop.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use agentspec_core::config::EngineConfig;
use agentspec_core::executor::Orchestrator;
use agentspec_core::optimizer::{
    IterationRecord, LoopState, OptimizationOutcome, Optimizer, OptimizerConfig, OptimizerOverrides,
};

use super::{build_host, build_provider, load_spec, print_report, spinner};
use crate::cli::OptimizeArgs;
use crate::config::apply_host_args;

pub async fn execute(args: OptimizeArgs, config: &EngineConfig) -> Result<()> {
    let config = apply_host_args(config.clone(), &args.host);
    let spec = load_spec(&args.spec)?;
    let out = args.out.clone().unwrap_or_else(|| args.spec.clone());

    let overrides = OptimizerOverrides {
        model: args.model.clone(),
        iterations: args.iterations,
        min_pass_rate: args.min_pass_rate,
        strategy: args.strategy.clone(),
        feedback_prompt: None,
        snapshot_path: Some(out.clone()),
    };
    let optimizer_config =
        OptimizerConfig::resolve(&spec, &overrides).context("Invalid optimizer settings")?;

    let orchestrator = Orchestrator::new(build_host(&config, args.host.dry_run))
        .with_skip_policy(config.execution.skip_policy);
    let provider = build_provider(&config, args.host.dry_run);
    let optimizer = Optimizer::new(orchestrator, provider, optimizer_config);

    let pb = spinner(format!(
        "Optimizing {} (up to {} iteration(s), target {}%)",
        spec.metadata.name,
        optimizer.config().iterations,
        optimizer.config().min_pass_rate
    ));
    let result = optimizer.optimize(&spec).await;
    pb.finish_and_clear();

    match result {
        Ok(outcome) => {
            if let Some(path) = &args.history {
                write_history(path, &outcome.history)?;
            }
            display_outcome(&outcome, optimizer.config(), &out);

            if !outcome.converged() {
                anyhow::bail!(
                    "pass rate stayed below {}% after {} iteration(s)",
                    optimizer.config().min_pass_rate,
                    outcome.history.len()
                );
            }
            Ok(())
        }
        Err(aborted) => {
            if let Some(path) = &args.history {
                write_history(path, &aborted.history)?;
            }
            println!(
                "{} after {} iteration(s)",
                "Optimization aborted".red().bold(),
                aborted.history.len()
            );
            display_score_history(&scores(&aborted.history));
            Err(anyhow::Error::new(aborted.error).context("Optimization aborted"))
        }
    }
}

fn write_history(path: &Path, history: &[IterationRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(history)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), iterations = history.len(), "History written");
    Ok(())
}

fn scores(history: &[IterationRecord]) -> Vec<f64> {
    history.iter().map(|r| r.report.pass_percent()).collect()
}

fn display_outcome(outcome: &OptimizationOutcome, config: &OptimizerConfig, out: &Path) {
    println!("{}", "═".repeat(60).cyan());
    println!(
        "{} {}",
        "Optimization Complete".green().bold(),
        if outcome.converged() {
            "✓ Target reached"
        } else {
            "⚠ Stopped early"
        }
    );
    println!("{}", "═".repeat(60).cyan());
    println!();

    println!("{}", "Summary".cyan().bold());
    println!("  Iterations: {}", outcome.history.len());
    if let Some(report) = outcome.final_report() {
        println!("  Final Pass Rate: {:.1}%", report.pass_percent());
    }
    println!("  Target: {}%", config.min_pass_rate);
    println!("  Duration: {:.1}s", outcome.duration_ms as f64 / 1000.0);
    println!(
        "  Stop Reason: {}",
        match outcome.state {
            LoopState::Converged { .. } => "Target pass rate reached".green().to_string(),
            LoopState::Exhausted { .. } => "Iteration limit reached".yellow().to_string(),
            LoopState::Running { .. } => "Running".to_string(),
        }
    );
    println!();

    display_score_history(&outcome.score_history());

    if let Some(report) = outcome.final_report() {
        println!("{}", "Final Run".cyan().bold());
        print_report(report);
        println!();
    }

    println!("{}", "Run".cyan().bold());
    println!("  ID: {}", outcome.run_id);
    println!("  Strategy: {}", config.strategy.as_str());
    println!("  Model: {}", config.model);
    println!("  Specification: {}", out.display());
    println!();
}

fn display_score_history(scores: &[f64]) {
    if scores.is_empty() {
        return;
    }
    println!("{}", "Score History".cyan().bold());
    for (i, score) in scores.iter().enumerate() {
        println!("  {:2}. {}{}", i + 1, score_bar(*score), score_change(scores, i));
    }
    println!();
}

fn score_bar(percent: f64) -> String {
    let bar_len = (percent.clamp(0.0, 100.0) * 0.3) as usize;
    format!("{} {:.1}%", "█".repeat(bar_len).blue(), percent)
}

fn score_change(scores: &[f64], i: usize) -> String {
    if i == 0 {
        return String::new();
    }
    let diff = scores[i] - scores[i - 1];
    if diff > 0.0 {
        format!(" (+{:.1}%)", diff).green().to_string()
    } else if diff < 0.0 {
        format!(" ({:.1}%)", diff).red().to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::HostArgs;
    use crate::commands::GREETER_SPEC;
    use agentspec_core::spec::load_specification;
    use tempfile::TempDir;

    fn args(dir: &TempDir) -> OptimizeArgs {
        let spec = dir.path().join("greeter.yaml");
        std::fs::write(&spec, GREETER_SPEC).unwrap();
        OptimizeArgs {
            spec,
            out: Some(dir.path().join("optimized.yaml")),
            iterations: Some(2),
            min_pass_rate: None,
            strategy: None,
            model: None,
            history: Some(dir.path().join("history.json")),
            host: HostArgs {
                dry_run: true,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_dry_run_converges() {
        let dir = TempDir::new().unwrap();
        let args = args(&dir);
        let out = args.out.clone().unwrap();
        let history = args.history.clone().unwrap();

        execute(args, &EngineConfig::default()).await.unwrap();

        let optimized = load_specification(&out).unwrap();
        assert_eq!(optimized.agent.system_prompt, "You greet users.");

        let records: Vec<IterationRecord> =
            serde_json::from_str(&std::fs::read_to_string(history).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, LoopState::Converged { iterations: 1 });
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir);
        args.iterations = Some(0);
        let err = execute(args, &EngineConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid optimizer settings"));
    }

    #[test]
    fn test_score_change() {
        let scores = [50.0, 75.0, 75.0, 25.0];
        assert_eq!(score_change(&scores, 0), "");
        assert!(score_change(&scores, 1).contains("+25.0%"));
        assert_eq!(score_change(&scores, 2), "");
        assert!(score_change(&scores, 3).contains("-50.0%"));
    }
}
