//! Validate command: report every problem in a specification document.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use agentspec_core::compiler::compile;
use agentspec_core::spec::{parse_document, DocumentFormat};

pub fn execute(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let spec = parse_document(&text, DocumentFormat::from_path(path))
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let problems = spec.problems();
    if !problems.is_empty() {
        println!("{} {}", "✗".red(), path.display());
        for problem in &problems {
            println!("  - {}", problem);
        }
        anyhow::bail!("{} problem(s) found", problems.len());
    }

    let program = compile(&spec).context("Specification is valid but does not compile")?;
    println!(
        "{} {} ({} v{}, {} case(s), {} tool(s))",
        "✓".green(),
        path.display(),
        spec.metadata.name,
        spec.metadata.version,
        program.units.len(),
        spec.tools.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::GREETER_SPEC;
    use tempfile::TempDir;

    #[test]
    fn test_valid_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("greeter.yaml");
        std::fs::write(&path, GREETER_SPEC).unwrap();
        execute(&path).unwrap();
    }

    #[test]
    fn test_all_problems_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        let broken = GREETER_SPEC
            .replace("model: gpt-4o-mini", "model: \"\"")
            .replace("schema: Verdict", "schema: Missing");
        std::fs::write(&path, broken).unwrap();

        let err = execute(&path).unwrap_err();
        assert_eq!(err.to_string(), "3 problem(s) found");
    }
}
