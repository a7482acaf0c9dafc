//! Compile command: write the generated test program.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use agentspec_core::compiler::{compile, SourceProgram};

use super::load_spec;
use crate::cli::CompileArgs;

pub fn execute(args: CompileArgs) -> Result<()> {
    let spec = load_spec(&args.spec)?;
    let program = compile(&spec).context("Failed to compile specification")?;

    tracing::info!(
        spec = %program.spec_name,
        units = program.units.len(),
        digest = %program.digest(),
        "Compiled specification"
    );

    if let Some(dir) = &args.units {
        write_units(&program, dir)?;
        eprintln!(
            "{} {} unit(s) written to {}",
            "✓".green(),
            program.units.len(),
            dir.display()
        );
    }

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(out, program.combined())
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("{} Program written to {}", "✓".green(), out.display());
        }
        None if args.units.is_none() => print!("{}", program.combined()),
        None => {}
    }

    Ok(())
}

/// Write one `<stem>.test.ts` file per compiled unit.
fn write_units(program: &SourceProgram, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    for unit in &program.units {
        let path = dir.join(format!("{}.test.ts", unit.file_stem));
        std::fs::write(&path, &unit.source)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
