//! Specification Compiler
//!
//! Turns a [`Specification`] into runnable test source. Compilation is pure
//! and deterministic: equal specifications always produce byte-identical
//! programs, and nothing is executed here.
//!
//! # Example
//!
//! ```rust,ignore
//! use agentspec_core::compiler::compile;
//!
//! let program = compile(&spec)?;
//! for unit in &program.units {
//!     println!("{} -> {} bytes", unit.name, unit.source.len());
//! }
//! ```

mod emit;
mod escape;
mod validators;

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::Specification;
use crate::utils::content_hash;

pub use emit::{qualified_model, PROVIDED_VALUES_ENV};
pub use escape::{comment_text, render_template, string_literal};
pub use validators::validator;

/// Compilation failures. Specifications are validated on load, but they
/// may come from untrusted input, so every reference is checked again here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("benchmark '{benchmark}' uses undeclared tool '{tool}'")]
    UnresolvedTool { benchmark: String, tool: String },

    #[error("{owner} references undeclared schema '{schema}'")]
    UnresolvedSchema { owner: String, schema: String },

    #[error("tool '{tool}' references undeclared generator '{generator}'")]
    UnresolvedGenerator { tool: String, generator: String },

    #[error("benchmark '{0}' has no user message to drive the agent")]
    MissingUserMessage(String),
}

/// One independently runnable test procedure for one benchmark case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    /// Benchmark case name
    pub name: String,
    /// File stem the host may use when writing the unit to disk
    pub file_stem: String,
    /// Complete program text, including the shared preamble
    pub source: String,
}

/// The compiled form of a whole specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProgram {
    pub spec_name: String,
    pub units: Vec<CompiledUnit>,
    combined: String,
}

impl SourceProgram {
    /// All cases in a single program file.
    pub fn combined(&self) -> &str {
        &self.combined
    }

    /// SHA-256 over all unit sources, in order.
    pub fn digest(&self) -> String {
        digest_units(&self.units)
    }
}

/// SHA-256 over unit sources, in order.
pub fn digest_units(units: &[CompiledUnit]) -> String {
    let joined: Vec<&str> = units.iter().map(|u| u.source.as_str()).collect();
    content_hash(&joined.join("\u{0}"))
}

/// Compile a specification into one unit per benchmark case.
pub fn compile(spec: &Specification) -> Result<SourceProgram, CompileError> {
    let header = emit::header(spec);
    let preamble = emit::preamble(spec);

    let mut blocks = Vec::with_capacity(spec.benchmarks.len());
    for case in &spec.benchmarks {
        blocks.push(emit::case_block(spec, case)?);
    }

    let units = spec
        .benchmarks
        .iter()
        .zip(&blocks)
        .enumerate()
        .map(|(index, (case, block))| CompiledUnit {
            name: case.name.clone(),
            file_stem: file_stem(index, &case.name),
            source: format!(
                "{}\n{}\n{}",
                header,
                preamble,
                emit::suite(spec, &[block.as_str()])
            ),
        })
        .collect();

    let all_blocks: Vec<&str> = blocks.iter().map(String::as_str).collect();
    let combined = format!(
        "{}\n{}\n{}",
        header,
        preamble,
        emit::suite(spec, &all_blocks)
    );

    tracing::debug!(
        spec = %spec.metadata.name,
        units = blocks.len(),
        bytes = combined.len(),
        "Compiled specification"
    );

    Ok(SourceProgram {
        spec_name: spec.metadata.name.clone(),
        units,
        combined,
    })
}

fn file_stem(index: usize, name: &str) -> String {
    let slug = name.to_snake_case();
    let slug: String = slug
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(48)
        .collect();
    if slug.is_empty() {
        format!("{:03}_case", index + 1)
    } else {
        format!("{:03}_{}", index + 1, slug)
    }
}
