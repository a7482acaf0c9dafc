//! Specification Model
//!
//! The validated, in-memory form of an agent definition: model, system
//! prompt, simulated tools, benchmark cases and optimizer settings.

mod document;
mod property;
mod types;
mod validate;

pub use document::{
    load_specification, parse_document, parse_specification, render_specification, save_specification,
    DocumentFormat,
};
pub use property::PropertyType;
pub use types::{
    AgentBlock, BenchmarkCase, Generator, Judge, Message, Metadata, OptimizerBlock, Role,
    Specification, ToolChoice, ToolDef,
};
pub use validate::ValidationError;
