//! Utilities
//!
//! Common helpers shared by the compiler, host adapters and optimizer.

mod hashing;
mod process;
mod text;
mod time;

pub use hashing::content_hash;
pub use process::{run_command, CommandOptions, CommandOutput};
pub use text::{strip_code_fences, truncate};
pub use time::{now_utc, run_stamp};
