//! labkit CLI
//!
//! Validate lab documents, list procedures, replay action scripts against a
//! procedure and run the randomized simulator from the command line.

pub mod commands;
pub mod script;

pub use commands::RunOptions;
pub use script::{parse_answers, parse_script, ScriptError};
