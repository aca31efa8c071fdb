//! Interactive chat loop for devchat.
//!
//! Reads operator lines, streams agent turns, runs requested tools, and
//! prints everything to the console. Entry point: [`loop_runner::ChatLoop`].

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;

/// Prompt shown before each operator line.
pub const PROMPT: &str = "Enter a prompt (type 'exit' to quit): ";
