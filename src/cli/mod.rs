//! CLI module for the EKS tag reconciler.
//!
//! This module provides the command-line interface for validating
//! configurations and planning or applying tag changes.

mod commands;
mod output;

pub use commands::{Cli, Commands, LogFormat, OutputFormat};
pub use output::OutputFormatter;
