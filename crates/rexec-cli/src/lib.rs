//! rexec: Command-line interface
//!
//! Connects to one device, runs commands on it and optionally saves the
//! transcript next to the session's other output files.

pub mod commands;
pub mod output;
