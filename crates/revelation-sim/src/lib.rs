//! Command-line driver library for the Epiphany multi-core simulator.

/// Argument parsing and usage text.
pub mod cli;
/// Host system calls on the real file system.
pub mod host;
/// Program loading, execution and exit status.
pub mod runner;
/// Trace stream printing.
pub mod trace;

use env_logger as _;

#[cfg(test)]
use tempfile as _;
