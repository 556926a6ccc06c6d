//! Program loading, mesh execution and result reporting.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use revelation_core::{
    CoreConfig, CoreReport, ImageError, RunSummary, SimConfig, Simulator, StopReason,
    SyscallHandler, TraceSink,
};

use crate::cli::Options;

/// Exit status reported when the first core faulted.
pub const FAULT_EXIT_STATUS: i32 = 1;

/// Error preparing a run.
#[derive(Debug)]
pub enum RunError {
    /// The image file could not be read.
    Read {
        /// Image path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The image could not be placed in memory.
    Image {
        /// Image path.
        path: PathBuf,
        /// Loader error.
        source: ImageError,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::Image { path, source } => {
                write!(f, "cannot load {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Image { source, .. } => Some(source),
        }
    }
}

/// Simulator configuration for `options`.
#[must_use]
pub fn sim_config(options: &Options) -> SimConfig {
    SimConfig {
        rows: options.rows,
        cols: options.cols,
        first_core: options.first_core,
        max_instructions: options.max_instructions,
        core: CoreConfig {
            tracing_enabled: options.trace,
            ..CoreConfig::default()
        },
    }
}

/// Builds the mesh and loads the image into every core.
///
/// # Errors
///
/// Returns [`RunError`] when the image cannot be read or does not fit.
pub fn load(options: &Options) -> Result<Simulator, RunError> {
    let image = fs::read(&options.image).map_err(|source| RunError::Read {
        path: options.image.clone(),
        source,
    })?;
    let mut sim = Simulator::new(sim_config(options));
    sim.load_image(&image, options.load_address)
        .map_err(|source| RunError::Image {
            path: options.image.clone(),
            source,
        })?;
    log::info!(
        "loaded {} ({} bytes) at {:#x}",
        options.image.display(),
        image.len(),
        options.load_address
    );
    Ok(sim)
}

/// Loads and runs the program described by `options`.
///
/// # Errors
///
/// Returns [`RunError`] when the image cannot be loaded.
pub fn run(
    options: &Options,
    host: &mut dyn SyscallHandler,
    trace: Option<&mut dyn TraceSink>,
) -> Result<RunSummary, RunError> {
    let mut sim = load(options)?;
    Ok(sim.run(host, trace))
}

/// Process exit status for a finished run: the low byte of the first
/// core's exit code, [`FAULT_EXIT_STATUS`] when it faulted, and 0 when it
/// stopped without exiting.
#[must_use]
pub fn exit_status(summary: &RunSummary) -> i32 {
    match summary.cores.first() {
        Some(CoreReport {
            exit_code: Some(code),
            ..
        }) => i32::from(code.to_le_bytes()[0]),
        Some(CoreReport { fault: Some(_), .. }) => FAULT_EXIT_STATUS,
        _ => 0,
    }
}

/// Renders the statistics printed by `--time`.
#[must_use]
pub fn format_statistics(summary: &RunSummary, elapsed: Duration) -> String {
    let mut text = String::new();
    for core in &summary.cores {
        let state = match (core.exit_code, core.fault, core.running) {
            (Some(code), _, _) => format!("exited with {code}"),
            (None, Some(fault), _) => format!("faulted: {fault}"),
            (None, None, true) => "still running".to_string(),
            (None, None, false) => "halted".to_string(),
        };
        text.push_str(&format!(
            "core {:#05x}: {} instructions, {} cycles, {state}\n",
            core.coreid, core.instructions, core.cycles
        ));
    }
    let cycles: u64 = summary.cores.iter().map(|core| core.cycles).sum();
    text.push_str(&format!(
        "Total instructions executed: {}\nTotal cycles: {cycles}\n",
        summary.instructions
    ));
    if summary.reason == StopReason::InstructionBudget {
        text.push_str("Instruction budget exhausted\n");
    }
    let seconds = elapsed.as_secs_f64();
    text.push_str(&format!("Simulation time: {seconds:.3} s\n"));
    if seconds > 0.0 {
        #[allow(clippy::cast_precision_loss)]
        let rate = summary.instructions as f64 / seconds;
        text.push_str(&format!("Instructions per second: {rate:.0}\n"));
    }
    text
}
