//! Multi-core driver: a `rows x cols` mesh of cores over one shared memory.

use thiserror::Error;

use crate::api::{SimConfig, StepOutcome, SyscallHandler, TraceSink};
use crate::engine::step_one;
use crate::fault::Fault;
use crate::memory::{
    coreid_at, globalize, CodeRange, Memory, BLOCK_SIZE, LOCAL_OFFSET_MASK,
};
use crate::state::CoreState;

/// Error loading a program image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ImageError {
    /// Image would run past the end of a core's local window.
    #[error("image of {len} bytes at {address:#x} does not fit in a 1 MiB core window")]
    TooLarge {
        /// Requested load address.
        address: u32,
        /// Image length in bytes.
        len: usize,
    },
    /// Image has no content.
    #[error("image is empty")]
    Empty,
}

/// Final state of one core after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreReport {
    /// Core identifier.
    pub coreid: u32,
    /// Status passed to the exit trap, if the core exited.
    pub exit_code: Option<u32>,
    /// Fault that stopped the core, if any.
    pub fault: Option<Fault>,
    /// Instructions retired.
    pub instructions: u64,
    /// Approximate cycles consumed.
    pub cycles: u64,
    /// Whether the core was still running when the run stopped.
    pub running: bool,
}

/// Why [`Simulator::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StopReason {
    /// Every core halted, exited or faulted.
    AllHalted,
    /// The instruction budget was exhausted.
    InstructionBudget,
}

/// Aggregated outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunSummary {
    /// Why the run stopped.
    pub reason: StopReason,
    /// Instructions retired across all cores during this run.
    pub instructions: u64,
    /// Per-core reports in mesh order.
    pub cores: Vec<CoreReport>,
}

/// Mesh of cores stepped round-robin, one instruction each per round.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimConfig,
    memory: Memory,
    cores: Vec<CoreState>,
    faults: Vec<Option<Fault>>,
    retired: u64,
}

impl Simulator {
    /// Builds the mesh described by `config`; every core starts at `PC = 0`.
    ///
    /// Core `(row, col)` gets identifier `first_core + (row << 6 | col)`.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let mut memory = Memory::new();
        let cores: Vec<CoreState> = (0..config.rows)
            .flat_map(|row| (0..config.cols).map(move |col| (row, col)))
            .map(|(row, col)| {
                CoreState::new(config.first_core + coreid_at(row, col), &mut memory)
            })
            .collect();
        memory.set_journaling(config.core.tracing_enabled);
        log::debug!(
            "mesh of {}x{} cores starting at {:#x}",
            config.rows,
            config.cols,
            config.first_core
        );
        let faults = vec![None; cores.len()];
        Self {
            config,
            memory,
            cores,
            faults,
            retired: 0,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Shared memory.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable shared memory.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Cores in mesh order (row-major).
    #[must_use]
    pub fn cores(&self) -> &[CoreState] {
        &self.cores
    }

    /// Core with identifier `coreid`.
    #[must_use]
    pub fn core(&self, coreid: u32) -> Option<&CoreState> {
        self.cores.iter().find(|core| core.coreid() == coreid)
    }

    /// Core with identifier `coreid`, together with the shared memory.
    pub fn core_mut(&mut self, coreid: u32) -> Option<(&mut CoreState, &mut Memory)> {
        let memory = &mut self.memory;
        self.cores
            .iter_mut()
            .find(|core| core.coreid() == coreid)
            .map(|core| (core, memory))
    }

    /// Instructions retired since construction.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    /// Copies a flat image into every core's local window at `load_address`.
    ///
    /// When self-modifying-code detection is enabled the loaded bytes are
    /// registered as code.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] when the image is empty or does not fit in a
    /// core window.
    pub fn load_image(&mut self, image: &[u8], load_address: u32) -> Result<(), ImageError> {
        if image.is_empty() {
            return Err(ImageError::Empty);
        }
        let offset = (load_address & LOCAL_OFFSET_MASK) as usize;
        if offset + image.len() > BLOCK_SIZE {
            return Err(ImageError::TooLarge {
                address: load_address,
                len: image.len(),
            });
        }
        let last = u32::try_from(image.len() - 1).map_err(|_| ImageError::TooLarge {
            address: load_address,
            len: image.len(),
        })?;
        for core in &self.cores {
            let start = globalize(load_address, core.coreid());
            self.memory.write_bytes(start, image, 0);
            if self.config.core.detect_self_modifying_code {
                self.memory
                    .add_code_range(CodeRange::new(start, start.wrapping_add(last)));
            }
            log::debug!(
                "loaded {} bytes for core {:#x} at {start:#010x}",
                image.len(),
                core.coreid()
            );
        }
        Ok(())
    }

    /// Steps every running core once, in mesh order.
    ///
    /// Returns `false` when no core was running or the instruction budget
    /// ran out before the round started.
    pub fn step_round(
        &mut self,
        host: &mut dyn SyscallHandler,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> bool {
        let mut stepped = false;
        for (core, fault) in self.cores.iter_mut().zip(&mut self.faults) {
            if self.retired >= self.config.max_instructions {
                return stepped;
            }
            if !core.running {
                continue;
            }
            stepped = true;
            match step_one(
                core,
                &mut self.memory,
                host,
                reborrow(&mut trace),
                &self.config.core,
            ) {
                StepOutcome::Retired { .. } => self.retired += 1,
                StepOutcome::Fault { fault: raised } => *fault = Some(raised),
                StepOutcome::Halted => {}
            }
        }
        stepped
    }

    /// Runs until every core stops or the instruction budget is exhausted.
    pub fn run(
        &mut self,
        host: &mut dyn SyscallHandler,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> RunSummary {
        let start = self.retired;
        let reason = loop {
            if self.retired >= self.config.max_instructions {
                break StopReason::InstructionBudget;
            }
            if !self.step_round(host, reborrow(&mut trace)) {
                break if self.cores.iter().any(|core| core.running) {
                    StopReason::InstructionBudget
                } else {
                    StopReason::AllHalted
                };
            }
        };
        log::info!(
            "run stopped ({reason:?}) after {} instructions",
            self.retired - start
        );
        RunSummary {
            reason,
            instructions: self.retired - start,
            cores: self.reports(),
        }
    }

    /// Per-core reports in mesh order.
    #[must_use]
    pub fn reports(&self) -> Vec<CoreReport> {
        self.cores
            .iter()
            .zip(&self.faults)
            .map(|(core, fault)| CoreReport {
                coreid: core.coreid(),
                exit_code: core.exit_code,
                fault: *fault,
                instructions: core.instructions,
                cycles: core.cycles,
                running: core.running,
            })
            .collect()
    }
}

fn reborrow<'a>(trace: &'a mut Option<&mut dyn TraceSink>) -> Option<&'a mut dyn TraceSink> {
    match trace {
        Some(sink) => Some(&mut **sink),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageError, Simulator, StopReason};
    use crate::api::{SimConfig, UnsupportedSyscalls};

    const TRAP_EXIT: [u8; 2] = (0b1111100010u16 | (3 << 10)).to_le_bytes();

    #[test]
    fn mesh_coreids_follow_row_and_column() {
        let sim = Simulator::new(SimConfig {
            rows: 2,
            cols: 2,
            ..SimConfig::default()
        });
        let ids: Vec<u32> = sim.cores().iter().map(|core| core.coreid()).collect();
        assert_eq!(ids, vec![0x808, 0x809, 0x848, 0x849]);
    }

    #[test]
    fn image_is_loaded_into_every_core_window() {
        let mut sim = Simulator::new(SimConfig {
            cols: 2,
            ..SimConfig::default()
        });
        sim.load_image(&[1, 2, 3, 4], 0x100).unwrap();
        assert_eq!(sim.memory().read(0x8080_0100, 4, 0), 0x0403_0201);
        assert_eq!(sim.memory().read(0x8090_0100, 4, 0), 0x0403_0201);
        assert_eq!(sim.memory().code_ranges().len(), 2);
    }

    #[test]
    fn oversized_or_empty_images_are_rejected() {
        let mut sim = Simulator::new(SimConfig::default());
        assert_eq!(sim.load_image(&[], 0), Err(ImageError::Empty));
        assert!(matches!(
            sim.load_image(&[0; 16], 0xffff8),
            Err(ImageError::TooLarge { .. })
        ));
    }

    #[test]
    fn run_stops_when_all_cores_exit() {
        let mut sim = Simulator::new(SimConfig {
            cols: 2,
            ..SimConfig::default()
        });
        sim.load_image(&TRAP_EXIT, 0).unwrap();
        let summary = sim.run(&mut UnsupportedSyscalls, None);
        assert_eq!(summary.reason, StopReason::AllHalted);
        assert_eq!(summary.instructions, 2);
        assert!(summary.cores.iter().all(|core| core.exit_code == Some(0)));
    }

    #[test]
    fn run_honours_instruction_budget() {
        let mut sim = Simulator::new(SimConfig {
            max_instructions: 5,
            ..SimConfig::default()
        });
        let nops: Vec<u8> = [0x01a2u16; 64]
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect();
        sim.load_image(&nops, 0).unwrap();
        let summary = sim.run(&mut UnsupportedSyscalls, None);
        assert_eq!(summary.reason, StopReason::InstructionBudget);
        assert_eq!(summary.instructions, 5);
        assert!(summary.cores[0].running);
    }
}
