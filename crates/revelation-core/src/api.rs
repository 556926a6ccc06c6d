//! Public host-facing API contracts for embedding the simulator core.

use crate::encoding::Mnemonic;
use crate::fault::Fault;
use crate::memory::{Memory, DEFAULT_COREID};
use crate::state::RegisterIndex;

/// Default instruction budget of a simulation run.
pub const DEFAULT_MAX_INSTRUCTIONS: u64 = u64::MAX;

/// `errno` reported for system calls the host does not service.
pub const ENOSYS: u32 = 38;

/// Per-core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// 12-bit core identifier (`row << 6 | col`).
    pub coreid: u32,
    /// Enables trace callback dispatch.
    pub tracing_enabled: bool,
    /// Registers loaded code so that stores into it are flagged.
    pub detect_self_modifying_code: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            coreid: DEFAULT_COREID,
            tracing_enabled: false,
            detect_self_modifying_code: true,
        }
    }
}

/// Configuration of a multi-core run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimConfig {
    /// Mesh rows.
    pub rows: u32,
    /// Mesh columns.
    pub cols: u32,
    /// Identifier of the top-left core.
    pub first_core: u32,
    /// Total instructions retired across all cores before the run stops.
    pub max_instructions: u64,
    /// Settings applied to every core; `coreid` is replaced per core.
    pub core: CoreConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            first_core: DEFAULT_COREID,
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            core: CoreConfig::default(),
        }
    }
}

/// Output status from one step of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction retired.
    Retired {
        /// Approximate cycles consumed, including any interrupt entry.
        cycles: u16,
    },
    /// Core is not running; nothing was executed.
    Halted,
    /// Fault raised during fetch, decode or execute. The core is halted.
    Fault {
        /// Raised fault.
        fault: Fault,
    },
}

/// Trace events emitted in execution order when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Fetch and decode of one instruction.
    InstructionStart {
        /// Executing core.
        coreid: u32,
        /// Fetch address.
        pc: u32,
        /// Encoded instruction (16-bit forms narrowed).
        word: u32,
        /// Decoded opcode.
        mnemonic: Mnemonic,
    },
    /// Register of the executing core written.
    RegisterWrite {
        /// Executing core.
        coreid: u32,
        /// Written register.
        register: RegisterIndex,
        /// Value stored.
        value: u32,
    },
    /// Memory outside the executing core's register block written.
    MemoryWrite {
        /// Executing core.
        coreid: u32,
        /// Global address.
        address: u32,
        /// Bytes written.
        bytes: usize,
        /// Value stored.
        value: u32,
    },
    /// Instruction completed.
    InstructionRetired {
        /// Executing core.
        coreid: u32,
        /// Address of the retired instruction.
        pc: u32,
        /// Cycles charged.
        cycles: u16,
    },
    /// Hardware loop wrapped back to its start.
    HardwareLoop {
        /// Executing core.
        coreid: u32,
        /// Loop start address.
        start: u32,
        /// Iterations remaining (`LC`).
        remaining: u32,
    },
    /// Interrupt entered.
    InterruptDispatched {
        /// Executing core.
        coreid: u32,
        /// Interrupt level (`ILAT` bit index).
        level: u32,
        /// Interrupted program counter saved in `IRET`.
        iret: u32,
    },
    /// Fault raised.
    FaultRaised {
        /// Executing core.
        coreid: u32,
        /// Program counter at the fault.
        pc: u32,
        /// Raised fault.
        fault: Fault,
    },
}

/// Sink trait for trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// System call requested by a `trap` instruction.
///
/// Buffer and path arguments are guest addresses; buffers of `read`,
/// `write`, `fstat` and `stat` have already been rebased onto the calling
/// core when they were local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Syscall {
    Open { path: u32, flags: u32, mode: u32 },
    Close { fd: u32 },
    Read { fd: u32, buf: u32, count: u32 },
    Write { fd: u32, buf: u32, count: u32 },
    Lseek { fd: u32, offset: u32, whence: u32 },
    Unlink { path: u32 },
    Fstat { fd: u32, buf: u32 },
    Stat { path: u32, buf: u32 },
    Link { src: u32, dst: u32 },
}

impl Syscall {
    /// Builds the call selected by `R3` for the generic trap.
    ///
    /// Returns `None` for unsupported numbers.
    #[must_use]
    pub const fn from_number(number: u32, args: [u32; 3]) -> Option<Self> {
        let [a0, a1, a2] = args;
        Some(match number {
            2 => Self::Open {
                path: a0,
                flags: a1,
                mode: a2,
            },
            3 => Self::Close { fd: a0 },
            4 => Self::Read {
                fd: a0,
                buf: a1,
                count: a2,
            },
            5 => Self::Write {
                fd: a0,
                buf: a1,
                count: a2,
            },
            6 => Self::Lseek {
                fd: a0,
                offset: a1,
                whence: a2,
            },
            7 => Self::Unlink { path: a0 },
            10 => Self::Fstat { fd: a0, buf: a1 },
            15 => Self::Stat { path: a0, buf: a1 },
            21 => Self::Link { src: a0, dst: a1 },
            _ => return None,
        })
    }

    /// `true` when `R1` carries a buffer pointer.
    #[must_use]
    pub const fn number_takes_buffer(number: u32) -> bool {
        matches!(number, 4 | 5 | 10 | 15)
    }
}

/// Host answer to a system call: `R0` and `R3` after the trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SyscallResult {
    /// Return value written to `R0`.
    pub retval: i32,
    /// Error number written to `R3` (0 on success).
    pub errno: u32,
}

impl SyscallResult {
    /// Successful call returning `retval`.
    #[must_use]
    pub const fn ok(retval: i32) -> Self {
        Self { retval, errno: 0 }
    }

    /// Failed call with `errno`.
    #[must_use]
    pub const fn err(errno: u32) -> Self {
        Self { retval: -1, errno }
    }
}

/// Host side of the trap boundary.
pub trait SyscallHandler {
    /// Services one call on behalf of core `coreid`.
    ///
    /// Guest buffers are accessed through `memory`; local addresses resolve
    /// against `coreid`.
    fn handle(&mut self, call: Syscall, memory: &mut Memory, coreid: u32) -> SyscallResult;
}

/// Handler that fails every call with `ENOSYS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSyscalls;

impl SyscallHandler for UnsupportedSyscalls {
    fn handle(&mut self, call: Syscall, _memory: &mut Memory, coreid: u32) -> SyscallResult {
        log::debug!("core {coreid:#x}: no host for {call:?}");
        SyscallResult::err(ENOSYS)
    }
}
