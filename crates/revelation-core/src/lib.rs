//! Core simulator crate for the Epiphany multi-core architecture.

/// Sparse shared memory, global address map and register aliases.
pub mod memory;
pub use memory::{
    coreid_at, coreid_of, globalize, is_local_address, local_offset, AccessSize, CodeRange,
    Memory, MemoryWrite, BLOCK_SIZE, CORE_WINDOW_BITS, DEFAULT_COREID, TESTSET_FLOOR,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreConfig, SimConfig, StepOutcome, Syscall, SyscallHandler, SyscallResult, TraceEvent,
    TraceSink, UnsupportedSyscalls, DEFAULT_MAX_INSTRUCTIONS, ENOSYS,
};

/// Architectural per-core state: register file, `STATUS` and `CONFIG`.
pub mod state;
pub use state::{
    ArithMode, ConditionFlags, Config, CoreState, Excause, MachineState, RegisterFile,
    RegisterIndex, Status, StatusFlag, Timer, TimerMode, GENERAL_REGISTER_COUNT, REGISTER_COUNT,
    REGISTER_LAYOUT,
};

/// Opcode encoding table and mnemonic classification.
pub mod encoding;
pub use encoding::{EncodingPattern, InstructionClass, Mnemonic, ENCODING_TABLE};

/// Instruction word field accessors.
pub mod instruction;
pub use instruction::Instruction;

/// Pattern-matching instruction decoder.
pub mod decoder;
pub use decoder::{decode, decoder, DecodedInstruction, Decoder};

/// Condition-code evaluation.
pub mod condition;
pub use condition::{condition_passed, CONDITION_SUFFIXES};

/// IEEE-754 single-precision bit helpers.
pub mod float;
pub use float::{bits_to_float, float_to_bits};

/// Fatal fault taxonomy.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Approximate instruction cycle-cost table and lookup helpers.
pub mod timing;
pub use timing::{cycle_cost, CycleCostKind, CYCLE_COST_TABLE};

/// Instruction executors.
pub mod execute;
pub use execute::{execute_instruction, ExecuteOutcome};

/// Step driver with hardware-loop and interrupt handling.
pub mod engine;
pub use engine::{step_one, InterruptLevel, PostStep};

/// Multi-core mesh driver.
pub mod sim;
pub use sim::{CoreReport, ImageError, RunSummary, Simulator, StopReason};

/// Software breakpoint insertion and removal.
pub mod breakpoints;
pub use breakpoints::{BreakpointTable, BKPT16, NOP16};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
