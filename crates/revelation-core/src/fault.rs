use thiserror::Error;

use crate::encoding::Mnemonic;

/// Fault classes used for driver policy and diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// No decode pattern matched the fetched word.
    Decode,
    /// Recognised opcode without simulator semantics.
    Unimplemented,
    /// Architectural safety constraint violated by the running program.
    Invariant,
    /// Register index or condition code outside its architectural domain.
    Range,
    /// Trap or system-call request the host cannot service.
    Trap,
}

/// Fatal execution faults surfaced from decode, execute and the step driver.
///
/// None of these are recoverable at the instruction level: the driver halts
/// the faulting core and reports the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Instruction word matched no entry of the decode table.
    #[error("no instruction pattern matches word {word:#010x}")]
    Decode {
        /// Raw fetched word.
        word: u32,
    },
    /// Decoded opcode has no simulator semantics.
    #[error("{mnemonic} is not implemented")]
    Unimplemented {
        /// Mnemonic of the rejected instruction.
        mnemonic: Mnemonic,
    },
    /// `testset32` addressed memory at or below the local-memory floor.
    #[error(
        "testset32 has failed to write to address {address:#x}.\n\
         The absolute address used for the test and set instruction must be located\n\
         within the on-chip local memory and must be greater than 0x00100000 (2^20).\n"
    )]
    TestSetFloor {
        /// Computed effective address.
        address: u32,
    },
    /// Unconditional branch to its own address.
    #[error("infinite loop: unconditional branch to itself at pc {pc:#x}")]
    InfiniteLoop {
        /// Address of the self-branch.
        pc: u32,
    },
    /// Double-word transfer named a register with no successor to hold the
    /// high word.
    #[error("double-word access through register {index} has no second register")]
    RegisterPair {
        /// Index of the first register of the pair.
        index: usize,
    },
    /// Register index outside `0..=106`.
    #[error("register index {index} is outside the architectural range 0..=106")]
    RegisterRange {
        /// Rejected index.
        index: usize,
    },
    /// Condition code outside `0..=15`.
    #[error("condition code {code} is outside the range 0..=15")]
    ConditionRange {
        /// Rejected code.
        code: u32,
    },
    /// `trap` executed with an undefined 5-bit code.
    #[error("Unknown argument to trap instruction: {code}")]
    UnknownTrap {
        /// Trap immediate.
        code: u32,
    },
    /// Generic system call selected an unsupported call number.
    #[error("unsupported system call number {number}")]
    UnknownSyscall {
        /// Value found in `R3`.
        number: u32,
    },
}

impl Fault {
    /// Returns the diagnostics class for this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::Decode { .. } => FaultClass::Decode,
            Self::Unimplemented { .. } => FaultClass::Unimplemented,
            Self::TestSetFloor { .. } | Self::InfiniteLoop { .. } | Self::RegisterPair { .. } => {
                FaultClass::Invariant
            }
            Self::RegisterRange { .. } | Self::ConditionRange { .. } => FaultClass::Range,
            Self::UnknownTrap { .. } | Self::UnknownSyscall { .. } => FaultClass::Trap,
        }
    }

    /// Faults caused by a simulator defect rather than by the guest program.
    ///
    /// Register and condition range faults can only come from host code
    /// building malformed requests; decoded fields are always in range.
    #[must_use]
    pub const fn is_host_error(&self) -> bool {
        matches!(self.class(), FaultClass::Range)
    }
}
