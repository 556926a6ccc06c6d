//! Instruction executors.
//!
//! Every executor reads its operands from a [`MachineState`], writes its
//! results back through it and advances (or replaces) the program counter.
//! Faults are returned before any further state is touched; state written
//! before a fault is left as is, and the driver halts the core.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::similar_names,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::struct_excessive_bools,
    unknown_lints,
    missing_docs
)]

mod arith;
mod branch;
mod control;
mod farith;
mod flags;
mod helpers;
mod load_store;
mod mov;
mod trap;

pub use control::{lowest_level, INTERRUPT_LEVELS};
pub use farith::{FIX_NAN_RESULT, FLOAT_ZERO_EPSILON};
pub use flags::IntegerFlags;
pub use helpers::{sext11, sext24, sext3, sext8, sign_extend};
pub use mov::{special_register_address, SPECIAL_BANKS};
pub use trap::codes as trap_codes;

use crate::api::SyscallHandler;
use crate::decoder::DecodedInstruction;
use crate::encoding::{InstructionClass, Mnemonic};
use crate::fault::Fault;
use crate::state::MachineState;
use crate::timing::CycleCostKind;
use trap::TrapOutcome;

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Instruction retired; the core keeps running.
    Retired {
        /// Cycle cost class of the instruction as executed.
        cost: CycleCostKind,
    },
    /// Instruction retired and stopped the core (`bkpt`, exit trap).
    Halted {
        /// Cycle cost class of the instruction as executed.
        cost: CycleCostKind,
    },
}

impl ExecuteOutcome {
    /// Cycle cost class of the retired instruction.
    #[must_use]
    pub const fn cost(self) -> CycleCostKind {
        match self {
            Self::Retired { cost } | Self::Halted { cost } => cost,
        }
    }
}

/// Executes one decoded instruction against `machine`.
///
/// `host` services `trap` system calls.
pub fn execute_instruction(
    decoded: DecodedInstruction,
    machine: &mut MachineState<'_>,
    host: &mut dyn SyscallHandler,
) -> Result<ExecuteOutcome, Fault> {
    let mnemonic = decoded.mnemonic;
    let inst = decoded.fields();

    let cost = match mnemonic.class() {
        InstructionClass::Branch => branch::execute_bcond(machine, mnemonic, inst)?,
        InstructionClass::Jump => branch::execute_jump(machine, mnemonic, inst),
        InstructionClass::Arith => arith::execute_add_sub(machine, mnemonic, inst),
        InstructionClass::Bitwise => arith::execute_logic(machine, mnemonic, inst),
        InstructionClass::Farith => farith::execute_farith(machine, mnemonic, inst),
        InstructionClass::LoadStore => match mnemonic {
            Mnemonic::Ldstrdisp16 | Mnemonic::Ldstrdisp32 => {
                load_store::execute_displacement(machine, mnemonic, inst)?
            }
            Mnemonic::Ldstrind16 | Mnemonic::Ldstrind32 => {
                load_store::execute_indexed(machine, mnemonic, inst)?
            }
            Mnemonic::Ldstrpm16 | Mnemonic::Ldstrpm32 => {
                load_store::execute_post_modify(machine, mnemonic, inst)?
            }
            Mnemonic::Ldstrpmd32 => load_store::execute_post_modify_displacement(machine, inst)?,
            _ => load_store::execute_testset(machine, inst)?,
        },
        InstructionClass::Move => match mnemonic {
            Mnemonic::Movcond16 | Mnemonic::Movcond32 => {
                mov::execute_movcond(machine, mnemonic, inst)?
            }
            Mnemonic::Movimm16 | Mnemonic::Movimm32 | Mnemonic::Movtimm32 => {
                mov::execute_movimm(machine, mnemonic, inst)
            }
            Mnemonic::Movts16 | Mnemonic::Movts32 => mov::execute_movts(machine, mnemonic, inst),
            _ => mov::execute_movfs(machine, mnemonic, inst),
        },
        InstructionClass::Control => {
            if mnemonic == Mnemonic::Trap16 {
                let (cost, outcome) = trap::execute_trap(machine, inst, host)?;
                if outcome == TrapOutcome::Exit {
                    return Ok(ExecuteOutcome::Halted { cost });
                }
                cost
            } else {
                control::execute_control(machine, mnemonic)?
            }
        }
    };

    if machine.running() {
        Ok(ExecuteOutcome::Retired { cost })
    } else {
        Ok(ExecuteOutcome::Halted { cost })
    }
}
