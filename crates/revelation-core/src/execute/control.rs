//! Interrupt, debug and system control instructions.

use crate::encoding::Mnemonic;
use crate::fault::Fault;
use crate::state::{Excause, MachineState, RegisterIndex, StatusFlag};
use crate::timing::CycleCostKind;

/// Number of interrupt levels (`ILAT`/`IMASK`/`IPEND` bits).
pub const INTERRUPT_LEVELS: u32 = 10;

const SOFTWARE_EXCEPTION: u32 = 1 << 1;
const DEBUG_HALT: u32 = 1;

/// Lowest set bit of `bits` among the interrupt levels.
#[must_use]
pub const fn lowest_level(bits: u32) -> Option<u32> {
    let masked = bits & ((1 << INTERRUPT_LEVELS) - 1);
    if masked == 0 {
        None
    } else {
        Some(masked.trailing_zeros())
    }
}

pub(super) fn execute_control(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
) -> Result<CycleCostKind, Fault> {
    match mnemonic {
        Mnemonic::Nop16 => {
            machine.advance_pc(2);
            return Ok(CycleCostKind::Nop);
        }
        Mnemonic::Idle16 => {
            machine.set_flag(StatusFlag::Active, false);
            if machine.reg(RegisterIndex::ILAT) == 0 {
                log::warn!("IDLE16 does not wait in this simulator. Moving to next instruction.");
            }
            machine.advance_pc(2);
        }
        Mnemonic::Bkpt16 => {
            machine.or_reg(RegisterIndex::DEBUGSTATUS, DEBUG_HALT);
            machine.set_flag(StatusFlag::Active, false);
            machine.halt();
            machine.advance_pc(2);
        }
        Mnemonic::Gie16 => {
            let imask = machine.reg(RegisterIndex::IMASK);
            let ilat = machine.reg(RegisterIndex::ILAT);
            machine.set_reg(RegisterIndex::ILAT, ilat & imask);
            machine.set_flag(StatusFlag::Gid, false);
            machine.advance_pc(2);
        }
        Mnemonic::Gid16 => {
            machine.set_flag(StatusFlag::Gid, true);
            machine.advance_pc(2);
        }
        Mnemonic::Swi16 => {
            machine.or_reg(RegisterIndex::ILAT, SOFTWARE_EXCEPTION);
            machine.update_status(|status| status.set_excause(Excause::Swi));
            machine.advance_pc(2);
        }
        Mnemonic::Rti16 => {
            // Without an interrupt in service RTI still returns through IRET.
            if let Some(level) = lowest_level(machine.reg(RegisterIndex::IPEND)) {
                machine.clear_reg_bits(RegisterIndex::IPEND, 1 << level);
            }
            machine.set_flag(StatusFlag::Gid, false);
            let iret = machine.reg(RegisterIndex::IRET);
            machine.set_pc(iret);
            return Ok(CycleCostKind::Rti);
        }
        Mnemonic::Unimpl32 => {
            machine.update_status(|status| status.set_excause(Excause::Unimplemented));
            machine.advance_pc(4);
        }
        other => return Err(Fault::Unimplemented { mnemonic: other }),
    }
    Ok(CycleCostKind::Control)
}
