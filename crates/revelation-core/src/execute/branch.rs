//! Relative branches and register-indirect jumps.

use super::helpers::{sext24, sext8};
use crate::condition::{condition_passed, COND_BRANCH_AND_LINK};
use crate::encoding::Mnemonic;
use crate::fault::Fault;
use crate::instruction::Instruction;
use crate::state::{MachineState, RegisterIndex};
use crate::timing::CycleCostKind;

pub(super) fn execute_bcond(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> Result<CycleCostKind, Fault> {
    let pc = machine.pc();
    let cond = inst.cond();
    let imm = inst.bcond_imm();
    if cond == 0 && imm == 0 {
        return Err(Fault::InfiniteLoop { pc });
    }
    let width = mnemonic.width();
    if cond == COND_BRANCH_AND_LINK {
        machine.set_reg(RegisterIndex::LR, pc.wrapping_add(width));
    }
    if condition_passed(machine.status().condition_flags(), cond)? {
        let displacement = if mnemonic.is_16bit() {
            sext8(imm)
        } else {
            sext24(imm)
        };
        machine.set_pc(pc.wrapping_add(displacement << 1));
        Ok(CycleCostKind::BranchTaken)
    } else {
        machine.set_pc(pc.wrapping_add(width));
        Ok(CycleCostKind::BranchNotTaken)
    }
}

pub(super) fn execute_jump(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> CycleCostKind {
    // LR is written before Rn is read, so `jalr lr` lands on the next instruction.
    if matches!(mnemonic, Mnemonic::Jalr32 | Mnemonic::Jalr16) {
        let link = machine.pc().wrapping_add(mnemonic.width());
        machine.set_reg(RegisterIndex::LR, link);
    }
    let target = machine.reg(inst.rn());
    machine.set_pc(target);
    CycleCostKind::Jump
}
