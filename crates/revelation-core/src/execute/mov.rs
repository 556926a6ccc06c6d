//! Immediate, conditional and special-register moves.

use crate::condition::condition_passed;
use crate::encoding::Mnemonic;
use crate::fault::Fault;
use crate::instruction::Instruction;
use crate::state::MachineState;
use crate::timing::CycleCostKind;

/// Local offsets of the four special-register banks selected by `mmr`.
pub const SPECIAL_BANKS: [u32; 4] = [0xf0400, 0xf0500, 0xf0600, 0xf0700];

/// Local address of special register `number` in bank `mmr`.
#[must_use]
pub const fn special_register_address(mmr: u32, number: u32) -> u32 {
    SPECIAL_BANKS[(mmr & 0x3) as usize] + 4 * (number & 0x3f)
}

pub(super) fn execute_movcond(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> Result<CycleCostKind, Fault> {
    if condition_passed(machine.status().condition_flags(), inst.cond())? {
        let value = machine.reg(inst.rn());
        machine.set_reg(inst.rd(), value);
    }
    machine.advance_pc(mnemonic.width());
    Ok(CycleCostKind::Move)
}

pub(super) fn execute_movimm(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> CycleCostKind {
    let value = if mnemonic == Mnemonic::Movtimm32 {
        (machine.reg(inst.rd()) & 0xffff) | (inst.imm16() << 16)
    } else {
        inst.imm16()
    };
    machine.set_reg(inst.rd(), value);
    machine.advance_pc(mnemonic.width());
    CycleCostKind::Move
}

/// `movts`: the `rn` field names the special register, `rd` the source GPR.
pub(super) fn execute_movts(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> CycleCostKind {
    let address = special_register_address(inst.mmr(), inst.rn_number());
    let value = machine.reg(inst.rd());
    machine.write_memory(address, 4, value);
    machine.advance_pc(mnemonic.width());
    CycleCostKind::Move
}

/// `movfs`: the `rn` field names the special register, `rd` the destination.
pub(super) fn execute_movfs(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> CycleCostKind {
    let address = special_register_address(inst.mmr(), inst.rn_number());
    let value = machine.read_memory(address, 4);
    machine.set_reg(inst.rd(), value);
    machine.advance_pc(mnemonic.width());
    CycleCostKind::Move
}
