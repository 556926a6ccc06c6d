//! Displacement, indexed and post-modify loads and stores, plus `testset32`.

use crate::encoding::Mnemonic;
use crate::fault::Fault;
use crate::instruction::Instruction;
use crate::memory::{AccessSize, TESTSET_FLOOR};
use crate::state::MachineState;
use crate::timing::CycleCostKind;

const fn offset(base: u32, amount: u32, subtract: bool) -> u32 {
    if subtract {
        base.wrapping_sub(amount)
    } else {
        base.wrapping_add(amount)
    }
}

/// Moves `Rd` (and `Rd+1` for doubles) to or from `address`.
fn transfer(
    machine: &mut MachineState<'_>,
    inst: Instruction,
    address: u32,
) -> Result<CycleCostKind, Fault> {
    let size = AccessSize::from_field(inst.size());
    let rd = inst.rd();
    match (inst.is_store(), size) {
        (true, AccessSize::Double) => {
            let (low, high) = (machine.reg(rd), machine.reg(rd.next_gpr()?));
            machine.write_memory(address, 4, low);
            machine.write_memory(address.wrapping_add(4), 4, high);
        }
        (true, _) => {
            let value = machine.reg(rd);
            machine.write_memory(address, size.bytes(), value);
        }
        (false, AccessSize::Double) => {
            let high_reg = rd.next_gpr()?;
            let low = machine.read_memory(address, 4);
            let high = machine.read_memory(address.wrapping_add(4), 4);
            machine.set_reg(rd, low);
            machine.set_reg(high_reg, high);
        }
        (false, _) => {
            let value = machine.read_memory(address, size.bytes());
            machine.set_reg(rd, value);
        }
    }
    Ok(match (size, inst.is_store()) {
        (AccessSize::Double, _) => CycleCostKind::DoubleTransfer,
        (_, true) => CycleCostKind::Store,
        (_, false) => CycleCostKind::Load,
    })
}

/// `address = Rn +/- (imm << log2(size))`.
pub(super) fn execute_displacement(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> Result<CycleCostKind, Fault> {
    let imm = if mnemonic.is_16bit() {
        inst.imm3()
    } else {
        inst.imm11()
    };
    let scaled = imm << AccessSize::from_field(inst.size()).log2();
    let address = offset(machine.reg(inst.rn()), scaled, inst.sub());
    let cost = transfer(machine, inst, address)?;
    machine.advance_pc(mnemonic.width());
    Ok(cost)
}

/// `address = Rn +/- Rm`.
pub(super) fn execute_indexed(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> Result<CycleCostKind, Fault> {
    let address = offset(machine.reg(inst.rn()), machine.reg(inst.rm()), inst.sub20());
    let cost = transfer(machine, inst, address)?;
    machine.advance_pc(mnemonic.width());
    Ok(cost)
}

/// Access at `Rn`, then `Rn = Rn +/- Rm`.
pub(super) fn execute_post_modify(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> Result<CycleCostKind, Fault> {
    let address = machine.reg(inst.rn());
    let index = machine.reg(inst.rm());
    let cost = transfer(machine, inst, address)?;
    machine.set_reg(inst.rn(), offset(address, index, inst.sub20()));
    machine.advance_pc(mnemonic.width());
    Ok(cost)
}

/// Access at `Rn`, then `Rn = Rn +/- (imm11 << log2(size))`.
pub(super) fn execute_post_modify_displacement(
    machine: &mut MachineState<'_>,
    inst: Instruction,
) -> Result<CycleCostKind, Fault> {
    let address = machine.reg(inst.rn());
    let scaled = inst.imm11() << AccessSize::from_field(inst.size()).log2();
    let cost = transfer(machine, inst, address)?;
    machine.set_reg(inst.rn(), offset(address, scaled, inst.sub()));
    machine.advance_pc(4);
    Ok(cost)
}

/// Atomic test-and-set at `Rn +/- Rm`.
///
/// Doubles test both words and exchange them with the `Rd`/`Rd+1` pair.
pub(super) fn execute_testset(
    machine: &mut MachineState<'_>,
    inst: Instruction,
) -> Result<CycleCostKind, Fault> {
    let address = offset(machine.reg(inst.rn()), machine.reg(inst.rm()), inst.sub20());
    if address <= TESTSET_FLOOR {
        return Err(Fault::TestSetFloor { address });
    }
    let rd = inst.rd();
    let size = AccessSize::from_field(inst.size());
    let registers = if size == AccessSize::Double {
        vec![(rd, address), (rd.next_gpr()?, address.wrapping_add(4))]
    } else {
        vec![(rd, address)]
    };
    let bytes = size.bytes().min(4);
    let current: Vec<u32> = registers
        .iter()
        .map(|&(_, word)| machine.read_memory(word, bytes))
        .collect();
    let free = current.iter().all(|&value| value == 0);
    for (&(reg, word), value) in registers.iter().zip(current) {
        if free {
            let new = machine.reg(reg);
            machine.write_memory(word, bytes, new);
        }
        machine.set_reg(reg, value);
    }
    machine.advance_pc(4);
    Ok(CycleCostKind::TestSet)
}
