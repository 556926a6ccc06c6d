//! Integer add/sub, logic, shifts and bit reverse.

use super::flags::IntegerFlags;
use super::helpers::reg_or_simm;
use crate::encoding::Mnemonic;
use crate::instruction::Instruction;
use crate::state::{MachineState, TimerMode};
use crate::timing::CycleCostKind;

pub(super) fn execute_add_sub(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> CycleCostKind {
    let lhs = machine.reg(inst.rn());
    let rhs = reg_or_simm(machine, inst, mnemonic.is_16bit());
    let (result, flags) = match mnemonic {
        Mnemonic::Sub32 | Mnemonic::Sub16 => IntegerFlags::sub(lhs, rhs),
        _ => IntegerFlags::add(lhs, rhs),
    };
    retire_integer(machine, mnemonic, inst, result, flags);
    CycleCostKind::Alu
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicOp {
    And,
    Orr,
    Eor,
    Asr,
    Lsr,
    Lsl,
    Bitr,
}

const fn logic_op(mnemonic: Mnemonic) -> (LogicOp, bool) {
    match mnemonic {
        Mnemonic::And32 | Mnemonic::And16 => (LogicOp::And, false),
        Mnemonic::Orr32 | Mnemonic::Orr16 => (LogicOp::Orr, false),
        Mnemonic::Eor32 | Mnemonic::Eor16 => (LogicOp::Eor, false),
        Mnemonic::Asr32 | Mnemonic::Asr16 => (LogicOp::Asr, false),
        Mnemonic::Lsr32 | Mnemonic::Lsr16 => (LogicOp::Lsr, false),
        Mnemonic::Lsl32 | Mnemonic::Lsl16 => (LogicOp::Lsl, false),
        Mnemonic::Asrimm32 | Mnemonic::Asrimm16 => (LogicOp::Asr, true),
        Mnemonic::Lsrimm32 | Mnemonic::Lsrimm16 => (LogicOp::Lsr, true),
        Mnemonic::Lslimm32 | Mnemonic::Lslimm16 => (LogicOp::Lsl, true),
        _ => (LogicOp::Bitr, true),
    }
}

pub(super) fn execute_logic(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> CycleCostKind {
    let (op, immediate) = logic_op(mnemonic);
    let rn = machine.reg(inst.rn());
    let rm = if immediate {
        inst.imm5()
    } else {
        machine.reg(inst.rm())
    };
    let shift = rm & 0x1f;
    let result = match op {
        LogicOp::And => rn & rm,
        LogicOp::Orr => rn | rm,
        LogicOp::Eor => rn ^ rm,
        LogicOp::Asr => ((rn as i32) >> shift) as u32,
        LogicOp::Lsr => rn >> shift,
        LogicOp::Lsl => rn << shift,
        // Full 32-bit reverse for both widths.
        LogicOp::Bitr => rn.reverse_bits(),
    };
    retire_integer(machine, mnemonic, inst, result, IntegerFlags::logic(result));
    CycleCostKind::Alu
}

fn retire_integer(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
    result: u32,
    flags: IntegerFlags,
) {
    machine.set_reg(inst.rd(), result);
    flags.apply(machine);
    machine.count_timer_event(TimerMode::IaluValid);
    machine.advance_pc(mnemonic.width());
}
