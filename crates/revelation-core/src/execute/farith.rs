//! Shared float / signed-integer arithmetic, selected by `CONFIG.ARITHMODE`.

use crate::encoding::Mnemonic;
use crate::float::{bits_to_float, float_to_bits, is_inf_bits, is_nan_bits, is_subnormal_bits};
use crate::instruction::Instruction;
use crate::state::{ArithMode, Excause, MachineState, RegisterIndex, StatusFlag, TimerMode};
use crate::timing::CycleCostKind;

/// Results with a smaller magnitude set `BZ`.
pub const FLOAT_ZERO_EPSILON: f32 = 0.0001;

/// `fix` of a NaN operand.
pub const FIX_NAN_RESULT: u32 = 0xffff_ffff;

const FPU_INTERRUPT: u32 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FarithOp {
    Add,
    Sub,
    Mul,
    Madd,
    Msub,
    Float,
    Fix,
    Abs,
}

impl FarithOp {
    const fn from_mnemonic(mnemonic: Mnemonic) -> Self {
        match mnemonic {
            Mnemonic::Fadd16 | Mnemonic::Fadd32 => Self::Add,
            Mnemonic::Fsub16 | Mnemonic::Fsub32 => Self::Sub,
            Mnemonic::Fmul16 | Mnemonic::Fmul32 => Self::Mul,
            Mnemonic::Fmadd16 | Mnemonic::Fmadd32 => Self::Madd,
            Mnemonic::Fmsub16 | Mnemonic::Fmsub32 => Self::Msub,
            Mnemonic::Float16 | Mnemonic::Float32 => Self::Float,
            Mnemonic::Fix16 | Mnemonic::Fix32 => Self::Fix,
            _ => Self::Abs,
        }
    }

    const fn is_unary(self) -> bool {
        matches!(self, Self::Float | Self::Fix | Self::Abs)
    }
}

pub(super) fn execute_farith(
    machine: &mut MachineState<'_>,
    mnemonic: Mnemonic,
    inst: Instruction,
) -> CycleCostKind {
    let op = FarithOp::from_mnemonic(mnemonic);
    let rd = machine.reg(inst.rd());
    let rn = machine.reg(inst.rn());
    let rm = machine.reg(inst.rm());
    match machine.config().arithmode() {
        ArithMode::Float => float_mode(machine, op, inst.rd(), [rd, rn, rm]),
        ArithMode::SignedInt => integer_mode(machine, op, inst.rd(), [rd, rn, rm]),
    }
    machine.advance_pc(mnemonic.width());
    CycleCostKind::Fpu
}

fn float_mode(
    machine: &mut MachineState<'_>,
    op: FarithOp,
    dest: RegisterIndex,
    [rd_bits, rn_bits, rm_bits]: [u32; 3],
) {
    let (rd, rn, rm) = (
        bits_to_float(rd_bits),
        bits_to_float(rn_bits),
        bits_to_float(rm_bits),
    );
    let invalid = is_nan_bits(rn_bits) || (!op.is_unary() && is_nan_bits(rm_bits));

    // `flag_value` is what BN/BZ are computed from.
    let (mut bits, flag_value) = match op {
        FarithOp::Add => float_result(rn + rm),
        FarithOp::Sub => float_result(rn - rm),
        FarithOp::Mul => float_result(rn * rm),
        FarithOp::Madd => float_result(rd + rn * rm),
        FarithOp::Msub => float_result(rd - rn * rm),
        FarithOp::Float => float_result(rn_bits as i32 as f32),
        FarithOp::Abs => float_result(rn.abs()),
        FarithOp::Fix if rn.is_nan() => (FIX_NAN_RESULT, FIX_NAN_RESULT as f32),
        FarithOp::Fix => {
            let value = rn as i32;
            (value as u32, value as f32)
        }
    };

    let underflow = op != FarithOp::Fix && is_subnormal_bits(bits);
    if underflow {
        bits = 0;
    }
    let overflow = op != FarithOp::Fix && is_inf_bits(bits);

    machine.set_reg(dest, bits);
    let status = machine.status();
    let bis = status.get(StatusFlag::Bis) || invalid;
    let bvs = status.get(StatusFlag::Bvs) || overflow;
    let bus = status.get(StatusFlag::Bus) || underflow;
    machine.update_status(|status| {
        status.set(StatusFlag::Bn, flag_value < 0.0);
        status.set(StatusFlag::Bz, flag_value.abs() < FLOAT_ZERO_EPSILON);
        status.set(StatusFlag::Bv, overflow);
        status.set(StatusFlag::Bis, bis);
        status.set(StatusFlag::Bvs, bvs);
        status.set(StatusFlag::Bus, bus);
    });

    let config = machine.config();
    if (config.ien() && bis) || (config.oen() && bvs) || (config.uen() && bus) {
        log::debug!("core {:#x}: floating-point exception", machine.coreid());
        machine.or_reg(RegisterIndex::ILAT, FPU_INTERRUPT);
        machine.update_status(|status| status.set_excause(Excause::Fpu));
    }
    if !invalid {
        machine.count_timer_event(TimerMode::FpuValid);
    }
}

fn float_result(value: f32) -> (u32, f32) {
    (float_to_bits(value), value)
}

fn integer_mode(
    machine: &mut MachineState<'_>,
    op: FarithOp,
    dest: RegisterIndex,
    [rd, rn, rm]: [u32; 3],
) {
    let (rd, rn, rm) = (rd as i32, rn as i32, rm as i32);
    let result = match op {
        FarithOp::Add => rn.wrapping_add(rm),
        FarithOp::Sub => rn.wrapping_sub(rm),
        FarithOp::Mul => rn.wrapping_mul(rm),
        FarithOp::Madd => rd.wrapping_add(rn.wrapping_mul(rm)),
        FarithOp::Msub => rd.wrapping_sub(rn.wrapping_mul(rm)),
        // Operands are already integers; the conversions copy `Rn`.
        FarithOp::Float | FarithOp::Fix => rn,
        FarithOp::Abs => rn.wrapping_abs(),
    };
    machine.set_reg(dest, result as u32);
    machine.update_status(|status| {
        status.set(StatusFlag::Bn, result < 0);
        status.set(StatusFlag::Bz, result == 0);
    });
    machine.count_timer_event(TimerMode::IaluValid);
}
