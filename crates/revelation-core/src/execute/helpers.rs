//! Sign extension and operand selection shared by the executors.

#![allow(clippy::pedantic, clippy::nursery, unknown_lints, missing_docs)]

use crate::instruction::Instruction;
use crate::state::MachineState;

/// Sign-extends the low `bits` bits of `value` to 32 bits.
#[must_use]
pub const fn sign_extend(value: u32, bits: u32) -> u32 {
    let shift = 32 - bits;
    (((value << shift) as i32) >> shift) as u32
}

/// Sign-extends a 3-bit immediate.
#[must_use]
pub const fn sext3(value: u32) -> u32 {
    sign_extend(value & 0x7, 3)
}

/// Sign-extends an 8-bit branch displacement.
#[must_use]
pub const fn sext8(value: u32) -> u32 {
    sign_extend(value & 0xff, 8)
}

/// Sign-extends an 11-bit immediate.
#[must_use]
pub const fn sext11(value: u32) -> u32 {
    sign_extend(value & 0x7ff, 11)
}

/// Sign-extends a 24-bit branch displacement.
#[must_use]
pub const fn sext24(value: u32) -> u32 {
    sign_extend(value & 0x00ff_ffff, 24)
}

/// Second operand of `add`/`sub`: `Rm`, or the sign-extended immediate.
///
/// The 16-bit form selects the immediate with `bit 0` set; the 32-bit form
/// selects the register with `bit 2` set.
pub(crate) fn reg_or_simm(machine: &MachineState<'_>, inst: Instruction, is_16bit: bool) -> u32 {
    if is_16bit {
        if inst.bit0() {
            sext3(inst.imm3())
        } else {
            machine.reg(inst.rm())
        }
    } else if inst.bit2() {
        machine.reg(inst.rm())
    } else {
        sext11(inst.imm11())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{sext11, sext24, sext3, sext8, sign_extend};

    #[test]
    fn sign_bit_extends_upwards() {
        assert_eq!(sext3(0b100), 0xffff_fffc);
        assert_eq!(sext3(0b011), 3);
        assert_eq!(sext8(0x80), 0xffff_ff80);
        assert_eq!(sext11(0x400), 0xffff_fc00);
        assert_eq!(sext11(0x2aa), 0x2aa);
        assert_eq!(sext24(0x00ff_fffe), 0xffff_fffe);
    }

    proptest! {
        #[test]
        fn sign_extension_preserves_value_as_signed(value in -1024i32..1024) {
            let field = (value as u32) & 0x7ff;
            prop_assert_eq!(sext11(field) as i32, value);
        }

        #[test]
        fn full_width_is_identity(value in any::<u32>()) {
            prop_assert_eq!(sign_extend(value, 32), value);
        }
    }
}
