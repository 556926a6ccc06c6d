//! Integer flag computation for the arithmetic and bitwise classes.

use crate::state::{MachineState, StatusFlag};

/// New values of the integer condition flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntegerFlags {
    /// Result bit 31.
    pub negative: bool,
    /// Result is zero.
    pub zero: bool,
    /// Carry out (add) or no borrow (sub); always clear for logic ops.
    pub carry: bool,
    /// Signed overflow; always clear for logic ops.
    pub overflow: bool,
}

impl IntegerFlags {
    /// Flags of a logic or shift result: `AC` and `AV` forced clear.
    #[must_use]
    pub const fn logic(result: u32) -> Self {
        Self {
            negative: result >> 31 == 1,
            zero: result == 0,
            carry: false,
            overflow: false,
        }
    }

    /// Result and flags of `lhs + rhs`.
    #[must_use]
    pub const fn add(lhs: u32, rhs: u32) -> (u32, Self) {
        let (result, carry) = lhs.overflowing_add(rhs);
        let overflow = (lhs >> 31 == rhs >> 31) && (lhs >> 31 != result >> 31);
        (
            result,
            Self {
                negative: result >> 31 == 1,
                zero: result == 0,
                carry,
                overflow,
            },
        )
    }

    /// Result and flags of `lhs - rhs`; carry means no borrow occurred.
    #[must_use]
    pub const fn sub(lhs: u32, rhs: u32) -> (u32, Self) {
        let (result, borrow) = lhs.overflowing_sub(rhs);
        let overflow = (lhs >> 31 != rhs >> 31) && (lhs >> 31 != result >> 31);
        (
            result,
            Self {
                negative: result >> 31 == 1,
                zero: result == 0,
                carry: !borrow,
                overflow,
            },
        )
    }

    /// Writes `AN`, `AZ`, `AC`, `AV` and accumulates `AVS`.
    pub fn apply(self, machine: &mut MachineState<'_>) {
        machine.update_status(|status| {
            let sticky = status.get(StatusFlag::Avs) || self.overflow;
            status.set(StatusFlag::An, self.negative);
            status.set(StatusFlag::Az, self.zero);
            status.set(StatusFlag::Ac, self.carry);
            status.set(StatusFlag::Av, self.overflow);
            status.set(StatusFlag::Avs, sticky);
        });
    }
}
