//! Branch and conditional-move condition codes.

use crate::fault::Fault;
use crate::state::ConditionFlags;

/// Condition code of the branch-and-link form (`bl`).
pub const COND_BRANCH_AND_LINK: u32 = 0b1111;
/// Condition code of the unconditional form (`b`).
pub const COND_ALWAYS: u32 = 0b1110;

/// Assembly suffix for each condition code, indexed by code.
pub const CONDITION_SUFFIXES: [&str; 16] = [
    "eq", "ne", "gtu", "gteu", "lteu", "ltu", "gt", "gte", "lt", "lte", "beq", "bne", "blt",
    "blte", "", "l",
];

/// Evaluates a 4-bit condition code against the current flags.
///
/// Codes 0..=9 test the integer flags, 10..=13 the floating flags; 14 and 15
/// always pass.
///
/// # Errors
///
/// Returns [`Fault::ConditionRange`] for codes above 15. Decoded fields are
/// four bits wide, so only host-built requests can hit this.
pub const fn condition_passed(flags: ConditionFlags, cond: u32) -> Result<bool, Fault> {
    let ConditionFlags {
        az,
        an,
        ac,
        av,
        bz,
        bn,
    } = flags;
    let passed = match cond {
        0 => az,
        1 => !az,
        2 => !az && ac,
        3 => ac,
        4 => az || !ac,
        5 => !ac,
        6 => !az && av == an,
        7 => av == an,
        8 => av != an,
        9 => az || av != an,
        10 => bz,
        11 => !bz,
        12 => bn && !bz,
        13 => bn || bz,
        14 | 15 => true,
        code => return Err(Fault::ConditionRange { code }),
    };
    Ok(passed)
}
