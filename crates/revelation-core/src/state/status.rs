//! `STATUS` and `CONFIG` bit-field views.

/// Single-bit fields of the `STATUS` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusFlag {
    /// Core is active (cleared by `idle`).
    Active = 0,
    /// Global interrupt disable.
    Gid = 1,
    /// Kernel (supervisor) mode.
    Kernel = 2,
    /// Wired-AND barrier flag.
    Wand = 3,
    /// Integer zero.
    Az = 4,
    /// Integer negative.
    An = 5,
    /// Integer carry.
    Ac = 6,
    /// Integer overflow.
    Av = 7,
    /// Floating zero.
    Bz = 8,
    /// Floating negative.
    Bn = 9,
    /// Floating overflow.
    Bv = 10,
    /// Sticky integer overflow.
    Avs = 12,
    /// Sticky invalid (NaN operand).
    Bis = 13,
    /// Sticky floating overflow.
    Bvs = 14,
    /// Sticky floating underflow.
    Bus = 15,
}

impl StatusFlag {
    /// Bit mask of this flag inside `STATUS`.
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self as u32
    }
}

const EXCAUSE_SHIFT: u32 = 16;
const EXCAUSE_MASK: u32 = 0xf << EXCAUSE_SHIFT;

/// Exception cause codes stored in `STATUS[19:16]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Excause {
    /// No exception recorded.
    None = 0b0000,
    /// Software interrupt.
    Swi = 0b0001,
    /// Unaligned access.
    Unaligned = 0b0010,
    /// Floating-point exception.
    Fpu = 0b0011,
    /// Unimplemented instruction.
    Unimplemented = 0b0100,
    /// Illegal memory access.
    IllegalAccess = 0b0101,
}

impl Excause {
    /// Decodes the 4-bit field; unknown encodings yield `None`.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0b0000 => Some(Self::None),
            0b0001 => Some(Self::Swi),
            0b0010 => Some(Self::Unaligned),
            0b0011 => Some(Self::Fpu),
            0b0100 => Some(Self::Unimplemented),
            0b0101 => Some(Self::IllegalAccess),
            _ => None,
        }
    }
}

/// Flag inputs of the condition evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(clippy::struct_excessive_bools, missing_docs)]
pub struct ConditionFlags {
    pub az: bool,
    pub an: bool,
    pub ac: bool,
    pub av: bool,
    pub bz: bool,
    pub bn: bool,
}

/// Value of the `STATUS` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Status(u32);

impl Status {
    /// Wraps a raw register value.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw register value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Reads one flag.
    #[must_use]
    pub const fn get(self, flag: StatusFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    /// Returns a copy with `flag` set to `value`.
    #[must_use]
    pub const fn with(self, flag: StatusFlag, value: bool) -> Self {
        if value {
            Self(self.0 | flag.mask())
        } else {
            Self(self.0 & !flag.mask())
        }
    }

    /// Sets one flag in place.
    pub fn set(&mut self, flag: StatusFlag, value: bool) {
        *self = self.with(flag, value);
    }

    /// Raw exception cause field.
    #[must_use]
    pub const fn excause_bits(self) -> u32 {
        (self.0 & EXCAUSE_MASK) >> EXCAUSE_SHIFT
    }

    /// Decoded exception cause.
    #[must_use]
    pub const fn excause(self) -> Option<Excause> {
        Excause::from_bits(self.excause_bits())
    }

    /// Replaces the exception cause field.
    pub fn set_excause(&mut self, cause: Excause) {
        self.0 = (self.0 & !EXCAUSE_MASK) | ((cause as u32) << EXCAUSE_SHIFT);
    }

    /// Flags consulted by branch and conditional-move conditions.
    #[must_use]
    pub const fn condition_flags(self) -> ConditionFlags {
        ConditionFlags {
            az: self.get(StatusFlag::Az),
            an: self.get(StatusFlag::An),
            ac: self.get(StatusFlag::Ac),
            av: self.get(StatusFlag::Av),
            bz: self.get(StatusFlag::Bz),
            bn: self.get(StatusFlag::Bn),
        }
    }
}

/// Execution mode of the shared float / signed-integer opcode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ArithMode {
    /// IEEE-754 single precision.
    Float,
    /// Two's-complement signed 32-bit integers.
    SignedInt,
}

/// Event counted by a core timer, from its `CONFIG` mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TimerMode {
    /// Timer stopped.
    Off,
    /// Every clock cycle.
    Clock,
    /// Idle cycles.
    Idle,
    /// Integer ALU instructions retired.
    IaluValid,
    /// Floating-point instructions retired.
    FpuValid,
    /// Any other event source; never matched by this simulator.
    Other(u32),
}

impl TimerMode {
    const fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::Off,
            1 => Self::Clock,
            2 => Self::Idle,
            4 => Self::IaluValid,
            5 => Self::FpuValid,
            other => Self::Other(other),
        }
    }
}

/// One of the two core timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// `CTIMER0`.
    Zero,
    /// `CTIMER1`.
    One,
}

const CONFIG_IEN: u32 = 1 << 1;
const CONFIG_OEN: u32 = 1 << 2;
const CONFIG_UEN: u32 = 1 << 3;
const CONFIG_ARITHMODE_SHIFT: u32 = 17;
const CONFIG_ARITHMODE_MASK: u32 = 0b111 << CONFIG_ARITHMODE_SHIFT;
const ARITHMODE_SIGNED_INT: u32 = 0b100;

/// Value of the `CONFIG` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Config(u32);

impl Config {
    /// Wraps a raw register value.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw register value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Truncate-to-zero rounding mode bit.
    #[must_use]
    pub const fn rmode(self) -> bool {
        self.0 & 1 != 0
    }

    /// Invalid-operation exception enable.
    #[must_use]
    pub const fn ien(self) -> bool {
        self.0 & CONFIG_IEN != 0
    }

    /// Overflow exception enable.
    #[must_use]
    pub const fn oen(self) -> bool {
        self.0 & CONFIG_OEN != 0
    }

    /// Underflow exception enable.
    #[must_use]
    pub const fn uen(self) -> bool {
        self.0 & CONFIG_UEN != 0
    }

    /// Event source configured for `timer`.
    #[must_use]
    pub const fn timer_mode(self, timer: Timer) -> TimerMode {
        let shift = match timer {
            Timer::Zero => 4,
            Timer::One => 8,
        };
        TimerMode::from_bits((self.0 >> shift) & 0xf)
    }

    /// Arithmetic mode of the `farith` opcode family.
    #[must_use]
    pub const fn arithmode(self) -> ArithMode {
        if (self.0 & CONFIG_ARITHMODE_MASK) >> CONFIG_ARITHMODE_SHIFT == ARITHMODE_SIGNED_INT {
            ArithMode::SignedInt
        } else {
            ArithMode::Float
        }
    }

    /// Returns a copy with the arithmetic mode replaced.
    #[must_use]
    pub const fn with_arithmode(self, mode: ArithMode) -> Self {
        let bits = match mode {
            ArithMode::Float => 0,
            ArithMode::SignedInt => ARITHMODE_SIGNED_INT,
        };
        Self((self.0 & !CONFIG_ARITHMODE_MASK) | (bits << CONFIG_ARITHMODE_SHIFT))
    }

    /// Returns a copy with `timer` counting `mode` events.
    #[must_use]
    pub const fn with_timer_mode(self, timer: Timer, mode: u32) -> Self {
        let shift = match timer {
            Timer::Zero => 4,
            Timer::One => 8,
        };
        Self((self.0 & !(0xf << shift)) | ((mode & 0xf) << shift))
    }
}

#[cfg(test)]
mod tests {
    use super::{ArithMode, Config, Excause, Status, StatusFlag, Timer, TimerMode};

    #[test]
    fn flag_masks_match_register_layout() {
        assert_eq!(StatusFlag::Active.mask(), 1);
        assert_eq!(StatusFlag::Gid.mask(), 1 << 1);
        assert_eq!(StatusFlag::Az.mask(), 1 << 4);
        assert_eq!(StatusFlag::Bv.mask(), 1 << 10);
        assert_eq!(StatusFlag::Avs.mask(), 1 << 12);
        assert_eq!(StatusFlag::Bus.mask(), 1 << 15);
    }

    #[test]
    fn with_sets_and_clears_single_bits() {
        let status = Status::new(0).with(StatusFlag::An, true).with(StatusFlag::Bis, true);
        assert_eq!(status.bits(), (1 << 5) | (1 << 13));
        assert!(!status.with(StatusFlag::An, false).get(StatusFlag::An));
    }

    #[test]
    fn excause_field_is_replaced_not_merged() {
        let mut status = Status::new(0xffff_ffff);
        status.set_excause(Excause::Swi);
        assert_eq!(status.excause(), Some(Excause::Swi));
        assert_eq!(status.bits() & 0xffff, 0xffff);
        status.set_excause(Excause::Unimplemented);
        assert_eq!(status.excause_bits(), 0b0100);
    }

    #[test]
    fn condition_flags_extract_both_groups() {
        let flags = Status::new(0)
            .with(StatusFlag::Ac, true)
            .with(StatusFlag::Bn, true)
            .condition_flags();
        assert!(flags.ac && flags.bn);
        assert!(!flags.az && !flags.an && !flags.av && !flags.bz);
    }

    #[test]
    fn config_decodes_arithmode_and_enables() {
        let config = Config::new((0b100 << 17) | 14);
        assert_eq!(config.arithmode(), ArithMode::SignedInt);
        assert!(config.ien() && config.oen() && config.uen());
        assert!(!config.rmode());
        assert_eq!(Config::default().arithmode(), ArithMode::Float);
        assert_eq!(
            config.with_arithmode(ArithMode::Float).arithmode(),
            ArithMode::Float
        );
    }

    #[test]
    fn config_decodes_timer_modes() {
        let config = Config::new(0)
            .with_timer_mode(Timer::Zero, 5)
            .with_timer_mode(Timer::One, 1);
        assert_eq!(config.timer_mode(Timer::Zero), TimerMode::FpuValid);
        assert_eq!(config.timer_mode(Timer::One), TimerMode::Clock);
        assert_eq!(
            Config::new(0xc << 4).timer_mode(Timer::Zero),
            TimerMode::Other(0xc)
        );
    }
}
