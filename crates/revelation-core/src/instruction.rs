//! Field accessors over raw instruction words.
//!
//! Register numbers and most immediates are split across two bit groups: the
//! low group lives in the first halfword so that 16-bit encodings can reach
//! `R0..R7`, the high group extends the field for 32-bit encodings. Every
//! accessor is total; a field is simply meaningless for opcodes that do not
//! use it.

use crate::state::registers::RegisterIndex;

/// Raw 16- or 32-bit instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction(u32);

impl Instruction {
    /// Wraps a raw word.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw word as fetched.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Clears the bits above a 16-bit encoding.
    #[must_use]
    pub const fn narrowed(self) -> Self {
        Self(self.0 & 0xffff)
    }

    const fn field(self, shift: u32, mask: u32) -> u32 {
        (self.0 >> shift) & mask
    }

    /// Destination register (`bits 13..15` low, `bits 29..31` high).
    #[must_use]
    pub const fn rd(self) -> RegisterIndex {
        RegisterIndex::gpr(self.field(13, 0x7) | self.field(26, 0x38))
    }

    /// First source register (`bits 10..12` low, `bits 26..28` high).
    #[must_use]
    pub const fn rn(self) -> RegisterIndex {
        RegisterIndex::gpr(self.field(10, 0x7) | self.field(23, 0x38))
    }

    /// Second source register (`bits 7..9` low, `bits 23..25` high).
    #[must_use]
    pub const fn rm(self) -> RegisterIndex {
        RegisterIndex::gpr(self.field(7, 0x7) | self.field(20, 0x38))
    }

    /// Raw 6-bit `rn` number, used where the field names a special register.
    #[must_use]
    pub const fn rn_number(self) -> u32 {
        self.field(10, 0x7) | self.field(23, 0x38)
    }

    /// 3-bit immediate of 16-bit arithmetic and displacement forms.
    #[must_use]
    pub const fn imm3(self) -> u32 {
        self.field(7, 0x7)
    }

    /// 5-bit shift amount.
    #[must_use]
    pub const fn imm5(self) -> u32 {
        self.field(5, 0x1f)
    }

    /// 11-bit immediate (`bits 7..9` low, `bits 16..23` high).
    #[must_use]
    pub const fn imm11(self) -> u32 {
        self.field(7, 0x7) | self.field(13, 0x7f8)
    }

    /// 16-bit immediate of the move forms (`bits 5..12` low, `bits 20..27` high).
    #[must_use]
    pub const fn imm16(self) -> u32 {
        self.field(5, 0xff) | self.field(12, 0xff00)
    }

    /// Special-register bank selector of `movts`/`movfs`.
    #[must_use]
    pub const fn mmr(self) -> u32 {
        self.field(20, 0x3)
    }

    /// 5-bit trap code.
    #[must_use]
    pub const fn t5(self) -> u32 {
        self.field(10, 0x1f)
    }

    /// 4-bit condition code.
    #[must_use]
    pub const fn cond(self) -> u32 {
        self.field(4, 0xf)
    }

    /// Branch displacement before sign extension (everything above `bit 7`).
    #[must_use]
    pub const fn bcond_imm(self) -> u32 {
        self.0 >> 8
    }

    /// log2 of the access size of loads and stores.
    #[must_use]
    pub const fn size(self) -> u32 {
        self.field(5, 0x3)
    }

    /// Subtract flag of 32-bit displacement forms (`bit 24`).
    #[must_use]
    pub const fn sub(self) -> bool {
        self.field(24, 1) == 1
    }

    /// Subtract flag of indexed and post-modify forms (`bit 20`).
    #[must_use]
    pub const fn sub20(self) -> bool {
        self.field(20, 1) == 1
    }

    /// Store flag of loads and stores (`bit 4`).
    #[must_use]
    pub const fn is_store(self) -> bool {
        self.field(4, 1) == 1
    }

    /// Register-operand selector of 32-bit arithmetic (`bit 2`).
    #[must_use]
    pub const fn bit2(self) -> bool {
        self.field(2, 1) == 1
    }

    /// Immediate selector of 16-bit arithmetic (`bit 0`).
    #[must_use]
    pub const fn bit0(self) -> bool {
        self.field(0, 1) == 1
    }
}

impl From<u32> for Instruction {
    fn from(bits: u32) -> Self {
        Self::new(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction;

    #[test]
    fn split_register_fields_join_low_and_high_groups() {
        // rd=0b101_011, rn=0b110_001, rm=0b011_111
        let word = (0b011 << 13)
            | (0b101 << 29)
            | (0b001 << 10)
            | (0b110 << 26)
            | (0b111 << 7)
            | (0b011 << 23);
        let inst = Instruction::new(word);
        assert_eq!(inst.rd().index(), 0b101_011);
        assert_eq!(inst.rn().index(), 0b110_001);
        assert_eq!(inst.rm().index(), 0b011_111);
    }

    #[test]
    fn add32_immediate_fields_decode() {
        let inst = Instruction::new(0b0000_0000_0101_0101_0010_0001_0001_1011);
        assert_eq!(inst.rd().index(), 1);
        assert_eq!(inst.rn().index(), 0);
        assert_eq!(inst.imm11(), 0b010_1010_1010);
        assert!(!inst.bit2());
    }

    #[test]
    fn imm16_spans_both_halfwords() {
        let imm = 0xbeef_u32;
        let word = 0b01011 | ((imm & 0xff) << 5) | ((imm & 0xff00) << 12);
        assert_eq!(Instruction::new(word).imm16(), imm);
        assert_eq!(Instruction::new(word).narrowed().imm16(), 0xef);
    }

    #[test]
    fn narrowed_clears_upper_halfword() {
        let inst = Instruction::new(0xffff_0000 | 0x1234).narrowed();
        assert_eq!(inst.bits(), 0x1234);
        assert_eq!(inst.rd().index(), 0);
    }

    #[test]
    fn control_fields_extract() {
        let trap = Instruction::new(0b11_1110_0010 | (7 << 10));
        assert_eq!(trap.t5(), 7);
        let bcond = Instruction::new(0b1000 | (0xf << 4) | (0x00ab_cdef << 8));
        assert_eq!(bcond.cond(), 0xf);
        assert_eq!(bcond.bcond_imm(), 0x00ab_cdef);
        let movts = Instruction::new(0b01_0000_1111 | (0b10 << 20));
        assert_eq!(movts.mmr(), 0b10);
        assert!(!movts.sub20());
    }

    #[test]
    fn load_store_flags_extract() {
        let word = (1 << 4) | (0b11 << 5) | (1 << 20) | (1 << 24);
        let inst = Instruction::new(word);
        assert!(inst.is_store());
        assert_eq!(inst.size(), 0b11);
        assert!(inst.sub20());
        assert!(inst.sub());
    }
}
