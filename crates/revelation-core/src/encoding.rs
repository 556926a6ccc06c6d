//! Static opcode encoding table and mnemonic classification.

use core::fmt;

/// Closed set of decodable instruction forms.
///
/// Each variant names one mnemonic of the assembly language together with its
/// encoding width, exactly as it appears in disassembly and trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Mnemonic {
    Bcond32,
    Bcond16,
    Ldstrpmd32,
    Ldstrdisp16,
    Ldstrdisp32,
    Ldstrind16,
    Ldstrind32,
    Ldstrpm16,
    Ldstrpm32,
    Testset32,
    Add32,
    Sub32,
    Add16,
    Sub16,
    And32,
    And16,
    Orr32,
    Orr16,
    Eor32,
    Eor16,
    Asr32,
    Asr16,
    Lsr32,
    Lsr16,
    Lsl32,
    Lsl16,
    Lsrimm32,
    Lslimm32,
    Asrimm32,
    Bitrimm32,
    Lsrimm16,
    Lslimm16,
    Asrimm16,
    Bitrimm16,
    Fadd16,
    Fsub16,
    Fmul16,
    Fmadd16,
    Fmsub16,
    Float16,
    Fix16,
    Fabs16,
    Fadd32,
    Fsub32,
    Fmul32,
    Fmadd32,
    Fmsub32,
    Float32,
    Fix32,
    Fabs32,
    Movcond32,
    Movcond16,
    Movimm32,
    Movimm16,
    Movtimm32,
    Movts16,
    Movts32,
    Movfs16,
    Movfs32,
    Jr32,
    Jr16,
    Jalr32,
    Jalr16,
    Nop16,
    Idle16,
    Bkpt16,
    Mbkpt16,
    Gie16,
    Gid16,
    Sync16,
    Rti16,
    Swi16,
    Trap16,
    Wand16,
    Unimpl32,
}

/// Execution family an opcode belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionClass {
    /// Conditional and linking relative branches.
    Branch,
    /// Register-indirect jumps.
    Jump,
    /// Loads, stores and the atomic test-and-set.
    LoadStore,
    /// Integer add and subtract.
    Arith,
    /// Logic operations, shifts and bit reversal.
    Bitwise,
    /// Float or signed-integer arithmetic selected by `ARITHMODE`.
    Farith,
    /// Immediate, conditional and special-register moves.
    Move,
    /// Interrupt, debug and system control.
    Control,
}

impl Mnemonic {
    /// Returns the assembly spelling of this mnemonic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bcond32 => "bcond32",
            Self::Bcond16 => "bcond16",
            Self::Ldstrpmd32 => "ldstrpmd32",
            Self::Ldstrdisp16 => "ldstrdisp16",
            Self::Ldstrdisp32 => "ldstrdisp32",
            Self::Ldstrind16 => "ldstrind16",
            Self::Ldstrind32 => "ldstrind32",
            Self::Ldstrpm16 => "ldstrpm16",
            Self::Ldstrpm32 => "ldstrpm32",
            Self::Testset32 => "testset32",
            Self::Add32 => "add32",
            Self::Sub32 => "sub32",
            Self::Add16 => "add16",
            Self::Sub16 => "sub16",
            Self::And32 => "and32",
            Self::And16 => "and16",
            Self::Orr32 => "orr32",
            Self::Orr16 => "orr16",
            Self::Eor32 => "eor32",
            Self::Eor16 => "eor16",
            Self::Asr32 => "asr32",
            Self::Asr16 => "asr16",
            Self::Lsr32 => "lsr32",
            Self::Lsr16 => "lsr16",
            Self::Lsl32 => "lsl32",
            Self::Lsl16 => "lsl16",
            Self::Lsrimm32 => "lsrimm32",
            Self::Lslimm32 => "lslimm32",
            Self::Asrimm32 => "asrimm32",
            Self::Bitrimm32 => "bitrimm32",
            Self::Lsrimm16 => "lsrimm16",
            Self::Lslimm16 => "lslimm16",
            Self::Asrimm16 => "asrimm16",
            Self::Bitrimm16 => "bitrimm16",
            Self::Fadd16 => "fadd16",
            Self::Fsub16 => "fsub16",
            Self::Fmul16 => "fmul16",
            Self::Fmadd16 => "fmadd16",
            Self::Fmsub16 => "fmsub16",
            Self::Float16 => "float16",
            Self::Fix16 => "fix16",
            Self::Fabs16 => "fabs16",
            Self::Fadd32 => "fadd32",
            Self::Fsub32 => "fsub32",
            Self::Fmul32 => "fmul32",
            Self::Fmadd32 => "fmadd32",
            Self::Fmsub32 => "fmsub32",
            Self::Float32 => "float32",
            Self::Fix32 => "fix32",
            Self::Fabs32 => "fabs32",
            Self::Movcond32 => "movcond32",
            Self::Movcond16 => "movcond16",
            Self::Movimm32 => "movimm32",
            Self::Movimm16 => "movimm16",
            Self::Movtimm32 => "movtimm32",
            Self::Movts16 => "movts16",
            Self::Movts32 => "movts32",
            Self::Movfs16 => "movfs16",
            Self::Movfs32 => "movfs32",
            Self::Jr32 => "jr32",
            Self::Jr16 => "jr16",
            Self::Jalr32 => "jalr32",
            Self::Jalr16 => "jalr16",
            Self::Nop16 => "nop16",
            Self::Idle16 => "idle16",
            Self::Bkpt16 => "bkpt16",
            Self::Mbkpt16 => "mbkpt16",
            Self::Gie16 => "gie16",
            Self::Gid16 => "gid16",
            Self::Sync16 => "sync16",
            Self::Rti16 => "rti16",
            Self::Swi16 => "swi16",
            Self::Trap16 => "trap16",
            Self::Wand16 => "wand16",
            Self::Unimpl32 => "unimpl32",
        }
    }

    /// Returns `true` for the 16-bit encodings.
    #[must_use]
    pub const fn is_16bit(self) -> bool {
        let name = self.as_str().as_bytes();
        let len = name.len();
        name[len - 2] == b'1' && name[len - 1] == b'6'
    }

    /// Encoding width in bytes (2 or 4); the program counter advances by this much.
    #[must_use]
    pub const fn width(self) -> u32 {
        if self.is_16bit() {
            2
        } else {
            4
        }
    }

    /// Returns the execution family of this opcode.
    #[must_use]
    pub const fn class(self) -> InstructionClass {
        match self {
            Self::Bcond32 | Self::Bcond16 => InstructionClass::Branch,
            Self::Jr32 | Self::Jr16 | Self::Jalr32 | Self::Jalr16 => InstructionClass::Jump,
            Self::Ldstrpmd32
            | Self::Ldstrdisp16
            | Self::Ldstrdisp32
            | Self::Ldstrind16
            | Self::Ldstrind32
            | Self::Ldstrpm16
            | Self::Ldstrpm32
            | Self::Testset32 => InstructionClass::LoadStore,
            Self::Add32 | Self::Sub32 | Self::Add16 | Self::Sub16 => InstructionClass::Arith,
            Self::And32
            | Self::And16
            | Self::Orr32
            | Self::Orr16
            | Self::Eor32
            | Self::Eor16
            | Self::Asr32
            | Self::Asr16
            | Self::Lsr32
            | Self::Lsr16
            | Self::Lsl32
            | Self::Lsl16
            | Self::Lsrimm32
            | Self::Lslimm32
            | Self::Asrimm32
            | Self::Bitrimm32
            | Self::Lsrimm16
            | Self::Lslimm16
            | Self::Asrimm16
            | Self::Bitrimm16 => InstructionClass::Bitwise,
            Self::Fadd16
            | Self::Fsub16
            | Self::Fmul16
            | Self::Fmadd16
            | Self::Fmsub16
            | Self::Float16
            | Self::Fix16
            | Self::Fabs16
            | Self::Fadd32
            | Self::Fsub32
            | Self::Fmul32
            | Self::Fmadd32
            | Self::Fmsub32
            | Self::Float32
            | Self::Fix32
            | Self::Fabs32 => InstructionClass::Farith,
            Self::Movcond32
            | Self::Movcond16
            | Self::Movimm32
            | Self::Movimm16
            | Self::Movtimm32
            | Self::Movts16
            | Self::Movts32
            | Self::Movfs16
            | Self::Movfs32 => InstructionClass::Move,
            Self::Nop16
            | Self::Idle16
            | Self::Bkpt16
            | Self::Mbkpt16
            | Self::Gie16
            | Self::Gid16
            | Self::Sync16
            | Self::Rti16
            | Self::Swi16
            | Self::Trap16
            | Self::Wand16
            | Self::Unimpl32 => InstructionClass::Control,
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed mask/value pair compiled from a textual bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingPattern {
    /// Bits that take part in the comparison (`x` positions are clear).
    pub mask: u32,
    /// Required values of the masked bits.
    pub value: u32,
}

impl EncodingPattern {
    /// Compiles a pattern of `0`, `1` and `x` symbols, most significant bit
    /// first. Underscores are separators and are skipped.
    #[must_use]
    pub const fn compile(pattern: &str) -> Self {
        let symbols = pattern.as_bytes();
        let mut mask = 0u32;
        let mut value = 0u32;
        let mut index = 0;
        while index < symbols.len() {
            match symbols[index] {
                b'0' => {
                    mask = (mask << 1) | 1;
                    value <<= 1;
                }
                b'1' => {
                    mask = (mask << 1) | 1;
                    value = (value << 1) | 1;
                }
                b'x' => {
                    mask <<= 1;
                    value <<= 1;
                }
                _ => {}
            }
            index += 1;
        }
        Self { mask, value }
    }

    /// Returns `true` when `word` satisfies every fixed bit of the pattern.
    #[must_use]
    pub const fn matches(self, word: u32) -> bool {
        word & self.mask == self.value
    }
}

/// Canonical opcode table. Patterns are pairwise disjoint, so table order
/// carries no priority. Four mnemonics have separate register and
/// immediate forms and therefore appear twice.
pub const ENCODING_TABLE: &[(Mnemonic, &str)] = &[
    // Branches.
    (Mnemonic::Bcond32, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxxx1000"),
    (Mnemonic::Bcond16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxxx0000"),
    // Loads and stores.
    (Mnemonic::Ldstrpmd32, "xxxxxx1x_xxxxxxxx_xxxxxxxx_xxxx1100"),
    (Mnemonic::Ldstrdisp16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxxx0100"),
    (Mnemonic::Ldstrdisp32, "xxxxxx0x_xxxxxxxx_xxxxxxxx_xxxx1100"),
    (Mnemonic::Ldstrind16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxxx0001"),
    (Mnemonic::Ldstrind32, "xxxxxxxx_x00xxxxx_xxxxxxxx_xxxx1001"),
    (Mnemonic::Ldstrpm16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxxx0101"),
    (Mnemonic::Ldstrpm32, "xxxxxxxx_x00xxxxx_xxxxxxxx_xxxx1101"),
    (Mnemonic::Testset32, "xxxxxxxx_x01xxxxx_xxxxxxxx_xxx01001"),
    // Integer arithmetic.
    (Mnemonic::Add32, "xxxxxxxx_xxxx1010_xxxxxxxx_x0011111"),
    (Mnemonic::Add32, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0011011"),
    (Mnemonic::Sub32, "xxxxxxxx_xxxx1010_xxxxxxxx_x0111111"),
    (Mnemonic::Sub32, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0111011"),
    (Mnemonic::Add16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0011010"),
    (Mnemonic::Add16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0010011"),
    (Mnemonic::Sub16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0111010"),
    (Mnemonic::Sub16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0110011"),
    // Logic and shifts.
    (Mnemonic::And32, "xxxxxxxx_xxxx1010_xxxxxxxx_x1011111"),
    (Mnemonic::And16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x1011010"),
    (Mnemonic::Orr32, "xxxxxxxx_xxxx1010_xxxxxxxx_x1111111"),
    (Mnemonic::Orr16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x1111010"),
    (Mnemonic::Eor32, "xxxxxxxx_xxxx1010_xxxxxxxx_x0001111"),
    (Mnemonic::Eor16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0001010"),
    (Mnemonic::Asr32, "xxxxxxxx_xxxx1010_xxxxxxxx_x1101111"),
    (Mnemonic::Asr16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x1101010"),
    (Mnemonic::Lsr32, "xxxxxxxx_xxxx1010_xxxxxxxx_x1001111"),
    (Mnemonic::Lsr16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x1001010"),
    (Mnemonic::Lsl32, "xxxxxxxx_xxxx1010_xxxxxxxx_x0101111"),
    (Mnemonic::Lsl16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0101010"),
    (Mnemonic::Lsrimm32, "xxxxxxxx_xxxx0110_xxxxxxxx_xxx01111"),
    (Mnemonic::Lslimm32, "xxxxxxxx_xxxx0110_xxxxxxxx_xxx11111"),
    (Mnemonic::Asrimm32, "xxxxxxxx_xxxx1110_xxxxxxxx_xxx01111"),
    (Mnemonic::Bitrimm32, "xxxxxxxx_xxxx1110_xxxxxxxx_xxx11111"),
    (Mnemonic::Lsrimm16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxx00110"),
    (Mnemonic::Lslimm16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxx10110"),
    (Mnemonic::Asrimm16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxx01110"),
    (Mnemonic::Bitrimm16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxx11110"),
    // Float / signed integer arithmetic.
    (Mnemonic::Fadd16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0000111"),
    (Mnemonic::Fsub16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0010111"),
    (Mnemonic::Fmul16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0100111"),
    (Mnemonic::Fmadd16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x0110111"),
    (Mnemonic::Fmsub16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_x1000111"),
    (Mnemonic::Float16, "xxxxxxxx_xxxxxxxx_xxxxxx00_01010111"),
    (Mnemonic::Fix16, "xxxxxxxx_xxxxxxxx_xxxxxx00_01100111"),
    (Mnemonic::Fabs16, "xxxxxxxx_xxxxxxxx_xxxxxx00_01110111"),
    (Mnemonic::Fadd32, "xxxxxxxx_xxxx0111_xxxxxxxx_x0001111"),
    (Mnemonic::Fsub32, "xxxxxxxx_xxxx0111_xxxxxxxx_x0011111"),
    (Mnemonic::Fmul32, "xxxxxxxx_xxxx0111_xxxxxxxx_x0101111"),
    (Mnemonic::Fmadd32, "xxxxxxxx_xxxx0111_xxxxxxxx_x0111111"),
    (Mnemonic::Fmsub32, "xxxxxxxx_xxxx0111_xxxxxxxx_x1001111"),
    (Mnemonic::Float32, "xxxxxxxx_xxxx0111_xxxxxx00_01011111"),
    (Mnemonic::Fix32, "xxxxxxxx_xxxx0111_xxxxxx00_01101111"),
    (Mnemonic::Fabs32, "xxxxxxxx_xxxx0111_xxxxxx00_01111111"),
    // Moves.
    (Mnemonic::Movcond32, "xxxxxxxx_xxxx0010_xxxxxx00_xxxx1111"),
    (Mnemonic::Movcond16, "xxxxxxxx_xxxxxxxx_xxxxxx00_xxxx0010"),
    (Mnemonic::Movimm32, "xxx0xxxx_xxxxxxxx_xxxxxxxx_xxx01011"),
    (Mnemonic::Movimm16, "xxxxxxxx_xxxxxxxx_xxxxxxxx_xxx00011"),
    (Mnemonic::Movtimm32, "xxx1xxxx_xxxxxxxx_xxxxxxxx_xxx01011"),
    (Mnemonic::Movts16, "xxxxxxxx_xxxxxxxx_xxxxxx01_00000010"),
    (Mnemonic::Movts32, "xxxxxxxx_xxxx0010_xxxxxx01_00001111"),
    (Mnemonic::Movfs16, "xxxxxxxx_xxxxxxxx_xxxxxx01_00010010"),
    (Mnemonic::Movfs32, "xxxxxxxx_xxxx0010_xxxxxx01_00011111"),
    // Jumps.
    (Mnemonic::Jr32, "xxxxxxxx_xxxx0010_xxxxxx01_01001111"),
    (Mnemonic::Jr16, "xxxxxxxx_xxxxxxxx_xxxxxx01_01000010"),
    (Mnemonic::Jalr32, "xxxxxxxx_xxxx0010_xxxxxx01_01011111"),
    (Mnemonic::Jalr16, "xxxxxxxx_xxxxxxxx_xxxxxx01_01010010"),
    // Interrupts, multicore and control.
    (Mnemonic::Nop16, "xxxxxxxx_xxxxxxxx_xxxxxx01_10100010"),
    (Mnemonic::Idle16, "xxxxxxxx_xxxxxxxx_xxxxxx01_10110010"),
    (Mnemonic::Bkpt16, "xxxxxxxx_xxxxxxxx_xxxxxx01_11000010"),
    (Mnemonic::Mbkpt16, "xxxxxxxx_xxxxxxxx_xxxxxx11_11000010"),
    (Mnemonic::Gie16, "xxxxxxxx_xxxxxxxx_xxxxxx01_10010010"),
    (Mnemonic::Gid16, "xxxxxxxx_xxxxxxxx_xxxxxx11_10010010"),
    (Mnemonic::Sync16, "xxxxxxxx_xxxxxxxx_xxxxxx01_11110010"),
    (Mnemonic::Rti16, "xxxxxxxx_xxxxxxxx_xxxxxx01_11010010"),
    (Mnemonic::Swi16, "xxxxxxxx_xxxxxxxx_xxxxxx01_11100010"),
    (Mnemonic::Trap16, "xxxxxxxx_xxxxxxxx_xxxxxx11_11100010"),
    (Mnemonic::Wand16, "xxxxxxxx_xxxxxxxx_xxxxxx01_10000010"),
    (Mnemonic::Unimpl32, "xxxxxxxx_xxxx1111_xxxxxx00_00001111"),
];
