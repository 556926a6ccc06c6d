//! Instruction decoder.
//!
//! The pattern table in [`crate::encoding`] is compiled once into mask/value
//! pairs. A fetched word is tested against every pair; the table is disjoint,
//! so the first hit is the only hit.

use std::sync::OnceLock;

use crate::encoding::{EncodingPattern, Mnemonic, ENCODING_TABLE};
use crate::fault::Fault;
use crate::instruction::Instruction;

/// Result of decoding one fetched word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Matched opcode.
    pub mnemonic: Mnemonic,
    /// Word as fetched (always 4 bytes from `PC`).
    pub instruction: Instruction,
}

impl DecodedInstruction {
    /// Field view for execution: 16-bit forms have bits 16..31 cleared.
    #[must_use]
    pub const fn fields(self) -> Instruction {
        if self.mnemonic.is_16bit() {
            self.instruction.narrowed()
        } else {
            self.instruction
        }
    }

    /// Encoding width in bytes.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.mnemonic.width()
    }

    /// Bytes of the fetched word that belong to this instruction.
    #[must_use]
    pub const fn encoded_bits(self) -> u32 {
        self.fields().bits()
    }
}

/// Compiled decode table.
#[derive(Debug, Clone)]
pub struct Decoder {
    patterns: Vec<(Mnemonic, EncodingPattern)>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Compiles the canonical opcode table.
    #[must_use]
    pub fn new() -> Self {
        Self::from_table(ENCODING_TABLE)
    }

    /// Compiles an explicit `(mnemonic, pattern)` table.
    #[must_use]
    pub fn from_table(table: &[(Mnemonic, &str)]) -> Self {
        Self {
            patterns: table
                .iter()
                .map(|(mnemonic, pattern)| (*mnemonic, EncodingPattern::compile(pattern)))
                .collect(),
        }
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` when no pattern is compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Decodes a raw word of either width.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Decode`] when no pattern matches.
    pub fn decode(&self, word: u32) -> Result<DecodedInstruction, Fault> {
        self.patterns
            .iter()
            .find_map(|(mnemonic, pattern)| {
                pattern.matches(word).then_some(DecodedInstruction {
                    mnemonic: *mnemonic,
                    instruction: Instruction::new(word),
                })
            })
            .ok_or(Fault::Decode { word })
    }

    /// Every mnemonic whose pattern matches `word`.
    ///
    /// Used by consistency checks; a well-formed table yields at most one.
    #[must_use]
    pub fn matches(&self, word: u32) -> Vec<Mnemonic> {
        self.patterns
            .iter()
            .filter(|(_, pattern)| pattern.matches(word))
            .map(|(mnemonic, _)| *mnemonic)
            .collect()
    }
}

static DECODER: OnceLock<Decoder> = OnceLock::new();

/// Shared decoder over the canonical table, compiled on first use.
pub fn decoder() -> &'static Decoder {
    DECODER.get_or_init(Decoder::new)
}

/// Decodes `word` with the shared decoder.
///
/// # Errors
///
/// Returns [`Fault::Decode`] when no pattern matches.
pub fn decode(word: u32) -> Result<DecodedInstruction, Fault> {
    decoder().decode(word)
}
