//! Software breakpoints patched into guest code.

use std::collections::BTreeMap;

use crate::decoder::decode;
use crate::fault::Fault;
use crate::memory::{globalize, Memory};

/// `bkpt16` encoding written over the patched instruction.
pub const BKPT16: u16 = 0b0000_0001_1100_0010;
/// `nop16` filler for the second half of a patched 32-bit instruction.
pub const NOP16: u16 = 0b0000_0001_1010_0010;

/// Original instruction bytes under a breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SavedInstruction {
    /// Encoded instruction, narrowed to 16 bits for 16-bit forms.
    pub word: u32,
    /// Bytes patched (2 or 4).
    pub width: usize,
}

/// Breakpoints keyed by global address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointTable {
    saved: BTreeMap<u32, SavedInstruction>,
}

impl BreakpointTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of breakpoints set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// Returns `true` when no breakpoint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Returns `true` when a breakpoint covers `address` (local to `coreid`).
    #[must_use]
    pub fn is_set(&self, address: u32, coreid: u32) -> bool {
        self.saved.contains_key(&globalize(address, coreid))
    }

    /// Global addresses of all breakpoints, ascending.
    pub fn addresses(&self) -> impl Iterator<Item = u32> + '_ {
        self.saved.keys().copied()
    }

    /// Replaces the instruction at `address` with `bkpt16`, padding 32-bit
    /// instructions with `nop16`. Setting an existing breakpoint is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Decode`] when the word at `address` is not an
    /// instruction.
    pub fn set(&mut self, memory: &mut Memory, address: u32, coreid: u32) -> Result<(), Fault> {
        let global = globalize(address, coreid);
        if self.saved.contains_key(&global) {
            return Ok(());
        }
        let word = memory.iread(global, 4, coreid);
        let decoded = decode(word)?;
        let mut patch = BKPT16.to_le_bytes().to_vec();
        let saved = if decoded.mnemonic.is_16bit() {
            SavedInstruction {
                word: word & 0xffff,
                width: 2,
            }
        } else {
            patch.extend_from_slice(&NOP16.to_le_bytes());
            SavedInstruction { word, width: 4 }
        };
        memory.write_bytes(global, &patch, coreid);
        self.saved.insert(global, saved);
        log::debug!("breakpoint set at {global:#010x} over {}", decoded.mnemonic);
        Ok(())
    }

    /// Restores the original instruction. Returns `false` when no breakpoint
    /// was set at `address`.
    pub fn remove(&mut self, memory: &mut Memory, address: u32, coreid: u32) -> bool {
        let global = globalize(address, coreid);
        let Some(saved) = self.saved.remove(&global) else {
            return false;
        };
        memory.write_bytes(global, &saved.word.to_le_bytes()[..saved.width], coreid);
        log::debug!("breakpoint removed at {global:#010x}");
        true
    }

    /// Restores every patched instruction.
    pub fn clear(&mut self, memory: &mut Memory) {
        for (global, saved) in std::mem::take(&mut self.saved) {
            memory.write_bytes(global, &saved.word.to_le_bytes()[..saved.width], 0);
        }
    }
}
