//! Sparse, core-addressed memory shared by every simulated core.

/// Access widths and loaded code ranges.
pub mod access;
/// Global address map and alias addresses.
pub mod map;

use std::collections::HashMap;

pub use access::{AccessSize, CodeRange};
pub use map::{
    coreid_at, coreid_of, globalize, is_local_address, is_register_offset, local_offset,
    BLOCK_SIZE, CORE_WINDOW_BITS, DEFAULT_COREID, LOCAL_OFFSET_MASK, TESTSET_FLOOR,
};

use map::{
    CTIMER0_OFFSET, CTIMER1_OFFSET, FSTATUS_OFFSET, ILATCL_OFFSET, ILATST_OFFSET, ILAT_OFFSET,
    STATUS_OFFSET,
};

const ILAT_BITS: u32 = 0x3ff;
const TIMER0_INTERRUPT: u32 = 1 << 3;
const TIMER1_INTERRUPT: u32 = 1 << 4;

/// One committed store, recorded when write journaling is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryWrite {
    /// Global address written.
    pub address: u32,
    /// Number of bytes written (1, 2 or 4).
    pub bytes: usize,
    /// Value written, little-endian in memory.
    pub value: u32,
}

/// Sparse little-endian address space of 1 MiB blocks, allocated on first write.
///
/// Addresses with a zero core prefix are relative to the accessing core and
/// are rebased onto its window. Stores to `ILATST`, `ILATCL`, `FSTATUS` and
/// to an expiring `CTIMER0`/`CTIMER1` additionally update the aliased
/// register of the addressed core.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    blocks: HashMap<u32, Box<[u8]>>,
    code_ranges: Vec<CodeRange>,
    self_modifying_writes: u64,
    journal: Option<Vec<MemoryWrite>>,
}

#[allow(clippy::cast_possible_truncation)]
impl Memory {
    /// Creates an empty address space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of 1 MiB blocks allocated so far.
    #[must_use]
    pub fn allocated_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn read_byte(&self, global: u32) -> u8 {
        let base = global & !LOCAL_OFFSET_MASK;
        self.blocks
            .get(&base)
            .map_or(0, |block| block[local_offset(global) as usize])
    }

    fn write_byte(&mut self, global: u32, byte: u8) {
        let base = global & !LOCAL_OFFSET_MASK;
        let block = self
            .blocks
            .entry(base)
            .or_insert_with(|| vec![0; BLOCK_SIZE].into_boxed_slice());
        block[local_offset(global) as usize] = byte;
    }

    fn load(&self, global: u32, nbytes: usize) -> u32 {
        (0..nbytes.min(4)).rev().fold(0, |value, i| {
            (value << 8) | u32::from(self.read_byte(global.wrapping_add(i as u32)))
        })
    }

    fn store(&mut self, global: u32, nbytes: usize, value: u32) {
        for (i, byte) in value.to_le_bytes().into_iter().take(nbytes).enumerate() {
            self.write_byte(global.wrapping_add(i as u32), byte);
        }
        if let Some(journal) = self.journal.as_mut() {
            journal.push(MemoryWrite {
                address: global,
                bytes: nbytes.min(4),
                value,
            });
        }
    }

    /// Reads up to 4 bytes at `addr` as a little-endian value.
    ///
    /// Untouched memory reads as zero and is not allocated.
    #[must_use]
    pub fn read(&self, addr: u32, nbytes: usize, from_core: u32) -> u32 {
        self.load(globalize(addr, from_core), nbytes)
    }

    /// Instruction fetch. Identical to [`Memory::read`]; a fetch may straddle
    /// two blocks when a 16-bit instruction ends a block.
    #[must_use]
    pub fn iread(&self, addr: u32, nbytes: usize, from_core: u32) -> u32 {
        self.load(globalize(addr, from_core), nbytes)
    }

    /// Stores the low `nbytes` (up to 4) of `value` at `addr`, applying
    /// register alias side effects first.
    pub fn write(&mut self, addr: u32, nbytes: usize, value: u32, from_core: u32) {
        let global = globalize(addr, from_core);
        self.apply_alias(global, value);
        self.flag_self_modifying(global, nbytes);
        self.store(global, nbytes, value);
    }

    fn apply_alias(&mut self, global: u32, value: u32) {
        let window = global & !LOCAL_OFFSET_MASK;
        let ilat_addr = window | ILAT_OFFSET;
        let ilat = self.load(ilat_addr, 4) & ILAT_BITS;
        match local_offset(global) {
            ILATST_OFFSET => self.store(ilat_addr, 4, ilat | (value & ILAT_BITS)),
            ILATCL_OFFSET => self.store(ilat_addr, 4, ilat & !value),
            FSTATUS_OFFSET => {
                let status_addr = window | STATUS_OFFSET;
                let status = self.load(status_addr, 4);
                self.store(status_addr, 4, status | (value & !0b11));
            }
            CTIMER0_OFFSET if value == 0 => self.store(ilat_addr, 4, ilat | TIMER0_INTERRUPT),
            CTIMER1_OFFSET if value == 0 => self.store(ilat_addr, 4, ilat | TIMER1_INTERRUPT),
            _ => {}
        }
    }

    fn flag_self_modifying(&mut self, global: u32, nbytes: usize) {
        if self
            .code_ranges
            .iter()
            .any(|range| range.overlaps(global, nbytes))
        {
            self.self_modifying_writes += 1;
            log::warn!("self-modifying write of {nbytes} bytes to code at {global:#010x}");
        }
    }

    /// Copies `data` into memory without alias side effects or code-range checks.
    ///
    /// Used by program loaders and host-side buffer fills.
    pub fn write_bytes(&mut self, addr: u32, data: &[u8], from_core: u32) {
        let global = globalize(addr, from_core);
        for (i, byte) in data.iter().enumerate() {
            self.write_byte(global.wrapping_add(i as u32), *byte);
        }
    }

    /// Copies `len` bytes out of memory.
    #[must_use]
    pub fn read_bytes(&self, addr: u32, len: usize, from_core: u32) -> Vec<u8> {
        let global = globalize(addr, from_core);
        (0..len)
            .map(|i| self.read_byte(global.wrapping_add(i as u32)))
            .collect()
    }

    /// Reads a NUL-terminated byte string of at most `limit` bytes.
    #[must_use]
    pub fn read_c_string(&self, addr: u32, limit: usize, from_core: u32) -> Vec<u8> {
        let global = globalize(addr, from_core);
        (0..limit)
            .map(|i| self.read_byte(global.wrapping_add(i as u32)))
            .take_while(|byte| *byte != 0)
            .collect()
    }

    /// Registers loaded instructions; later stores into the range are flagged.
    pub fn add_code_range(&mut self, range: CodeRange) {
        self.code_ranges.push(range);
    }

    /// Code ranges registered so far.
    #[must_use]
    pub fn code_ranges(&self) -> &[CodeRange] {
        &self.code_ranges
    }

    /// Number of stores that hit a registered code range.
    #[must_use]
    pub const fn self_modifying_writes(&self) -> u64 {
        self.self_modifying_writes
    }

    /// Starts or stops recording committed stores for tracing.
    pub fn set_journaling(&mut self, enabled: bool) {
        self.journal = enabled.then(Vec::new);
    }

    /// Drains the stores recorded since the previous call.
    pub fn take_journal(&mut self) -> Vec<MemoryWrite> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeRange, Memory, MemoryWrite, BLOCK_SIZE};

    const CORE: u32 = 0x808;

    #[test]
    fn values_are_little_endian() {
        let mut memory = Memory::new();
        memory.write(0x100, 4, 0x1122_3344, CORE);
        assert_eq!(memory.read(0x100, 1, CORE), 0x44);
        assert_eq!(memory.read(0x101, 2, CORE), 0x2233);
        assert_eq!(memory.read(0x100, 4, CORE), 0x1122_3344);
    }

    #[test]
    fn reads_of_untouched_memory_do_not_allocate() {
        let memory = Memory::new();
        assert_eq!(memory.read(0x8e00_0000, 4, CORE), 0);
        assert_eq!(memory.allocated_blocks(), 0);
    }

    #[test]
    fn local_addresses_resolve_to_the_accessing_core() {
        let mut memory = Memory::new();
        memory.write(0x40, 4, 7, 0x808);
        memory.write(0x40, 4, 9, 0x809);
        assert_eq!(memory.read(0x8080_0040, 4, 0), 7);
        assert_eq!(memory.read(0x8090_0040, 4, 0), 9);
        assert_eq!(memory.allocated_blocks(), 2);
    }

    #[test]
    fn instruction_fetch_crosses_block_boundary() {
        let mut memory = Memory::new();
        let end = 0x8080_0000 + BLOCK_SIZE as u32 - 2;
        memory.write(end, 2, 0xbeef, 0);
        memory.write(end + 2, 2, 0xdead, 0);
        assert_eq!(memory.iread(end, 4, 0), 0xdead_beef);
    }

    #[test]
    fn ilatst_sets_ilat_bits() {
        let mut memory = Memory::new();
        memory.write(0xf0428, 4, 0b1, CORE);
        memory.write(0xf042c, 4, 0b1000_0010, CORE);
        assert_eq!(memory.read(0xf0428, 4, CORE), 0b1000_0011);
    }

    #[test]
    fn ilatcl_clears_ilat_bits() {
        let mut memory = Memory::new();
        memory.write(0xf0428, 4, 0x3ff, CORE);
        memory.write(0xf0430, 4, 0x00f, CORE);
        assert_eq!(memory.read(0xf0428, 4, CORE), 0x3f0);
    }

    #[test]
    fn fstatus_ors_into_status_except_low_bits() {
        let mut memory = Memory::new();
        memory.write(0xf0404, 4, 0b01, CORE);
        memory.write(0xf0440, 4, 0xffff_fffe, CORE);
        assert_eq!(memory.read(0xf0404, 4, CORE), 0xffff_fffd);
    }

    #[test]
    fn expiring_timers_latch_timer_interrupts() {
        let mut memory = Memory::new();
        memory.write(0xf0438, 4, 5, CORE);
        assert_eq!(memory.read(0xf0428, 4, CORE), 0);
        memory.write(0xf0438, 4, 0, CORE);
        assert_eq!(memory.read(0xf0428, 4, CORE), 0x8);
        memory.write(0xf043c, 4, 0, CORE);
        assert_eq!(memory.read(0xf0428, 4, CORE), 0x18);
    }

    #[test]
    fn aliases_apply_to_the_addressed_core_only() {
        let mut memory = Memory::new();
        memory.write(0x809f_042c, 4, 0x2, 0x808);
        assert_eq!(memory.read(0xf0428, 4, 0x809), 0x2);
        assert_eq!(memory.read(0xf0428, 4, 0x808), 0);
    }

    #[test]
    fn writes_into_code_ranges_are_counted() {
        let mut memory = Memory::new();
        memory.add_code_range(CodeRange::new(0x8080_0000, 0x8080_00ff));
        memory.write(0x200, 4, 1, CORE);
        assert_eq!(memory.self_modifying_writes(), 0);
        memory.write(0x10, 2, 1, CORE);
        assert_eq!(memory.self_modifying_writes(), 1);
        memory.write_bytes(0x0, &[1, 2, 3], CORE);
        assert_eq!(memory.self_modifying_writes(), 1);
    }

    #[test]
    fn journal_records_stores_when_enabled() {
        let mut memory = Memory::new();
        memory.write(0x0, 4, 1, CORE);
        assert!(memory.take_journal().is_empty());
        memory.set_journaling(true);
        memory.write(0x4, 2, 0xabcd, CORE);
        assert_eq!(
            memory.take_journal(),
            vec![MemoryWrite {
                address: 0x8080_0004,
                bytes: 2,
                value: 0xabcd
            }]
        );
        assert!(memory.take_journal().is_empty());
    }

    #[test]
    fn c_strings_stop_at_nul_or_limit() {
        let mut memory = Memory::new();
        memory.write_bytes(0x300, b"hello\0world", CORE);
        assert_eq!(memory.read_c_string(0x300, 64, CORE), b"hello");
        assert_eq!(memory.read_c_string(0x300, 3, CORE), b"hel");
        assert_eq!(memory.read_bytes(0x306, 5, CORE), b"world");
    }
}
