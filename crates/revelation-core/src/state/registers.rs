use crate::fault::Fault;
use crate::memory::Memory;

/// Number of architecturally visible general-purpose registers (`R0..R63`).
pub const GENERAL_REGISTER_COUNT: usize = 64;
/// Size of the register index domain (`0..=106`).
pub const REGISTER_COUNT: usize = 107;
/// Base offset of the general-purpose register window in local memory.
pub const GPR_BASE_OFFSET: u32 = 0xf0000;

/// Validated register index in `0..=106`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterIndex(u8);

#[allow(missing_docs)]
impl RegisterIndex {
    pub const R0: Self = Self(0);
    pub const R1: Self = Self(1);
    pub const R2: Self = Self(2);
    pub const R3: Self = Self(3);
    /// Static base.
    pub const SB: Self = Self(9);
    /// Stack limit.
    pub const SL: Self = Self(10);
    /// Frame pointer.
    pub const FP: Self = Self(11);
    /// Stack pointer.
    pub const SP: Self = Self(13);
    /// Link register.
    pub const LR: Self = Self(14);
    pub const CONFIG: Self = Self(64);
    pub const STATUS: Self = Self(65);
    pub const PC: Self = Self(66);
    pub const DEBUGSTATUS: Self = Self(67);
    pub const LC: Self = Self(68);
    pub const LS: Self = Self(69);
    pub const LE: Self = Self(70);
    pub const IRET: Self = Self(71);
    pub const IMASK: Self = Self(72);
    pub const ILAT: Self = Self(73);
    pub const ILATST: Self = Self(74);
    pub const ILATCL: Self = Self(75);
    pub const IPEND: Self = Self(76);
    pub const FSTATUS: Self = Self(77);
    pub const DEBUGCMD: Self = Self(78);
    pub const RESETCORE: Self = Self(79);
    pub const CTIMER0: Self = Self(80);
    pub const CTIMER1: Self = Self(81);
    pub const MEMSTATUS: Self = Self(82);
    pub const MEMPROTECT: Self = Self(83);
    pub const DMA0CONFIG: Self = Self(84);
    pub const DMA1CONFIG: Self = Self(92);
    pub const MESHCONFIG: Self = Self(100);
    pub const COREID: Self = Self(101);
    pub const MULTICAST: Self = Self(102);
    pub const CMESHROUTE: Self = Self(103);
    pub const XMESHROUTE: Self = Self(104);
    pub const RMESHROUTE: Self = Self(105);
    pub const RESERVED: Self = Self(106);

    /// Validates a host-supplied register index.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterRange`] when `index` is 107 or above.
    pub fn new(index: usize) -> Result<Self, Fault> {
        u8::try_from(index)
            .ok()
            .filter(|value| usize::from(*value) < REGISTER_COUNT)
            .map(Self)
            .ok_or(Fault::RegisterRange { index })
    }

    /// General-purpose register from a 6-bit instruction field.
    ///
    /// Bits above the field width are discarded, so the result is always valid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn gpr(number: u32) -> Self {
        Self((number & 0x3f) as u8)
    }

    /// Second register of the pair starting at this one, used for the high
    /// word of double-word transfers.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterPair`] for `R63` and for special registers,
    /// which have no general-purpose successor.
    pub const fn next_gpr(self) -> Result<Self, Fault> {
        if (self.0 as usize) + 1 < GENERAL_REGISTER_COUNT {
            Ok(Self(self.0 + 1))
        } else {
            Err(Fault::RegisterPair {
                index: self.0 as usize,
            })
        }
    }

    /// Numeric index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for `R0..R63`.
    #[must_use]
    pub const fn is_general(self) -> bool {
        (self.0 as usize) < GENERAL_REGISTER_COUNT
    }

    /// Looks an index up by architectural name (`r12`, `sp`, `status`, ...).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if let Some(number) = lower.strip_prefix('r').and_then(|n| n.parse::<u8>().ok()) {
            return (usize::from(number) < GENERAL_REGISTER_COUNT).then_some(Self(number));
        }
        match lower.as_str() {
            "sb" => return Some(Self::SB),
            "sl" => return Some(Self::SL),
            "fp" => return Some(Self::FP),
            "ip" => return Some(Self(12)),
            "sp" => return Some(Self::SP),
            "lr" => return Some(Self::LR),
            _ => {}
        }
        REGISTER_LAYOUT
            .iter()
            .position(|descriptor| descriptor.name.eq_ignore_ascii_case(&lower))
            .and_then(|index| u8::try_from(index).ok())
            .map(Self)
    }

    /// Layout entry for this register.
    #[must_use]
    pub const fn descriptor(self) -> RegisterDescriptor {
        REGISTER_LAYOUT[self.0 as usize]
    }

    /// Register mapped at a local window offset, if any.
    #[must_use]
    pub fn from_offset(offset: u32) -> Option<Self> {
        REGISTER_LAYOUT
            .iter()
            .position(|descriptor| descriptor.offset == offset)
            .and_then(|index| u8::try_from(index).ok())
            .map(Self)
    }
}

impl TryFrom<usize> for RegisterIndex {
    type Error = Fault;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

/// Memory-mapped location and width of one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterDescriptor {
    /// Architectural name.
    pub name: &'static str,
    /// Offset inside the core's 1 MiB local window.
    pub offset: u32,
    /// Number of implemented bits; reads and writes are masked to this width.
    pub bits: u32,
}

impl RegisterDescriptor {
    /// Mask of the implemented bits.
    #[must_use]
    pub const fn mask(self) -> u32 {
        if self.bits >= 32 {
            u32::MAX
        } else {
            (1 << self.bits) - 1
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn gpr_layout() -> [RegisterDescriptor; GENERAL_REGISTER_COUNT] {
    const NAMES: [&str; GENERAL_REGISTER_COUNT] = [
        "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "r13",
        "r14", "r15", "r16", "r17", "r18", "r19", "r20", "r21", "r22", "r23", "r24", "r25", "r26",
        "r27", "r28", "r29", "r30", "r31", "r32", "r33", "r34", "r35", "r36", "r37", "r38", "r39",
        "r40", "r41", "r42", "r43", "r44", "r45", "r46", "r47", "r48", "r49", "r50", "r51", "r52",
        "r53", "r54", "r55", "r56", "r57", "r58", "r59", "r60", "r61", "r62", "r63",
    ];
    let mut layout = [RegisterDescriptor {
        name: "",
        offset: 0,
        bits: 32,
    }; GENERAL_REGISTER_COUNT];
    let mut index = 0;
    while index < GENERAL_REGISTER_COUNT {
        layout[index] = RegisterDescriptor {
            name: NAMES[index],
            offset: GPR_BASE_OFFSET + 4 * index as u32,
            bits: 32,
        };
        index += 1;
    }
    layout
}

const fn special(name: &'static str, offset: u32, bits: u32) -> RegisterDescriptor {
    RegisterDescriptor { name, offset, bits }
}

const SPECIAL_LAYOUT: [RegisterDescriptor; REGISTER_COUNT - GENERAL_REGISTER_COUNT] = [
    special("config", 0xf0400, 32),
    special("status", 0xf0404, 32),
    special("pc", 0xf0408, 32),
    special("debugstatus", 0xf040c, 32),
    special("lc", 0xf0414, 32),
    special("ls", 0xf0418, 32),
    special("le", 0xf041c, 32),
    special("iret", 0xf0420, 32),
    special("imask", 0xf0424, 10),
    special("ilat", 0xf0428, 10),
    special("ilatst", 0xf042c, 10),
    special("ilatcl", 0xf0430, 10),
    special("ipend", 0xf0434, 10),
    special("fstatus", 0xf0440, 32),
    special("debugcmd", 0xf0448, 2),
    special("resetcore", 0xf070c, 1),
    special("ctimer0", 0xf0438, 32),
    special("ctimer1", 0xf043c, 32),
    special("memstatus", 0xf0604, 3),
    special("memprotect", 0xf0608, 8),
    special("dma0config", 0xf0500, 32),
    special("dma0stride", 0xf0504, 32),
    special("dma0count", 0xf0508, 32),
    special("dma0srcaddr", 0xf050c, 32),
    special("dma0dstaddr", 0xf0510, 32),
    special("dma0auto0", 0xf0514, 32),
    special("dma0auto1", 0xf0518, 32),
    special("dma0status", 0xf051c, 32),
    special("dma1config", 0xf0520, 32),
    special("dma1stride", 0xf0524, 32),
    special("dma1count", 0xf0528, 32),
    special("dma1srcaddr", 0xf052c, 32),
    special("dma1dstaddr", 0xf0530, 32),
    special("dma1auto0", 0xf0534, 32),
    special("dma1auto1", 0xf0538, 32),
    special("dma1status", 0xf053c, 32),
    special("meshconfig", 0xf0700, 16),
    special("coreid", 0xf0704, 12),
    special("multicast", 0xf0708, 12),
    special("cmeshroute", 0xf0710, 12),
    special("xmeshroute", 0xf0714, 12),
    special("rmeshroute", 0xf0718, 12),
    special("reserved", 0xf0410, 32),
];

const fn build_layout() -> [RegisterDescriptor; REGISTER_COUNT] {
    let gprs = gpr_layout();
    let mut layout = [special("", 0, 32); REGISTER_COUNT];
    let mut index = 0;
    while index < REGISTER_COUNT {
        layout[index] = if index < GENERAL_REGISTER_COUNT {
            gprs[index]
        } else {
            SPECIAL_LAYOUT[index - GENERAL_REGISTER_COUNT]
        };
        index += 1;
    }
    layout
}

/// Register index to memory-mapped location table.
pub const REGISTER_LAYOUT: [RegisterDescriptor; REGISTER_COUNT] = build_layout();

/// One core's register file, viewed through the shared memory.
///
/// Registers hold no storage of their own: every access goes to the core's
/// local window at `(coreid << 20) | offset`, so memory-mapped writes from
/// any core are visible as register values and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    coreid: u32,
    layout: &'static [RegisterDescriptor; REGISTER_COUNT],
}

impl RegisterFile {
    /// Creates a register file over the standard layout.
    #[must_use]
    pub const fn new(coreid: u32) -> Self {
        Self::with_layout(coreid, &REGISTER_LAYOUT)
    }

    /// Creates a register file over an explicit layout table.
    #[must_use]
    pub const fn with_layout(
        coreid: u32,
        layout: &'static [RegisterDescriptor; REGISTER_COUNT],
    ) -> Self {
        Self { coreid, layout }
    }

    /// 12-bit identifier of the owning core.
    #[must_use]
    pub const fn coreid(&self) -> u32 {
        self.coreid
    }

    /// Global address backing `index` for this core.
    #[must_use]
    pub const fn address_of(&self, index: RegisterIndex) -> u32 {
        (self.coreid << 20) | self.layout[index.index()].offset
    }

    /// Reads a register, masked to its implemented width.
    #[must_use]
    pub fn read(&self, memory: &Memory, index: RegisterIndex) -> u32 {
        let descriptor = self.layout[index.index()];
        memory.iread(descriptor.offset, 4, self.coreid) & descriptor.mask()
    }

    /// Writes a register through memory, so alias side effects apply.
    ///
    /// `COREID` is read-only from instructions; writes to it are dropped.
    pub fn write(&self, memory: &mut Memory, index: RegisterIndex, value: u32) {
        if index == RegisterIndex::COREID {
            return;
        }
        let descriptor = self.layout[index.index()];
        memory.write(descriptor.offset, 4, value & descriptor.mask(), self.coreid);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{RegisterFile, RegisterIndex, REGISTER_COUNT, REGISTER_LAYOUT};
    use crate::fault::Fault;
    use crate::memory::Memory;

    #[test]
    fn index_domain_is_exactly_zero_to_106() {
        assert!(RegisterIndex::new(0).is_ok());
        assert!(RegisterIndex::new(106).is_ok());
        assert_eq!(
            RegisterIndex::new(107),
            Err(Fault::RegisterRange { index: 107 })
        );
        assert_eq!(
            RegisterIndex::new(100_000),
            Err(Fault::RegisterRange { index: 100_000 })
        );
    }

    #[test]
    fn register_pairs_end_at_r62() {
        assert_eq!(RegisterIndex::R0.next_gpr(), Ok(RegisterIndex::gpr(1)));
        assert_eq!(RegisterIndex::gpr(62).next_gpr(), Ok(RegisterIndex::gpr(63)));
        assert_eq!(
            RegisterIndex::gpr(63).next_gpr(),
            Err(Fault::RegisterPair { index: 63 })
        );
        assert_eq!(
            RegisterIndex::LC.next_gpr(),
            Err(Fault::RegisterPair { index: 68 })
        );
    }

    #[test]
    fn layout_offsets_are_unique() {
        let offsets: HashSet<_> = REGISTER_LAYOUT.iter().map(|d| d.offset).collect();
        assert_eq!(offsets.len(), REGISTER_COUNT);
    }

    #[test]
    fn gprs_are_packed_from_window_base() {
        assert_eq!(REGISTER_LAYOUT[0].offset, 0xf0000);
        assert_eq!(REGISTER_LAYOUT[63].offset, 0xf00fc);
        assert_eq!(RegisterIndex::LR.descriptor().name, "r14");
        assert_eq!(RegisterIndex::PC.descriptor().offset, 0xf0408);
        assert_eq!(RegisterIndex::RMESHROUTE.descriptor().offset, 0xf0718);
    }

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(RegisterIndex::from_name("R7"), RegisterIndex::new(7).ok());
        assert_eq!(RegisterIndex::from_name("sp"), Some(RegisterIndex::SP));
        assert_eq!(RegisterIndex::from_name("IMASK"), Some(RegisterIndex::IMASK));
        assert_eq!(RegisterIndex::from_name("r64"), None);
        assert_eq!(RegisterIndex::from_name("bogus"), None);
    }

    #[test]
    fn offsets_map_back_to_indices() {
        assert_eq!(RegisterIndex::from_offset(0xf0408), Some(RegisterIndex::PC));
        assert_eq!(RegisterIndex::from_offset(0xf0410), Some(RegisterIndex::RESERVED));
        assert_eq!(RegisterIndex::from_offset(0xf0004), RegisterIndex::new(1).ok());
        assert_eq!(RegisterIndex::from_offset(0xf0444), None);
    }

    #[test]
    fn reads_and_writes_mask_to_register_width() {
        let mut memory = Memory::new();
        let rf = RegisterFile::new(0x808);
        rf.write(&mut memory, RegisterIndex::IMASK, 0xffff_ffff);
        assert_eq!(rf.read(&memory, RegisterIndex::IMASK), 0x3ff);
        rf.write(&mut memory, RegisterIndex::R2, 0xdead_beef);
        assert_eq!(rf.read(&memory, RegisterIndex::R2), 0xdead_beef);
        assert_eq!(memory.read(0x808f_0008, 4, 0), 0xdead_beef);
    }

    #[test]
    fn coreid_is_read_only_through_register_file() {
        let mut memory = Memory::new();
        let rf = RegisterFile::new(0x808);
        memory.write(0xf0704, 4, 0x808, 0x808);
        rf.write(&mut memory, RegisterIndex::COREID, 0x123);
        assert_eq!(rf.read(&memory, RegisterIndex::COREID), 0x808);
    }

    #[test]
    fn cores_see_their_own_register_windows() {
        let mut memory = Memory::new();
        let first = RegisterFile::new(0x808);
        let second = RegisterFile::new(0x809);
        first.write(&mut memory, RegisterIndex::R0, 1);
        second.write(&mut memory, RegisterIndex::R0, 2);
        assert_eq!(first.read(&memory, RegisterIndex::R0), 1);
        assert_eq!(second.read(&memory, RegisterIndex::R0), 2);
        assert_eq!(second.address_of(RegisterIndex::R0), 0x809f_0000);
    }
}
