//! Access widths and loaded code ranges.

/// Width of a load/store, encoded as log2 of the byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessSize {
    /// 1 byte.
    Byte,
    /// 2 bytes.
    Half,
    /// 4 bytes.
    Word,
    /// 8 bytes, moved as two consecutive words through `Rd`/`Rd+1`.
    Double,
}

impl AccessSize {
    /// Decodes the 2-bit size field of a load/store.
    #[must_use]
    pub const fn from_field(size: u32) -> Self {
        match size & 0x3 {
            0 => Self::Byte,
            1 => Self::Half,
            2 => Self::Word,
            _ => Self::Double,
        }
    }

    /// log2 of the byte count; displacement immediates are scaled by this.
    #[must_use]
    pub const fn log2(self) -> u32 {
        match self {
            Self::Byte => 0,
            Self::Half => 1,
            Self::Word => 2,
            Self::Double => 3,
        }
    }

    /// Number of bytes transferred.
    #[must_use]
    pub const fn bytes(self) -> usize {
        1 << self.log2()
    }
}

/// Inclusive range of global addresses holding loaded instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CodeRange {
    /// First byte of the range.
    pub start: u32,
    /// Last byte of the range.
    pub end: u32,
}

impl CodeRange {
    /// Creates a range from its first and last byte.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns `true` when any byte of an `len`-byte access at `addr` falls in the range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn overlaps(self, addr: u32, len: usize) -> bool {
        let last = addr.wrapping_add(len.saturating_sub(1) as u32);
        addr <= self.end && last >= self.start
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{AccessSize, CodeRange};

    #[rstest]
    #[case(0b00, AccessSize::Byte, 1)]
    #[case(0b01, AccessSize::Half, 2)]
    #[case(0b10, AccessSize::Word, 4)]
    #[case(0b11, AccessSize::Double, 8)]
    fn size_field_maps_to_byte_counts(
        #[case] field: u32,
        #[case] size: AccessSize,
        #[case] bytes: usize,
    ) {
        assert_eq!(AccessSize::from_field(field), size);
        assert_eq!(size.bytes(), bytes);
    }

    #[test]
    fn code_range_overlap_is_inclusive() {
        let range = CodeRange::new(0x100, 0x1ff);
        assert!(range.overlaps(0x100, 1));
        assert!(range.overlaps(0x1ff, 4));
        assert!(range.overlaps(0xfe, 4));
        assert!(!range.overlaps(0xfc, 4));
        assert!(!range.overlaps(0x200, 4));
    }
}
