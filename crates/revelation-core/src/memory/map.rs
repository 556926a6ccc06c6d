//! Global address map: core windows, register block and alias addresses.

/// Bits of a global address that select the offset inside a core window.
pub const CORE_WINDOW_BITS: u32 = 20;
/// Size of one core's local window, and of one sparse memory block.
pub const BLOCK_SIZE: usize = 1 << CORE_WINDOW_BITS;
/// Mask of the in-window offset.
pub const LOCAL_OFFSET_MASK: u32 = (1 << CORE_WINDOW_BITS) - 1;
/// Core identifier used when no mesh geometry is given (row 32, column 8).
pub const DEFAULT_COREID: u32 = 0x808;
/// Mask of the 12-bit core identifier.
pub const COREID_MASK: u32 = 0xfff;

/// Inclusive start of the memory-mapped register block inside a window.
pub const REGISTER_BLOCK_START: u32 = 0xf0000;
/// Inclusive end of the memory-mapped register block inside a window.
pub const REGISTER_BLOCK_END: u32 = 0xf0718;

/// `STATUS` register offset.
pub const STATUS_OFFSET: u32 = 0xf0404;
/// `ILAT` register offset.
pub const ILAT_OFFSET: u32 = 0xf0428;
/// Write-one-to-set alias of `ILAT`.
pub const ILATST_OFFSET: u32 = 0xf042c;
/// Write-one-to-clear alias of `ILAT`.
pub const ILATCL_OFFSET: u32 = 0xf0430;
/// Core timer 0; writing zero latches the timer 0 interrupt.
pub const CTIMER0_OFFSET: u32 = 0xf0438;
/// Core timer 1; writing zero latches the timer 1 interrupt.
pub const CTIMER1_OFFSET: u32 = 0xf043c;
/// `FSTATUS` register offset; writes are OR-ed into `STATUS`.
pub const FSTATUS_OFFSET: u32 = 0xf0440;
/// `COREID` register offset.
pub const COREID_OFFSET: u32 = 0xf0704;

/// Effective addresses at or below this value are rejected by `testset32`.
pub const TESTSET_FLOOR: u32 = 0x0010_0000;

const _: () = assert_register_block_layout();

const fn assert_register_block_layout() {
    let aliases = [
        STATUS_OFFSET,
        ILAT_OFFSET,
        ILATST_OFFSET,
        ILATCL_OFFSET,
        CTIMER0_OFFSET,
        CTIMER1_OFFSET,
        FSTATUS_OFFSET,
        COREID_OFFSET,
    ];
    let mut index = 0;
    while index < aliases.len() {
        assert!(
            aliases[index] >= REGISTER_BLOCK_START && aliases[index] <= REGISTER_BLOCK_END,
            "aliased registers must sit inside the register block"
        );
        assert!(aliases[index] % 4 == 0, "registers are word aligned");
        index += 1;
    }
    assert!(
        REGISTER_BLOCK_END <= LOCAL_OFFSET_MASK,
        "register block must fit inside a core window"
    );
}

/// Returns `true` when `addr` carries no core identifier and is therefore
/// relative to the accessing core.
#[must_use]
pub const fn is_local_address(addr: u32) -> bool {
    addr >> CORE_WINDOW_BITS == 0
}

/// Rebases a local address onto `coreid`'s window; global addresses pass through.
#[must_use]
pub const fn globalize(addr: u32, coreid: u32) -> u32 {
    if is_local_address(addr) {
        addr | ((coreid & COREID_MASK) << CORE_WINDOW_BITS)
    } else {
        addr
    }
}

/// Core identifier encoded in the top 12 bits of a global address.
#[must_use]
pub const fn coreid_of(addr: u32) -> u32 {
    addr >> CORE_WINDOW_BITS
}

/// Offset of `addr` inside its core window.
#[must_use]
pub const fn local_offset(addr: u32) -> u32 {
    addr & LOCAL_OFFSET_MASK
}

/// Returns `true` when the window offset lies in the register block.
#[must_use]
pub const fn is_register_offset(offset: u32) -> bool {
    offset >= REGISTER_BLOCK_START && offset <= REGISTER_BLOCK_END
}

/// Core identifier for mesh position `(row, col)`.
#[must_use]
pub const fn coreid_at(row: u32, col: u32) -> u32 {
    ((row & 0x3f) << 6) | (col & 0x3f)
}
