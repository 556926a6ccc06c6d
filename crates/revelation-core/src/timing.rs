/// Instruction and dispatch forms with an approximate cycle cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CycleCostKind {
    /// No-operation instruction.
    Nop,
    /// Integer add/sub, logic, shift and bit reverse.
    Alu,
    /// Float or signed-integer `farith` operation.
    Fpu,
    /// Immediate, conditional and special-register moves.
    Move,
    /// Single load.
    Load,
    /// Single store.
    Store,
    /// Double-word load or store (two bus transfers).
    DoubleTransfer,
    /// Atomic test-and-set.
    TestSet,
    /// Conditional branch when the condition fails.
    BranchNotTaken,
    /// Taken branch, including branch-and-link.
    BranchTaken,
    /// Register-indirect jump.
    Jump,
    /// Interrupt enable/disable, software interrupt, idle and breakpoint.
    Control,
    /// Return from interrupt.
    Rti,
    /// Host-serviced trap.
    Trap,
    /// Interrupt dispatch performed by the engine between instructions.
    InterruptEntry,
}

/// Single source-of-truth cycle-cost table.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u16)] = &[
    (CycleCostKind::Nop, 1),
    (CycleCostKind::Alu, 1),
    (CycleCostKind::Fpu, 1),
    (CycleCostKind::Move, 1),
    (CycleCostKind::Load, 1),
    (CycleCostKind::Store, 1),
    (CycleCostKind::DoubleTransfer, 2),
    (CycleCostKind::TestSet, 2),
    (CycleCostKind::BranchNotTaken, 1),
    (CycleCostKind::BranchTaken, 3),
    (CycleCostKind::Jump, 3),
    (CycleCostKind::Control, 1),
    (CycleCostKind::Rti, 3),
    (CycleCostKind::Trap, 1),
    (CycleCostKind::InterruptEntry, 3),
];

/// Looks up the cycle cost for a cycle-cost kind.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u16> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}
