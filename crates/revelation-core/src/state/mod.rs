//! Per-core architectural state viewed through shared memory.

/// Register index domain, layout table and memory-backed register file.
pub mod registers;
/// `STATUS` and `CONFIG` bit-field views.
pub mod status;

pub use registers::{
    RegisterDescriptor, RegisterFile, RegisterIndex, GENERAL_REGISTER_COUNT, REGISTER_COUNT,
    REGISTER_LAYOUT,
};
pub use status::{
    ArithMode, ConditionFlags, Config, Excause, Status, StatusFlag, Timer, TimerMode,
};

use crate::memory::map::{COREID_MASK, COREID_OFFSET};
use crate::memory::Memory;

/// Host-side bookkeeping for one core.
///
/// Architected registers live in memory; this struct only carries what the
/// architecture has no register for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreState {
    registers: RegisterFile,
    /// Cleared by `bkpt`, the exit trap, or a fatal fault.
    pub running: bool,
    /// Set by the pre-step hook when `PC` reached `LE`.
    pub hardware_loop: bool,
    /// Status passed to the exit trap, once it has run.
    pub exit_code: Option<u32>,
    /// Instructions retired.
    pub instructions: u64,
    /// Approximate cycles consumed.
    pub cycles: u64,
}

impl CoreState {
    /// Creates a running core and stamps its identifier into `COREID`.
    pub fn new(coreid: u32, memory: &mut Memory) -> Self {
        Self::with_register_file(RegisterFile::new(coreid & COREID_MASK), memory)
    }

    /// Creates a running core over an explicit register layout.
    pub fn with_register_file(registers: RegisterFile, memory: &mut Memory) -> Self {
        let coreid = registers.coreid();
        memory.write(COREID_OFFSET, 4, coreid, coreid);
        Self {
            registers,
            running: true,
            hardware_loop: false,
            exit_code: None,
            instructions: 0,
            cycles: 0,
        }
    }

    /// 12-bit core identifier.
    #[must_use]
    pub const fn coreid(&self) -> u32 {
        self.registers.coreid()
    }

    /// Register file of this core.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Reads a register without building a [`MachineState`].
    #[must_use]
    pub fn reg(&self, memory: &Memory, index: RegisterIndex) -> u32 {
        self.registers.read(memory, index)
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self, memory: &Memory) -> u32 {
        self.registers.read(memory, RegisterIndex::PC)
    }

    /// Binds this core to the shared memory for one step.
    pub fn machine<'a>(&'a mut self, memory: &'a mut Memory) -> MachineState<'a> {
        MachineState { core: self, memory }
    }
}

/// One core's state together with the memory it lives in.
///
/// Every executor receives a `MachineState`; flags are read and written as
/// bit-slices of `STATUS` and `CONFIG` through the memory handle.
#[derive(Debug)]
pub struct MachineState<'a> {
    core: &'a mut CoreState,
    memory: &'a mut Memory,
}

impl<'a> MachineState<'a> {
    /// Builds a machine view over `core` and `memory`.
    pub fn new(core: &'a mut CoreState, memory: &'a mut Memory) -> Self {
        Self { core, memory }
    }

    /// Bookkeeping of the bound core.
    #[must_use]
    pub fn core(&self) -> &CoreState {
        &*self.core
    }

    /// Mutable bookkeeping of the bound core.
    pub fn core_mut(&mut self) -> &mut CoreState {
        &mut *self.core
    }

    /// Shared memory.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &*self.memory
    }

    /// Mutable shared memory.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut *self.memory
    }

    /// 12-bit identifier of the bound core.
    #[must_use]
    pub fn coreid(&self) -> u32 {
        self.core.coreid()
    }

    /// Reads a register.
    #[must_use]
    pub fn reg(&self, index: RegisterIndex) -> u32 {
        self.core.registers.read(&*self.memory, index)
    }

    /// Writes a register.
    pub fn set_reg(&mut self, index: RegisterIndex, value: u32) {
        self.core.registers.write(self.memory, index, value);
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u32 {
        self.reg(RegisterIndex::PC)
    }

    /// Sets the program counter.
    pub fn set_pc(&mut self, value: u32) {
        self.set_reg(RegisterIndex::PC, value);
    }

    /// Advances the program counter by `width` bytes.
    pub fn advance_pc(&mut self, width: u32) {
        let pc = self.pc();
        self.set_pc(pc.wrapping_add(width));
    }

    /// Current `STATUS` value.
    #[must_use]
    pub fn status(&self) -> Status {
        Status::new(self.reg(RegisterIndex::STATUS))
    }

    /// Replaces `STATUS`.
    pub fn set_status(&mut self, status: Status) {
        self.set_reg(RegisterIndex::STATUS, status.bits());
    }

    /// Read-modify-writes `STATUS`.
    pub fn update_status(&mut self, update: impl FnOnce(&mut Status)) {
        let mut status = self.status();
        update(&mut status);
        self.set_status(status);
    }

    /// Reads one `STATUS` flag.
    #[must_use]
    pub fn flag(&self, flag: StatusFlag) -> bool {
        self.status().get(flag)
    }

    /// Writes one `STATUS` flag.
    pub fn set_flag(&mut self, flag: StatusFlag, value: bool) {
        self.update_status(|status| status.set(flag, value));
    }

    /// Current `CONFIG` value.
    #[must_use]
    pub fn config(&self) -> Config {
        Config::new(self.reg(RegisterIndex::CONFIG))
    }

    /// Replaces `CONFIG`.
    pub fn set_config(&mut self, config: Config) {
        self.set_reg(RegisterIndex::CONFIG, config.bits());
    }

    /// Sets bits in a register.
    pub fn or_reg(&mut self, index: RegisterIndex, bits: u32) {
        let value = self.reg(index);
        self.set_reg(index, value | bits);
    }

    /// Clears bits in a register.
    pub fn clear_reg_bits(&mut self, index: RegisterIndex, bits: u32) {
        let value = self.reg(index);
        self.set_reg(index, value & !bits);
    }

    /// Loads up to 4 bytes; local addresses resolve to this core.
    #[must_use]
    pub fn read_memory(&self, addr: u32, nbytes: usize) -> u32 {
        self.memory.read(addr, nbytes, self.coreid())
    }

    /// Stores up to 4 bytes; local addresses resolve to this core.
    pub fn write_memory(&mut self, addr: u32, nbytes: usize, value: u32) {
        let coreid = self.coreid();
        self.memory.write(addr, nbytes, value, coreid);
    }

    /// Whether the core is still executing.
    #[must_use]
    pub fn running(&self) -> bool {
        self.core.running
    }

    /// Stops the core after the current instruction.
    pub fn halt(&mut self) {
        self.core.running = false;
    }

    /// Decrements every core timer configured to count `event`.
    ///
    /// A timer reaching zero latches its interrupt through the `CTIMER`
    /// memory alias. Timers already at zero stay there.
    pub fn count_timer_event(&mut self, event: TimerMode) {
        let config = self.config();
        for (timer, index) in [
            (Timer::Zero, RegisterIndex::CTIMER0),
            (Timer::One, RegisterIndex::CTIMER1),
        ] {
            if config.timer_mode(timer) != event {
                continue;
            }
            let count = self.reg(index);
            if count != 0 {
                self.set_reg(index, count - 1);
            }
        }
    }
}
