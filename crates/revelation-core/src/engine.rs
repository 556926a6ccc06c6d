//! Fetch/decode/execute driver with the hardware-loop and interrupt hooks
//! that run between instructions.

use crate::api::{CoreConfig, StepOutcome, SyscallHandler, TraceEvent, TraceSink};
use crate::decoder::decode;
use crate::execute::{execute_instruction, lowest_level, ExecuteOutcome, INTERRUPT_LEVELS};
use crate::fault::Fault;
use crate::memory::{coreid_of, is_register_offset, local_offset, Memory};
use crate::state::{CoreState, MachineState, RegisterIndex, StatusFlag, TimerMode};
use crate::timing::{cycle_cost, CycleCostKind};

/// Interrupt levels in priority order; level N vectors to `4 * N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InterruptLevel {
    /// Sync hardware signal.
    Sync = 0,
    /// Floating-point, invalid instruction, alignment or `swi`.
    SoftwareException = 1,
    /// Memory protection fault.
    MemoryFault = 2,
    /// `CTIMER0` expired.
    Timer0 = 3,
    /// `CTIMER1` expired.
    Timer1 = 4,
    /// Mesh message.
    Message = 5,
    /// DMA channel 0 finished.
    Dma0 = 6,
    /// DMA channel 1 finished.
    Dma1 = 7,
    /// Wired-AND signal.
    Wand = 8,
    /// Software-generated user interrupt.
    User = 9,
}

impl InterruptLevel {
    /// All levels, highest priority first.
    pub const ALL: [Self; INTERRUPT_LEVELS as usize] = [
        Self::Sync,
        Self::SoftwareException,
        Self::MemoryFault,
        Self::Timer0,
        Self::Timer1,
        Self::Message,
        Self::Dma0,
        Self::Dma1,
        Self::Wand,
        Self::User,
    ];

    /// Level for an `ILAT` bit index.
    #[must_use]
    pub const fn from_index(index: u32) -> Option<Self> {
        if index < INTERRUPT_LEVELS {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Bit index in `ILAT`, `IMASK` and `IPEND`.
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Interrupt vector table entry.
    #[must_use]
    pub const fn vector(self) -> u32 {
        4 * self.index()
    }
}

/// Pre-step hook: entering the last instruction of a hardware loop
/// consumes one iteration.
pub fn pre_execute(machine: &mut MachineState<'_>) {
    if machine.flag(StatusFlag::Gid) && machine.pc() == machine.reg(RegisterIndex::LE) {
        let count = machine.reg(RegisterIndex::LC);
        machine.set_reg(RegisterIndex::LC, count.wrapping_sub(1));
        machine.core_mut().hardware_loop = true;
    }
}

/// What the post-step hook did to the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStep {
    /// Executor's program counter stands.
    Fallthrough,
    /// Hardware loop wrapped to `LS`.
    LoopWrapped {
        /// Loop start.
        start: u32,
        /// Iterations left in `LC`.
        remaining: u32,
    },
    /// Interrupt entered.
    Interrupted {
        /// Dispatched level.
        level: InterruptLevel,
        /// Program counter saved in `IRET`.
        iret: u32,
    },
}

/// Post-step hook: hardware-loop wrap, otherwise interrupt dispatch.
pub fn post_execute(machine: &mut MachineState<'_>) -> PostStep {
    if machine.core().hardware_loop {
        machine.core_mut().hardware_loop = false;
        let remaining = machine.reg(RegisterIndex::LC);
        if remaining as i32 > 0 {
            let start = machine.reg(RegisterIndex::LS);
            machine.set_pc(start);
            return PostStep::LoopWrapped { start, remaining };
        }
    }
    if machine.reg(RegisterIndex::ILAT) != 0
        && !machine.flag(StatusFlag::Gid)
        && machine.reg(RegisterIndex::DEBUGSTATUS) != 1
    {
        if let Some((level, iret)) = service_interrupts(machine) {
            return PostStep::Interrupted { level, iret };
        }
    }
    PostStep::Fallthrough
}

/// Highest-priority latched interrupt not suppressed by `IMASK`.
///
/// A nonzero `ILAT` with every latched bit masked selects
/// [`InterruptLevel::Sync`], so latches kept by `gie` still enter the
/// level 0 handler. `None` only when nothing is latched.
#[must_use]
pub fn latched_interrupt(machine: &MachineState<'_>) -> Option<InterruptLevel> {
    let ilat = machine.reg(RegisterIndex::ILAT);
    if ilat == 0 {
        return None;
    }
    let imask = machine.reg(RegisterIndex::IMASK);
    Some(
        lowest_level(ilat & !imask)
            .and_then(InterruptLevel::from_index)
            .unwrap_or(InterruptLevel::Sync),
    )
}

/// Highest-priority interrupt currently in service.
#[must_use]
pub fn pending_interrupt(machine: &MachineState<'_>) -> Option<InterruptLevel> {
    lowest_level(machine.reg(RegisterIndex::IPEND)).and_then(InterruptLevel::from_index)
}

/// Enters the highest-priority latched interrupt unless one of equal or
/// higher priority is already in service.
pub fn service_interrupts(machine: &mut MachineState<'_>) -> Option<(InterruptLevel, u32)> {
    let level = latched_interrupt(machine)?;
    if pending_interrupt(machine).is_some_and(|pending| pending <= level) {
        return None;
    }
    let iret = machine.pc();
    let bit = 1 << level.index();
    machine.set_reg(RegisterIndex::IRET, iret);
    machine.clear_reg_bits(RegisterIndex::ILAT, bit);
    machine.or_reg(RegisterIndex::IPEND, bit);
    machine.set_flag(StatusFlag::Gid, true);
    machine.set_pc(level.vector());
    log::debug!(
        "core {:#x}: interrupt {level:?} from pc {iret:#x}",
        machine.coreid()
    );
    Some((level, iret))
}

fn cost_of(kind: CycleCostKind) -> u16 {
    cycle_cost(kind).unwrap_or(1)
}

/// Executes one instruction on `core`, including the hooks around it.
///
/// A fault halts the core; it is reported once and later calls return
/// [`StepOutcome::Halted`].
pub fn step_one(
    core: &mut CoreState,
    memory: &mut Memory,
    host: &mut dyn SyscallHandler,
    trace: Option<&mut dyn TraceSink>,
    config: &CoreConfig,
) -> StepOutcome {
    if !core.running {
        return StepOutcome::Halted;
    }
    let mut trace = trace.filter(|_| config.tracing_enabled);
    let coreid = core.coreid();
    let mut machine = core.machine(memory);
    let pc = machine.pc();

    match step_inner(&mut machine, host, &mut trace) {
        Ok(cycles) => {
            emit(&mut trace, TraceEvent::InstructionRetired { coreid, pc, cycles });
            StepOutcome::Retired { cycles }
        }
        Err(fault) => {
            log::error!("core {coreid:#x}: {fault} at pc {pc:#x}");
            machine.halt();
            emit(&mut trace, TraceEvent::FaultRaised { coreid, pc, fault });
            StepOutcome::Fault { fault }
        }
    }
}

fn emit(trace: &mut Option<&mut dyn TraceSink>, event: TraceEvent) {
    if let Some(sink) = trace.as_mut() {
        sink.on_event(event);
    }
}

fn step_inner(
    machine: &mut MachineState<'_>,
    host: &mut dyn SyscallHandler,
    trace: &mut Option<&mut dyn TraceSink>,
) -> Result<u16, Fault> {
    let coreid = machine.coreid();
    let pc = machine.pc();
    let word = machine.memory().iread(pc, 4, coreid);
    let decoded = decode(word)?;
    emit(
        trace,
        TraceEvent::InstructionStart {
            coreid,
            pc,
            word: decoded.encoded_bits(),
            mnemonic: decoded.mnemonic,
        },
    );

    pre_execute(machine);
    let outcome = execute_instruction(decoded, machine, host);
    emit_writes(machine, trace);
    let outcome = outcome?;
    let mut cycles = cost_of(outcome.cost());

    if let ExecuteOutcome::Retired { .. } = outcome {
        let post = post_execute(machine);
        emit_writes(machine, trace);
        match post {
            PostStep::LoopWrapped { start, remaining } => emit(
                trace,
                TraceEvent::HardwareLoop {
                    coreid,
                    start,
                    remaining,
                },
            ),
            PostStep::Interrupted { level, iret } => {
                cycles = cycles.saturating_add(cost_of(CycleCostKind::InterruptEntry));
                emit(
                    trace,
                    TraceEvent::InterruptDispatched {
                        coreid,
                        level: level.index(),
                        iret,
                    },
                );
            }
            PostStep::Fallthrough => {}
        }
    }

    machine.count_timer_event(TimerMode::Clock);
    emit_writes(machine, trace);
    let core = machine.core_mut();
    core.instructions += 1;
    core.cycles += u64::from(cycles);
    Ok(cycles)
}

/// Turns journaled stores into register or memory write events.
fn emit_writes(machine: &mut MachineState<'_>, trace: &mut Option<&mut dyn TraceSink>) {
    let Some(sink) = trace.as_mut() else {
        return;
    };
    let coreid = machine.coreid();
    for write in machine.memory_mut().take_journal() {
        let offset = local_offset(write.address);
        let register = (coreid_of(write.address) == coreid && is_register_offset(offset))
            .then(|| RegisterIndex::from_offset(offset))
            .flatten();
        sink.on_event(match register {
            Some(register) => TraceEvent::RegisterWrite {
                coreid,
                register,
                value: write.value,
            },
            None => TraceEvent::MemoryWrite {
                coreid,
                address: write.address,
                bytes: write.bytes,
                value: write.value,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UnsupportedSyscalls;

    const NOP16: u32 = 0x1a2;

    fn core_with_program(words: &[u16]) -> (CoreState, Memory) {
        let mut memory = Memory::new();
        let core = CoreState::new(0x808, &mut memory);
        for (i, word) in words.iter().enumerate() {
            memory.write(2 * i as u32, 2, u32::from(*word), 0x808);
        }
        (core, memory)
    }

    fn step(core: &mut CoreState, memory: &mut Memory) -> StepOutcome {
        step_one(
            core,
            memory,
            &mut UnsupportedSyscalls,
            None,
            &CoreConfig::default(),
        )
    }

    #[test]
    fn vectors_are_four_bytes_apart() {
        assert_eq!(InterruptLevel::Sync.vector(), 0);
        assert_eq!(InterruptLevel::Timer0.vector(), 0xc);
        assert_eq!(InterruptLevel::User.vector(), 0x24);
        assert_eq!(InterruptLevel::from_index(10), None);
    }

    #[test]
    fn nop_retires_and_counts() {
        let (mut core, mut memory) = core_with_program(&[NOP16 as u16]);
        assert_eq!(
            step(&mut core, &mut memory),
            StepOutcome::Retired { cycles: 1 }
        );
        assert_eq!(core.pc(&memory), 2);
        assert_eq!((core.instructions, core.cycles), (1, 1));
    }

    #[test]
    fn latched_interrupt_dispatches_after_instruction() {
        let (mut core, mut memory) = core_with_program(&[NOP16 as u16; 4]);
        core.machine(&mut memory)
            .set_reg(RegisterIndex::ILAT, 1 << 3);
        assert_eq!(
            step(&mut core, &mut memory),
            StepOutcome::Retired { cycles: 4 }
        );
        let machine = core.machine(&mut memory);
        assert_eq!(machine.pc(), 0xc);
        assert_eq!(machine.reg(RegisterIndex::IRET), 2);
        assert_eq!(machine.reg(RegisterIndex::ILAT), 0);
        assert_eq!(machine.reg(RegisterIndex::IPEND), 1 << 3);
        assert!(machine.flag(StatusFlag::Gid));
    }

    #[test]
    fn disabled_interrupts_wait_and_masked_latches_enter_level_zero() {
        let (mut core, mut memory) = core_with_program(&[NOP16 as u16; 4]);
        {
            let mut machine = core.machine(&mut memory);
            machine.set_reg(RegisterIndex::ILAT, 1 << 4);
            machine.set_reg(RegisterIndex::IMASK, 1 << 4);
            machine.set_flag(StatusFlag::Gid, true);
        }
        step(&mut core, &mut memory);
        assert_eq!(core.pc(&memory), 2);
        core.machine(&mut memory).set_flag(StatusFlag::Gid, false);
        step(&mut core, &mut memory);
        let machine = core.machine(&mut memory);
        assert_eq!(machine.pc(), InterruptLevel::Sync.vector());
        assert_eq!(machine.reg(RegisterIndex::IRET), 4);
        assert_eq!(machine.reg(RegisterIndex::IPEND), 1);
        assert_eq!(machine.reg(RegisterIndex::ILAT), 1 << 4);
    }

    #[test]
    fn lower_priority_latch_defers_to_interrupt_in_service() {
        let (mut core, mut memory) = core_with_program(&[NOP16 as u16; 4]);
        let mut machine = core.machine(&mut memory);
        machine.set_reg(RegisterIndex::ILAT, 1 << 5);
        machine.set_reg(RegisterIndex::IPEND, 1 << 3);
        assert_eq!(service_interrupts(&mut machine), None);
        machine.set_reg(RegisterIndex::ILAT, 1 << 1);
        assert_eq!(
            service_interrupts(&mut machine),
            Some((InterruptLevel::SoftwareException, 0))
        );
        assert_eq!(machine.reg(RegisterIndex::IPEND), (1 << 3) | (1 << 1));
    }

    #[test]
    fn hardware_loop_repeats_until_count_expires() {
        // Loop body is the second nop; LC = 3 runs it three times.
        let (mut core, mut memory) = core_with_program(&[NOP16 as u16; 4]);
        {
            let mut machine = core.machine(&mut memory);
            machine.set_flag(StatusFlag::Gid, true);
            machine.set_reg(RegisterIndex::LS, 2);
            machine.set_reg(RegisterIndex::LE, 2);
            machine.set_reg(RegisterIndex::LC, 3);
        }
        let mut visited = Vec::new();
        for _ in 0..5 {
            visited.push(core.pc(&memory));
            step(&mut core, &mut memory);
        }
        assert_eq!(visited, vec![0, 2, 2, 2, 4]);
        assert_eq!(core.reg(&memory, RegisterIndex::LC), 0);
    }

    #[test]
    fn decode_fault_halts_the_core() {
        let (mut core, mut memory) = core_with_program(&[]);
        memory.write(0, 4, 0xffff_ffff, 0x808);
        let outcome = step(&mut core, &mut memory);
        assert!(matches!(outcome, StepOutcome::Fault { .. }));
        assert!(!core.running);
        assert_eq!(step(&mut core, &mut memory), StepOutcome::Halted);
    }

    #[test]
    fn tracing_reports_start_writes_and_retire() {
        let (mut core, mut memory) = core_with_program(&[NOP16 as u16]);
        memory.set_journaling(true);
        let mut events: Vec<TraceEvent> = Vec::new();
        let config = CoreConfig {
            tracing_enabled: true,
            ..CoreConfig::default()
        };
        step_one(
            &mut core,
            &mut memory,
            &mut UnsupportedSyscalls,
            Some(&mut events),
            &config,
        );
        assert_eq!(
            events,
            vec![
                TraceEvent::InstructionStart {
                    coreid: 0x808,
                    pc: 0,
                    word: NOP16,
                    mnemonic: crate::encoding::Mnemonic::Nop16,
                },
                TraceEvent::RegisterWrite {
                    coreid: 0x808,
                    register: RegisterIndex::PC,
                    value: 2,
                },
                TraceEvent::InstructionRetired {
                    coreid: 0x808,
                    pc: 0,
                    cycles: 1,
                },
            ]
        );
    }
}
