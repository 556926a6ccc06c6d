//! `trap16`: host system calls, program exit and assertion markers.

use crate::api::{Syscall, SyscallHandler};
use crate::fault::Fault;
use crate::instruction::Instruction;
use crate::memory::globalize;
use crate::state::{MachineState, RegisterIndex};
use crate::timing::CycleCostKind;

/// Trap codes carried in the 5-bit immediate.
pub mod codes {
    /// Undocumented `write(r0, r1, r2)`.
    pub const WRITE: u32 = 0;
    /// Undocumented `read(r0, r1, r2)`.
    pub const READ: u32 = 1;
    /// Undocumented `open(r0, r1, r2)`.
    pub const OPEN: u32 = 2;
    /// `exit(r0)`.
    pub const EXIT: u32 = 3;
    /// Assertion succeeded.
    pub const PASS: u32 = 4;
    /// Assertion failed.
    pub const FAIL: u32 = 5;
    /// Undocumented `close(r0)`.
    pub const CLOSE: u32 = 6;
    /// Generic system call selected by `r3`.
    pub const SYSCALL: u32 = 7;
}

/// Result of a trap that did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TrapOutcome {
    Continue,
    Exit,
}

pub(super) fn execute_trap(
    machine: &mut MachineState<'_>,
    inst: Instruction,
    host: &mut dyn SyscallHandler,
) -> Result<(CycleCostKind, TrapOutcome), Fault> {
    let code = inst.t5();
    let args = [
        machine.reg(RegisterIndex::R0),
        machine.reg(RegisterIndex::R1),
        machine.reg(RegisterIndex::R2),
    ];
    let [a0, a1, a2] = args;
    let call = match code {
        codes::WRITE => Syscall::Write {
            fd: a0,
            buf: a1,
            count: a2,
        },
        codes::READ => Syscall::Read {
            fd: a0,
            buf: a1,
            count: a2,
        },
        codes::OPEN => Syscall::Open {
            path: a0,
            flags: a1,
            mode: a2,
        },
        codes::CLOSE => Syscall::Close { fd: a0 },
        codes::EXIT => {
            log::debug!("core {:#x}: exit({a0})", machine.coreid());
            machine.core_mut().exit_code = Some(a0);
            machine.advance_pc(2);
            machine.halt();
            return Ok((CycleCostKind::Trap, TrapOutcome::Exit));
        }
        codes::PASS | codes::FAIL => {
            let passed = code == codes::PASS;
            log::debug!(
                "core {:#x}: assertion {}",
                machine.coreid(),
                if passed { "succeeded" } else { "failed" }
            );
            machine.set_reg(RegisterIndex::R0, u32::from(passed));
            machine.advance_pc(2);
            return Ok((CycleCostKind::Trap, TrapOutcome::Continue));
        }
        codes::SYSCALL => {
            let number = machine.reg(RegisterIndex::R3);
            let mut args = args;
            if Syscall::number_takes_buffer(number) {
                args[1] = globalize(args[1], machine.coreid());
            }
            Syscall::from_number(number, args).ok_or(Fault::UnknownSyscall { number })?
        }
        _ => return Err(Fault::UnknownTrap { code }),
    };

    let coreid = machine.coreid();
    log::debug!("core {coreid:#x}: {call:?}");
    let result = host.handle(call, machine.memory_mut(), coreid);
    machine.set_reg(RegisterIndex::R0, result.retval as u32);
    machine.set_reg(RegisterIndex::R3, result.errno);
    machine.advance_pc(2);
    Ok((CycleCostKind::Trap, TrapOutcome::Continue))
}
