//! Opcode encoders and a single-core harness shared by the integration suites.

#![allow(dead_code)]

use revelation_core::{
    step_one, CoreConfig, CoreState, MachineState, Memory, RegisterIndex, StepOutcome,
    UnsupportedSyscalls,
};

pub const COREID: u32 = 0x808;

const fn split(rd: u32, rn: u32, rm: u32) -> u32 {
    ((rm & 7) << 7)
        | ((rn & 7) << 10)
        | ((rd & 7) << 13)
        | ((rm & 56) << 20)
        | ((rn & 56) << 23)
        | ((rd & 56) << 26)
}

/// Three-register 32-bit integer forms (`bits 16..19 = 0b1010`).
pub const fn int32(opcode: u32, rd: u32, rn: u32, rm: u32) -> u32 {
    opcode | (0b1010 << 16) | split(rd, rn, rm)
}

pub const fn add32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b0011111, rd, rn, rm)
}

pub const fn sub32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b0111111, rd, rn, rm)
}

pub const fn and32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b1011111, rd, rn, rm)
}

pub const fn orr32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b1111111, rd, rn, rm)
}

pub const fn eor32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b0001111, rd, rn, rm)
}

pub const fn asr32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b1101111, rd, rn, rm)
}

pub const fn lsr32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b1001111, rd, rn, rm)
}

pub const fn lsl32(rd: u32, rn: u32, rm: u32) -> u32 {
    int32(0b0101111, rd, rn, rm)
}

/// Three-register 16-bit forms.
pub const fn int16(opcode: u32, rd: u32, rn: u32, rm: u32) -> u32 {
    opcode | (rm << 7) | (rn << 10) | (rd << 13)
}

pub const fn add16(rd: u32, rn: u32, rm: u32) -> u32 {
    int16(0b0011010, rd, rn, rm)
}

pub const fn sub16(rd: u32, rn: u32, rm: u32) -> u32 {
    int16(0b0111010, rd, rn, rm)
}

pub const fn and16(rd: u32, rn: u32, rm: u32) -> u32 {
    int16(0b1011010, rd, rn, rm)
}

pub const fn eor16(rd: u32, rn: u32, rm: u32) -> u32 {
    int16(0b0001010, rd, rn, rm)
}

pub const fn lsl16(rd: u32, rn: u32, rm: u32) -> u32 {
    int16(0b0101010, rd, rn, rm)
}

pub const fn add32_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    0b0011011
        | ((imm & 7) << 7)
        | ((rn & 7) << 10)
        | ((rd & 7) << 13)
        | ((imm & 0x7f8) << 13)
        | ((rn & 56) << 23)
        | ((rd & 56) << 26)
}

pub const fn sub32_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    add32_immediate(rd, rn, imm) ^ 0b0011011 ^ 0b0111011
}

pub const fn add16_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    0b0010011 | ((imm & 7) << 7) | (rn << 10) | (rd << 13)
}

pub const fn sub16_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    0b0110011 | ((imm & 7) << 7) | (rn << 10) | (rd << 13)
}

/// Shift and bit-reverse by immediate, 32-bit forms.
pub const fn shift32_immediate(opcode: u32, bits_16_19: u32, rd: u32, rn: u32, imm: u32) -> u32 {
    opcode
        | (imm << 5)
        | ((rn & 7) << 10)
        | ((rd & 7) << 13)
        | (bits_16_19 << 16)
        | ((rn & 56) << 23)
        | ((rd & 56) << 26)
}

pub const fn lsr32_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    shift32_immediate(0b01111, 0b0110, rd, rn, imm)
}

pub const fn lsl32_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    shift32_immediate(0b11111, 0b0110, rd, rn, imm)
}

pub const fn asr32_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    shift32_immediate(0b01111, 0b1110, rd, rn, imm)
}

pub const fn bitr32_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    shift32_immediate(0b11111, 0b1110, rd, rn, imm)
}

pub const fn lsr16_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    0b00110 | (imm << 5) | (rn << 10) | (rd << 13)
}

pub const fn asr16_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    0b01110 | (imm << 5) | (rn << 10) | (rd << 13)
}

pub const fn bitr16_immediate(rd: u32, rn: u32, imm: u32) -> u32 {
    0b11110 | (imm << 5) | (rn << 10) | (rd << 13)
}

/// Float / integer-mode arithmetic; `op` is 0 add .. 7 abs.
pub const fn farith32(op: u32, rd: u32, rn: u32, rm: u32) -> u32 {
    ((op << 4) | 0b1111) | (0b0111 << 16) | split(rd, rn, rm)
}

pub const fn farith16(op: u32, rd: u32, rn: u32, rm: u32) -> u32 {
    ((op << 4) | 0b0111) | (rm << 7) | (rn << 10) | (rd << 13)
}

pub const FADD: u32 = 0;
pub const FSUB: u32 = 1;
pub const FMUL: u32 = 2;
pub const FMADD: u32 = 3;
pub const FMSUB: u32 = 4;
pub const FLOAT: u32 = 5;
pub const FIX: u32 = 6;
pub const FABS: u32 = 7;

pub const fn bcond32(cond: u32, imm: u32) -> u32 {
    0b1000 | (cond << 4) | (imm << 8)
}

pub const fn bcond16(cond: u32, imm: u32) -> u32 {
    (cond << 4) | ((imm & 0xff) << 8)
}

pub const fn jr32(rn: u32) -> u32 {
    0b0101001111 | ((rn & 7) << 10) | (0b0010 << 16) | ((rn & 56) << 23)
}

pub const fn jalr32(rn: u32) -> u32 {
    0b0101011111 | ((rn & 7) << 10) | (0b0010 << 16) | ((rn & 56) << 23)
}

pub const fn jr16(rn: u32) -> u32 {
    0b0101000010 | (rn << 10)
}

pub const fn jalr16(rn: u32) -> u32 {
    0b0101010010 | (rn << 10)
}

pub const fn movcond32(cond: u32, rd: u32, rn: u32) -> u32 {
    0b1111 | (cond << 4) | (0b0010 << 16) | split(rd, rn, 0)
}

pub const fn movcond16(cond: u32, rd: u32, rn: u32) -> u32 {
    0b0010 | (cond << 4) | (rn << 10) | (rd << 13)
}

pub const fn movimm32(rd: u32, imm: u32) -> u32 {
    0b01011 | ((imm & 255) << 5) | ((rd & 7) << 13) | ((imm & 0xff00) << 12) | ((rd & 56) << 26)
}

pub const fn movtimm32(rd: u32, imm: u32) -> u32 {
    movimm32(rd, imm) | (1 << 28)
}

pub const fn movimm16(rd: u32, imm: u32) -> u32 {
    0b00011 | (imm << 5) | (rd << 13)
}

/// `movts special, gpr`: `special` is the register number inside its bank.
pub const fn movts32(special: u32, gpr: u32, bank: u32) -> u32 {
    0b0100001111 | (0b0010 << 16) | (bank << 20) | split(gpr, special, 0)
}

pub const fn movfs32(gpr: u32, special: u32, bank: u32) -> u32 {
    0b0100011111 | (0b0010 << 16) | (bank << 20) | split(gpr, special, 0)
}

pub const fn movts16(special: u32, gpr: u32) -> u32 {
    0b0100000010 | (special << 10) | (gpr << 13)
}

pub const fn movfs16(gpr: u32, special: u32) -> u32 {
    0b0100010010 | (special << 10) | (gpr << 13)
}

pub const BYTE: u32 = 0b00;
pub const HALF: u32 = 0b01;
pub const WORD: u32 = 0b10;
pub const DOUBLE: u32 = 0b11;

pub const fn ldstrdisp16(rd: u32, rn: u32, imm: u32, size: u32, store: bool) -> u32 {
    0b0100 | ((store as u32) << 4) | (size << 5) | ((imm & 7) << 7) | (rn << 10) | (rd << 13)
}

pub const fn ldstrdisp32(rd: u32, rn: u32, imm: u32, size: u32, store: bool, sub: bool) -> u32 {
    0b1100
        | ((store as u32) << 4)
        | (size << 5)
        | ((imm & 7) << 7)
        | ((imm & 0x7f8) << 13)
        | ((sub as u32) << 24)
        | split(rd, rn, 0)
}

pub const fn ldstrpmd32(rd: u32, rn: u32, imm: u32, size: u32, store: bool, sub: bool) -> u32 {
    ldstrdisp32(rd, rn, imm, size, store, sub) | (1 << 25)
}

pub const fn ldstrind16(rd: u32, rn: u32, rm: u32, size: u32, store: bool) -> u32 {
    0b0001 | ((store as u32) << 4) | (size << 5) | (rm << 7) | (rn << 10) | (rd << 13)
}

pub const fn ldstrind32(rd: u32, rn: u32, rm: u32, size: u32, store: bool, sub: bool) -> u32 {
    0b1001 | ((store as u32) << 4) | (size << 5) | ((sub as u32) << 20) | split(rd, rn, rm)
}

pub const fn ldstrpm16(rd: u32, rn: u32, rm: u32, size: u32, store: bool) -> u32 {
    0b0101 | ((store as u32) << 4) | (size << 5) | (rm << 7) | (rn << 10) | (rd << 13)
}

pub const fn ldstrpm32(rd: u32, rn: u32, rm: u32, size: u32, store: bool, sub: bool) -> u32 {
    0b1101 | ((store as u32) << 4) | (size << 5) | ((sub as u32) << 20) | split(rd, rn, rm)
}

pub const fn testset32(rd: u32, rn: u32, rm: u32, size: u32, sub: bool) -> u32 {
    0b01001 | (size << 5) | ((sub as u32) << 20) | (0b01 << 21) | split(rd, rn, rm)
}

pub const fn trap16(code: u32) -> u32 {
    0b1111100010 | (code << 10)
}

pub const NOP16: u32 = 0x1a2;
pub const IDLE16: u32 = 0x1b2;
pub const BKPT16: u32 = 0x1c2;
pub const MBKPT16: u32 = 0x3c2;
pub const GIE16: u32 = 0x192;
pub const GID16: u32 = 0x392;
pub const SYNC16: u32 = 0x1f2;
pub const RTI16: u32 = 0x1d2;
pub const SWI16: u32 = 0x1e2;
pub const WAND16: u32 = 0x182;
pub const UNIMPL32: u32 = 0x000f_000f;

/// One core over its own memory, executing a program placed at address 0.
pub struct Harness {
    pub core: CoreState,
    pub memory: Memory,
    pub config: CoreConfig,
}

impl Harness {
    pub fn new() -> Self {
        let mut memory = Memory::new();
        let core = CoreState::new(COREID, &mut memory);
        Self {
            core,
            memory,
            config: CoreConfig::default(),
        }
    }

    /// Lays out instructions back to back starting at `address`; 16-bit
    /// encodings (below `0x10000` and decoding as 16-bit) take 2 bytes.
    pub fn with_program(address: u32, program: &[(u32, u32)]) -> Self {
        let mut harness = Self::new();
        harness.load(address, program);
        harness.machine().set_pc(address);
        harness
    }

    /// Writes `(word, width)` pairs starting at `address`.
    pub fn load(&mut self, address: u32, program: &[(u32, u32)]) {
        let mut at = address;
        for &(word, width) in program {
            self.memory
                .write_bytes(at, &word.to_le_bytes()[..width as usize], COREID);
            at += width;
        }
    }

    pub fn machine(&mut self) -> MachineState<'_> {
        self.core.machine(&mut self.memory)
    }

    pub fn reg(&self, index: RegisterIndex) -> u32 {
        self.core.reg(&self.memory, index)
    }

    pub fn set_reg(&mut self, index: RegisterIndex, value: u32) {
        self.machine().set_reg(index, value);
    }

    pub fn gpr(&self, number: u32) -> u32 {
        self.reg(RegisterIndex::gpr(number))
    }

    pub fn set_gpr(&mut self, number: u32, value: u32) {
        self.set_reg(RegisterIndex::gpr(number), value);
    }

    pub fn pc(&self) -> u32 {
        self.core.pc(&self.memory)
    }

    pub fn step(&mut self) -> StepOutcome {
        step_one(
            &mut self.core,
            &mut self.memory,
            &mut UnsupportedSyscalls,
            None,
            &self.config,
        )
    }

    /// Runs a single instruction placed at the current `PC`.
    pub fn execute(&mut self, word: u32, width: u32) -> StepOutcome {
        let pc = self.pc();
        self.load(pc, &[(word, width)]);
        self.step()
    }
}
