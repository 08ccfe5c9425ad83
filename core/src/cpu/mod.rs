//! The two-state FETCH/EXECUTE machine (spec.md §4.6).
//!
//! FETCH issues one bus read per tick until it acks; EXECUTE then runs for
//! one or more ticks (multi-tick only for loads/stores, which themselves
//! wait on the bus) before handing control back to FETCH or halting.

mod execute;

use crate::bus::{BusRequest, BusResponse, BusTarget, SEL_WORD};
use crate::csr::CsrBus;
use crate::decode::{self, Instr};
use crate::regfile::RegisterFile;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CpuState {
    Fetch,
    Execute { instr: Instr, pc: u32, rs1_val: u32, rs2_val: u32 },
    Halted { pc: u32 },
}

/// Owns the register file and program counter; drives a [`BusTarget`] for
/// fetch/load/store and a [`CsrBus`] for Zicsr. Does not own memory or
/// peripherals itself — those live in the `Soc` that calls [`Cpu::tick`].
pub struct Cpu {
    pc: u32,
    regs: RegisterFile,
    state: CpuState,
    strict_diagnostics: bool,
}

impl Cpu {
    /// `pc=0`, all registers zero, state FETCH, per spec.md §3 reset.
    /// `strict_diagnostics` escalates invalid-instruction and
    /// invalid/read-only-CSR diagnostics to a panic instead of only
    /// `tracing::warn!` (spec.md §7's "test mode").
    pub fn new(strict_diagnostics: bool) -> Self {
        Self { pc: 0, regs: RegisterFile::new(), state: CpuState::Fetch, strict_diagnostics }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, CpuState::Halted { .. })
    }

    /// Advance by one clock edge. `bus` carries fetch/load/store traffic;
    /// `csr` carries CSR accesses and also receives the per-tick counter
    /// broadcast, so `cycle` advances even while halted or mid-fetch.
    pub fn tick(&mut self, bus: &mut dyn BusTarget, csr: &mut CsrBus) {
        csr.tick();
        match self.state.clone() {
            CpuState::Halted { .. } => {}
            CpuState::Fetch => self.tick_fetch(bus, csr),
            CpuState::Execute { instr, pc, rs1_val, rs2_val } => {
                self.tick_execute(bus, csr, instr, pc, rs1_val, rs2_val)
            }
        }
    }

    /// `instret` increments here, on a successful fetch ack, not on
    /// execute completion — a fetched EBREAK still retires even though its
    /// execute step never advances the PC again.
    fn tick_fetch(&mut self, bus: &mut dyn BusTarget, csr: &mut CsrBus) {
        let req = BusRequest {
            adr: self.pc >> 2,
            dat_w: 0,
            sel: SEL_WORD,
            cyc: true,
            stb: true,
            we: false,
        };
        let BusResponse { dat_r, ack } = bus.step(req);
        if !ack {
            return;
        }
        csr.retire();
        let instr = decode::decode(dat_r);
        let rs1_val = self.regs.read(reg_index(&instr, RegSlot::Rs1));
        let rs2_val = self.regs.read(reg_index(&instr, RegSlot::Rs2));
        self.state = CpuState::Execute { instr, pc: self.pc, rs1_val, rs2_val };
    }

    fn tick_execute(
        &mut self,
        bus: &mut dyn BusTarget,
        csr: &mut CsrBus,
        instr: Instr,
        pc: u32,
        rs1_val: u32,
        rs2_val: u32,
    ) {
        if let Instr::Invalid(word) = instr {
            warn!(pc, encoding = format!("{word:#010x}"), "invalid instruction, continuing");
            assert!(
                !self.strict_diagnostics,
                "strict diagnostics: invalid instruction at pc={pc:#010x} encoding={word:#010x}"
            );
        }
        match execute::step(&instr, pc, rs1_val, rs2_val, bus, csr, self.strict_diagnostics) {
            execute::Outcome::Complete { next_pc, writeback } => {
                if let Some((rd, value)) = writeback {
                    self.regs.write(rd, value);
                }
                self.pc = next_pc;
                self.state = CpuState::Fetch;
            }
            execute::Outcome::WaitMem => {
                self.state = CpuState::Execute { instr, pc, rs1_val, rs2_val };
            }
            execute::Outcome::Halt => {
                self.state = CpuState::Halted { pc };
            }
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(false)
    }
}

enum RegSlot {
    Rs1,
    Rs2,
}

fn reg_index(instr: &Instr, slot: RegSlot) -> u8 {
    match (instr, slot) {
        (Instr::Jalr { rs1, .. }, RegSlot::Rs1) => *rs1,
        (Instr::Branch { rs1, .. }, RegSlot::Rs1) => *rs1,
        (Instr::Branch { rs2, .. }, RegSlot::Rs2) => *rs2,
        (Instr::Load { rs1, .. }, RegSlot::Rs1) => *rs1,
        (Instr::Store { rs1, .. }, RegSlot::Rs1) => *rs1,
        (Instr::Store { rs2, .. }, RegSlot::Rs2) => *rs2,
        (Instr::OpImm { rs1, .. }, RegSlot::Rs1) => *rs1,
        (Instr::Op { rs1, .. }, RegSlot::Rs1) => *rs1,
        (Instr::Op { rs2, .. }, RegSlot::Rs2) => *rs2,
        (Instr::Csr { rs1, .. }, RegSlot::Rs1) => *rs1,
        _ => 0,
    }
}
