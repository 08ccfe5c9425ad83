//! Golden-vector format and minimal RV32I assembler for testgen's generator
//! binaries and the vector-driven integration tests that replay them.

pub mod encode;

use riscv32_core::soc::{Soc, SocConfig};
use serde::{Deserialize, Serialize};

/// A single end-to-end test case: a ROM image, a tick budget, and the
/// expected architectural state after the CPU halts (or the budget runs
/// out, whichever comes first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    pub name: String,
    pub rom: Vec<u8>,
    pub max_ticks: u64,
    pub expected_regs: [u32; 32],
    pub expected_pc: u32,
    pub expect_halted: bool,
    /// Low 32 bits of `instret` at halt, checked only when `Some` — most
    /// vectors only care about architectural register state.
    #[serde(default)]
    pub expected_instret: Option<u32>,
}

/// Outcome of replaying a [`Vector`] against a freshly constructed [`Soc`].
pub struct VectorResult {
    pub actual_regs: [u32; 32],
    pub actual_pc: u32,
    pub halted: bool,
    pub ticks_used: u64,
    pub instret: u32,
}

pub fn run_vector(vector: &Vector) -> VectorResult {
    let config = SocConfig { rom_size_bytes: 4096, ram_size_bytes: 1024, io_size_bytes: 1024, ..SocConfig::default() };
    let mut soc = Soc::new(&config, &vector.rom, Vec::new()).expect("vector ROM fits default map");
    let ticks_used = soc.run(vector.max_ticks);
    VectorResult {
        actual_regs: soc.cpu.registers().snapshot(),
        actual_pc: soc.cpu.pc(),
        halted: soc.cpu.is_halted(),
        ticks_used,
        instret: soc.csr_bus().peek(0xc02).unwrap_or(0),
    }
}

impl Vector {
    /// Assert this vector's expectations hold, with a message naming the
    /// vector on failure.
    pub fn check(&self) {
        let result = run_vector(self);
        assert_eq!(result.halted, self.expect_halted, "{}: halted mismatch", self.name);
        assert_eq!(result.actual_pc, self.expected_pc, "{}: pc mismatch", self.name);
        assert_eq!(result.actual_regs, self.expected_regs, "{}: register mismatch", self.name);
        if let Some(expected) = self.expected_instret {
            assert_eq!(result.instret, expected, "{}: instret mismatch", self.name);
        }
    }
}
