//! Assembles a complete machine: [`Cpu`] plus the bus fabric and CSR sub-bus
//! from the default memory map (spec.md §6).
//!
//! ROM sits at 0x0000_0000, RAM at 0x1000_0000, and a peripheral I/O region
//! at 0x2000_0000. All three addresses and the two memory sizes are
//! configurable; peripherals are supplied by the caller (see the
//! `riscv32-devices` crate) since this core knows nothing about their
//! register semantics beyond the bus protocol.

use crate::bus::{BusDecoder, BusTarget, MemoryMap, Ram, Rom, Window};
use crate::cpu::Cpu;
use crate::csr::counters::Counters;
use crate::csr::CsrBus;
use crate::error::BuildError;

pub const DEFAULT_ROM_BASE: u32 = 0x0000_0000;
pub const DEFAULT_RAM_BASE: u32 = 0x1000_0000;
pub const DEFAULT_IO_BASE: u32 = 0x2000_0000;

/// One memory-mapped peripheral register block, placed at a byte offset
/// within the I/O region.
pub struct IoDevice {
    pub name: &'static str,
    pub offset_bytes: u32,
    pub size_bytes: u32,
    pub target: Box<dyn BusTarget>,
}

/// Construction-time configuration for a [`Soc`]. Byte-oriented (matching
/// how a human names memory sizes); converted to the bus's word-address
/// convention in [`Soc::new`].
#[derive(Clone)]
pub struct SocConfig {
    pub rom_size_bytes: u32,
    pub ram_size_bytes: u32,
    pub io_size_bytes: u32,
    pub rom_base: u32,
    pub ram_base: u32,
    pub io_base: u32,
    /// Escalate invalid-instruction and invalid/read-only-CSR diagnostics
    /// (spec.md §7) from a logged warning to a hard `assert!` failure.
    /// Off by default so a misbehaving program doesn't crash the host.
    pub strict_diagnostics: bool,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            rom_size_bytes: 64 * 1024,
            ram_size_bytes: 8 * 1024,
            io_size_bytes: 4 * 1024,
            rom_base: DEFAULT_ROM_BASE,
            ram_base: DEFAULT_RAM_BASE,
            io_base: DEFAULT_IO_BASE,
            strict_diagnostics: false,
        }
    }
}

pub struct Soc {
    pub cpu: Cpu,
    bus: BusDecoder,
    csr: CsrBus,
}

impl Soc {
    pub fn new(config: &SocConfig, rom_image: &[u8], devices: Vec<IoDevice>) -> Result<Self, BuildError> {
        let rom = Rom::from_image(rom_image, (config.rom_size_bytes / 4) as usize)?;
        let ram = Ram::new((config.ram_size_bytes / 4) as usize);

        let mut io_windows = Vec::with_capacity(devices.len());
        let mut io_targets: Vec<Box<dyn BusTarget>> = Vec::with_capacity(devices.len());
        for (index, device) in devices.into_iter().enumerate() {
            io_windows.push(Window::leaf(device.name, device.offset_bytes / 4, device.size_bytes / 4, index));
            io_targets.push(device.target);
        }
        let io_map = MemoryMap::new(io_windows)?;
        let io_decoder = BusDecoder::new(io_map, io_targets);

        let top_windows = vec![
            Window::leaf("rom", config.rom_base / 4, config.rom_size_bytes / 4, 0),
            Window::leaf("ram", config.ram_base / 4, config.ram_size_bytes / 4, 1),
            Window::leaf("io", config.io_base / 4, config.io_size_bytes / 4, 2),
        ];
        let top_map = MemoryMap::new(top_windows)?;
        let targets: Vec<Box<dyn BusTarget>> = vec![Box::new(rom), Box::new(ram), Box::new(io_decoder)];
        let bus = BusDecoder::new(top_map, targets);

        let csr = CsrBus::new(vec![Box::new(Counters::new())])?;

        Ok(Self { cpu: Cpu::new(config.strict_diagnostics), bus, csr })
    }

    /// Like [`Soc::new`], but forces `strict_diagnostics` on regardless of
    /// what `config` carries — the test-mode entry point spec.md §7 calls
    /// for, for callers that want escalation without building their own
    /// `SocConfig`.
    pub fn new_strict(config: &SocConfig, rom_image: &[u8], devices: Vec<IoDevice>) -> Result<Self, BuildError> {
        let mut config = config.clone();
        config.strict_diagnostics = true;
        Self::new(&config, rom_image, devices)
    }

    /// Advance the whole machine by one clock edge.
    pub fn tick(&mut self) {
        self.cpu.tick(&mut self.bus, &mut self.csr);
        self.bus.on_cycle_tick();
    }

    /// Run ticks until the CPU halts (EBREAK) or `max_ticks` is exhausted,
    /// returning the number of ticks actually run. The host test harness'
    /// wall-clock budget (spec.md §5) is this function's caller's concern.
    pub fn run(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && !self.cpu.is_halted() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    pub fn csr_bus(&self) -> &CsrBus {
        &self.csr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(image: &[u8]) -> Soc {
        let config = SocConfig { rom_size_bytes: 256, ram_size_bytes: 256, io_size_bytes: 256, ..SocConfig::default() };
        Soc::new(&config, image, Vec::new()).unwrap()
    }

    fn encode_u(opcode: u32, rd: u8, imm: i32) -> u32 {
        opcode | ((rd as u32) << 7) | ((imm as u32) & 0xffff_f000)
    }

    fn encode_i(opcode: u32, rd: u8, funct3: u8, rs1: u8, imm: i32) -> u32 {
        opcode
            | ((rd as u32) << 7)
            | ((funct3 as u32) << 12)
            | ((rs1 as u32) << 15)
            | (((imm as u32) & 0xfff) << 20)
    }

    #[test]
    fn lui_then_ebreak_halts_with_expected_register() {
        use crate::decode::opcode;
        let lui = encode_u(opcode::LUI, 10, 0x0000_1000i32);
        let ebreak = opcode::SYSTEM | (1 << 20);
        let image: Vec<u8> = [lui, ebreak].iter().flat_map(|w| w.to_le_bytes()).collect();

        let mut soc = assemble(&image);
        soc.run(100);
        assert!(soc.cpu.is_halted());
        assert_eq!(soc.cpu.registers().read(10), 0x0000_1000);
    }

    #[test]
    fn addi_chain_then_ebreak() {
        use crate::decode::{alu_funct3, opcode};
        let addi_22 = encode_i(opcode::OP_IMM, 10, alu_funct3::ADD_SUB, 0, 22);
        let addi_5 = encode_i(opcode::OP_IMM, 11, alu_funct3::ADD_SUB, 0, 5);
        let add = opcode::OP | (12 << 7) | ((alu_funct3::ADD_SUB as u32) << 12) | (10 << 15) | (11 << 20);
        let ebreak = opcode::SYSTEM | (1 << 20);
        let image: Vec<u8> =
            [addi_22, addi_5, add, ebreak].iter().flat_map(|w| w.to_le_bytes()).collect();

        let mut soc = assemble(&image);
        soc.run(100);
        assert_eq!(soc.cpu.registers().read(10), 22);
        assert_eq!(soc.cpu.registers().read(11), 5);
        assert_eq!(soc.cpu.registers().read(12), 27);
    }

    #[test]
    #[should_panic(expected = "strict diagnostics")]
    fn strict_mode_panics_on_invalid_instruction() {
        // All-zero word: opcode field 0b0000000 is not a recognized RV32I opcode.
        let image: Vec<u8> = 0u32.to_le_bytes().to_vec();
        let config = SocConfig { rom_size_bytes: 256, ram_size_bytes: 256, io_size_bytes: 256, ..SocConfig::default() };
        let mut soc = Soc::new_strict(&config, &image, Vec::new()).unwrap();
        soc.run(10);
    }

    #[test]
    fn overlapping_top_level_windows_rejected() {
        let config = SocConfig {
            rom_size_bytes: 256,
            ram_size_bytes: 256,
            io_size_bytes: 256,
            rom_base: 0,
            ram_base: 128, // overlaps the 256-byte ROM window
            io_base: DEFAULT_IO_BASE,
            ..SocConfig::default()
        };
        assert!(Soc::new(&config, &[], Vec::new()).is_err());
    }
}
