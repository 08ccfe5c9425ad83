//! `riscv32`: run a flat RV32I ROM image against the simulator and print the
//! architectural state at halt (or at the tick budget, whichever comes
//! first).

mod config;
mod rom;

use clap::Parser;
use config::FileConfig;
use riscv32_core::soc::{IoDevice, Soc, SocConfig};
use riscv32_devices::{Gpio, RegisterBlockTarget, Timer};
use rom::load_rom;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Parse a base-address or size argument, accepting `0x`-prefixed hex or
/// plain decimal (matching how these values are usually quoted in docs).
fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "riscv32", about = "Run a flat RV32I ROM image against the simulator")]
struct Cli {
    /// Path to a flat little-endian RV32I ROM image.
    rom: PathBuf,

    /// TOML file overriding SocConfig fields (CLI flags still win).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks even if the CPU never halts.
    #[arg(long, default_value_t = 1_000_000)]
    max_ticks: u64,

    #[arg(long, value_parser = parse_u32)]
    rom_base: Option<u32>,
    #[arg(long, value_parser = parse_u32)]
    ram_base: Option<u32>,
    #[arg(long, value_parser = parse_u32)]
    io_base: Option<u32>,
    #[arg(long, value_parser = parse_u32)]
    rom_size_bytes: Option<u32>,
    #[arg(long, value_parser = parse_u32)]
    ram_size_bytes: Option<u32>,
    #[arg(long, value_parser = parse_u32)]
    io_size_bytes: Option<u32>,

    /// Escalate invalid-instruction and invalid/read-only-CSR diagnostics to
    /// a panic instead of only logging them (spec.md §7's "test mode").
    #[arg(long)]
    strict: bool,

    /// Enable debug-level tracing output regardless of `RUST_LOG`.
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<SocConfig, config::ConfigError> {
        let mut soc_config = SocConfig::default();
        if let Some(path) = &self.config {
            soc_config = FileConfig::load(path)?.apply(soc_config);
        }
        if let Some(v) = self.rom_base {
            soc_config.rom_base = v;
        }
        if let Some(v) = self.ram_base {
            soc_config.ram_base = v;
        }
        if let Some(v) = self.io_base {
            soc_config.io_base = v;
        }
        if let Some(v) = self.rom_size_bytes {
            soc_config.rom_size_bytes = v;
        }
        if let Some(v) = self.ram_size_bytes {
            soc_config.ram_size_bytes = v;
        }
        if let Some(v) = self.io_size_bytes {
            soc_config.io_size_bytes = v;
        }
        if self.strict {
            soc_config.strict_diagnostics = true;
        }
        Ok(soc_config)
    }
}

/// `Gpio` at I/O offset 0x0, `Timer` at 0x10 — both rounded up to a 16-byte
/// (power-of-two) window even though each uses only 3 registers, since the
/// bus decoder requires power-of-two, base-aligned window geometry.
fn default_devices() -> Vec<IoDevice> {
    vec![
        IoDevice { name: "gpio", offset_bytes: 0x00, size_bytes: 0x10, target: Box::new(RegisterBlockTarget::new(Gpio::new())) },
        IoDevice { name: "timer", offset_bytes: 0x10, size_bytes: 0x10, target: Box::new(RegisterBlockTarget::new(Timer::new())) },
    ]
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let soc_config = match cli.resolve_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let rom_image = match load_rom(&cli.rom) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut soc = match Soc::new(&soc_config, &rom_image, default_devices()) {
        Ok(soc) => soc,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ticks = soc.run(cli.max_ticks);
    info!(ticks, halted = soc.cpu.is_halted(), pc = soc.cpu.pc(), "run finished");

    print_state(&soc);
    if soc.cpu.is_halted() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn print_state(soc: &Soc) {
    println!("halted: {}", soc.cpu.is_halted());
    println!("pc: {:#010x}", soc.cpu.pc());
    let regs = soc.cpu.registers().snapshot();
    for (i, chunk) in regs.chunks(4).enumerate() {
        let base = i * 4;
        println!(
            "x{:<2} {:#010x}  x{:<2} {:#010x}  x{:<2} {:#010x}  x{:<2} {:#010x}",
            base, chunk[0], base + 1, chunk[1], base + 2, chunk[2], base + 3, chunk[3]
        );
    }
}
