//! A minimal GPIO register block: one output latch, one direction mask, one
//! input capture register. Three 32-bit registers, one bit per pin.

use riscv32_regs_macros::RegisterBlock;

#[derive(RegisterBlock, Default)]
pub struct Gpio {
    #[reg(addr = 0, mode = "rw")]
    output: u32,
    #[reg(addr = 1, mode = "rw")]
    direction: u32,
    #[reg(addr = 2, mode = "r")]
    input: u32,
}

impl Gpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> u32 {
        self.output
    }

    pub fn direction(&self) -> u32 {
        self.direction
    }

    /// Drive external input pin state, as a test harness or peripheral
    /// stand-in for real hardware would.
    pub fn set_input(&mut self, value: u32) {
        self.input = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_block::{RegisterBlock as _, RegisterBlockTarget};
    use riscv32_core::bus::{BusRequest, BusTarget};

    #[test]
    fn write_then_read_output_register() {
        let mut target = RegisterBlockTarget::new(Gpio::new());
        let w = target.step(BusRequest { adr: 0, dat_w: 0xff, sel: 0b1111, cyc: true, stb: true, we: true });
        assert!(w.ack);
        let r = target.step(BusRequest { adr: 0, dat_w: 0, sel: 0b1111, cyc: true, stb: true, we: false });
        assert_eq!(r.dat_r, 0xff);
    }

    #[test]
    fn input_register_is_read_only() {
        let mut gpio = Gpio::new();
        gpio.set_input(0x5);
        assert_eq!(gpio.read_register(2), 0x5);
        gpio.write_register(2, 0xff);
        assert_eq!(gpio.read_register(2), 0x5, "writes to a read-only register are discarded");
    }

    #[test]
    fn unmapped_register_reads_zero() {
        let gpio = Gpio::new();
        assert_eq!(gpio.read_register(99), 0);
    }
}
