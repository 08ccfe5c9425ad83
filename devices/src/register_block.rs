//! The peripheral side of the memory-mapped register-block interface
//! (spec.md §6): "Each peripheral register block exposes a sequence of
//! 32-bit registers... The core does not constrain peripheral semantics
//! beyond the bus protocol."
//!
//! [`RegisterBlock`] is that seam: a peripheral implements plain
//! word-addressed read/write (usually via `#[derive(RegisterBlock)]`), and
//! [`RegisterBlockTarget`] adapts it to [`riscv32_core::bus::BusTarget`].
//! Register blocks respond in the same cycle they're addressed — they hold
//! no wait-state machinery of their own, unlike [`riscv32_core::bus::Ram`].

use riscv32_core::bus::{BusRequest, BusResponse, BusTarget};

pub trait RegisterBlock {
    fn read_register(&self, addr: u32) -> u32;
    fn write_register(&mut self, addr: u32, value: u32);

    /// Called once per clock edge regardless of bus traffic. Peripherals
    /// with no free-running state (most of them) use the default no-op.
    fn on_cycle_tick(&mut self) {}
}

pub struct RegisterBlockTarget<T> {
    inner: T,
}

impl<T: RegisterBlock> RegisterBlockTarget<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: RegisterBlock> BusTarget for RegisterBlockTarget<T> {
    fn step(&mut self, req: BusRequest) -> BusResponse {
        if !req.cyc || !req.stb {
            return BusResponse::default();
        }
        if req.we {
            self.inner.write_register(req.adr, req.dat_w);
            BusResponse { dat_r: 0, ack: true }
        } else {
            BusResponse { dat_r: self.inner.read_register(req.adr), ack: true }
        }
    }

    fn on_cycle_tick(&mut self) {
        self.inner.on_cycle_tick();
    }
}
