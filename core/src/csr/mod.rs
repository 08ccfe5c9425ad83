//! Zicsr control/status register sub-bus (spec.md §5).
//!
//! CSRs are addressed in a disjoint 12-bit space from the main bus and are
//! accessed only via the six `CSRRx` instruction forms, never through
//! load/store. A [`CsrBus`] multiplexes a fixed set of [`CsrProvider`]s,
//! resolved to an address once at construction.

pub mod counters;

use crate::error::BuildError;

/// One of the six Zicsr access modes (spec.md §5.2). Each carries the value
/// to combine with the CSR's current contents; `Write` ignores the current
/// value entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrOp {
    /// CSRRW / CSRRWI: unconditional replace.
    Write(u32),
    /// CSRRS / CSRRSI: set bits present in the mask.
    Set(u32),
    /// CSRRC / CSRRCI: clear bits present in the mask.
    Clear(u32),
}

/// A single CSR-backed device: a counter bank, or (future) a custom
/// implementation-defined register. `addresses` lists every CSR address this
/// provider answers for.
pub trait CsrProvider {
    fn name(&self) -> &'static str;
    fn addresses(&self) -> &[u16];
    /// Read a CSR's current value without side effects.
    fn read(&self, addr: u16) -> u32;
    /// Apply an access. `rd == x0` write-suppression (CSRRS/CSRRC with a
    /// zero mask reading but not writing) is handled by the caller, per
    /// spec.md §5.2 — by the time `apply` runs, the write should occur.
    fn apply(&mut self, addr: u16, op: CsrOp) -> u32;

    /// Called once per clock edge regardless of instruction traffic. Only
    /// [`counters::Counters`] observes this; other providers no-op.
    fn on_cycle_tick(&mut self) {}

    /// Called once per instruction retired (a FETCH that completed with ack).
    fn on_instruction_retire(&mut self) {}

    /// Whether `addr` (one of this provider's own addresses) rejects writes
    /// (spec.md §7: "write attempted to a read-only CSR" gets the same
    /// logged/strict-assert diagnostic as an invalid instruction). Default
    /// false; [`counters::Counters`] overrides since all six of its
    /// addresses are fixed architectural state.
    fn is_read_only(&self, addr: u16) -> bool {
        let _ = addr;
        false
    }
}

struct Entry {
    provider_index: usize,
}

/// Routes CSR accesses to the provider that claims each address. Providers
/// are heterogeneous (a counter bank today, possibly other CSR-backed
/// devices later), so they are held as trait objects.
pub struct CsrBus {
    providers: Vec<Box<dyn CsrProvider>>,
    // Linear scan is fine: CSR space is sparse and accesses are already off
    // the CPU's per-cycle critical path.
    table: Vec<(u16, Entry)>,
}

impl CsrBus {
    pub fn new(providers: Vec<Box<dyn CsrProvider>>) -> Result<Self, BuildError> {
        let mut table: Vec<(u16, Entry)> = Vec::new();
        for (index, provider) in providers.iter().enumerate() {
            for &addr in provider.addresses() {
                if let Some((_, existing)) = table.iter().find(|(a, _)| *a == addr) {
                    return Err(BuildError::DuplicateCsrProvider {
                        addr,
                        first: providers[existing.provider_index].name(),
                        second: provider.name(),
                    });
                }
                table.push((addr, Entry { provider_index: index }));
            }
        }
        Ok(Self { providers, table })
    }

    fn find(&self, addr: u16) -> Option<usize> {
        self.table.iter().find(|(a, _)| *a == addr).map(|(_, e)| e.provider_index)
    }

    /// Read-only peek, for diagnostics; no side effects.
    pub fn peek(&self, addr: u16) -> Option<u32> {
        self.find(addr).map(|i| self.providers[i].read(addr))
    }

    /// Whether `addr` is claimed by a provider that marks it read-only.
    /// `None` if the address is unclaimed.
    pub fn is_read_only(&self, addr: u16) -> Option<bool> {
        self.find(addr).map(|i| self.providers[i].is_read_only(addr))
    }

    /// Perform a full CSRRx access: read the prior value, then apply the
    /// write per `op` (already resolved by the caller to account for the
    /// `rd == x0` / zero-mask write-suppression rules). Unmapped addresses
    /// read and write as zero, per spec.md §5.3 (no illegal-CSR trap).
    pub fn access(&mut self, addr: u16, op: CsrOp, suppress_write: bool) -> u32 {
        match self.find(addr) {
            Some(index) => {
                let provider = &mut self.providers[index];
                let before = provider.read(addr);
                if !suppress_write {
                    provider.apply(addr, op);
                }
                before
            }
            None => 0,
        }
    }

    pub fn provider(&self, index: usize) -> &dyn CsrProvider {
        self.providers[index].as_ref()
    }

    pub fn provider_mut(&mut self, index: usize) -> &mut (dyn CsrProvider + 'static) {
        self.providers[index].as_mut()
    }

    /// Broadcast a clock edge to every provider (drives `cycle`/`time`).
    pub fn tick(&mut self) {
        for provider in &mut self.providers {
            provider.on_cycle_tick();
        }
    }

    /// Broadcast an instruction retirement to every provider (drives `instret`).
    pub fn retire(&mut self) {
        for provider in &mut self.providers {
            provider.on_instruction_retire();
        }
    }
}
