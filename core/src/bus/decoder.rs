//! Hierarchical address decode (spec.md §4.3).
//!
//! A [`MemoryMap`] is a list of named, non-overlapping [`Window`]s. A window
//! either addresses a leaf target directly or nests another `MemoryMap` (used
//! for the I/O region's per-peripheral register blocks). All overlap and
//! containment checks happen once, at construction, via [`MemoryMap::new`] —
//! the hot `step` path never re-validates.

use crate::error::BuildError;

#[derive(Debug, Clone)]
pub enum WindowKind {
    /// Index into the [`BusDecoder`]'s flat target vector.
    Leaf(usize),
    /// A nested sub-decode, rebased to this window's `base`.
    Nested(MemoryMap),
}

#[derive(Debug, Clone)]
pub struct Window {
    pub name: &'static str,
    pub base: u32,
    pub size: u32,
    pub kind: WindowKind,
}

impl Window {
    pub fn leaf(name: &'static str, base: u32, size: u32, target_index: usize) -> Self {
        Self { name, base, size, kind: WindowKind::Leaf(target_index) }
    }

    pub fn nested(name: &'static str, base: u32, size: u32, map: MemoryMap) -> Self {
        Self { name, base, size, kind: WindowKind::Nested(map) }
    }

    #[inline]
    fn end(&self) -> u32 {
        self.base + self.size
    }

    fn validate_geometry(&self) -> Result<(), BuildError> {
        if self.size == 0 || !self.size.is_power_of_two() || self.base % self.size != 0 {
            return Err(BuildError::InvalidWindowGeometry {
                name: self.name,
                base: self.base,
                size: self.size,
            });
        }
        Ok(())
    }
}

/// A validated, non-overlapping set of address windows.
#[derive(Debug, Clone)]
pub struct MemoryMap {
    windows: Vec<Window>,
}

impl MemoryMap {
    /// Build and validate a memory map. Rejects overlapping windows,
    /// misaligned or non-power-of-two window sizes, and (for nested windows)
    /// sub-windows that escape their parent's bounds.
    pub fn new(windows: Vec<Window>) -> Result<Self, BuildError> {
        for w in &windows {
            w.validate_geometry()?;
            if let WindowKind::Nested(child) = &w.kind {
                for cw in &child.windows {
                    if cw.base < w.base || cw.end() > w.end() {
                        return Err(BuildError::WindowNotContained {
                            name: cw.name,
                            base: cw.base,
                            end: cw.end(),
                            parent: w.name,
                        });
                    }
                }
            }
        }

        for i in 0..windows.len() {
            for j in (i + 1)..windows.len() {
                let a = &windows[i];
                let b = &windows[j];
                if a.base < b.end() && b.base < a.end() {
                    return Err(BuildError::OverlappingWindows {
                        a_name: a.name,
                        a_base: a.base,
                        a_end: a.end(),
                        b_name: b.name,
                        b_base: b.base,
                        b_end: b.end(),
                    });
                }
            }
        }

        Ok(Self { windows })
    }

    /// Find the window containing `addr`, if any, returning it along with
    /// `addr` rebased to that window's local offset.
    pub fn decode(&self, addr: u32) -> Option<(&Window, u32)> {
        self.windows
            .iter()
            .find(|w| addr >= w.base && addr < w.end())
            .map(|w| (w, addr - w.base))
    }
}

/// Drives a [`BusRequest`] through a [`MemoryMap`] to the leaf [`BusTarget`]
/// it decodes to. Targets are heterogeneous (ROM, RAM, peripheral register
/// blocks), so they are held as trait objects. Per spec.md §7, an address
/// outside every window still completes: `ack` is asserted immediately with
/// an undefined `dat_r` rather than hanging the controller.
pub struct BusDecoder {
    map: MemoryMap,
    targets: Vec<Box<dyn super::BusTarget>>,
}

impl BusDecoder {
    pub fn new(map: MemoryMap, targets: Vec<Box<dyn super::BusTarget>>) -> Self {
        Self { map, targets }
    }

    fn resolve(map: &MemoryMap, addr: u32) -> Option<(usize, u32)> {
        let (window, local) = map.decode(addr)?;
        match &window.kind {
            WindowKind::Leaf(index) => Some((*index, local)),
            WindowKind::Nested(child) => Self::resolve(child, local),
        }
    }
}

impl super::BusTarget for BusDecoder {
    fn step(&mut self, req: super::BusRequest) -> super::BusResponse {
        if !req.cyc || !req.stb {
            return super::BusResponse::default();
        }
        match Self::resolve(&self.map, req.adr) {
            Some((index, local_addr)) => {
                let local_req = super::BusRequest { adr: local_addr, ..req };
                self.targets[index].step(local_req)
            }
            None => super::BusResponse { dat_r: 0, ack: true },
        }
    }

    /// Forward to every target, including nested decoders, so a peripheral
    /// several levels down the I/O hierarchy still sees one tick per cycle.
    fn on_cycle_tick(&mut self) {
        for target in &mut self.targets {
            target.on_cycle_tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_windows_rejected() {
        let result = MemoryMap::new(vec![
            Window::leaf("a", 0x0000_0000, 0x1000, 0),
            Window::leaf("b", 0x0000_0800, 0x1000, 1),
        ]);
        assert!(matches!(result, Err(BuildError::OverlappingWindows { .. })));
    }

    #[test]
    fn non_power_of_two_size_rejected() {
        let result = MemoryMap::new(vec![Window::leaf("a", 0, 0x1500, 0)]);
        assert!(matches!(result, Err(BuildError::InvalidWindowGeometry { .. })));
    }

    #[test]
    fn misaligned_base_rejected() {
        let result = MemoryMap::new(vec![Window::leaf("a", 0x100, 0x1000, 0)]);
        assert!(matches!(result, Err(BuildError::InvalidWindowGeometry { .. })));
    }

    #[test]
    fn nested_window_escaping_parent_rejected() {
        let child = MemoryMap::new(vec![Window::leaf("gpio", 0x2000_1000, 0x1000, 0)]).unwrap();
        let result = MemoryMap::new(vec![Window::nested("io", 0x2000_0000, 0x1000, child)]);
        assert!(matches!(result, Err(BuildError::WindowNotContained { .. })));
    }

    #[test]
    fn decode_finds_containing_window() {
        let map = MemoryMap::new(vec![
            Window::leaf("rom", 0x0000_0000, 0x1000, 0),
            Window::leaf("ram", 0x1000_0000, 0x1000, 1),
        ])
        .unwrap();
        let (w, local) = map.decode(0x1000_0004).unwrap();
        assert_eq!(w.name, "ram");
        assert_eq!(local, 4);
        assert!(map.decode(0x0500_0000).is_none());
    }
}
