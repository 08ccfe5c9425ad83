//! Construction-time error types.
//!
//! Runtime conditions (invalid instruction, invalid CSR access, an
//! out-of-map bus address) are never [`Result`] errors — the core never
//! halts on them (see [`crate::cpu`] module docs). Only problems detected
//! while assembling a [`crate::bus::decoder::BusDecoder`] or
//! [`crate::csr::CsrBus`] are reported here, before any tick runs.

use thiserror::Error;

/// Failure assembling a bus decoder, CSR sub-bus, or ROM image.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Two memory windows overlap in address space.
    #[error(
        "memory window `{a_name}` [{a_base:#010x}, {a_end:#010x}) overlaps `{b_name}` [{b_base:#010x}, {b_end:#010x})"
    )]
    OverlappingWindows {
        a_name: &'static str,
        a_base: u32,
        a_end: u32,
        b_name: &'static str,
        b_base: u32,
        b_end: u32,
    },

    /// A window's size is not a power of two, or its base is not aligned to its size.
    #[error("memory window `{name}` at {base:#010x} has invalid size {size:#x} (must be a nonzero power of two, base-aligned)")]
    InvalidWindowGeometry {
        name: &'static str,
        base: u32,
        size: u32,
    },

    /// A window is not fully contained within its parent window.
    #[error("memory window `{name}` [{base:#010x}, {end:#010x}) is not contained in parent window `{parent}`")]
    WindowNotContained {
        name: &'static str,
        base: u32,
        end: u32,
        parent: &'static str,
    },

    /// Two CSR providers both claim the same address.
    #[error("CSR address {addr:#05x} is claimed by both `{first}` and `{second}`")]
    DuplicateCsrProvider {
        addr: u16,
        first: &'static str,
        second: &'static str,
    },

    /// A flat ROM image is larger than the window it is being loaded into.
    #[error("ROM image of {image_len} bytes does not fit in a {window_len}-byte window")]
    RomImageTooLarge { image_len: usize, window_len: usize },
}
