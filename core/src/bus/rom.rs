//! Read-only, word-indexed program/data storage (spec.md §4.3).
//!
//! Identical read-path timing to [`super::Ram`]: a read completes one cycle
//! after the request, ack'd that same cycle. Writes take the same one-cycle
//! latency for protocol symmetry with a real bus target, but are always
//! discarded — there is no illegal-write trap in this core.

use super::{BusRequest, BusResponse, BusTarget};
use crate::error::BuildError;

#[derive(Debug, Clone, Copy)]
enum RomState {
    Idle,
    ReadPending { adr: u32 },
    WritePending,
}

pub struct Rom {
    words: Vec<u32>,
    state: RomState,
}

impl Rom {
    /// Build a ROM of `window_len_words` words, initialized from a flat
    /// little-endian byte `image` and zero-padded. Errors if `image` is
    /// larger than the window it targets.
    pub fn from_image(image: &[u8], window_len_words: usize) -> Result<Self, BuildError> {
        let window_len_bytes = window_len_words * 4;
        if image.len() > window_len_bytes {
            return Err(BuildError::RomImageTooLarge {
                image_len: image.len(),
                window_len: window_len_bytes,
            });
        }
        let mut words = vec![0u32; window_len_words];
        for (i, chunk) in image.chunks(4).enumerate() {
            let mut buf = [0u8; 4];
            buf[..chunk.len()].copy_from_slice(chunk);
            words[i] = u32::from_le_bytes(buf);
        }
        Ok(Self { words, state: RomState::Idle })
    }

    pub fn len_words(&self) -> usize {
        self.words.len()
    }
}

impl BusTarget for Rom {
    fn step(&mut self, req: BusRequest) -> BusResponse {
        match self.state {
            RomState::Idle => {
                if req.cyc && req.stb {
                    self.state =
                        if req.we { RomState::WritePending } else { RomState::ReadPending { adr: req.adr } };
                }
                BusResponse::default()
            }
            RomState::ReadPending { adr } => {
                self.state = RomState::Idle;
                BusResponse { dat_r: self.words[adr as usize], ack: true }
            }
            RomState::WritePending => {
                self.state = RomState::Idle;
                BusResponse { dat_r: 0, ack: true }
            }
        }
    }
}
