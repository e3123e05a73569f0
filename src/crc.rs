//! CRC-32 (spec §4.2)
//!
//! IEEE 802.3 polynomial, pre/post-inverted, seedable for streaming. Thin
//! wrapper over `crc32fast::Hasher`; this just gives the seed/finalize
//! dance a name so callers (writer, copy-through verification) don't
//! reach past it.

use crc32fast::Hasher;

/// Streaming CRC-32 accumulator, seedable so copy-through verification can
/// resume from a known value if ever needed.
pub struct Crc32 {
    hasher: Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Self::seeded(0)
    }

    pub fn seeded(seed: u32) -> Self {
        Self {
            hasher: Hasher::new_with_initial(seed),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot CRC-32 of a full buffer.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
