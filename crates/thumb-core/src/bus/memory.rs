//! Word-addressable reference store for the bus handshake.

use super::{BusRequest, BusResponse, MemoryBus};

/// Default store size in 32-bit words (16 KiB).
pub const DEFAULT_MEMORY_WORDS: usize = 4096;

/// Word-addressable store with a one-cycle read latency.
///
/// Writes complete in the cycle they are presented. A read completes in the
/// second consecutive cycle it is held at the same word address; dropping
/// `valid`, switching to a write, or moving to another word restarts it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WordMemory {
    words: Box<[u32]>,
    pending_read: Option<u32>,
}

impl Default for WordMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_WORDS)
    }
}

impl WordMemory {
    /// Allocates a zeroed store of `words` 32-bit words.
    #[must_use]
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![0; words].into_boxed_slice(),
            pending_read: None,
        }
    }

    /// Allocates a store and loads `image` at address 0.
    ///
    /// The store holds [`DEFAULT_MEMORY_WORDS`] words, or the whole image when
    /// it is larger. Callers loading untrusted images bound their size first.
    #[must_use]
    pub fn with_image(image: &[u32]) -> Self {
        let mut memory = Self::new(DEFAULT_MEMORY_WORDS.max(image.len()));
        memory.load_image(image);
        memory
    }

    /// Copies a program image into the store starting at address 0.
    ///
    /// Words beyond the end of the store are dropped.
    pub fn load_image(&mut self, image: &[u32]) {
        let len = image.len().min(self.words.len());
        if len < image.len() {
            tracing::warn!(
                image_words = image.len(),
                capacity = self.words.len(),
                "program image truncated to store size"
            );
        }
        self.words[..len].copy_from_slice(&image[..len]);
    }

    /// Store size in 32-bit words.
    #[must_use]
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Returns the backing words.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Reads the word containing `address` without bus latency.
    ///
    /// Addresses beyond the store read as zero.
    #[must_use]
    pub fn read_word(&self, address: u32) -> u32 {
        Self::index(address)
            .and_then(|index| self.words.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Writes the word containing `address` without bus latency.
    pub fn write_word(&mut self, address: u32, value: u32) {
        self.write_masked(address, value, super::WRITE_MASK_ALL);
    }

    fn write_masked(&mut self, address: u32, value: u32, mask: u8) {
        let Some(slot) = Self::index(address).and_then(|index| self.words.get_mut(index)) else {
            tracing::warn!("write to {address:#010x} beyond store dropped");
            return;
        };

        let mut merged = *slot;
        for lane in 0..4 {
            if mask & (1 << lane) != 0 {
                let lane_mask = 0xFF_u32 << (lane * 8);
                merged = (merged & !lane_mask) | (value & lane_mask);
            }
        }
        *slot = merged;
    }

    fn load(&self, address: u32) -> u32 {
        Self::index(address)
            .and_then(|index| self.words.get(index))
            .copied()
            .unwrap_or_else(|| {
                tracing::warn!("read from {address:#010x} beyond store");
                0
            })
    }

    fn index(address: u32) -> Option<usize> {
        usize::try_from(address >> 2).ok()
    }
}

impl MemoryBus for WordMemory {
    fn cycle(&mut self, request: &BusRequest) -> BusResponse {
        if !request.valid {
            self.pending_read = None;
            return BusResponse::NOT_READY;
        }

        if request.write {
            self.pending_read = None;
            self.write_masked(request.address, request.write_data, request.write_mask);
            return BusResponse::ready(0);
        }

        let word_address = request.address >> 2;
        if self.pending_read == Some(word_address) {
            self.pending_read = None;
            BusResponse::ready(self.load(request.address))
        } else {
            self.pending_read = Some(word_address);
            BusResponse::NOT_READY
        }
    }
}

/// Packs 16-bit instructions into program-image words, lower half first.
///
/// An odd trailing instruction is padded with `0x0000` in the upper half.
#[must_use]
pub fn pack_halfwords(halfwords: &[u16]) -> Vec<u32> {
    halfwords
        .chunks(2)
        .map(|pair| {
            let low = u32::from(pair[0]);
            let high = pair.get(1).copied().map_or(0, u32::from);
            low | (high << 16)
        })
        .collect()
}
