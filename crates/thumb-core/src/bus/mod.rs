//! Memory bus handshake contract and the reference word-addressable store.

/// Reference word store honoring the handshake and read latency.
pub mod memory;

pub use memory::{pack_halfwords, WordMemory, DEFAULT_MEMORY_WORDS};

/// Byte-lane mask selecting all four lanes of a word.
pub const WRITE_MASK_ALL: u8 = 0b1111;

/// Request driven by the core for one cycle.
///
/// The requester holds every field stable until it observes `ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusRequest {
    /// A transaction is being requested this cycle.
    pub valid: bool,
    /// The transaction is a write.
    pub write: bool,
    /// Byte address; the low two bits are ignored by word stores.
    pub address: u32,
    /// Data to write.
    pub write_data: u32,
    /// Byte-lane write enables, bit `n` selects bits `8n..8n+8`.
    pub write_mask: u8,
}

impl BusRequest {
    /// No transaction this cycle.
    pub const IDLE: Self = Self {
        valid: false,
        write: false,
        address: 0,
        write_data: 0,
        write_mask: 0,
    };

    /// Word read at `address`.
    #[must_use]
    pub const fn read(address: u32) -> Self {
        Self {
            valid: true,
            write: false,
            address,
            write_data: 0,
            write_mask: 0,
        }
    }

    /// Full-word write of `data` at `address`.
    #[must_use]
    pub const fn write(address: u32, data: u32) -> Self {
        Self {
            valid: true,
            write: true,
            address,
            write_data: data,
            write_mask: WRITE_MASK_ALL,
        }
    }

    /// Returns `true` for a valid read request.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.valid && !self.write
    }
}

/// Response produced by the bus for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusResponse {
    /// The held transaction completed this cycle.
    pub ready: bool,
    /// Read data; meaningful only when `ready` acknowledges a read.
    pub read_data: u32,
}

impl BusResponse {
    /// No completion this cycle.
    pub const NOT_READY: Self = Self {
        ready: false,
        read_data: 0,
    };

    /// Completion carrying `data`.
    #[must_use]
    pub const fn ready(data: u32) -> Self {
        Self {
            ready: true,
            read_data: data,
        }
    }
}

/// Single-ported, word-addressed bus backend.
///
/// Called once per cycle with the request the core drives during that cycle.
/// Implementations must complete writes in the cycle they are presented and
/// complete a read once it has been held unchanged for two consecutive cycles.
pub trait MemoryBus {
    /// Advances the backend by one cycle and returns this cycle's response.
    fn cycle(&mut self, request: &BusRequest) -> BusResponse;
}
