//! Flag update behaviors for different micro-op classes.

use crate::state::Flags;

/// Describes which flags a micro-op writes. Flags it does not name keep their
/// previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FlagsUpdate {
    /// No change to flags.
    #[default]
    None,
    /// Update `N` and `Z` only.
    Nz {
        /// Negative flag.
        negative: bool,
        /// Zero flag.
        zero: bool,
    },
    /// Update `N`, `Z`, and `C`.
    Nzc {
        /// Negative flag.
        negative: bool,
        /// Zero flag.
        zero: bool,
        /// Carry flag.
        carry: bool,
    },
    /// Update all four flags.
    Nzcv {
        /// Negative flag.
        negative: bool,
        /// Zero flag.
        zero: bool,
        /// Carry flag.
        carry: bool,
        /// Overflow flag.
        overflow: bool,
    },
}

impl FlagsUpdate {
    /// `N`/`Z` derived from `result`.
    #[must_use]
    pub const fn nz(result: u32) -> Self {
        Self::Nz {
            negative: is_negative(result),
            zero: result == 0,
        }
    }

    /// `N`/`Z` derived from `result` plus an explicit carry.
    #[must_use]
    pub const fn nzc(result: u32, carry: bool) -> Self {
        Self::Nzc {
            negative: is_negative(result),
            zero: result == 0,
            carry,
        }
    }

    /// `N`/`Z` derived from `result` plus explicit carry and overflow.
    #[must_use]
    pub const fn nzcv(result: u32, carry: bool, overflow: bool) -> Self {
        Self::Nzcv {
            negative: is_negative(result),
            zero: result == 0,
            carry,
            overflow,
        }
    }

    /// Returns `flags` with this update applied.
    #[must_use]
    pub const fn apply(self, flags: Flags) -> Flags {
        match self {
            Self::None => flags,
            Self::Nz { negative, zero } => Flags {
                negative,
                zero,
                ..flags
            },
            Self::Nzc {
                negative,
                zero,
                carry,
            } => Flags {
                negative,
                zero,
                carry,
                ..flags
            },
            Self::Nzcv {
                negative,
                zero,
                carry,
                overflow,
            } => Flags {
                negative,
                zero,
                carry,
                overflow,
            },
        }
    }
}

const fn is_negative(result: u32) -> bool {
    result & 0x8000_0000 != 0
}
