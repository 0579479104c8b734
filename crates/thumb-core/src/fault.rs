use thiserror::Error;

use crate::encoding::{condition_mnemonic, data_processing_mnemonic};

/// Trap classes used for diagnostics aggregation and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum TrapClass {
    /// Instruction word matched no decode pattern.
    Decode = 0x01,
    /// Register-ALU group with an unimplemented sub-opcode.
    SubOpcode = 0x02,
    /// Conditional branch with a condition outside `EQ/NE/MI/PL`.
    Condition = 0x03,
}

impl TrapClass {
    /// Converts a trap class to its stable diagnostic code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable diagnostic code back into a trap class.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::Decode),
            0x02 => Some(Self::SubOpcode),
            0x03 => Some(Self::Condition),
            _ => None,
        }
    }
}

/// Reason the core entered the terminal `Trap` state.
///
/// All causes have identical runtime behavior: the core halts and never
/// resumes. They differ only in what diagnostics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TrapCause {
    /// The instruction word matches no pattern of the implemented subset.
    #[error("undefined instruction encoding {word:#06x}")]
    DecodeError {
        /// Raw instruction word.
        word: u16,
    },
    /// Register-ALU encoding whose sub-opcode is not implemented.
    #[error(
        "unsupported register-ALU sub-opcode {sub_opcode:#x} ({}) in {word:#06x}",
        sub_opcode_name(.sub_opcode)
    )]
    UnsupportedSubOpcode {
        /// Raw instruction word.
        word: u16,
        /// 4-bit data-processing sub-opcode.
        sub_opcode: u8,
    },
    /// Conditional branch encoding with an unimplemented condition code.
    #[error(
        "reserved condition code {condition:#x} ({}) in {word:#06x}",
        condition_name(.condition)
    )]
    ReservedCondition {
        /// Raw instruction word.
        word: u16,
        /// 4-bit condition field.
        condition: u8,
    },
}

impl TrapCause {
    /// Returns the diagnostics class for this cause.
    #[must_use]
    pub const fn class(self) -> TrapClass {
        match self {
            Self::DecodeError { .. } => TrapClass::Decode,
            Self::UnsupportedSubOpcode { .. } => TrapClass::SubOpcode,
            Self::ReservedCondition { .. } => TrapClass::Condition,
        }
    }

    /// Returns the instruction word that caused the trap.
    #[must_use]
    pub const fn word(self) -> u16 {
        match self {
            Self::DecodeError { word }
            | Self::UnsupportedSubOpcode { word, .. }
            | Self::ReservedCondition { word, .. } => word,
        }
    }
}

fn sub_opcode_name(sub_opcode: &u8) -> &'static str {
    data_processing_mnemonic(*sub_opcode)
}

fn condition_name(condition: &u8) -> &'static str {
    condition_mnemonic(*condition)
}
