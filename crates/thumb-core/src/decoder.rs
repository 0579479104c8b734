//! Instruction decoder for the implemented Thumb subset.
//!
//! Decoding walks [`OPCODE_PATTERN_TABLE`](crate::encoding::OPCODE_PATTERN_TABLE)
//! in priority order, then validates the group-specific sub-fields (condition
//! code, register-ALU sub-opcode). Anything outside the subset is reported as a
//! [`TrapCause`].

use crate::encoding::{
    classify_opcode, field_alu_sub_opcode, field_condition, field_imm11, field_imm5, field_imm8,
    field_u3, OpcodeClass,
};
use crate::fault::TrapCause;
use crate::state::{Flags, LowRegister};

/// Branch conditions implemented by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Condition {
    /// Zero set.
    Eq,
    /// Zero clear.
    Ne,
    /// Negative set.
    Mi,
    /// Negative clear.
    Pl,
}

impl Condition {
    /// Converts a 4-bit condition field into an implemented condition.
    #[must_use]
    pub const fn from_u4(bits: u8) -> Option<Self> {
        match bits {
            0x0 => Some(Self::Eq),
            0x1 => Some(Self::Ne),
            0x4 => Some(Self::Mi),
            0x5 => Some(Self::Pl),
            _ => None,
        }
    }

    /// Returns the 4-bit encoding of this condition.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Eq => 0x0,
            Self::Ne => 0x1,
            Self::Mi => 0x4,
            Self::Pl => 0x5,
        }
    }

    /// Evaluates the condition against the current flags.
    #[must_use]
    pub const fn holds(self, flags: Flags) -> bool {
        match self {
            Self::Eq => flags.zero,
            Self::Ne => !flags.zero,
            Self::Mi => flags.negative,
            Self::Pl => !flags.negative,
        }
    }
}

/// Register-ALU sub-operations implemented by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RegisterAluOp {
    /// Bitwise AND.
    And,
    /// Bitwise exclusive OR.
    Eor,
    /// Bitwise OR.
    Orr,
    /// Compare (subtract, flags only).
    Cmp,
}

impl RegisterAluOp {
    /// Converts a 4-bit data-processing sub-opcode into an implemented op.
    #[must_use]
    pub const fn from_u4(bits: u8) -> Option<Self> {
        match bits {
            0x0 => Some(Self::And),
            0x1 => Some(Self::Eor),
            0xA => Some(Self::Cmp),
            0xC => Some(Self::Orr),
            _ => None,
        }
    }

    /// Returns the 4-bit sub-opcode of this operation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::And => 0x0,
            Self::Eor => 0x1,
            Self::Cmp => 0xA,
            Self::Orr => 0xC,
        }
    }
}

/// Decoded micro-operation with only the operand fields its kind uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum DecodedOp {
    /// `B<cond> label`; `imm8` is the raw signed halfword offset.
    ConditionalBranch { condition: Condition, imm8: u8 },
    /// `B label`; `imm11` is the raw signed halfword offset.
    Branch { imm11: u16 },
    /// `LDR rt, [pc, #imm8*4]`.
    LoadLiteral { rt: LowRegister, imm8: u8 },
    /// `LDR rt, [rn, #imm5*4]`.
    LoadIndexed {
        rt: LowRegister,
        rn: LowRegister,
        imm5: u8,
    },
    /// `STR rt, [rn, #imm5*4]`.
    StoreIndexed {
        rt: LowRegister,
        rn: LowRegister,
        imm5: u8,
    },
    /// `MOVS rd, #imm8`.
    MoveImmediate { rd: LowRegister, imm8: u8 },
    /// `CMP rn, #imm8`.
    CompareImmediate { rn: LowRegister, imm8: u8 },
    /// `ADDS rdn, #imm8`.
    AddImmediate { rdn: LowRegister, imm8: u8 },
    /// `SUBS rdn, #imm8`.
    SubtractImmediate { rdn: LowRegister, imm8: u8 },
    /// `LSLS rd, rm, #imm5`.
    ShiftLeftImmediate {
        rd: LowRegister,
        rm: LowRegister,
        imm5: u8,
    },
    /// `LSRS rd, rm, #imm5`.
    ShiftRightImmediate {
        rd: LowRegister,
        rm: LowRegister,
        imm5: u8,
    },
    /// `<op>S rdn, rm` from the data-processing group.
    RegisterAlu {
        op: RegisterAluOp,
        rdn: LowRegister,
        rm: LowRegister,
    },
}

impl DecodedOp {
    /// Re-encodes this micro-op to its 16-bit instruction word.
    ///
    /// Immediate fields wider than their encoding are truncated.
    #[must_use]
    pub fn encode(self) -> u16 {
        let imm5 = |value: u8| (u16::from(value) & 0x1F) << 6;
        let rd8 = |reg: LowRegister| reg.bits() << 8;
        let rn3 = |reg: LowRegister| reg.bits() << 3;

        match self {
            Self::ConditionalBranch { condition, imm8 } => {
                0xD000 | (u16::from(condition.bits()) << 8) | u16::from(imm8)
            }
            Self::Branch { imm11 } => 0xE000 | (imm11 & 0x07FF),
            Self::LoadLiteral { rt, imm8 } => 0x4800 | rd8(rt) | u16::from(imm8),
            Self::LoadIndexed { rt, rn, imm5: imm } => 0x6800 | imm5(imm) | rn3(rn) | rt.bits(),
            Self::StoreIndexed { rt, rn, imm5: imm } => 0x6000 | imm5(imm) | rn3(rn) | rt.bits(),
            Self::MoveImmediate { rd, imm8 } => 0x2000 | rd8(rd) | u16::from(imm8),
            Self::CompareImmediate { rn, imm8 } => 0x2800 | rd8(rn) | u16::from(imm8),
            Self::AddImmediate { rdn, imm8 } => 0x3000 | rd8(rdn) | u16::from(imm8),
            Self::SubtractImmediate { rdn, imm8 } => 0x3800 | rd8(rdn) | u16::from(imm8),
            Self::ShiftLeftImmediate { rd, rm, imm5: imm } => imm5(imm) | rn3(rm) | rd.bits(),
            Self::ShiftRightImmediate { rd, rm, imm5: imm } => {
                0x0800 | imm5(imm) | rn3(rm) | rd.bits()
            }
            Self::RegisterAlu { op, rdn, rm } => {
                0x4000 | (u16::from(op.bits()) << 6) | rn3(rm) | rdn.bits()
            }
        }
    }

    /// Returns `true` for micro-ops that need a data bus transaction.
    #[must_use]
    pub const fn accesses_memory(self) -> bool {
        matches!(
            self,
            Self::LoadLiteral { .. } | Self::LoadIndexed { .. } | Self::StoreIndexed { .. }
        )
    }
}

/// Instruction decoder for the implemented subset.
pub struct Decoder;

impl Decoder {
    /// Decodes a 16-bit instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`TrapCause::DecodeError`] for words outside every decode
    /// pattern, [`TrapCause::ReservedCondition`] for conditional branches with
    /// a condition other than `EQ/NE/MI/PL`, and
    /// [`TrapCause::UnsupportedSubOpcode`] for register-ALU words whose
    /// sub-opcode is not `AND/EOR/ORR/CMP`.
    pub fn decode(word: u16) -> Result<DecodedOp, TrapCause> {
        let Some(class) = classify_opcode(word) else {
            return Err(TrapCause::DecodeError { word });
        };

        let low = LowRegister::from_u3(field_u3(word, 0));
        let mid = LowRegister::from_u3(field_u3(word, 3));
        let high = LowRegister::from_u3(field_u3(word, 8));
        let imm8 = field_imm8(word);
        let imm5 = field_imm5(word);

        let op = match class {
            OpcodeClass::ConditionalBranch => {
                let bits = field_condition(word);
                let Some(condition) = Condition::from_u4(bits) else {
                    return Err(TrapCause::ReservedCondition {
                        word,
                        condition: bits,
                    });
                };
                DecodedOp::ConditionalBranch { condition, imm8 }
            }
            OpcodeClass::Branch => DecodedOp::Branch {
                imm11: field_imm11(word),
            },
            OpcodeClass::LoadLiteral => DecodedOp::LoadLiteral { rt: high, imm8 },
            OpcodeClass::LoadIndexed => DecodedOp::LoadIndexed {
                rt: low,
                rn: mid,
                imm5,
            },
            OpcodeClass::StoreIndexed => DecodedOp::StoreIndexed {
                rt: low,
                rn: mid,
                imm5,
            },
            OpcodeClass::MoveImmediate => DecodedOp::MoveImmediate { rd: high, imm8 },
            OpcodeClass::CompareImmediate => DecodedOp::CompareImmediate { rn: high, imm8 },
            OpcodeClass::AddImmediate => DecodedOp::AddImmediate { rdn: high, imm8 },
            OpcodeClass::SubtractImmediate => DecodedOp::SubtractImmediate { rdn: high, imm8 },
            OpcodeClass::ShiftLeftImmediate => DecodedOp::ShiftLeftImmediate {
                rd: low,
                rm: mid,
                imm5,
            },
            OpcodeClass::ShiftRightImmediate => DecodedOp::ShiftRightImmediate {
                rd: low,
                rm: mid,
                imm5,
            },
            OpcodeClass::RegisterAlu => {
                let sub_opcode = field_alu_sub_opcode(word);
                let Some(op) = RegisterAluOp::from_u4(sub_opcode) else {
                    return Err(TrapCause::UnsupportedSubOpcode { word, sub_opcode });
                };
                DecodedOp::RegisterAlu {
                    op,
                    rdn: low,
                    rm: mid,
                }
            }
        };

        Ok(op)
    }
}
