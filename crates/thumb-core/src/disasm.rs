//! Instruction disassembly for the implemented Thumb subset.
//!
//! Text follows UAL spelling (`MOVS r0, #5`, `LDR r0, [pc, #12]`). Words that
//! would trap are rendered as `.hword 0xXXXX ; <reason>`.

use std::fmt::Write as _;

use crate::bus::WordMemory;
use crate::decoder::{DecodedOp, Decoder, RegisterAluOp};
use crate::encoding::condition_mnemonic;
use crate::execute::sign_extend;
use crate::fault::TrapCause;
use crate::state::LowRegister;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the instruction.
    pub address: u32,
    /// Raw 16-bit instruction word.
    pub word: u16,
    /// Rendered instruction text.
    pub text: String,
    /// Trap the word would raise, if it is outside the subset.
    pub trap: Option<TrapCause>,
}

/// Disassembles `word` without a known address.
///
/// Branch targets are shown as a signed byte offset from the advanced program
/// counter, e.g. `B #-2` for a branch to self.
#[must_use]
pub fn disassemble(word: u16) -> String {
    render(None, word)
}

/// Disassembles `word` located at `address`, resolving branch targets.
#[must_use]
pub fn disassemble_at(address: u32, word: u16) -> String {
    render(Some(address), word)
}

/// Disassembles `count` consecutive halfwords starting at `address`.
///
/// `address` is rounded down to a halfword boundary. The listing stops at
/// the end of the store.
#[must_use]
pub fn disassemble_window(memory: &WordMemory, address: u32, count: usize) -> Vec<DisassemblyRow> {
    let mut address = address & !1;
    let start = usize::try_from(address / 2).unwrap_or(usize::MAX);
    let count = count.min((memory.len_words() * 2).saturating_sub(start));
    let mut rows = Vec::with_capacity(count);

    for _ in 0..count {
        let word = halfword_at(memory, address);
        rows.push(DisassemblyRow {
            address,
            word,
            text: disassemble_at(address, word),
            trap: Decoder::decode(word).err(),
        });
        address = address.wrapping_add(2);
    }

    rows
}

#[allow(clippy::cast_possible_truncation)]
fn halfword_at(memory: &WordMemory, address: u32) -> u16 {
    let word = memory.read_word(address);
    let half = if address & 0b10 == 0 { word } else { word >> 16 };
    half as u16
}

fn render(address: Option<u32>, word: u16) -> String {
    let op = match Decoder::decode(word) {
        Ok(op) => op,
        Err(cause) => return format!(".hword {word:#06x} ; {cause}"),
    };

    let r = |reg: LowRegister| format!("r{}", reg.index());
    let target = |offset: u32, bits: u32| {
        let delta = sign_extend(offset << 1, bits);
        match address {
            Some(address) => format!("{:#010x}", address.wrapping_add(2).wrapping_add(delta)),
            #[allow(clippy::cast_possible_wrap)]
            None => format!("#{}", delta as i32),
        }
    };

    match op {
        DecodedOp::ConditionalBranch { condition, imm8 } => format!(
            "B{} {}",
            condition_mnemonic(condition.bits()),
            target(u32::from(imm8), 9)
        ),
        DecodedOp::Branch { imm11 } => format!("B {}", target(u32::from(imm11), 12)),
        DecodedOp::LoadLiteral { rt, imm8 } => {
            let mut text = format!("LDR {}, [pc, #{}]", r(rt), u32::from(imm8) * 4);
            if let Some(address) = address {
                let literal = (address.wrapping_add(2) & !3).wrapping_add(u32::from(imm8) * 4);
                let _ = write!(text, " ; {literal:#010x}");
            }
            text
        }
        DecodedOp::LoadIndexed { rt, rn, imm5 } => {
            format!("LDR {}, {}", r(rt), indexed(rn, imm5))
        }
        DecodedOp::StoreIndexed { rt, rn, imm5 } => {
            format!("STR {}, {}", r(rt), indexed(rn, imm5))
        }
        DecodedOp::MoveImmediate { rd, imm8 } => format!("MOVS {}, #{imm8}", r(rd)),
        DecodedOp::CompareImmediate { rn, imm8 } => format!("CMP {}, #{imm8}", r(rn)),
        DecodedOp::AddImmediate { rdn, imm8 } => format!("ADDS {}, #{imm8}", r(rdn)),
        DecodedOp::SubtractImmediate { rdn, imm8 } => format!("SUBS {}, #{imm8}", r(rdn)),
        DecodedOp::ShiftLeftImmediate { rd, rm, imm5 } => {
            format!("LSLS {}, {}, #{imm5}", r(rd), r(rm))
        }
        DecodedOp::ShiftRightImmediate { rd, rm, imm5 } => {
            format!("LSRS {}, {}, #{imm5}", r(rd), r(rm))
        }
        DecodedOp::RegisterAlu { op, rdn, rm } => {
            let mnemonic = match op {
                RegisterAluOp::And => "ANDS",
                RegisterAluOp::Eor => "EORS",
                RegisterAluOp::Orr => "ORRS",
                RegisterAluOp::Cmp => "CMP",
            };
            format!("{mnemonic} {}, {}", r(rdn), r(rm))
        }
    }
}

fn indexed(rn: LowRegister, imm5: u8) -> String {
    if imm5 == 0 {
        format!("[r{}]", rn.index())
    } else {
        format!("[r{}, #{}]", rn.index(), u32::from(imm5) * 4)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{disassemble, disassemble_at, disassemble_window};
    use crate::bus::{pack_halfwords, WordMemory};
    use crate::TrapCause;

    #[rstest]
    #[case(0x2005, "MOVS r0, #5")]
    #[case(0x3007, "ADDS r0, #7")]
    #[case(0x3802, "SUBS r0, #2")]
    #[case(0x2800, "CMP r0, #0")]
    #[case(0x0209, "LSLS r1, r1, #8")]
    #[case(0x0848, "LSRS r0, r1, #1")]
    #[case(0x6008, "STR r0, [r1]")]
    #[case(0x684A, "LDR r2, [r1, #4]")]
    #[case(0x4803, "LDR r0, [pc, #12]")]
    #[case(0x4048, "EORS r0, r1")]
    #[case(0x4008, "ANDS r0, r1")]
    #[case(0x4308, "ORRS r0, r1")]
    #[case(0x4288, "CMP r0, r1")]
    #[case(0xE7FF, "B #-2")]
    #[case(0xD1FC, "BNE #-8")]
    fn renders_ual_text(#[case] word: u16, #[case] text: &str) {
        assert_eq!(disassemble(word), text);
    }

    #[test]
    fn resolves_branch_targets_and_literals_with_address() {
        assert_eq!(disassemble_at(0x0C, 0xE7FF), "B 0x0000000c");
        assert_eq!(disassemble_at(0x0A, 0xD1FC), "BNE 0x00000004");
        assert_eq!(disassemble_at(0x02, 0x4802), "LDR r0, [pc, #8] ; 0x0000000c");
    }

    #[test]
    fn trapping_words_render_as_data_with_reason() {
        assert_eq!(
            disassemble(0x4340),
            ".hword 0x4340 ; unsupported register-ALU sub-opcode 0xd (MUL) in 0x4340"
        );
        assert_eq!(
            disassemble(0xB000),
            ".hword 0xb000 ; undefined instruction encoding 0xb000"
        );
    }

    #[test]
    fn window_walks_halfwords_in_execution_order() {
        let memory = WordMemory::with_image(&pack_halfwords(&[0x2005, 0x4340, 0xE7FF]));
        let rows = disassemble_window(&memory, 1, 3);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].address, 0);
        assert_eq!(rows[0].text, "MOVS r0, #5");
        assert_eq!(rows[1].word, 0x4340);
        assert_eq!(
            rows[1].trap,
            Some(TrapCause::UnsupportedSubOpcode {
                word: 0x4340,
                sub_opcode: 0xD,
            })
        );
        assert_eq!(rows[2].text, "B 0x00000004");
    }

    #[test]
    fn window_stops_at_the_end_of_the_store() {
        let memory = WordMemory::new(2);
        assert_eq!(disassemble_window(&memory, 4, usize::MAX).len(), 2);
        assert_eq!(disassemble_window(&memory, 6, 10)[0].address, 6);
        assert!(disassemble_window(&memory, 8, 1).is_empty());
        assert!(disassemble_window(&memory, u32::MAX, usize::MAX).is_empty());
    }
}
