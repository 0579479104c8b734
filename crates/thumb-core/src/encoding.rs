/// Instruction groups recognised by the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum OpcodeClass {
    ConditionalBranch,
    Branch,
    LoadLiteral,
    LoadIndexed,
    StoreIndexed,
    MoveImmediate,
    CompareImmediate,
    AddImmediate,
    SubtractImmediate,
    ShiftLeftImmediate,
    ShiftRightImmediate,
    RegisterAlu,
}

/// Single source-of-truth `(mask, value, class)` decode table in priority order.
///
/// The first entry with `word & mask == value` wins. Any word that matches no
/// entry is an undefined encoding.
pub const OPCODE_PATTERN_TABLE: &[(u16, u16, OpcodeClass)] = &[
    (0xF000, 0xD000, OpcodeClass::ConditionalBranch),
    (0xF800, 0xE000, OpcodeClass::Branch),
    (0xF800, 0x4800, OpcodeClass::LoadLiteral),
    (0xF800, 0x6800, OpcodeClass::LoadIndexed),
    (0xF800, 0x6000, OpcodeClass::StoreIndexed),
    (0xF800, 0x2000, OpcodeClass::MoveImmediate),
    (0xF800, 0x2800, OpcodeClass::CompareImmediate),
    (0xF800, 0x3000, OpcodeClass::AddImmediate),
    (0xF800, 0x3800, OpcodeClass::SubtractImmediate),
    (0xF800, 0x0000, OpcodeClass::ShiftLeftImmediate),
    (0xF800, 0x0800, OpcodeClass::ShiftRightImmediate),
    (0xFC00, 0x4000, OpcodeClass::RegisterAlu),
];

/// Returns the instruction group for a 16-bit word.
///
/// `None` means the word is outside the implemented subset.
#[must_use]
pub fn classify_opcode(word: u16) -> Option<OpcodeClass> {
    OPCODE_PATTERN_TABLE
        .iter()
        .find_map(|(mask, value, class)| ((word & *mask) == *value).then_some(*class))
}

/// Architectural condition-code mnemonics indexed by the 4-bit field.
pub const CONDITION_MNEMONICS: [&str; 16] = [
    "EQ", "NE", "HS", "LO", "MI", "PL", "VS", "VC", "HI", "LS", "GE", "LT", "GT", "LE", "AL",
    "SVC",
];

/// Architectural data-processing mnemonics indexed by the 4-bit sub-opcode.
pub const DATA_PROCESSING_MNEMONICS: [&str; 16] = [
    "AND", "EOR", "LSL", "LSR", "ASR", "ADC", "SBC", "ROR", "TST", "NEG", "CMP", "CMN", "ORR",
    "MUL", "BIC", "MVN",
];

/// Returns the architectural mnemonic for a 4-bit condition field.
#[must_use]
pub const fn condition_mnemonic(condition: u8) -> &'static str {
    CONDITION_MNEMONICS[(condition & 0x0F) as usize]
}

/// Returns the architectural mnemonic for a 4-bit data-processing sub-opcode.
#[must_use]
pub const fn data_processing_mnemonic(sub_opcode: u8) -> &'static str {
    DATA_PROCESSING_MNEMONICS[(sub_opcode & 0x0F) as usize]
}

/// Extracts the 3-bit field at `shift`.
#[must_use]
pub const fn field_u3(word: u16, shift: u32) -> u8 {
    ((word >> shift) & 0x7) as u8
}

/// Extracts the 5-bit immediate at bits `[10:6]`.
#[must_use]
pub const fn field_imm5(word: u16) -> u8 {
    ((word >> 6) & 0x1F) as u8
}

/// Extracts the 8-bit immediate at bits `[7:0]`.
#[must_use]
pub const fn field_imm8(word: u16) -> u8 {
    (word & 0xFF) as u8
}

/// Extracts the 4-bit field at bits `[11:8]` (branch condition).
#[must_use]
pub const fn field_condition(word: u16) -> u8 {
    ((word >> 8) & 0xF) as u8
}

/// Extracts the 4-bit field at bits `[9:6]` (register-ALU sub-opcode).
#[must_use]
pub const fn field_alu_sub_opcode(word: u16) -> u8 {
    ((word >> 6) & 0xF) as u8
}

/// Extracts the 11-bit immediate at bits `[10:0]`.
#[must_use]
pub const fn field_imm11(word: u16) -> u16 {
    word & 0x07FF
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        classify_opcode, condition_mnemonic, data_processing_mnemonic, field_alu_sub_opcode,
        field_condition, field_imm11, field_imm5, field_imm8, field_u3, OpcodeClass,
        OPCODE_PATTERN_TABLE,
    };

    #[test]
    fn table_contains_unique_patterns() {
        let patterns: HashSet<_> = OPCODE_PATTERN_TABLE
            .iter()
            .map(|(mask, value, _)| (*mask, *value))
            .collect();
        assert_eq!(patterns.len(), OPCODE_PATTERN_TABLE.len());
    }

    #[test]
    fn every_pattern_value_lies_inside_its_mask() {
        for (mask, value, class) in OPCODE_PATTERN_TABLE {
            assert_eq!(value & !mask, 0, "{class:?} value has bits outside its mask");
        }
    }

    #[test]
    fn patterns_are_mutually_exclusive() {
        for word in 0u16..=u16::MAX {
            let hits = OPCODE_PATTERN_TABLE
                .iter()
                .filter(|(mask, value, _)| word & mask == *value)
                .count();
            assert!(hits <= 1, "word {word:#06x} matches {hits} patterns");
        }
    }

    #[test]
    fn lookup_matches_known_encodings() {
        assert_eq!(classify_opcode(0x2005), Some(OpcodeClass::MoveImmediate));
        assert_eq!(classify_opcode(0x3007), Some(OpcodeClass::AddImmediate));
        assert_eq!(classify_opcode(0x3802), Some(OpcodeClass::SubtractImmediate));
        assert_eq!(classify_opcode(0x2800), Some(OpcodeClass::CompareImmediate));
        assert_eq!(classify_opcode(0x0209), Some(OpcodeClass::ShiftLeftImmediate));
        assert_eq!(classify_opcode(0x0848), Some(OpcodeClass::ShiftRightImmediate));
        assert_eq!(classify_opcode(0x6008), Some(OpcodeClass::StoreIndexed));
        assert_eq!(classify_opcode(0x6808), Some(OpcodeClass::LoadIndexed));
        assert_eq!(classify_opcode(0x4803), Some(OpcodeClass::LoadLiteral));
        assert_eq!(classify_opcode(0x4048), Some(OpcodeClass::RegisterAlu));
        assert_eq!(classify_opcode(0xD1FC), Some(OpcodeClass::ConditionalBranch));
        assert_eq!(classify_opcode(0xE7FF), Some(OpcodeClass::Branch));
    }

    #[test]
    fn unimplemented_groups_are_unclassified() {
        // ASR imm, ADD/SUB reg, hi-register ops, STRB, PUSH, BL prefix.
        for word in [0x1000, 0x1800, 0x4400, 0x7000, 0xB400, 0xF000] {
            assert_eq!(classify_opcode(word), None, "{word:#06x}");
        }
    }

    #[test]
    fn field_extraction_matches_bit_layout() {
        let word = 0b0110_1101_0111_0101_u16;
        assert_eq!(field_imm5(word), 0b10101);
        assert_eq!(field_u3(word, 3), 0b110);
        assert_eq!(field_u3(word, 0), 0b101);
        assert_eq!(field_u3(word, 8), 0b101);
        assert_eq!(field_imm8(word), 0x75);
        assert_eq!(field_condition(0xD4AA), 0x4);
        assert_eq!(field_alu_sub_opcode(0x4340), 0xD);
        assert_eq!(field_imm11(0xE7FF), 0x7FF);
    }

    #[test]
    fn mnemonic_tables_cover_full_encoding_space() {
        assert_eq!(condition_mnemonic(0x0), "EQ");
        assert_eq!(condition_mnemonic(0x5), "PL");
        assert_eq!(condition_mnemonic(0xF), "SVC");
        assert_eq!(data_processing_mnemonic(0x0), "AND");
        assert_eq!(data_processing_mnemonic(0xA), "CMP");
        assert_eq!(data_processing_mnemonic(0xC), "ORR");
        assert_eq!(data_processing_mnemonic(0xF), "MVN");
    }
}
