/// Number of architecturally visible registers (`r0..r15`).
pub const REGISTER_COUNT: usize = 16;
/// Number of low registers addressable by 3-bit operand fields (`r0..r7`).
pub const LOW_REGISTER_COUNT: usize = 8;
/// Register index of the stack pointer (reserved, unused by the subset).
pub const SP_INDEX: usize = 13;
/// Register index of the link register (reserved, unused by the subset).
pub const LR_INDEX: usize = 14;
/// Register index of the program-counter mirror.
pub const PC_INDEX: usize = 15;

/// Low register operand identifier (`r0..r7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum LowRegister {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl LowRegister {
    /// Ordered list of all low registers.
    pub const ALL: [Self; LOW_REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the register-file index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the 3-bit encoding of this register.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Decodes a 3-bit register field. Only the low three bits are used.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match bits & 0x7 {
            0 => Self::R0,
            1 => Self::R1,
            2 => Self::R2,
            3 => Self::R3,
            4 => Self::R4,
            5 => Self::R5,
            6 => Self::R6,
            _ => Self::R7,
        }
    }
}

/// Condition flags of the most recent flag-setting operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct Flags {
    /// Result sign bit.
    pub negative: bool,
    /// Result equal to zero.
    pub zero: bool,
    /// Unsigned carry out, or "no borrow" for subtraction.
    pub carry: bool,
    /// Signed overflow.
    pub overflow: bool,
}

impl Flags {
    /// Packs the flags into the `NZCV` nibble (`N` in bit 3).
    #[must_use]
    pub const fn nzcv(self) -> u8 {
        ((self.negative as u8) << 3)
            | ((self.zero as u8) << 2)
            | ((self.carry as u8) << 1)
            | (self.overflow as u8)
    }
}

/// Register file, dedicated program counter, and flags.
///
/// The dedicated program counter is owned by the control unit. Register 15 is
/// a mirror refreshed from it at the end of every cycle and can only be
/// written through [`ArchitecturalState::refresh_pc_mirror`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    regs: [u32; REGISTER_COUNT],
    pc: u32,
    flags: Flags,
}

impl ArchitecturalState {
    /// Reads a low register.
    #[must_use]
    pub const fn gpr(&self, reg: LowRegister) -> u32 {
        self.regs[reg.index()]
    }

    /// Writes a low register.
    pub const fn set_gpr(&mut self, reg: LowRegister, value: u32) {
        self.regs[reg.index()] = value;
    }

    /// Reads any register by index (`0..=15`). Out-of-range indices read zero.
    #[must_use]
    pub fn register(&self, index: usize) -> u32 {
        self.regs.get(index).copied().unwrap_or(0)
    }

    /// Returns the whole register file.
    #[must_use]
    pub const fn registers(&self) -> &[u32; REGISTER_COUNT] {
        &self.regs
    }

    /// Reads the dedicated program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the dedicated program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Copies the dedicated program counter into register 15.
    pub const fn refresh_pc_mirror(&mut self) {
        self.regs[PC_INDEX] = self.pc;
    }

    /// Reads the condition flags.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        self.flags
    }

    /// Writes the condition flags.
    pub const fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }
}
