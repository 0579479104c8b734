//! Execution engine: per-micro-op semantics.
//!
//! [`ExecutionEngine::execute`] is pure. It reads operands from the
//! architectural state and returns an [`ExecuteState`] describing every side
//! effect. The control unit applies that state with [`commit_execution`] and,
//! for loads, later writes the returned bus data with [`commit_load`].

mod alu;
mod flags;

pub use alu::{add_with_flags, shift_left, shift_right, sign_extend, sub_with_flags};
pub use flags::FlagsUpdate;

use crate::api::ShiftByZeroPolicy;
use crate::bus::BusRequest;
use crate::decoder::{DecodedOp, RegisterAluOp};
use crate::state::{ArchitecturalState, LowRegister};

/// Direction and payload of a data bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryAccessKind {
    /// Read a word into `rt`.
    Load {
        /// Destination register.
        rt: LowRegister,
    },
    /// Write `value`.
    Store {
        /// Word to write.
        value: u32,
    },
}

/// Data bus transaction produced by a load or store micro-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryAccess {
    /// Effective byte address.
    pub address: u32,
    /// Load or store payload.
    pub kind: MemoryAccessKind,
}

impl MemoryAccess {
    /// Returns the bus request that carries this access.
    #[must_use]
    pub const fn request(&self) -> BusRequest {
        match self.kind {
            MemoryAccessKind::Load { .. } => BusRequest::read(self.address),
            MemoryAccessKind::Store { value } => BusRequest::write(self.address, value),
        }
    }

    /// Returns `true` for stores.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self.kind, MemoryAccessKind::Store { .. })
    }
}

/// Side effects accumulated while executing one micro-op.
///
/// Nothing here touches architectural state until [`commit_execution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExecuteState {
    /// Register write-back.
    pub dest: Option<(LowRegister, u32)>,
    /// Flag update to apply.
    pub flags_update: FlagsUpdate,
    /// Redirected program counter for taken branches.
    pub next_pc: Option<u32>,
    /// Data bus transaction still to perform.
    pub memory: Option<MemoryAccess>,
}

impl ExecuteState {
    /// Returns `true` when the micro-op redirected the program counter.
    #[must_use]
    pub const fn branch_taken(&self) -> bool {
        self.next_pc.is_some()
    }
}

/// Computes micro-op results under a fixed shift-by-zero policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExecutionEngine {
    shift_by_zero: ShiftByZeroPolicy,
}

impl ExecutionEngine {
    /// Creates an engine. The policy is fixed for the life of the engine.
    #[must_use]
    pub const fn new(shift_by_zero: ShiftByZeroPolicy) -> Self {
        Self { shift_by_zero }
    }

    /// Returns the shift-by-zero policy this engine was built with.
    #[must_use]
    pub const fn shift_by_zero(&self) -> ShiftByZeroPolicy {
        self.shift_by_zero
    }

    /// Computes the side effects of `op` against `arch`.
    ///
    /// `arch.pc()` must already point past the instruction, as it does after
    /// the fetch that produced `op`.
    #[must_use]
    pub fn execute(&self, op: &DecodedOp, arch: &ArchitecturalState) -> ExecuteState {
        let pc = arch.pc();
        let mut exec = ExecuteState::default();

        match *op {
            DecodedOp::MoveImmediate { rd, imm8 } => {
                let value = u32::from(imm8);
                exec.dest = Some((rd, value));
                exec.flags_update = FlagsUpdate::nz(value);
            }
            DecodedOp::CompareImmediate { rn, imm8 } => {
                let (result, carry, overflow) = sub_with_flags(arch.gpr(rn), u32::from(imm8));
                exec.flags_update = FlagsUpdate::nzcv(result, carry, overflow);
            }
            DecodedOp::AddImmediate { rdn, imm8 } => {
                let (result, carry, overflow) = add_with_flags(arch.gpr(rdn), u32::from(imm8));
                exec.dest = Some((rdn, result));
                exec.flags_update = FlagsUpdate::nzcv(result, carry, overflow);
            }
            DecodedOp::SubtractImmediate { rdn, imm8 } => {
                let (result, carry, overflow) = sub_with_flags(arch.gpr(rdn), u32::from(imm8));
                exec.dest = Some((rdn, result));
                exec.flags_update = FlagsUpdate::nzcv(result, carry, overflow);
            }
            DecodedOp::ShiftLeftImmediate { rd, rm, imm5 } => {
                let (result, carry) = shift_left(arch.gpr(rm), imm5);
                exec.dest = Some((rd, result));
                exec.flags_update = shift_flags(result, carry);
            }
            DecodedOp::ShiftRightImmediate { rd, rm, imm5 } => {
                let (result, carry) = shift_right(arch.gpr(rm), imm5, self.shift_by_zero);
                exec.dest = Some((rd, result));
                exec.flags_update = shift_flags(result, carry);
            }
            DecodedOp::RegisterAlu { op, rdn, rm } => {
                let (a, b) = (arch.gpr(rdn), arch.gpr(rm));
                let logical = |result: u32| (Some((rdn, result)), FlagsUpdate::nz(result));
                let (dest, flags_update) = match op {
                    RegisterAluOp::And => logical(a & b),
                    RegisterAluOp::Eor => logical(a ^ b),
                    RegisterAluOp::Orr => logical(a | b),
                    RegisterAluOp::Cmp => {
                        let (result, carry, overflow) = sub_with_flags(a, b);
                        (None, FlagsUpdate::nzcv(result, carry, overflow))
                    }
                };
                exec.dest = dest;
                exec.flags_update = flags_update;
            }
            DecodedOp::LoadLiteral { rt, imm8 } => {
                exec.memory = Some(MemoryAccess {
                    address: literal_address(pc, imm8),
                    kind: MemoryAccessKind::Load { rt },
                });
            }
            DecodedOp::LoadIndexed { rt, rn, imm5 } => {
                exec.memory = Some(MemoryAccess {
                    address: indexed_address(arch.gpr(rn), imm5),
                    kind: MemoryAccessKind::Load { rt },
                });
            }
            DecodedOp::StoreIndexed { rt, rn, imm5 } => {
                exec.memory = Some(MemoryAccess {
                    address: indexed_address(arch.gpr(rn), imm5),
                    kind: MemoryAccessKind::Store {
                        value: arch.gpr(rt),
                    },
                });
            }
            DecodedOp::Branch { imm11 } => {
                exec.next_pc = Some(branch_target(pc, u32::from(imm11), 12));
            }
            DecodedOp::ConditionalBranch { condition, imm8 } => {
                if condition.holds(arch.flags()) {
                    exec.next_pc = Some(branch_target(pc, u32::from(imm8), 9));
                }
            }
        }

        exec
    }
}

/// Applies register, flag, and program-counter effects of an executed op.
///
/// Memory effects are carried out by the control unit over the bus.
pub fn commit_execution(arch: &mut ArchitecturalState, exec: &ExecuteState) {
    if let Some((reg, value)) = exec.dest {
        arch.set_gpr(reg, value);
    }
    arch.set_flags(exec.flags_update.apply(arch.flags()));
    if let Some(pc) = exec.next_pc {
        arch.set_pc(pc);
    }
}

/// Writes the data returned for a completed load. Stores are ignored.
pub fn commit_load(arch: &mut ArchitecturalState, access: &MemoryAccess, data: u32) {
    if let MemoryAccessKind::Load { rt } = access.kind {
        arch.set_gpr(rt, data);
    }
}

const fn shift_flags(result: u32, carry: Option<bool>) -> FlagsUpdate {
    match carry {
        Some(carry) => FlagsUpdate::nzc(result, carry),
        None => FlagsUpdate::nz(result),
    }
}

const fn literal_address(pc: u32, imm8: u8) -> u32 {
    (pc & !3).wrapping_add((imm8 as u32) * 4)
}

const fn indexed_address(base: u32, imm5: u8) -> u32 {
    base.wrapping_add((imm5 as u32) * 4)
}

/// `offset` is a halfword count occupying `bits - 1` bits before scaling.
const fn branch_target(pc: u32, offset: u32, bits: u32) -> u32 {
    pc.wrapping_add(sign_extend(offset << 1, bits))
}
