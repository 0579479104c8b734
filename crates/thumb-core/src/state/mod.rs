//! Architectural CPU state and control-unit state primitives.

/// Register file, program counter, and flags.
pub mod registers;
/// Control-unit state machine states.
pub mod run_state;

pub use registers::{
    ArchitecturalState, Flags, LowRegister, LOW_REGISTER_COUNT, LR_INDEX, PC_INDEX,
    REGISTER_COUNT, SP_INDEX,
};
pub use run_state::ControlState;
