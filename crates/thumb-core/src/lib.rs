//! Cycle-accurate multi-cycle core for a Thumb-1 instruction subset.
//!
//! The core is a synchronous state machine clocked one cycle at a time
//! against a valid/ready memory bus. [`System`] wires the control unit to a
//! bus backend; [`WordMemory`] is the reference store.

/// Host-facing configuration, trace hooks, and run-loop contracts.
pub mod api;
pub use api::{
    CoreConfig, NullSink, Retired, RunBoundary, RunOutcome, ShiftByZeroPolicy, StepOutcome,
    TraceEvent, TraceSink,
};

/// Memory bus handshake contract and reference store.
pub mod bus;
pub use bus::{
    pack_halfwords, BusRequest, BusResponse, MemoryBus, WordMemory, DEFAULT_MEMORY_WORDS,
    WRITE_MASK_ALL,
};

/// Architectural register, flag, and control-state model.
pub mod state;
pub use state::{
    ArchitecturalState, ControlState, Flags, LowRegister, LOW_REGISTER_COUNT, LR_INDEX, PC_INDEX,
    REGISTER_COUNT, SP_INDEX,
};

/// Instruction decode table and field extraction helpers.
pub mod encoding;
pub use encoding::{classify_opcode, OpcodeClass, OPCODE_PATTERN_TABLE};

/// Instruction decoder producing micro-ops.
pub mod decoder;
pub use decoder::{Condition, DecodedOp, Decoder, RegisterAluOp};

/// Trap taxonomy.
pub mod fault;
pub use fault::{TrapCause, TrapClass};

/// Micro-op semantics and commit helpers.
pub mod execute;
pub use execute::{
    commit_execution, commit_load, ExecuteState, ExecutionEngine, FlagsUpdate, MemoryAccess,
    MemoryAccessKind,
};

/// Per-cycle control unit.
pub mod control;
pub use control::{clock, ClockOutcome, CoreState};

/// Diagnostic counters.
pub mod diag;
pub use diag::{Diagnostics, TrapRecord};

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_at, disassemble_window, DisassemblyRow};

/// Core and bus clocked together.
pub mod system;
pub use system::System;

#[cfg(test)]
use proptest as _;
