//! Control unit: the per-cycle state machine that drives the bus.
//!
//! Each call to [`clock`] consumes the bus response to the request driven
//! during the current cycle and returns the request for the next cycle.
//! Instructions are strictly serialized: fetch, decode, execute, and the
//! optional memory phase of one instruction complete before the next fetch.

use tracing::{debug, trace, warn};

use crate::api::{Retired, StepOutcome, TraceEvent, TraceSink};
use crate::bus::{BusRequest, BusResponse};
use crate::decoder::{DecodedOp, Decoder};
use crate::diag::Diagnostics;
use crate::disasm::disassemble_at;
use crate::execute::{
    commit_execution, commit_load, ExecutionEngine, MemoryAccess, MemoryAccessKind,
};
use crate::state::{ArchitecturalState, ControlState};

/// Complete host-visible core state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Register file, program counter, and flags.
    pub arch: ArchitecturalState,
    /// State the next cycle starts in.
    pub control: ControlState,
    /// Most recently latched instruction word.
    pub instruction: u16,
    /// Address the latched instruction was fetched from.
    pub instruction_pc: u32,
    /// Micro-op produced by the last decode.
    pub decoded: Option<DecodedOp>,
    /// Data transaction bridging `Execute` and `AwaitMemory`.
    pub pending: Option<MemoryAccess>,
    /// Performance and trap counters.
    pub diag: Diagnostics,
}

impl CoreState {
    /// Returns the core to `Reset`. Architectural state is cleared on the
    /// following cycle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns the trap cause when the core has halted.
    #[must_use]
    pub const fn trap_cause(&self) -> Option<crate::TrapCause> {
        self.control.trap_cause()
    }
}

/// Result of one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOutcome {
    /// Request to drive on the bus during the next cycle.
    pub request: BusRequest,
    /// What the cycle accomplished.
    pub step: StepOutcome,
}

impl ClockOutcome {
    const fn busy(request: BusRequest) -> Self {
        Self {
            request,
            step: StepOutcome::Busy,
        }
    }
}

/// Advances the control unit by one cycle.
///
/// `response` is the bus reply to the request returned by the previous call
/// (or [`BusRequest::IDLE`] after reset). The program-counter mirror in
/// register 15 is refreshed before returning, whatever the state.
pub fn clock(
    state: &mut CoreState,
    engine: &ExecutionEngine,
    response: BusResponse,
    sink: &mut dyn TraceSink,
) -> ClockOutcome {
    let cycle = state.diag.cycles;
    let from = state.control;

    let outcome = match from {
        ControlState::Reset => {
            state.arch = ArchitecturalState::default();
            state.pending = None;
            state.decoded = None;
            state.control = ControlState::Fetch;
            ClockOutcome::busy(BusRequest::IDLE)
        }
        ControlState::Fetch => {
            let pc = state.arch.pc();
            state.arch.set_pc(pc.wrapping_add(2));
            state.control = ControlState::AwaitInstruction;
            ClockOutcome::busy(BusRequest::read(pc))
        }
        ControlState::AwaitInstruction => await_instruction(state, response, sink),
        ControlState::Decode => decode(state, sink),
        ControlState::Execute => execute(state, engine, sink),
        ControlState::MemAccess => match state.pending {
            Some(access) => {
                state.control = ControlState::AwaitMemory;
                ClockOutcome::busy(access.request())
            }
            None => {
                state.control = ControlState::Fetch;
                ClockOutcome::busy(BusRequest::IDLE)
            }
        },
        ControlState::AwaitMemory => await_memory(state, response, sink),
        ControlState::Trap(cause) => ClockOutcome {
            request: BusRequest::IDLE,
            step: StepOutcome::Trapped(cause),
        },
    };

    if state.control != from {
        trace!(cycle, ?from, to = ?state.control, "state transition");
        sink.on_event(TraceEvent::StateTransition {
            cycle,
            from,
            to: state.control,
        });
    }

    state.diag.record_cycle();
    state.arch.refresh_pc_mirror();
    outcome
}

fn await_instruction(
    state: &mut CoreState,
    response: BusResponse,
    sink: &mut dyn TraceSink,
) -> ClockOutcome {
    let fetch_address = state.arch.pc().wrapping_sub(2);
    if !response.ready {
        state.diag.record_fetch_wait();
        return ClockOutcome::busy(BusRequest::read(fetch_address));
    }

    let word = if fetch_address & 0b10 == 0 {
        response.read_data & 0xFFFF
    } else {
        response.read_data >> 16
    };
    #[allow(clippy::cast_possible_truncation)]
    let word = word as u16;

    state.instruction = word;
    state.instruction_pc = fetch_address;
    state.control = ControlState::Decode;
    sink.on_event(TraceEvent::InstructionFetched {
        pc: fetch_address,
        word,
    });
    ClockOutcome::busy(BusRequest::IDLE)
}

fn decode(state: &mut CoreState, sink: &mut dyn TraceSink) -> ClockOutcome {
    match Decoder::decode(state.instruction) {
        Ok(op) => {
            state.decoded = Some(op);
            state.control = ControlState::Execute;
            ClockOutcome::busy(BusRequest::IDLE)
        }
        Err(cause) => {
            let pc = state.instruction_pc;
            warn!("core trapped at {pc:#010x}: {cause}");
            state.decoded = None;
            state.diag.record_trap(cause, pc);
            state.control = ControlState::Trap(cause);
            sink.on_event(TraceEvent::Trapped { pc, cause });
            ClockOutcome {
                request: BusRequest::IDLE,
                step: StepOutcome::Trapped(cause),
            }
        }
    }
}

fn execute(
    state: &mut CoreState,
    engine: &ExecutionEngine,
    sink: &mut dyn TraceSink,
) -> ClockOutcome {
    let Some(op) = state.decoded else {
        state.control = ControlState::Fetch;
        return ClockOutcome::busy(BusRequest::IDLE);
    };

    let exec = engine.execute(&op, &state.arch);
    commit_execution(&mut state.arch, &exec);

    if let Some(access) = exec.memory {
        state.pending = Some(access);
        state.control = ControlState::MemAccess;
        return ClockOutcome::busy(BusRequest::IDLE);
    }

    state.diag.record_retired(exec.branch_taken());
    state.control = ControlState::Fetch;
    ClockOutcome {
        request: BusRequest::IDLE,
        step: StepOutcome::Retired(retire(state, op, sink)),
    }
}

fn await_memory(
    state: &mut CoreState,
    response: BusResponse,
    sink: &mut dyn TraceSink,
) -> ClockOutcome {
    let Some(access) = state.pending else {
        state.control = ControlState::Fetch;
        return ClockOutcome::busy(BusRequest::IDLE);
    };

    if !response.ready {
        state.diag.record_memory_wait();
        return ClockOutcome::busy(access.request());
    }

    commit_load(&mut state.arch, &access, response.read_data);
    let value = match access.kind {
        MemoryAccessKind::Load { .. } => response.read_data,
        MemoryAccessKind::Store { value } => value,
    };
    sink.on_event(TraceEvent::MemoryAccess {
        address: access.address,
        value,
        is_write: access.is_store(),
    });
    state.diag.record_memory_access(access.is_store());
    state.pending = None;
    state.control = ControlState::Fetch;

    let step = match state.decoded {
        Some(op) => {
            state.diag.record_retired(false);
            StepOutcome::Retired(retire(state, op, sink))
        }
        None => StepOutcome::Busy,
    };
    ClockOutcome {
        request: BusRequest::IDLE,
        step,
    }
}

fn retire(state: &CoreState, op: DecodedOp, sink: &mut dyn TraceSink) -> Retired {
    let retired = Retired {
        pc: state.instruction_pc,
        word: state.instruction,
        op,
        next_pc: state.arch.pc(),
    };
    debug!(
        "{:#010x}: {}",
        retired.pc,
        disassemble_at(retired.pc, retired.word)
    );
    sink.on_event(TraceEvent::InstructionRetired {
        pc: retired.pc,
        word: retired.word,
        next_pc: retired.next_pc,
    });
    retired
}
