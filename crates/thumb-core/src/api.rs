//! Host-facing configuration, trace hooks, and run-loop contracts.

use crate::decoder::DecodedOp;
use crate::fault::TrapCause;
use crate::state::ControlState;

/// How a logical shift right by an encoded amount of zero behaves.
///
/// This is a build-time choice for a given core. It is passed to
/// [`ExecutionEngine::new`](crate::ExecutionEngine::new) and never changes for
/// the life of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShiftByZeroPolicy {
    /// Shift by zero leaves the value unchanged and updates `N`/`Z` only.
    Legacy,
    /// Shift by zero behaves as a shift by 32: result 0, carry from bit 31.
    Strict32,
}

impl ShiftByZeroPolicy {
    /// Policy selected by the `strict-shift32` cargo feature.
    pub const BUILD_DEFAULT: Self = if cfg!(feature = "strict-shift32") {
        Self::Strict32
    } else {
        Self::Legacy
    };

    /// Parses the lowercase policy name used on command lines and manifests.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "legacy" => Some(Self::Legacy),
            "strict32" => Some(Self::Strict32),
            _ => None,
        }
    }

    /// Returns the lowercase policy name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Strict32 => "strict32",
        }
    }
}

impl Default for ShiftByZeroPolicy {
    fn default() -> Self {
        Self::BUILD_DEFAULT
    }
}

/// Top-level immutable configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoreConfig {
    /// Shift-right-by-zero behavior of the execution engine.
    pub shift_by_zero: ShiftByZeroPolicy,
    /// Buffers [`TraceEvent`]s inside the system for later retrieval.
    pub tracing_enabled: bool,
}

/// Deterministic trace events emitted in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// The control unit changed state at the end of a cycle.
    StateTransition {
        /// Cycle number, counted from the last reset.
        cycle: u64,
        /// State the cycle started in.
        from: ControlState,
        /// State the next cycle starts in.
        to: ControlState,
    },
    /// An instruction word was latched from the bus.
    InstructionFetched {
        /// Address of the instruction.
        pc: u32,
        /// Selected 16-bit instruction word.
        word: u16,
    },
    /// An instruction completed, including any memory phase.
    InstructionRetired {
        /// Address of the instruction.
        pc: u32,
        /// Raw instruction word.
        word: u16,
        /// Program counter after retirement.
        next_pc: u32,
    },
    /// A data transaction completed on the bus.
    MemoryAccess {
        /// Effective byte address.
        address: u32,
        /// Word read or written.
        value: u32,
        /// `true` for stores.
        is_write: bool,
    },
    /// The core entered the terminal trap state.
    Trapped {
        /// Address of the trapping instruction.
        pc: u32,
        /// Trap reason.
        cause: TrapCause,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Instruction that completed during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Retired {
    /// Address of the instruction.
    pub pc: u32,
    /// Raw instruction word.
    pub word: u16,
    /// Decoded micro-op.
    pub op: DecodedOp,
    /// Program counter after retirement.
    pub next_pc: u32,
}

impl Retired {
    /// Returns `true` for a branch whose target is its own address.
    #[must_use]
    pub const fn is_self_loop(&self) -> bool {
        self.next_pc == self.pc
            && matches!(
                self.op,
                DecodedOp::Branch { .. } | DecodedOp::ConditionalBranch { .. }
            )
    }
}

/// Output status of one clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// An instruction is still in flight.
    Busy,
    /// An instruction retired at the end of this cycle.
    Retired(Retired),
    /// The core is in the terminal trap state.
    Trapped(TrapCause),
}

/// Stop conditions for batched execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunBoundary {
    /// Stop once the core has trapped.
    Trap,
    /// Stop after the next instruction retires.
    InstructionRetired,
    /// Stop after a branch-to-self retires, or on trap.
    SelfLoop,
}

/// Aggregated outcome from running until a selected boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Cycles clocked during this call.
    pub cycles: u64,
    /// `true` when the boundary was reached before the cycle limit.
    pub reached: bool,
    /// Status of the last cycle clocked, if any.
    pub last_step: Option<StepOutcome>,
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, Retired, ShiftByZeroPolicy, TraceEvent, TraceSink};
    use crate::decoder::DecodedOp;
    use crate::state::LowRegister;

    #[test]
    fn default_core_config_uses_build_policy_and_no_tracing() {
        let config = CoreConfig::default();
        assert_eq!(config.shift_by_zero, ShiftByZeroPolicy::BUILD_DEFAULT);
        assert!(!config.tracing_enabled);
    }

    #[cfg(not(feature = "strict-shift32"))]
    #[test]
    fn legacy_is_default_without_strict_feature() {
        assert_eq!(ShiftByZeroPolicy::default(), ShiftByZeroPolicy::Legacy);
    }

    #[cfg(feature = "strict-shift32")]
    #[test]
    fn strict_feature_selects_strict32() {
        assert_eq!(ShiftByZeroPolicy::default(), ShiftByZeroPolicy::Strict32);
    }

    #[test]
    fn policy_names_roundtrip() {
        for policy in [ShiftByZeroPolicy::Legacy, ShiftByZeroPolicy::Strict32] {
            assert_eq!(ShiftByZeroPolicy::from_name(policy.name()), Some(policy));
        }
        assert_eq!(ShiftByZeroPolicy::from_name("Strict32"), None);
    }

    #[test]
    fn vec_sink_records_in_order() {
        let mut sink: Vec<TraceEvent> = Vec::new();
        sink.on_event(TraceEvent::InstructionFetched { pc: 0, word: 0x2005 });
        sink.on_event(TraceEvent::MemoryAccess {
            address: 0x100,
            value: 10,
            is_write: true,
        });
        assert_eq!(sink.len(), 2);
        assert!(matches!(sink[0], TraceEvent::InstructionFetched { .. }));
    }

    #[test]
    fn only_branches_to_own_address_are_self_loops() {
        let halt = Retired {
            pc: 0x0C,
            word: 0xE7FF,
            op: DecodedOp::Branch { imm11: 0x7FF },
            next_pc: 0x0C,
        };
        assert!(halt.is_self_loop());

        let forward = Retired {
            next_pc: 0x0E,
            op: DecodedOp::Branch { imm11: 0 },
            ..halt
        };
        assert!(!forward.is_self_loop());

        let movs = Retired {
            op: DecodedOp::MoveImmediate {
                rd: LowRegister::R0,
                imm8: 0,
            },
            ..halt
        };
        assert!(!movs.is_self_loop());
    }
}
