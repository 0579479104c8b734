//! Single-core system: the control unit wired to a bus backend.

use crate::api::{
    CoreConfig, NullSink, RunBoundary, RunOutcome, StepOutcome, TraceEvent, TraceSink,
};
use crate::bus::{BusRequest, MemoryBus, WordMemory};
use crate::control::{clock, CoreState};
use crate::diag::Diagnostics;
use crate::execute::ExecutionEngine;
use crate::fault::TrapCause;
use crate::state::ControlState;

/// Core, execution engine, and bus advanced together one cycle at a time.
///
/// Every cycle the bus first answers the request the core drove, then the core
/// consumes that response and produces the next request.
#[derive(Debug, Clone)]
pub struct System<B: MemoryBus = WordMemory> {
    core: CoreState,
    engine: ExecutionEngine,
    config: CoreConfig,
    bus: B,
    request: BusRequest,
    trace: Vec<TraceEvent>,
}

impl<B: MemoryBus> System<B> {
    /// Creates a system in `Reset` with the default configuration.
    #[must_use]
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, CoreConfig::default())
    }

    /// Creates a system in `Reset` with an explicit configuration.
    #[must_use]
    pub fn with_config(bus: B, config: CoreConfig) -> Self {
        Self {
            core: CoreState::default(),
            engine: ExecutionEngine::new(config.shift_by_zero),
            config,
            bus,
            request: BusRequest::IDLE,
            trace: Vec::new(),
        }
    }

    /// Returns the core to `Reset`. Bus contents are preserved.
    pub fn reset(&mut self) {
        self.core.reset();
        self.request = BusRequest::IDLE;
        self.trace.clear();
    }

    /// Clocks one cycle.
    ///
    /// With [`CoreConfig::tracing_enabled`] set, events are buffered and can be
    /// collected with [`System::take_trace`].
    pub fn step(&mut self) -> StepOutcome {
        if self.config.tracing_enabled {
            let mut trace = std::mem::take(&mut self.trace);
            let step = self.step_traced(&mut trace);
            self.trace = trace;
            step
        } else {
            self.step_traced(&mut NullSink)
        }
    }

    /// Clocks one cycle, delivering trace events to `sink`.
    pub fn step_traced(&mut self, sink: &mut dyn TraceSink) -> StepOutcome {
        let response = self.bus.cycle(&self.request);
        let outcome = clock(&mut self.core, &self.engine, response, sink);
        self.request = outcome.request;
        outcome.step
    }

    /// Clocks exactly `cycles` cycles. A trapped core keeps idling.
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// Clocks until `boundary` is reached or `max_cycles` have elapsed.
    ///
    /// A trap ends the run for every boundary, since a trapped core makes no
    /// further progress. It counts as reaching [`RunBoundary::Trap`] and
    /// [`RunBoundary::SelfLoop`].
    pub fn run_until(&mut self, boundary: RunBoundary, max_cycles: u64) -> RunOutcome {
        let mut cycles = 0;
        let mut last_step = None;

        while cycles < max_cycles {
            let step = self.step();
            cycles += 1;
            last_step = Some(step);

            let reached = match step {
                StepOutcome::Trapped(_) => Some(matches!(
                    boundary,
                    RunBoundary::Trap | RunBoundary::SelfLoop
                )),
                StepOutcome::Retired(retired) => match boundary {
                    RunBoundary::InstructionRetired => Some(true),
                    RunBoundary::SelfLoop if retired.is_self_loop() => Some(true),
                    RunBoundary::SelfLoop | RunBoundary::Trap => None,
                },
                StepOutcome::Busy => None,
            };

            if let Some(reached) = reached {
                return RunOutcome {
                    cycles,
                    reached,
                    last_step,
                };
            }
        }

        RunOutcome {
            cycles,
            reached: false,
            last_step,
        }
    }

    /// Returns the core state.
    #[must_use]
    pub const fn core(&self) -> &CoreState {
        &self.core
    }

    /// Returns the core state for direct manipulation by test benches.
    pub const fn core_mut(&mut self) -> &mut CoreState {
        &mut self.core
    }

    /// Returns the bus backend.
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Returns the bus backend mutably, e.g. to load a new image.
    pub const fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consumes the system and returns the bus backend.
    #[must_use]
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Returns the state the next cycle starts in.
    #[must_use]
    pub const fn control_state(&self) -> ControlState {
        self.core.control
    }

    /// Returns the trap cause once the core has halted.
    #[must_use]
    pub const fn trap_cause(&self) -> Option<TrapCause> {
        self.core.trap_cause()
    }

    /// Cycles clocked since the last reset.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.core.diag.cycles
    }

    /// Returns the diagnostic counters.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.core.diag
    }

    /// Returns the configuration this system was built with.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Returns the execution engine.
    #[must_use]
    pub const fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Drains buffered trace events.
    pub fn take_trace(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.trace)
    }
}

impl System<WordMemory> {
    /// Creates a system over a default-sized store holding `image`.
    #[must_use]
    pub fn with_image(image: &[u32], config: CoreConfig) -> Self {
        Self::with_config(WordMemory::with_image(image), config)
    }
}
