//! Diagnostic counters maintained by the control unit.

use crate::{TrapCause, TrapClass};

/// Last trap observed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TrapRecord {
    /// Trap reason.
    pub cause: TrapCause,
    /// Address of the trapping instruction.
    pub pc: u32,
    /// Cycle on which the trap was taken.
    pub cycle: u64,
}

/// Saturating performance and trap counters.
///
/// Every counter is cleared by reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Diagnostics {
    /// Cycles clocked since reset.
    pub cycles: u64,
    /// Instructions retired.
    pub retired: u64,
    /// Cycles spent in `AwaitInstruction` without the bus acknowledging.
    pub fetch_wait_cycles: u64,
    /// Cycles spent in `AwaitMemory` without the bus acknowledging.
    pub memory_wait_cycles: u64,
    /// Completed data loads.
    pub loads: u64,
    /// Completed data stores.
    pub stores: u64,
    /// Branches whose condition held.
    pub branches_taken: u64,
    /// Most recent trap, if any.
    pub last_trap: Option<TrapRecord>,
}

impl Diagnostics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one clocked cycle.
    pub const fn record_cycle(&mut self) {
        self.cycles = self.cycles.saturating_add(1);
    }

    /// Counts one retired instruction.
    pub const fn record_retired(&mut self, branch_taken: bool) {
        self.retired = self.retired.saturating_add(1);
        if branch_taken {
            self.branches_taken = self.branches_taken.saturating_add(1);
        }
    }

    /// Counts a cycle waiting on the instruction fetch.
    pub const fn record_fetch_wait(&mut self) {
        self.fetch_wait_cycles = self.fetch_wait_cycles.saturating_add(1);
    }

    /// Counts a cycle waiting on a data transaction.
    pub const fn record_memory_wait(&mut self) {
        self.memory_wait_cycles = self.memory_wait_cycles.saturating_add(1);
    }

    /// Counts a completed data transaction.
    pub const fn record_memory_access(&mut self, is_store: bool) {
        if is_store {
            self.stores = self.stores.saturating_add(1);
        } else {
            self.loads = self.loads.saturating_add(1);
        }
    }

    /// Records the trap that halted the core.
    pub const fn record_trap(&mut self, cause: TrapCause, pc: u32) {
        self.last_trap = Some(TrapRecord {
            cause,
            pc,
            cycle: self.cycles,
        });
    }

    /// Returns the class of the last trap, if any.
    #[must_use]
    pub const fn last_trap_class(&self) -> Option<TrapClass> {
        match self.last_trap {
            Some(record) => Some(record.cause.class()),
            None => None,
        }
    }

    /// Clears every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
