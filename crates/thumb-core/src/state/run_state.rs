use crate::TrapCause;

/// Control-unit state. One transition is taken per clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ControlState {
    /// Clears architectural state; entered on construction and reset.
    #[default]
    Reset,
    /// Issues the instruction read and advances the program counter.
    Fetch,
    /// Holds the instruction read until the bus acknowledges it.
    AwaitInstruction,
    /// Classifies the latched instruction word.
    Decode,
    /// Computes results, targets, and effective addresses.
    Execute,
    /// Issues the data read or write.
    MemAccess,
    /// Holds the data transaction until the bus acknowledges it.
    AwaitMemory,
    /// Terminal halt on an unrecognised or unsupported instruction.
    Trap(TrapCause),
}

impl ControlState {
    /// Returns the trap cause, if this is the terminal trap state.
    #[must_use]
    pub const fn trap_cause(self) -> Option<TrapCause> {
        match self {
            Self::Trap(cause) => Some(cause),
            Self::Reset
            | Self::Fetch
            | Self::AwaitInstruction
            | Self::Decode
            | Self::Execute
            | Self::MemAccess
            | Self::AwaitMemory => None,
        }
    }

    /// Returns `true` for the terminal trap state.
    #[must_use]
    pub const fn is_trapped(self) -> bool {
        matches!(self, Self::Trap(_))
    }

    /// Returns `true` for states that hold a bus transaction open.
    #[must_use]
    pub const fn is_waiting(self) -> bool {
        matches!(self, Self::AwaitInstruction | Self::AwaitMemory)
    }
}

#[cfg(test)]
mod tests {
    use super::ControlState;
    use crate::TrapCause;

    #[test]
    fn control_state_default_is_reset() {
        assert_eq!(ControlState::default(), ControlState::Reset);
    }

    #[test]
    fn trap_cause_accessor_reports_only_trap_variant() {
        assert_eq!(ControlState::Fetch.trap_cause(), None);
        assert_eq!(ControlState::AwaitMemory.trap_cause(), None);
        let cause = TrapCause::DecodeError { word: 0xFFFF };
        assert_eq!(ControlState::Trap(cause).trap_cause(), Some(cause));
        assert!(ControlState::Trap(cause).is_trapped());
        assert!(!ControlState::Execute.is_trapped());
    }

    #[test]
    fn only_await_states_are_waiting() {
        assert!(ControlState::AwaitInstruction.is_waiting());
        assert!(ControlState::AwaitMemory.is_waiting());
        assert!(!ControlState::Fetch.is_waiting());
        assert!(!ControlState::MemAccess.is_waiting());
    }
}
