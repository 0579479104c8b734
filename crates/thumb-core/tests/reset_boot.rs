//! Reset and boot semantics.

use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use rstest::rstest;
use thumb_core::{
    pack_halfwords, ControlState, CoreConfig, CoreState, Flags, LowRegister,
    RunBoundary, System, TraceEvent, WordMemory, PC_INDEX,
};

fn boot(program: &[u16]) -> System {
    System::with_image(&pack_halfwords(program), CoreConfig::default())
}

#[test]
fn new_system_starts_in_reset_with_idle_bus() {
    let sys = boot(&[0x2005]);
    assert_eq!(sys.control_state(), ControlState::Reset);
    assert_eq!(sys.cycle(), 0);
    assert_eq!(sys.core().arch.pc(), 0);
    assert_eq!(sys.core().arch.flags(), Flags::default());
}

#[test]
fn reset_cycle_moves_to_fetch_and_boots_at_zero() {
    let mut sys = boot(&[0x2005]);
    sys.step();

    assert_eq!(sys.control_state(), ControlState::Fetch);
    assert_eq!(sys.core().arch.pc(), 0);
    assert_eq!(sys.core().arch.register(PC_INDEX), 0);
    assert_eq!(sys.cycle(), 1);
}

#[test]
fn reset_clears_registers_flags_and_trap_but_keeps_memory() {
    let mut sys = boot(&[
        0x2101, // MOVS r1, #1
        0x0209, // LSLS r1, r1, #8
        0x2080, // MOVS r0, #0x80
        0x0600, // LSLS r0, r0, #24
        0x6008, // STR r0, [r1]
        0xFFFF, // undefined
    ]);
    let outcome = sys.run_until(RunBoundary::Trap, 1_000);
    assert!(outcome.reached);
    assert!(sys.core().arch.flags().negative);
    assert_eq!(sys.bus().read_word(0x100), 0x8000_0000);

    sys.reset();
    assert_eq!(sys.control_state(), ControlState::Reset);
    assert_eq!(sys.diagnostics().retired, 0);
    assert!(sys.diagnostics().last_trap.is_none());

    sys.step();
    for reg in LowRegister::ALL {
        assert_eq!(sys.core().arch.gpr(reg), 0, "{reg:?} survived reset");
    }
    assert_eq!(sys.core().arch.flags(), Flags::default());
    assert_eq!(sys.bus().read_word(0x100), 0x8000_0000);
    assert_eq!(sys.bus().read_word(0), 0x0209_2101);
}

#[test]
fn program_reruns_identically_after_reset() {
    let config = CoreConfig {
        tracing_enabled: true,
        ..CoreConfig::default()
    };
    let image = pack_halfwords(&[0x2003, 0x3801, 0xD1FE, 0xE7FF]);
    let mut sys = System::with_config(WordMemory::with_image(&image), config);

    let first = sys.run_until(RunBoundary::SelfLoop, 1_000);
    let first_trace = sys.take_trace();
    let first_core = sys.core().clone();

    sys.reset();
    let second = sys.run_until(RunBoundary::SelfLoop, 1_000);

    assert_eq!(first, second);
    assert_eq!(sys.take_trace(), first_trace);
    assert_eq!(sys.core(), &first_core);
}

#[test]
fn reset_drops_buffered_trace() {
    let config = CoreConfig {
        tracing_enabled: true,
        ..CoreConfig::default()
    };
    let mut sys = System::with_config(WordMemory::with_image(&[0x0000_2005]), config);
    sys.run(3);
    sys.reset();
    assert!(sys.take_trace().is_empty());

    sys.step();
    assert_eq!(
        sys.take_trace(),
        vec![TraceEvent::StateTransition {
            cycle: 0,
            from: ControlState::Reset,
            to: ControlState::Fetch,
        }]
    );
}

#[rstest]
#[case::mid_fetch(2)]
#[case::mid_execute(4)]
#[case::mid_memory(7)]
fn reset_from_any_state_restarts_cleanly(#[case] cycles: u64) {
    let mut sys = boot(&[0x6808, 0xE7FF]);
    sys.run(cycles);
    sys.reset();

    let outcome = sys.run_until(RunBoundary::InstructionRetired, 100);
    assert!(outcome.reached);
    assert_eq!(outcome.cycles, 1 + 8);
    assert_eq!(sys.core().arch.pc(), 2);
}

#[test]
fn core_state_reset_matches_default() {
    let mut state = CoreState {
        instruction: 0x4348,
        instruction_pc: 0x20,
        control: ControlState::Execute,
        ..CoreState::default()
    };
    state.arch.set_gpr(LowRegister::R5, 0x55);
    state.diag.record_cycle();

    state.reset();

    assert_eq!(state, CoreState::default());
}
