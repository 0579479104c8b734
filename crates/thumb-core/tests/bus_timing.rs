//! Bus handshake and cycle-timing coverage.

use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use rstest::rstest;
use thumb_core::{
    pack_halfwords, BusRequest, BusResponse, ControlState, CoreConfig, LowRegister, MemoryBus,
    RunBoundary, System, TraceEvent, WordMemory, PC_INDEX,
};

/// Word store with `read_wait` extra cycles per read that also records every
/// cycle where an unacknowledged request was changed.
#[derive(Debug)]
struct CheckedBus {
    words: Vec<u32>,
    read_wait: u32,
    held: u32,
    outstanding: Option<BusRequest>,
    violations: Vec<(BusRequest, BusRequest)>,
}

impl CheckedBus {
    fn new(program: &[u16], read_wait: u32) -> Self {
        let mut words = pack_halfwords(program);
        words.resize(256, 0);
        Self {
            words,
            read_wait,
            held: 0,
            outstanding: None,
            violations: Vec::new(),
        }
    }

    fn word(&self, address: u32) -> u32 {
        self.words[(address >> 2) as usize]
    }
}

impl MemoryBus for CheckedBus {
    fn cycle(&mut self, request: &BusRequest) -> BusResponse {
        if let Some(outstanding) = self.outstanding.take() {
            if outstanding != *request {
                self.violations.push((outstanding, *request));
                self.held = 0;
            }
        }

        if !request.valid {
            self.held = 0;
            return BusResponse::NOT_READY;
        }

        let index = (request.address >> 2) as usize;
        if request.write {
            self.held = 0;
            self.words[index] = request.write_data;
            return BusResponse::ready(0);
        }

        self.held += 1;
        if self.held > self.read_wait {
            self.held = 0;
            BusResponse::ready(self.words[index])
        } else {
            self.outstanding = Some(*request);
            BusResponse::NOT_READY
        }
    }
}

fn boot(program: &[u16]) -> System {
    System::with_image(&pack_halfwords(program), CoreConfig::default())
}

#[rstest]
#[case::move_immediate(0x2005, 5)]
#[case::compare_register(0x4288, 5)]
#[case::shift(0x0209, 5)]
#[case::branch(0xE7FF, 5)]
#[case::conditional_branch_not_taken(0xD000, 5)]
#[case::store(0x67C8, 7)]
#[case::indexed_load(0x6808, 8)]
#[case::literal_load(0x4800, 8)]
fn instruction_latency_from_zero_wait_store(#[case] word: u16, #[case] cycles: u64) {
    let mut sys = boot(&[word, word]);

    let first = sys.run_until(RunBoundary::InstructionRetired, 100);
    assert!(first.reached);
    assert_eq!(first.cycles, 1 + cycles, "first retirement includes reset");

    let second = sys.run_until(RunBoundary::InstructionRetired, 100);
    assert!(second.reached);
    assert_eq!(second.cycles, cycles);
}

#[test]
fn wait_counters_track_bus_latency() {
    let mut sys = boot(&[0x2005, 0x67C8, 0x6808]);
    for _ in 0..3 {
        sys.run_until(RunBoundary::InstructionRetired, 100);
    }

    let diag = sys.diagnostics();
    assert_eq!(diag.retired, 3);
    assert_eq!(diag.fetch_wait_cycles, 3);
    assert_eq!(diag.memory_wait_cycles, 1);
    assert_eq!(diag.cycles, 1 + 5 + 7 + 8);
}

#[test]
fn low_halfword_executes_before_high_halfword() {
    let config = CoreConfig {
        tracing_enabled: true,
        ..CoreConfig::default()
    };
    let mut sys = System::with_config(
        WordMemory::with_image(&[0x2107_2005]),
        config,
    );
    sys.run_until(RunBoundary::InstructionRetired, 100);
    sys.run_until(RunBoundary::InstructionRetired, 100);

    assert_eq!(sys.core().arch.gpr(LowRegister::R0), 5);
    assert_eq!(sys.core().arch.gpr(LowRegister::R1), 7);

    let fetched: Vec<_> = sys
        .take_trace()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::InstructionFetched { pc, word } => Some((pc, word)),
            _ => None,
        })
        .collect();
    assert_eq!(fetched, vec![(0, 0x2005), (2, 0x2107)]);
}

#[rstest]
#[case::single_wait(1, 5)]
#[case::three_waits(3, 7)]
fn core_holds_requests_stable_under_slow_reads(#[case] read_wait: u32, #[case] alu_cycles: u64) {
    let program = [
        0x2005, // MOVS r0, #5
        0x2101, // MOVS r1, #1
        0x0209, // LSLS r1, r1, #8
        0x6048, // STR r0, [r1, #4]
        0x684A, // LDR r2, [r1, #4]
        0xE7FF, // B .
    ];
    let mut sys = System::new(CheckedBus::new(&program, read_wait));

    let first = sys.run_until(RunBoundary::InstructionRetired, 100);
    assert_eq!(first.cycles, 1 + alu_cycles);

    let outcome = sys.run_until(RunBoundary::SelfLoop, 1_000);
    assert!(outcome.reached);
    assert_eq!(sys.core().arch.gpr(LowRegister::R2), 5);
    assert_eq!(sys.bus().word(0x104), 5);
    assert!(
        sys.bus().violations.is_empty(),
        "request changed before ready: {:?}",
        sys.bus().violations
    );
}

#[test]
fn pc_mirror_matches_program_counter_after_every_cycle() {
    let mut sys = boot(&[0x2003, 0x3801, 0xD1FE, 0xE7FF]);

    for _ in 0..200 {
        sys.step();
        let arch = &sys.core().arch;
        assert_eq!(arch.register(PC_INDEX), arch.pc());
    }
    assert_eq!(sys.core().arch.gpr(LowRegister::R0), 0);
}

#[test]
fn trapped_core_drives_an_idle_bus() {
    let mut sys = boot(&[0xFFFF]);
    sys.run_until(RunBoundary::Trap, 100);
    assert!(matches!(sys.control_state(), ControlState::Trap(_)));

    let mut sink: Vec<TraceEvent> = Vec::new();
    for _ in 0..10 {
        sys.step_traced(&mut sink);
    }
    assert!(sink.is_empty());
}
