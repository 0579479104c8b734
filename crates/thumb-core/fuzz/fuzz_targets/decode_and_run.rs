#![no_main]

use libfuzzer_sys::fuzz_target;
use thumb_core::{
    disassemble, CoreConfig, Decoder, RunBoundary, ShiftByZeroPolicy, System, WordMemory,
};

const IMAGE_WORDS: usize = 128;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let word = u16::from_le_bytes([data[0], data[1]]);
    if let Ok(op) = Decoder::decode(word) {
        assert_eq!(op.encode(), word);
    }
    let _ = disassemble(word);

    let shift_by_zero = if data[2] & 1 == 0 {
        ShiftByZeroPolicy::Legacy
    } else {
        ShiftByZeroPolicy::Strict32
    };
    let image: Vec<u32> = data[3..]
        .chunks(4)
        .take(IMAGE_WORDS)
        .map(|chunk| {
            let mut bytes = [0_u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(bytes)
        })
        .collect();

    let mut memory = WordMemory::new(IMAGE_WORDS);
    memory.load_image(&image);
    let config = CoreConfig {
        shift_by_zero,
        tracing_enabled: false,
    };
    let mut sys = System::with_config(memory, config);
    let outcome = sys.run_until(RunBoundary::Trap, 4_096);

    let arch = &sys.core().arch;
    assert_eq!(arch.register(thumb_core::PC_INDEX), arch.pc());
    assert_eq!(sys.cycle(), outcome.cycles);
    assert!(sys.diagnostics().retired <= outcome.cycles / 5);
});
