#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sordina_lec::{AdaptionMode, EchoCanceller};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Filter length (mapped into 1..=512).
    taps: u16,
    /// Raw adaption-mode bits (undefined bits are discarded).
    mode_bits: u32,
    /// Far-end / near-end sample pairs.
    samples: Vec<(i16, i16)>,
}

fuzz_target!(|input: FuzzInput| {
    let taps = usize::from(input.taps % 512) + 1;
    let mode = AdaptionMode::from_bits_truncate(input.mode_bits);
    let mut ec = EchoCanceller::new(taps, mode).unwrap();

    for &(tx, rx) in &input.samples {
        ec.update(tx, rx);
        assert!(ec.curr_pos() < taps);
        assert!(ec.pstates() >= 0);
        assert!((0..=600).contains(&ec.nonupdate_dwell()));
        assert!((0..=6).contains(&ec.cond_met()));
    }
});
