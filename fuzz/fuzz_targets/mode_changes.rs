#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sordina_lec::{AdaptionMode, EchoCanceller};

/// One step of the fuzzed schedule: possibly reconfigure, then process a
/// burst of samples.
#[derive(Debug, Arbitrary)]
enum Step {
    SetMode(u32),
    Flush,
    Snapshot,
    Process(Vec<(i16, i16)>),
}

fuzz_target!(|steps: Vec<Step>| {
    let mut ec = EchoCanceller::new(256, AdaptionMode::ALL).unwrap();

    for step in &steps {
        match step {
            Step::SetMode(bits) => {
                ec.set_adaption_mode(AdaptionMode::from_bits_truncate(*bits));
            }
            Step::Flush => {
                ec.flush();
                assert_eq!(ec.curr_pos(), 255);
                assert_eq!(ec.pstates(), 0);
                assert_eq!(ec.nonupdate_dwell(), 0);
            }
            Step::Snapshot => {
                ec.snapshot();
                assert_eq!(ec.snapshot_taps(), ec.foreground_taps());
            }
            Step::Process(samples) => {
                for &(tx, rx) in samples {
                    ec.update(tx, rx);
                    ec.hpf_tx(tx);
                    assert!(ec.curr_pos() < 256);
                }
            }
        }
    }
});
