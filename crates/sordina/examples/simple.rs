//! Minimal line echo cancellation demo.
//!
//! Synthesizes a far-end tone, leaks an attenuated, delayed copy of it
//! into the near end (a fake hybrid), runs the canceller over it frame by
//! frame, and verifies that the echo goes away.
//!
//! ```sh
//! cargo run -p sordina --example simple
//! ```

use std::f64::consts::PI;

use sordina::{Config, LineEchoProcessor, frame_size};

const SAMPLE_RATE: u32 = 16000;
const ECHO_DELAY: usize = 25;
const SECONDS: usize = 2;

fn main() {
    let frame = frame_size(SAMPLE_RATE);
    let total = SECONDS * SAMPLE_RATE as usize;

    // Pure linear cancellation so the residual is easy to measure.
    let config = Config {
        taps: 256,
        nlp: None,
        tx_hpf: false,
        rx_hpf: false,
        ..Default::default()
    };
    let mut processor = LineEchoProcessor::new(config).unwrap();

    // Far end: a steady 440 Hz tone. Near end: the same tone through a
    // fake hybrid, 12 dB down and 25 samples late.
    let far: Vec<i16> = (0..total)
        .map(|n| {
            let phase = 2.0 * PI * 440.0 * n as f64 / f64::from(SAMPLE_RATE);
            (8000.0 * phase.sin()) as i16
        })
        .collect();
    let near: Vec<i16> = (0..total)
        .map(|n| {
            if n >= ECHO_DELAY {
                far[n - ECHO_DELAY] >> 2
            } else {
                0
            }
        })
        .collect();

    let mut out = vec![0i16; frame];
    let mut early_energy: i64 = 0;
    let mut late_energy: i64 = 0;

    for (i, (far_frame, near_frame)) in far.chunks(frame).zip(near.chunks(frame)).enumerate() {
        processor
            .process_frame(far_frame, near_frame, &mut out)
            .unwrap();

        let energy: i64 = out.iter().map(|&s| i64::from(s) * i64::from(s)).sum();
        if i < 10 {
            early_energy += energy;
        } else if i >= far.len() / frame - 10 {
            late_energy += energy;
        }
    }

    assert!(
        late_energy * 16 < early_energy,
        "echo should decay by at least 12 dB (early: {early_energy}, late: {late_energy})"
    );

    let stats = processor.stats();
    println!(
        "cancelled a {} Hz echo: residual level {}, far level {}, ERLE {:?} dB",
        440, stats.residual_level, stats.far_level, stats.echo_return_loss_enhancement
    );
}
