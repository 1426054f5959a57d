//! Whole-pipeline tests through the public frame API.

use std::f64::consts::PI;

use sordina::{AdaptionMode, Config, LineEchoProcessor, NlpConfig, NlpMode, frame_size};

const SAMPLE_RATE: u32 = 16000;

/// Far-end tone plus its fake hybrid echo: 12 dB down, 25 samples late.
fn line_signals(total: usize) -> (Vec<i16>, Vec<i16>) {
    const DELAY: usize = 25;
    let far: Vec<i16> = (0..total)
        .map(|n| {
            let phase = 2.0 * PI * 440.0 * n as f64 / f64::from(SAMPLE_RATE);
            (8000.0 * phase.sin()) as i16
        })
        .collect();
    let near: Vec<i16> = (0..total)
        .map(|n| if n >= DELAY { far[n - DELAY] >> 2 } else { 0 })
        .collect();
    (far, near)
}

#[test]
fn clip_nlp_fully_silences_a_converged_line() {
    let frame = frame_size(SAMPLE_RATE);
    let total = 4 * SAMPLE_RATE as usize;
    let (far, near) = line_signals(total);

    let mut processor = LineEchoProcessor::new(Config {
        taps: 256,
        tx_hpf: false,
        ..Default::default()
    })
    .unwrap();

    let mut out = vec![0i16; frame];
    let mut last_frame = vec![0i16; frame];
    for (far_frame, near_frame) in far.chunks(frame).zip(near.chunks(frame)) {
        processor
            .process_frame(far_frame, near_frame, &mut out)
            .unwrap();
        last_frame.copy_from_slice(&out);
    }

    // Once the linear filter has converged, the clip NLP clamps whatever
    // residual is left to the (zero) background noise level.
    assert!(
        last_frame.iter().all(|&s| s == 0),
        "expected full suppression, got {last_frame:?}"
    );

    let stats = processor.stats();
    assert!(stats.far_level > 0);
    assert!(
        stats.residual_level * 16 < stats.far_level,
        "suppressor should be active (residual {}, far {})",
        stats.residual_level,
        stats.far_level
    );
    let erle = stats.echo_return_loss_enhancement.unwrap_or(f64::INFINITY);
    assert!(erle > 12.0, "ERLE {erle} dB too small");
}

#[test]
fn linear_only_config_leaves_a_measurable_residual_drop() {
    let frame = frame_size(SAMPLE_RATE);
    let total = 4 * SAMPLE_RATE as usize;
    let (far, near) = line_signals(total);

    let mut processor = LineEchoProcessor::new(Config {
        taps: 256,
        nlp: None,
        tx_hpf: false,
        rx_hpf: false,
        ..Default::default()
    })
    .unwrap();

    let mut out = vec![0i16; frame];
    let mut early: i64 = 0;
    let mut late: i64 = 0;
    let frames = total / frame;
    for (i, (far_frame, near_frame)) in far.chunks(frame).zip(near.chunks(frame)).enumerate() {
        processor
            .process_frame(far_frame, near_frame, &mut out)
            .unwrap();
        let sum: i64 = out.iter().map(|&s| i64::from(s).abs()).sum();
        if i < 10 {
            early += sum;
        } else if i >= frames - 10 {
            late += sum;
        }
    }

    assert!(
        late * 10 < early,
        "linear cancellation too weak (early {early}, late {late})"
    );
}

#[test]
fn mode_flip_to_disable_takes_effect_mid_stream() {
    let frame = frame_size(SAMPLE_RATE);
    let (far, near) = line_signals(frame * 4);

    let mut processor = LineEchoProcessor::new(Config {
        rx_hpf: false,
        tx_hpf: false,
        ..Default::default()
    })
    .unwrap();

    let mut out = vec![0i16; frame];
    processor
        .process_frame(&far[..frame], &near[..frame], &mut out)
        .unwrap();

    processor.set_adaption_mode(AdaptionMode::DISABLE);
    let evened: Vec<i16> = near[frame..2 * frame].iter().map(|&s| s & !1).collect();
    processor
        .process_frame(&far[frame..2 * frame], &evened, &mut out)
        .unwrap();
    assert_eq!(out, evened);
}

#[test]
fn snapshot_reflects_transferred_coefficients() {
    let frame = frame_size(SAMPLE_RATE);
    let total = 2 * SAMPLE_RATE as usize;
    let (far, near) = line_signals(total);

    let mut processor = LineEchoProcessor::new(Config {
        taps: 256,
        nlp: Some(NlpConfig {
            mode: NlpMode::Mute,
        }),
        tx_hpf: false,
        rx_hpf: false,
        ..Default::default()
    })
    .unwrap();

    let mut out = vec![0i16; frame];
    for (far_frame, near_frame) in far.chunks(frame).zip(near.chunks(frame)) {
        processor
            .process_frame(far_frame, near_frame, &mut out)
            .unwrap();
    }

    processor.snapshot();
    assert!(
        processor.snapshot_taps().iter().any(|&t| t != 0),
        "foreground should have received adapted coefficients"
    );
}
