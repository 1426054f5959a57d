//! Offline echo cancellation over WAV files.
//!
//! Reads a far-end (playback) file and a near-end (recording) file, runs
//! the canceller frame by frame, and writes the cleaned near-end signal.
//! Both inputs must be mono 16-bit PCM at the same sample rate, already
//! time-aligned; the canceller does no delay estimation.
//!
//! ```sh
//! cargo run -p sordina --features examples --example wav_cancel -- \
//!     --far playback.wav --near recording.wav --out clean.wav
//! ```

use anyhow::{Context, Result, bail};
use clap::Parser;
use hound::{WavReader, WavSpec, WavWriter};
use tracing_subscriber::EnvFilter;

use sordina::{Config, LineEchoProcessor, NlpConfig, NlpMode, frame_size};

#[derive(Debug, Parser)]
#[command(about = "Cancel line echo from a recording, given its reference")]
struct Args {
    /// Far-end (reference / playback) WAV file.
    #[arg(long)]
    far: String,

    /// Near-end (recording) WAV file containing the echo.
    #[arg(long)]
    near: String,

    /// Output WAV file for the cleaned recording.
    #[arg(long)]
    out: String,

    /// Echo canceller filter length in taps.
    #[arg(long, default_value_t = 2048)]
    taps: usize,

    /// Replace suppressed residual with comfort noise instead of clipping.
    #[arg(long)]
    comfort_noise: bool,
}

fn read_mono(path: &str) -> Result<(WavSpec, Vec<i16>)> {
    let mut reader = WavReader::open(path).with_context(|| format!("opening {path}"))?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 {
        bail!("{path}: expected mono 16-bit PCM");
    }
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading {path}"))?;
    Ok((spec, samples))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let (far_spec, far) = read_mono(&args.far)?;
    let (near_spec, near) = read_mono(&args.near)?;
    if far_spec.sample_rate != near_spec.sample_rate {
        bail!(
            "sample rates differ: far {} Hz, near {} Hz",
            far_spec.sample_rate,
            near_spec.sample_rate
        );
    }

    let config = Config {
        taps: args.taps,
        nlp: Some(NlpConfig {
            mode: if args.comfort_noise {
                NlpMode::ComfortNoise
            } else {
                NlpMode::Clip
            },
        }),
        ..Default::default()
    };
    let mut processor = LineEchoProcessor::new(config)?;

    let frame = frame_size(near_spec.sample_rate);
    let len = far.len().min(near.len());
    let mut writer = WavWriter::create(&args.out, near_spec).with_context(|| "creating output")?;

    let mut out = vec![0i16; frame];
    for (far_frame, near_frame) in far[..len].chunks_exact(frame).zip(near[..len].chunks_exact(frame)) {
        processor.process_frame(far_frame, near_frame, &mut out)?;
        for &s in &out {
            writer.write_sample(s)?;
        }
    }
    writer.finalize()?;

    let stats = processor.stats();
    println!(
        "wrote {}: residual level {}, ERLE {:?} dB",
        args.out, stats.residual_level, stats.echo_return_loss_enhancement
    );
    Ok(())
}
