//! Frame-level processing over the per-sample canceller.

use tracing::debug;

use sordina_lec::{AdaptionMode, EchoCanceller};

use crate::config::Config;
use crate::error::Error;
use crate::stats::CancellerStats;

/// Samples per 10 ms frame at the given rate, the granularity the
/// canceller is normally driven at.
pub fn frame_size(sample_rate_hz: u32) -> usize {
    sample_rate_hz as usize / 100
}

/// Frame-oriented wrapper around one [`EchoCanceller`].
///
/// The processor owns a single monaural canceller and runs it over 10 ms
/// (or any other fixed-size) frames. Far and near frames must be
/// sample-aligned by the host; the canceller does no delay estimation.
#[derive(Debug)]
pub struct LineEchoProcessor {
    canceller: EchoCanceller,
}

impl LineEchoProcessor {
    /// Builds a processor for the given configuration.
    pub fn new(config: Config) -> Result<Self, Error> {
        let mode = config.adaption_mode();
        let canceller = EchoCanceller::new(config.taps, mode)?;
        debug!(
            taps = config.taps,
            mode = mode.bits(),
            "line echo processor ready"
        );
        Ok(Self { canceller })
    }

    /// Cancels the echo of `far` out of `near`, writing the result to
    /// `out`. All three frames must have the same length.
    pub fn process_frame(&mut self, far: &[i16], near: &[i16], out: &mut [i16]) -> Result<(), Error> {
        if far.len() != near.len() || near.len() != out.len() {
            return Err(Error::FrameSizeMismatch {
                far: far.len(),
                near: near.len(),
                out: out.len(),
            });
        }
        for ((o, &tx), &rx) in out.iter_mut().zip(far).zip(near) {
            *o = self.canceller.update(tx, rx);
        }
        Ok(())
    }

    /// Applies the tx-direction DC blocker to a far-end frame in place.
    ///
    /// Call this on the signal headed for the line, before it reaches the
    /// hybrid; it is a no-op unless the configuration enables the far-end
    /// high-pass filter.
    pub fn hpf_far_frame(&mut self, frame: &mut [i16]) {
        for s in frame {
            *s = self.canceller.hpf_tx(*s);
        }
    }

    /// Resets all runtime state, as if freshly constructed.
    pub fn flush(&mut self) {
        self.canceller.flush();
    }

    /// Swaps the behaviour flags; takes effect from the next sample.
    pub fn set_adaption_mode(&mut self, mode: AdaptionMode) {
        self.canceller.set_adaption_mode(mode);
    }

    /// Captures the foreground coefficients into the snapshot buffer.
    pub fn snapshot(&mut self) {
        self.canceller.snapshot();
    }

    /// The coefficients captured by the last [`snapshot`](Self::snapshot).
    pub fn snapshot_taps(&self) -> &[i16] {
        self.canceller.snapshot_taps()
    }

    /// Current canceller statistics.
    pub fn stats(&self) -> CancellerStats {
        CancellerStats {
            far_level: self.canceller.ltx(),
            near_level: self.canceller.lrx(),
            residual_level: self.canceller.lclean(),
            residual_level_background: self.canceller.lclean_bg(),
            background_noise_level: self.canceller.lbgn(),
            double_talk_hangover: self.canceller.nonupdate_dwell(),
            lms_shift: self.canceller.shift(),
            echo_return_loss_enhancement: None,
        }
        .derive()
    }

    /// Direct access to the underlying per-sample canceller.
    pub fn canceller(&self) -> &EchoCanceller {
        &self.canceller
    }

    /// Mutable access to the underlying per-sample canceller.
    pub fn canceller_mut(&mut self) -> &mut EchoCanceller {
        &mut self.canceller
    }
}
