//! The dual-path echo canceller.
//!
//! Two FIR filters share the same far-end history geometry: the background
//! filter adapts on every quiet sample, the foreground filter only ever
//! changes by wholesale copy from the background once the background has
//! demonstrably outperformed it for a run of samples. The conditions for
//! that transfer come from the dual path paper, massaged a little for
//! better behaviour on real lines.

use core::fmt;
use std::error::Error;

use tracing::{debug, trace};

use sordina_dsp::{Fir16, top_bit};

use crate::comfort_noise::ComfortNoiseGenerator;
use crate::config::{AdaptionMode, MIN_TX_POWER_FOR_ADAPTION};
use crate::dc_blocker::DcBlocker;
use crate::double_talk::DoubleTalkDetector;
use crate::level::{LevelEstimator, NoiseLevelEstimator};

/// Number of consecutive qualifying samples before the background
/// coefficients are promoted to the foreground.
const TRANSFER_COND_SAMPLES: i32 = 6;

/// Error returned by [`EchoCanceller::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateError {
    /// A canceller needs at least one tap.
    ZeroTaps,
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTaps => write!(f, "echo canceller filter length must be non-zero"),
        }
    }
}

impl Error for CreateError {}

/// G.168-style line echo canceller working state.
///
/// One instance is owned by exactly one audio worker and fed strictly
/// sequential samples; [`update`](Self::update) performs no allocation,
/// I/O, or locking.
#[derive(derive_more::Debug)]
pub struct EchoCanceller {
    taps: usize,
    log2taps: u32,
    adaption_mode: AdaptionMode,

    // Most recent per-sample values, kept for inspection.
    tx: i16,
    rx: i16,
    clean: i16,
    clean_nlp: i16,
    adapt: bool,
    shift: i16,
    factor: i32,

    curr_pos: usize,
    pstates: i32,
    cond_met: i32,

    #[debug(skip)]
    fir_fg: Fir16,
    #[debug(skip)]
    fir_bg: Fir16,
    #[debug(skip)]
    taps_fg: Vec<i16>,
    #[debug(skip)]
    taps_bg: Vec<i16>,

    ltx: LevelEstimator,
    lrx: LevelEstimator,
    lclean: LevelEstimator,
    lclean_bg: LevelEstimator,
    lbgn: NoiseLevelEstimator,

    tx_hpf: DcBlocker,
    rx_hpf: DcBlocker,

    dtd: DoubleTalkDetector,
    cng: ComfortNoiseGenerator,

    #[debug(skip)]
    snapshot: Vec<i16>,
}

impl EchoCanceller {
    /// Creates a canceller with `taps` FIR coefficients per path.
    ///
    /// `taps` need not be a power of two; the internal `log2taps` is the
    /// floor of the true logarithm. Typical lengths are 256–4096 (a power
    /// of two covering the worst-case echo tail).
    pub fn new(taps: usize, adaption_mode: AdaptionMode) -> Result<Self, CreateError> {
        if taps == 0 {
            return Err(CreateError::ZeroTaps);
        }
        debug!(taps, mode = adaption_mode.bits(), "creating line echo canceller");
        Ok(Self {
            taps,
            log2taps: top_bit(taps as u32) as u32,
            adaption_mode,
            tx: 0,
            rx: 0,
            clean: 0,
            clean_nlp: 0,
            adapt: false,
            shift: 0,
            factor: 0,
            curr_pos: taps - 1,
            pstates: 0,
            cond_met: 0,
            fir_fg: Fir16::new(taps),
            fir_bg: Fir16::new(taps),
            taps_fg: vec![0; taps],
            taps_bg: vec![0; taps],
            ltx: LevelEstimator::new(),
            lrx: LevelEstimator::new(),
            lclean: LevelEstimator::new(),
            lclean_bg: LevelEstimator::new(),
            lbgn: NoiseLevelEstimator::new(),
            tx_hpf: DcBlocker::new(32767),
            rx_hpf: DcBlocker::new(16383),
            dtd: DoubleTalkDetector::new(),
            cng: ComfortNoiseGenerator::new(),
            snapshot: vec![0; taps],
        })
    }

    /// Processes one far-end/near-end sample pair and returns the cleaned
    /// near-end sample.
    pub fn update(&mut self, tx: i16, rx: i16) -> i16 {
        self.tx = tx;
        self.rx = rx;

        // Input scaling prevents trouble once tx starts clipping; the
        // alternative would be scaling the filter coefficients instead.
        let tx = tx >> 1;
        let mut rx = rx >> 1;

        // Strip DC and deep bass from the near end. 32-bit precision is
        // required or the state never tracks down to zero; some chip sets
        // don't need this, a cheap X100P style card does.
        if self.adaption_mode.contains(AdaptionMode::RX_HPF) {
            rx = self.rx_hpf.process(rx);
        }

        // Block average of the power in the filter states, used for the
        // adaption step size. Out with the old and in with the new, so the
        // whole block never needs recomputing.
        {
            let new_p = i32::from(tx) * i32::from(tx);
            let old = i32::from(self.fir_fg.oldest());
            self.pstates += (new_p - old * old + (1 << self.log2taps)) >> self.log2taps;
            if self.pstates < 0 {
                self.pstates = 0;
            }
        }

        // Short term average levels, simple single-pole IIRs.
        let ltx = self.ltx.update(tx.into());
        let lrx = self.lrx.update(rx.into());

        // Foreground filter.
        let echo = self.fir_fg.process(&self.taps_fg, tx);
        self.clean = (i32::from(rx) - i32::from(echo)) as i16;
        let lclean = self.lclean.update(self.clean.into());

        // Background filter. Its residual stays 32-bit.
        let echo_bg = self.fir_bg.process(&self.taps_bg, tx);
        let clean_bg = i32::from(rx) - i32::from(echo_bg);
        let lclean_bg = self.lclean_bg.update(clean_bg);

        // Background filter adaption. Adapt almost always; the DTD only
        // holds it off during strong double talk, which is not critical
        // for the dual path structure.
        self.factor = 0;
        self.shift = 0;
        if self.dtd.dwell() == 0 {
            // The normalised step is Beta * clean_bg / P with Beta = 0.25,
            // scaled to Q30 for the tap update; log2(P) is approximated by
            // the highest-bit position, off by at most a factor of two,
            // which the algorithm tolerates.
            let p = MIN_TX_POWER_FOR_ADAPTION + self.pstates;
            let log_p = top_bit(p as u32) + self.log2taps as i32;
            let shift = 30 - 2 - log_p;
            self.shift = shift as i16;
            self.lms_adapt_bg(clean_bg, shift);
        }

        // Very simple DTD so we don't adapt against strong near-end
        // speech.
        self.adapt = false;
        self.dtd.update(lrx, ltx);

        // Transfer logic: the background must beat the foreground by
        // 8/7 and sit at least 18 dB below the far end, for six samples
        // running.
        if self.adaption_mode.contains(AdaptionMode::ADAPT)
            && self.dtd.dwell() == 0
            && 8 * lclean_bg < 7 * lclean
            && 8 * lclean_bg < ltx
        {
            if self.cond_met == TRANSFER_COND_SAMPLES {
                self.adapt = true;
                trace!(lclean, lclean_bg, "promoting background coefficients");
                self.taps_fg.copy_from_slice(&self.taps_bg);
            } else {
                self.cond_met += 1;
            }
        } else {
            self.cond_met = 0;
        }

        // Non-linear processing: zap small residuals, which are mostly
        // uLaw/ALaw non-linearity the linear filter can never reach.
        self.clean_nlp = self.clean;
        if self.adaption_mode.contains(AdaptionMode::NLP) {
            if 16 * lclean < ltx {
                // Cancellation has improved the echo by at least 24 dB.
                if self.adaption_mode.contains(AdaptionMode::CNG) {
                    self.clean_nlp = self.cng.generate(self.lbgn.level());
                } else if self.adaption_mode.contains(AdaptionMode::CLIP) {
                    // Sounds much better than CNG.
                    let lbgn = self.lbgn.level();
                    let mut v = i32::from(self.clean_nlp);
                    if v > lbgn {
                        v = lbgn;
                    }
                    if v < -lbgn {
                        v = -lbgn;
                    }
                    self.clean_nlp = v as i16;
                } else {
                    // Plain muting; doesn't sound great, used mainly for
                    // G.168 testing.
                    self.clean_nlp = 0;
                }
            } else if lclean < 40 {
                // Slow background noise average, gated so high-level
                // near-end speech stays out of it.
                self.lbgn.update(self.clean);
            }
        }

        // Roll around the taps buffer.
        if self.curr_pos == 0 {
            self.curr_pos = self.taps;
        }
        self.curr_pos -= 1;

        if self.adaption_mode.contains(AdaptionMode::DISABLE) {
            self.clean_nlp = rx;
        }

        // Output scaled back up to match the input scaling.
        ((i32::from(self.clean_nlp)) << 1) as i16
    }

    /// Least mean squares update of the background taps, proportional to
    /// the background residual times the stored far-end history.
    fn lms_adapt_bg(&mut self, clean: i32, shift: i32) {
        let factor = if shift > 0 {
            clean << shift
        } else {
            clean >> -shift
        };

        // Tap i pairs with history[(curr_pos + i) mod taps]; split the
        // wrap into its two contiguous runs.
        let offset2 = self.curr_pos;
        let offset1 = self.taps - offset2;
        let history = self.fir_bg.history();

        for (tap, &h) in self.taps_bg[offset1..].iter_mut().zip(&history[..offset2]) {
            let exp = i32::from(h).wrapping_mul(factor);
            *tap = tap.wrapping_add((exp.wrapping_add(1 << 14) >> 15) as i16);
        }
        for (tap, &h) in self.taps_bg[..offset1].iter_mut().zip(&history[offset2..]) {
            let exp = i32::from(h).wrapping_mul(factor);
            *tap = tap.wrapping_add((exp.wrapping_add(1 << 14) >> 15) as i16);
        }
    }

    /// Standalone tx-direction DC blocker.
    ///
    /// Usually called as part of the host's tx chain, before the sample is
    /// played into the hybrid: low frequency energy makes hybrids go
    /// non-linear, and DC is bad for the LMS, so both are best removed at
    /// the source. Gated on [`AdaptionMode::TX_HPF`].
    pub fn hpf_tx(&mut self, tx: i16) -> i16 {
        if self.adaption_mode.contains(AdaptionMode::TX_HPF) {
            self.tx_hpf.process(tx)
        } else {
            tx
        }
    }

    /// Resets every mutable runtime value to its post-create state,
    /// keeping the configuration (taps, mode) and buffer identity. Two
    /// flushed cancellers with the same configuration replay a sample
    /// stream bit-identically.
    pub fn flush(&mut self) {
        self.tx = 0;
        self.rx = 0;
        self.clean = 0;
        self.clean_nlp = 0;
        self.adapt = false;
        self.shift = 0;
        self.factor = 0;

        self.curr_pos = self.taps - 1;
        self.pstates = 0;
        self.cond_met = 0;

        self.fir_fg.flush();
        self.fir_bg.flush();
        self.taps_fg.fill(0);
        self.taps_bg.fill(0);

        self.ltx.flush();
        self.lrx.flush();
        self.lclean.flush();
        self.lclean_bg.flush();
        self.lbgn.flush();

        self.tx_hpf.flush();
        self.rx_hpf.flush();

        self.dtd.flush();
        self.cng.flush();
    }

    /// Copies the current foreground coefficients into the snapshot
    /// buffer, readable via [`snapshot_taps`](Self::snapshot_taps).
    pub fn snapshot(&mut self) {
        self.snapshot.copy_from_slice(&self.taps_fg);
    }

    /// The coefficients captured by the last [`snapshot`](Self::snapshot).
    pub fn snapshot_taps(&self) -> &[i16] {
        &self.snapshot
    }

    /// Replaces the adaption mode; takes effect on the next `update`.
    pub fn set_adaption_mode(&mut self, adaption_mode: AdaptionMode) {
        self.adaption_mode = adaption_mode;
    }

    /// The active adaption mode.
    pub fn adaption_mode(&self) -> AdaptionMode {
        self.adaption_mode
    }

    /// Filter length in taps.
    pub fn taps(&self) -> usize {
        self.taps
    }

    /// Current write cursor, shared by both FIR paths.
    pub fn curr_pos(&self) -> usize {
        self.curr_pos
    }

    /// Running block power of the far-end history.
    pub fn pstates(&self) -> i32 {
        self.pstates
    }

    /// Short-term far-end level.
    pub fn ltx(&self) -> i32 {
        self.ltx.level()
    }

    /// Short-term near-end level.
    pub fn lrx(&self) -> i32 {
        self.lrx.level()
    }

    /// Short-term foreground residual level.
    pub fn lclean(&self) -> i32 {
        self.lclean.level()
    }

    /// Short-term background residual level.
    pub fn lclean_bg(&self) -> i32 {
        self.lclean_bg.level()
    }

    /// Background noise level estimate.
    pub fn lbgn(&self) -> i32 {
        self.lbgn.level()
    }

    /// Upper bound companion of the background noise estimate.
    pub fn lbgn_upper(&self) -> i32 {
        self.lbgn.upper_bound()
    }

    /// Accumulator behind [`lbgn_upper`](Self::lbgn_upper).
    pub fn lbgn_upper_acc(&self) -> i32 {
        self.lbgn.upper_bound_acc()
    }

    /// The level the comfort noise generator last shaped to (1000 until
    /// the first suppressed sample).
    pub fn cng_level(&self) -> i32 {
        self.cng.level()
    }

    /// Remaining double-talk hold-off, in samples.
    pub fn nonupdate_dwell(&self) -> i32 {
        self.dtd.dwell()
    }

    /// Consecutive samples the transfer condition has held.
    pub fn cond_met(&self) -> i32 {
        self.cond_met
    }

    /// Whether the last `update` promoted the background coefficients.
    pub fn adapted(&self) -> bool {
        self.adapt
    }

    /// LMS step exponent derived on the last adapting sample.
    pub fn shift(&self) -> i16 {
        self.shift
    }

    /// Vestigial step factor record (always zero after `update`).
    pub fn factor(&self) -> i32 {
        self.factor
    }

    /// The last raw far-end sample seen.
    pub fn last_tx(&self) -> i16 {
        self.tx
    }

    /// The last raw near-end sample seen.
    pub fn last_rx(&self) -> i16 {
        self.rx
    }

    /// The last foreground residual (before non-linear processing).
    pub fn last_clean(&self) -> i16 {
        self.clean
    }

    /// The foreground coefficient vector.
    pub fn foreground_taps(&self) -> &[i16] {
        &self.taps_fg
    }

    /// The background coefficient vector.
    pub fn background_taps(&self) -> &[i16] {
        &self.taps_bg
    }
}
