//! Echo canceller configuration.

use sordina_lec::AdaptionMode;

/// Top-level configuration for a [`LineEchoProcessor`](crate::LineEchoProcessor).
///
/// The default matches the launch mode of the reference host: adaptation
/// on, residual clipping, and DC blocking on both paths.
///
/// # Example
///
/// ```
/// use sordina::{Config, NlpConfig, NlpMode};
///
/// let config = Config {
///     taps: 1024,
///     nlp: Some(NlpConfig {
///         mode: NlpMode::ComfortNoise,
///     }),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// FIR length per filter path, in taps. A power of two covering the
    /// worst-case echo tail is recommended (e.g. 2048 taps spans 128 ms
    /// at 16 kHz).
    pub taps: usize,
    /// Allow the foreground filter to be overwritten from the background
    /// filter when the background demonstrably outperforms it.
    pub adaptation: bool,
    /// Non-linear residual processing. `None` leaves the linear residual
    /// untouched.
    pub nlp: Option<NlpConfig>,
    /// DC-block the far-end path (applied via
    /// [`hpf_far_frame`](crate::LineEchoProcessor::hpf_far_frame)).
    pub tx_hpf: bool,
    /// DC-block the near-end path inside the canceller.
    pub rx_hpf: bool,
    /// Pass the near-end signal through unmodified while keeping the
    /// canceller state running.
    pub bypass: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            taps: 256,
            adaptation: true,
            nlp: Some(NlpConfig::default()),
            tx_hpf: true,
            rx_hpf: true,
            bypass: false,
        }
    }
}

/// Non-linear processor settings.
#[derive(Debug, Clone, Default)]
pub struct NlpConfig {
    /// What to do with a residual the suppressor has decided to remove.
    pub mode: NlpMode,
}

/// Treatment of a suppressed residual.
///
/// The variants are mutually exclusive by construction; the core applies
/// comfort noise in preference to clipping when both bits are set, and
/// this enum never sets both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NlpMode {
    /// Mute the residual outright. Mainly useful for G.168 compliance
    /// testing; sounds dead on real calls.
    Mute,
    /// Clip the residual to the tracked background noise level.
    #[default]
    Clip,
    /// Replace the residual with synthetic comfort noise at the tracked
    /// background level.
    ComfortNoise,
}

impl Config {
    /// The core adaption-mode bitset equivalent to this configuration.
    pub fn adaption_mode(&self) -> AdaptionMode {
        let mut mode = AdaptionMode::NONE;
        if self.adaptation {
            mode |= AdaptionMode::ADAPT;
        }
        if let Some(nlp) = &self.nlp {
            mode |= AdaptionMode::NLP;
            match nlp.mode {
                NlpMode::Mute => {}
                NlpMode::Clip => mode |= AdaptionMode::CLIP,
                NlpMode::ComfortNoise => mode |= AdaptionMode::CNG,
            }
        }
        if self.tx_hpf {
            mode |= AdaptionMode::TX_HPF;
        }
        if self.rx_hpf {
            mode |= AdaptionMode::RX_HPF;
        }
        if self.bypass {
            mode |= AdaptionMode::DISABLE;
        }
        mode
    }
}
