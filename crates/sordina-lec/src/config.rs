//! Adaption mode flags and algorithm constants.

use core::ops::{BitAnd, BitOr, BitOrAssign};

/// log2 of the DC blocking filter's Beta coefficient.
///
/// Beta = 2⁻³ places the 3 dB corner at roughly 0.125 rad, about 159 Hz at
/// telephony rates.
pub const DC_LOG2BETA: u32 = 3;

/// Floor added to the filter-state power before deriving the LMS step, so
/// the step exponent stays sane when the far end goes quiet.
pub const MIN_TX_POWER_FOR_ADAPTION: i32 = 64;

/// Near-end level above which (combined with Lrx > Ltx) double-talk is
/// declared.
pub const MIN_RX_POWER_FOR_ADAPTION: i32 = 64;

/// Double-talk hangover, in samples: 600 samples is 75 ms at 8 kHz.
pub const DTD_HANGOVER: i32 = 600;

/// Runtime behaviour flags for the echo canceller.
///
/// Each flag is an independent bit; combine them with `|`. The empty set
/// (also [`AdaptionMode::default`]) runs the linear canceller with no
/// adaptation transfer, no NLP and no high-pass filtering.
///
/// `CNG` and `CLIP` select the residual treatment inside the NLP; when both
/// are set, `CNG` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdaptionMode(u32);

impl AdaptionMode {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Allow foreground ← background coefficient transfer.
    pub const ADAPT: Self = Self(1 << 0);
    /// Enable the non-linear processor on the residual.
    pub const NLP: Self = Self(1 << 1);
    /// Within the NLP, replace the suppressed residual with comfort noise.
    pub const CNG: Self = Self(1 << 2);
    /// Within the NLP, clip the residual to the background noise level.
    pub const CLIP: Self = Self(1 << 3);
    /// DC-block the tx (far-end reference) path via
    /// [`EchoCanceller::hpf_tx`](crate::EchoCanceller::hpf_tx).
    pub const TX_HPF: Self = Self(1 << 4);
    /// DC-block the rx (near-end capture) path inside `update`.
    pub const RX_HPF: Self = Self(1 << 5);
    /// Bypass: emit the rx sample unmodified while the canceller keeps
    /// running internally.
    pub const DISABLE: Self = Self(1 << 6);

    /// Every defined flag at once.
    pub const ALL: Self = Self(0x7f);

    /// Builds a mode from raw bits, discarding undefined ones.
    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Whether every flag in `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The raw flag bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for AdaptionMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AdaptionMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for AdaptionMode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}
