//! Echo canceller statistics.

/// Point-in-time statistics from a
/// [`LineEchoProcessor`](crate::LineEchoProcessor).
///
/// The raw levels are the canceller's internal short-term averages
/// (single-pole IIRs over the half-scaled samples); derived metrics are
/// `None` when the underlying levels cannot support them.
#[derive(Debug, Clone, Default)]
pub struct CancellerStats {
    /// Short-term far-end (reference) level.
    pub far_level: i32,
    /// Short-term near-end (capture) level.
    pub near_level: i32,
    /// Short-term level of the foreground residual.
    pub residual_level: i32,
    /// Short-term level of the background residual.
    pub residual_level_background: i32,
    /// Tracked background noise level.
    pub background_noise_level: i32,
    /// Remaining double-talk hold-off, in samples; 0 when adaptation is
    /// free to run.
    pub double_talk_hangover: i32,
    /// LMS step exponent derived on the last adapting sample.
    pub lms_shift: i16,
    /// Echo Return Loss Enhancement estimate in dB:
    /// `20 log10(near_level / residual_level)`.
    pub echo_return_loss_enhancement: Option<f64>,
}

impl CancellerStats {
    pub(crate) fn derive(mut self) -> Self {
        self.echo_return_loss_enhancement = if self.near_level > 0 && self.residual_level > 0 {
            Some(20.0 * (f64::from(self.near_level) / f64::from(self.residual_level)).log10())
        } else {
            None
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erle_requires_both_levels() {
        let stats = CancellerStats {
            near_level: 0,
            residual_level: 100,
            ..Default::default()
        }
        .derive();
        assert_eq!(stats.echo_return_loss_enhancement, None);
    }

    #[test]
    fn erle_measures_the_level_ratio() {
        let stats = CancellerStats {
            near_level: 1000,
            residual_level: 10,
            ..Default::default()
        }
        .derive();
        let erle = stats.echo_return_loss_enhancement.unwrap();
        assert!((erle - 40.0).abs() < 1e-9);
    }
}
