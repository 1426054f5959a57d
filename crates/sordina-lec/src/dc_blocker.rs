//! DC blocking high-pass filter.
//!
//! One of the classic DC removal designs: the difference between successive
//! samples makes a lousy HPF on its own, and a pole near DC (at 1 − Beta,
//! real axis only) flattens the response back out, leaving a nicely rolled
//! off bass end. The state is kept in extended fractional precision, which
//! noise-shapes the result and lets values track all the way down to zero.
//!
//! Any DC on either path badly slows LMS convergence, and low-frequency
//! energy (soft phones emit content down to 20 Hz) can drive a hybrid
//! non-linear, so both the tx and rx paths get one of these.

use crate::config::DC_LOG2BETA;

/// Fixed-point DC blocker with a configurable output clamp.
///
/// The clamp differs per path: ±32767 on tx, ±16383 on rx (the rx sample
/// has already been scaled down by one bit when it reaches the filter).
#[derive(Debug, Clone)]
pub(crate) struct DcBlocker {
    state: i32,
    prev_in: i32,
    limit: i32,
}

impl DcBlocker {
    pub(crate) const fn new(limit: i32) -> Self {
        Self {
            state: 0,
            prev_in: 0,
            limit,
        }
    }

    /// Filters one sample.
    ///
    /// The input is carried at Q15 with the `tmp -= tmp >> 4` correction
    /// keeping the pass-band gain at 1.0. That can still saturate a little
    /// under impulse conditions and may roll over the clamp on sustained
    /// peak-level signals, but the scale of such clipping is small enough
    /// not to disturb downstream processing.
    pub(crate) fn process(&mut self, sample: i16) -> i16 {
        let mut tmp = i32::from(sample) << 15;
        tmp -= tmp >> 4;
        self.state = self.state.wrapping_add(
            (-(self.state >> DC_LOG2BETA))
                .wrapping_add(tmp)
                .wrapping_sub(self.prev_in),
        );

        let out = (self.state >> 15).clamp(-self.limit, self.limit);
        self.prev_in = tmp;
        out as i16
    }

    pub(crate) fn flush(&mut self) {
        self.state = 0;
        self.prev_in = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    #[test]
    fn dc_input_decays_to_zero() {
        let mut hpf = DcBlocker::new(32767);
        let mut out = 0i16;
        for _ in 0..4000 {
            out = hpf.process(1000);
        }
        assert_eq!(out, 0, "sustained DC must be fully removed");
    }

    #[test]
    fn midband_gain_is_close_to_unity() {
        let mut hpf = DcBlocker::new(32767);
        // 1 kHz at 8 kHz sampling, well above the ~160 Hz corner.
        let amplitude = 8000.0f64;
        let step = 2.0 * PI * 1000.0 / 8000.0;

        let mut peak = 0i16;
        for n in 0..8000 {
            let x = (amplitude * (step * n as f64).sin()) as i16;
            let y = hpf.process(x);
            if n > 4000 {
                peak = peak.max(y.unsigned_abs() as i16);
            }
        }
        assert!(
            (7000..=8400).contains(&peak),
            "1 kHz gain should be near unity, peak was {peak}"
        );
    }

    #[test]
    fn output_respects_clamp() {
        let mut hpf = DcBlocker::new(100);
        let mut seen_limit = false;
        for n in 0..64 {
            let x = if n % 2 == 0 { 20000 } else { -20000 };
            let y = hpf.process(x);
            assert!((-100..=100).contains(&y));
            if y.unsigned_abs() == 100 {
                seen_limit = true;
            }
        }
        assert!(seen_limit, "alternating full-scale input should hit the clamp");
    }

    #[test]
    fn flush_clears_state() {
        let mut hpf = DcBlocker::new(16383);
        for _ in 0..100 {
            hpf.process(12345);
        }
        hpf.flush();
        assert_eq!(hpf.process(0), 0);
    }
}
