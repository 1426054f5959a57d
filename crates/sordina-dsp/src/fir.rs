//! 16-bit fixed-point FIR filter with a circular history buffer.
//!
//! The history is written backwards: each processed sample lands at the
//! current cursor position and the cursor then rolls down with wraparound,
//! so `history[(cursor + i) mod taps]` is the input delayed by `i` samples.
//! Coefficients are Q15 and are passed in per call rather than owned, which
//! lets one caller run several coefficient sets over separately maintained
//! histories while keeping the vectors in a single place.

/// Circular-history Q15 FIR filter state.
#[derive(Debug, Clone)]
pub struct Fir16 {
    history: Vec<i16>,
    curr_pos: usize,
}

impl Fir16 {
    /// Creates a filter with a zeroed history of `taps` samples.
    ///
    /// # Panics
    ///
    /// Panics if `taps` is 0.
    pub fn new(taps: usize) -> Self {
        assert!(taps > 0, "FIR length must be non-zero");
        Self {
            history: vec![0; taps],
            curr_pos: taps - 1,
        }
    }

    /// Number of taps (history length).
    #[inline]
    pub fn taps(&self) -> usize {
        self.history.len()
    }

    /// Current write cursor position.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.curr_pos
    }

    /// The history sample that the next [`process`](Self::process) call will
    /// overwrite, i.e. the oldest sample in the window.
    #[inline]
    pub fn oldest(&self) -> i16 {
        self.history[self.curr_pos]
    }

    /// The raw history buffer, indexed as described in the module docs.
    #[inline]
    pub fn history(&self) -> &[i16] {
        &self.history
    }

    /// Writes `sample` into the history, convolves the history with
    /// `coeffs`, rolls the cursor, and returns the Q15 convolution output
    /// `(sum >> 15)` truncated to 16 bits.
    ///
    /// The accumulator wraps on overflow, matching the 32-bit integer
    /// arithmetic of the reference implementation.
    ///
    /// `coeffs` must have the same length as the history.
    pub fn process(&mut self, coeffs: &[i16], sample: i16) -> i16 {
        let taps = self.history.len();
        debug_assert_eq!(coeffs.len(), taps, "coefficient/history length mismatch");

        self.history[self.curr_pos] = sample;

        // Split the circular convolution into the two contiguous segments
        // around the cursor: tap i pairs with history[(cursor + i) mod taps].
        let offset2 = self.curr_pos;
        let offset1 = taps - offset2;
        let mut acc: i32 = 0;
        for (&c, &h) in coeffs[offset1..].iter().zip(&self.history[..offset2]) {
            acc = acc.wrapping_add(i32::from(c) * i32::from(h));
        }
        for (&c, &h) in coeffs[..offset1].iter().zip(&self.history[offset2..]) {
            acc = acc.wrapping_add(i32::from(c) * i32::from(h));
        }

        if self.curr_pos == 0 {
            self.curr_pos = taps;
        }
        self.curr_pos -= 1;

        (acc >> 15) as i16
    }

    /// Zeroes the history and resets the cursor to its initial position.
    pub fn flush(&mut self) {
        self.history.fill(0);
        self.curr_pos = self.history.len() - 1;
    }
}
