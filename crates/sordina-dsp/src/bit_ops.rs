//! Bit-position arithmetic.
//!
//! The canceller approximates `log2(x)` by the position of the highest set
//! bit, which keeps the normalised LMS step-size derivation free of divides.

/// Zero-based index of the most significant set bit of `bits`.
///
/// Returns 0 for an input of 0, so `top_bit` can be used directly as a
/// `floor(log2)` approximation on power quantities that may momentarily be
/// zero.
#[inline]
pub fn top_bit(bits: u32) -> i32 {
    if bits == 0 {
        0
    } else {
        (31 - bits.leading_zeros()) as i32
    }
}
