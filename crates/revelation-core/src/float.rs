//! Bit-exact conversions between register words and IEEE-754 singles.
//!
//! Non-finite values are classified from the bit pattern, never from host
//! float behaviour, so every NaN collapses to one canonical encoding.

/// Encoding produced for every NaN result.
pub const CANONICAL_NAN: u32 = 0x7fff_ffff;
/// Positive infinity.
pub const POSITIVE_INFINITY: u32 = 0x7f80_0000;
/// Negative infinity.
pub const NEGATIVE_INFINITY: u32 = 0xff80_0000;

const EXPONENT_MASK: u32 = 0xff;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Biased 8-bit exponent of a single-precision pattern.
#[must_use]
pub const fn exponent(bits: u32) -> u32 {
    (bits >> 23) & EXPONENT_MASK
}

/// 23-bit mantissa of a single-precision pattern.
#[must_use]
pub const fn mantissa(bits: u32) -> u32 {
    bits & MANTISSA_MASK
}

/// `true` for any NaN pattern.
#[must_use]
pub const fn is_nan_bits(bits: u32) -> bool {
    exponent(bits) == EXPONENT_MASK && mantissa(bits) != 0
}

/// `true` for either infinity.
#[must_use]
pub const fn is_inf_bits(bits: u32) -> bool {
    exponent(bits) == EXPONENT_MASK && mantissa(bits) == 0
}

/// `true` for a denormal (non-zero mantissa, zero exponent).
#[must_use]
pub const fn is_subnormal_bits(bits: u32) -> bool {
    exponent(bits) == 0 && mantissa(bits) != 0
}

/// Interprets a register word as a float.
#[must_use]
pub fn bits_to_float(bits: u32) -> f32 {
    if is_inf_bits(bits) {
        if bits >> 31 == 0 {
            f32::INFINITY
        } else {
            f32::NEG_INFINITY
        }
    } else if is_nan_bits(bits) {
        f32::NAN
    } else {
        f32::from_bits(bits)
    }
}

/// Encodes a float as a register word.
///
/// NaN maps to [`CANONICAL_NAN`] and both zeros map to `0`.
#[must_use]
pub fn float_to_bits(value: f32) -> u32 {
    if value.is_nan() {
        CANONICAL_NAN
    } else if value == f32::INFINITY {
        POSITIVE_INFINITY
    } else if value == f32::NEG_INFINITY {
        NEGATIVE_INFINITY
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}
