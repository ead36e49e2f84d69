//! Lossless float and date payloads
//!
//! A float travels as the unsigned varint of its IEEE-754 bit pattern, so
//! every double (including -0.0, subnormals and NaN payloads) survives
//! bit-for-bit. Dates are signed epoch milliseconds.

use super::varint::{encode_signed, encode_unsigned};

/// Append the varint payload of a float
pub fn encode_float(value: f64, out: &mut String) {
    encode_unsigned(value.to_bits(), out);
}

/// Rebuild a float from its decoded bit pattern
#[inline]
pub fn float_from_bits(bits: u64) -> f64 {
    f64::from_bits(bits)
}

/// Append the varint payload of a date
pub fn encode_date(millis: i64, out: &mut String) {
    encode_signed(millis, out);
}
