//! Base-91 text varints
//!
//! Values below the radix are a single digit symbol. Everything else is a
//! sign marker, most-significant-first digits and a terminator, so a reader
//! can find the end without knowing the length up front.

use crate::{Error, Result};

/// Number of digit symbols
pub const RADIX: u64 = 91;

/// Digit symbols in value order: printable ASCII without `+`, `-` and `|`
pub const DIGITS: &[u8; 91] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!\"#$%&'()*,./:;<=>?@[\\]^_`{}~";

/// Introduces a multi-digit non-negative value
pub const LONG_POSITIVE: u8 = b'+';

/// Introduces a negative value
pub const LONG_NEGATIVE: u8 = b'-';

/// Ends a multi-digit value
pub const TERMINATOR: u8 = b'|';

/// Enough digits for any u64 (91^10 > 2^64)
pub const MAX_DIGITS: usize = 10;

const NOT_A_DIGIT: u8 = 0xFF;

const DIGIT_VALUES: [u8; 256] = {
    let mut table = [NOT_A_DIGIT; 256];
    let mut i = 0;
    while i < DIGITS.len() {
        table[DIGITS[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Value of a digit symbol, if it is one
#[inline]
pub fn digit_value(symbol: u8) -> Option<u8> {
    match DIGIT_VALUES[symbol as usize] {
        NOT_A_DIGIT => None,
        v => Some(v),
    }
}

/// A decoded varint: sign plus 64-bit magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Varint {
    pub negative: bool,
    pub magnitude: u64,
}

impl Varint {
    /// Interpret as an unsigned quantity (length, id, bit pattern)
    pub fn to_u64(self) -> Result<u64> {
        if self.negative {
            return Err(Error::InvalidEncoding(
                "negative varint where an unsigned value is required".into(),
            ));
        }
        Ok(self.magnitude)
    }

    /// Interpret as a signed integer
    pub fn to_i64(self) -> Result<i64> {
        if self.negative {
            if self.magnitude > i64::MAX as u64 + 1 {
                return Err(Error::InvalidEncoding("varint below i64::MIN".into()));
            }
            Ok((self.magnitude as i64).wrapping_neg())
        } else {
            i64::try_from(self.magnitude)
                .map_err(|_| Error::InvalidEncoding("varint above i64::MAX".into()))
        }
    }
}

fn push_digits(mut value: u64, out: &mut String) {
    let mut digits = [0u8; MAX_DIGITS];
    let mut n = 0;
    loop {
        digits[n] = DIGITS[(value % RADIX) as usize];
        n += 1;
        value /= RADIX;
        if value == 0 {
            break;
        }
    }
    for &d in digits[..n].iter().rev() {
        out.push(d as char);
    }
}

/// Encode a non-negative value
pub fn encode_unsigned(value: u64, out: &mut String) {
    if value < RADIX {
        out.push(DIGITS[value as usize] as char);
        return;
    }
    out.push(LONG_POSITIVE as char);
    push_digits(value, out);
    out.push(TERMINATOR as char);
}

/// Encode a signed value
pub fn encode_signed(value: i64, out: &mut String) {
    if value >= 0 {
        encode_unsigned(value as u64, out);
    } else {
        out.push(LONG_NEGATIVE as char);
        push_digits(value.unsigned_abs(), out);
        out.push(TERMINATOR as char);
    }
}

/// Decode a varint from the start of `buf`
///
/// Returns `Ok(None)` when `buf` ends before the varint does, otherwise the
/// value and the number of bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<Option<(Varint, usize)>> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };

    let negative = match first {
        LONG_POSITIVE => false,
        LONG_NEGATIVE => true,
        symbol => {
            let value = digit_value(symbol).ok_or_else(|| {
                Error::InvalidEncoding(format!("invalid varint symbol 0x{:02x}", symbol))
            })?;
            let varint = Varint {
                negative: false,
                magnitude: value as u64,
            };
            return Ok(Some((varint, 1)));
        }
    };

    let mut magnitude: u64 = 0;
    let mut pos = 1;
    loop {
        let Some(&symbol) = buf.get(pos) else {
            return Ok(None);
        };
        pos += 1;

        if symbol == TERMINATOR {
            if pos == 2 {
                return Err(Error::InvalidEncoding("varint has no digits".into()));
            }
            break;
        }
        if pos - 1 > MAX_DIGITS {
            return Err(Error::InvalidEncoding("varint too long".into()));
        }

        let digit = digit_value(symbol).ok_or_else(|| {
            Error::InvalidEncoding(format!("invalid varint digit 0x{:02x}", symbol))
        })?;
        magnitude = magnitude
            .checked_mul(RADIX)
            .and_then(|m| m.checked_add(digit as u64))
            .ok_or_else(|| Error::InvalidEncoding("varint overflows 64 bits".into()))?;
    }

    Ok(Some((Varint { negative, magnitude }, pos)))
}
