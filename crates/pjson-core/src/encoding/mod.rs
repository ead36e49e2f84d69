//! Symbol-level encoding: varints, float/date payloads and token-start
//! classification

pub mod float;
pub mod varint;

pub use float::{encode_date, encode_float, float_from_bits};
pub use varint::{decode_varint, encode_signed, encode_unsigned, Varint, RADIX};

use crate::types::tag;

/// What a token-start symbol announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lead {
    /// Not valid at a token boundary
    Invalid,
    /// One of the `tag` constants; the symbol itself identifies it
    Tag,
    SmallInt(u8),
    ShortArray(u8),
    ShortObject(u8),
}

const LEADS: [Lead; 256] = {
    let mut table = [Lead::Invalid; 256];

    let tags = [
        tag::NULL,
        tag::TRUE,
        tag::FALSE,
        tag::INT,
        tag::FLOAT,
        tag::DATE,
        tag::STRING,
        tag::STRING_DEF,
        tag::STRING_REF,
        tag::KEY,
        tag::KEY_DEF,
        tag::KEY_REF,
        tag::ARRAY,
        tag::OBJECT,
        tag::STRUCT_REF,
        tag::PAD,
    ];
    let mut i = 0;
    while i < tags.len() {
        table[tags[i] as usize] = Lead::Tag;
        i += 1;
    }

    i = 0;
    while i < tag::SMALL_INT.len() {
        table[tag::SMALL_INT[i] as usize] = Lead::SmallInt(i as u8);
        i += 1;
    }

    i = 0;
    while i < tag::SHORT_LEN {
        table[tag::SHORT_ARRAY[i] as usize] = Lead::ShortArray(i as u8);
        table[tag::SHORT_OBJECT[i] as usize] = Lead::ShortObject(i as u8);
        i += 1;
    }

    table
};

/// Classify a token-start symbol
#[inline]
pub fn classify(symbol: u8) -> Lead {
    LEADS[symbol as usize]
}

/// Append the token for an integer
pub fn encode_int(value: i64, out: &mut String) {
    if (0..=tag::SMALL_INT_MAX).contains(&value) {
        out.push(tag::SMALL_INT[value as usize] as char);
    } else {
        out.push(tag::INT as char);
        encode_signed(value, out);
    }
}

/// Append a container start token, short form when the length allows
pub fn encode_container_start(short: &[u8; tag::SHORT_LEN], long: u8, len: usize, out: &mut String) {
    if len < tag::SHORT_LEN {
        out.push(short[len] as char);
    } else {
        out.push(long as char);
        encode_unsigned(len as u64, out);
    }
}
