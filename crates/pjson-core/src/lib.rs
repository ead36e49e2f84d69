//! PJSON - Progressive JSON
//!
//! A compact, self-describing text encoding for JSON-like values that can be
//! decoded while it is still arriving.
//!
//! # Key Features
//!
//! - **Base-91 varints**: integers, lengths and ids in printable ASCII
//! - **String dictionary**: repeated strings and keys become short references
//! - **Structural references**: shared arrays/objects are written once
//! - **Bit-exact floats and dates**: no decimal round-trip loss
//! - **Progressive decoding**: any prefix yields the partial tree so far
//!
//! # Example
//!
//! ```rust,ignore
//! use pjson_core::{decode, encode, Decoder, Value};
//!
//! // One-shot
//! let value = Value::object([("message", Value::from("Hello World"))]);
//! let wire = encode(&value)?;
//! assert_eq!(decode(&wire)?, value);
//!
//! // Streaming: feed bytes as they arrive
//! let mut decoder = Decoder::new();
//! let progress = decoder.feed(&wire[..5])?;   // partial object
//! let progress = decoder.feed(&wire[5..])?;   // complete
//! assert!(progress.complete);
//! ```

pub mod compare;
pub mod date;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod encoding;
pub mod error;
pub mod inspect;
pub mod lexer;
pub mod refs;
pub mod types;

// Re-exports
pub use compare::{compare, CompareStats};
pub use date::Date;
pub use decoder::{Decoder, ParseState, Progress};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use inspect::inspect;
pub use types::Value;

use serde::{de::DeserializeOwned, Serialize};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// PJSON configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PjConfig {
    /// Dictionary growth stops at this many entries
    pub max_dict_entries: usize,
    /// Value strings shorter than this many bytes are never interned
    pub min_dict_len: usize,
    /// Emit structural references for repeated containers
    pub structural_refs: bool,
    /// Maximum container nesting, on both encode and decode
    pub max_depth: usize,
}

impl Default for PjConfig {
    fn default() -> Self {
        Self {
            max_dict_entries: 4096,
            min_dict_len: 3,
            structural_refs: true,
            max_depth: 512,
        }
    }
}

/// Encode a value with the default configuration
pub fn encode(value: &Value) -> Result<String> {
    Encoder::new().encode(value)
}

/// Encode a value with a custom configuration
pub fn encode_with(value: &Value, config: PjConfig) -> Result<String> {
    Encoder::with_config(config).encode(value)
}

/// Decode a complete wire string
///
/// A truncated stream is [`Error::Incomplete`]; use [`Decoder`] to consume
/// partial input.
pub fn decode(wire: &str) -> Result<Value> {
    decode_with(wire, PjConfig::default())
}

/// Decode a complete wire string with a custom configuration
pub fn decode_with(wire: &str, config: PjConfig) -> Result<Value> {
    let mut decoder = Decoder::with_config(config);
    decoder.push(wire)?;
    decoder.finish()
}

/// Create a decoder for incrementally arriving input
pub fn create_streaming_decoder() -> Decoder {
    Decoder::new()
}

/// Encode JSON text
pub fn encode_json(json: &str) -> Result<String> {
    let json: serde_json::Value =
        serde_json::from_str(json).map_err(|e| Error::ParseError(e.to_string()))?;
    encode(&Value::from_json(&json)?)
}

/// Decode a wire string to JSON text
pub fn decode_json(wire: &str) -> Result<String> {
    serde_json::to_string(&decode(wire)?.to_json())
        .map_err(|e| Error::SerializeError(e.to_string()))
}

/// Encode any serializable type
pub fn to_wire<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value).map_err(|e| Error::SerializeError(e.to_string()))?;
    encode(&Value::from_json(&json)?)
}

/// Decode into any deserializable type
pub fn from_wire<T: DeserializeOwned>(wire: &str) -> Result<T> {
    serde_json::from_value(decode(wire)?.to_json()).map_err(|e| Error::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn hello_users() -> Value {
        Value::object([
            ("message", Value::from("Hello World")),
            (
                "users",
                Value::array(vec![
                    Value::object([
                        ("id", Value::from(1)),
                        ("name", Value::from("Alice")),
                        ("active", Value::from(true)),
                    ]),
                    Value::object([
                        ("id", Value::from(2)),
                        ("name", Value::from("Bob")),
                        ("active", Value::from(false)),
                    ]),
                ]),
            ),
        ])
    }

    fn mixed() -> Value {
        let shared = Value::object([
            ("role", Value::from("admin")),
            ("scopes", Value::array(vec![Value::from("read"), Value::from("write")])),
        ]);
        Value::object([
            ("title", Value::from("naïve café ☕ 日本")),
            ("when", Value::Date(Date::from_millis(1_735_689_600_123))),
            ("ratio", Value::Float(123.456789012345)),
            ("neg", Value::Float(-0.1)),
            ("big", Value::from(i64::MAX)),
            ("small", Value::from(i64::MIN)),
            ("count", Value::from(1234)),
            ("none", Value::Null),
            ("empty", Value::array(vec![Value::empty_array(), Value::empty_object()])),
            ("a", shared.clone()),
            ("b", shared),
            ("long", Value::array((0..40).map(|i| Value::from(i * 7 - 100)).collect())),
        ])
    }

    #[test]
    fn test_roundtrip() {
        for value in [hello_users(), mixed(), Value::Null, Value::from("x")] {
            let wire = encode(&value).unwrap();
            assert_eq!(decode(&wire).unwrap(), value);
        }
    }

    #[test]
    fn test_size_scenario_beats_json() {
        let stats = compare(&hello_users()).unwrap();
        assert!(stats.pj < stats.json, "{:?}", stats);
    }

    #[test]
    fn test_dictionary_writes_repeated_string_once() {
        let value = Value::object([
            ("a", Value::from("Alice")),
            ("b", Value::from("Alice")),
            ("c", Value::from("Alice")),
        ]);
        assert_eq!(encode(&value).unwrap().matches("Alice").count(), 1);
    }

    #[test]
    fn test_structural_refs_shrink_repeated_objects() {
        let user = Value::object([
            ("id", Value::from(42)),
            ("name", Value::from("Alice Johnson")),
            ("email", Value::from("alice@example.com")),
            ("roles", Value::array(vec![Value::from("admin"), Value::from("editor")])),
            ("active", Value::from(true)),
        ]);
        let single = encode(&user).unwrap();
        let value = Value::object([
            ("primary", user.clone()),
            ("secondary", user.clone()),
            ("list", Value::array(vec![user.clone(), user.clone(), user])),
        ]);
        let wire = encode(&value).unwrap();

        assert!(wire.len() < 2 * single.len(), "{} vs {}", wire.len(), single.len());
        assert_eq!(decode(&wire).unwrap(), value);
    }

    #[test]
    fn test_float_is_bit_exact_and_shorter_than_json() {
        let f = 123.456789012345_f64;
        let wire = encode(&Value::Float(f)).unwrap();
        let decoded = decode(&wire).unwrap().as_f64().unwrap();

        assert_eq!(decoded.to_bits(), f.to_bits());
        assert!(wire.len() < serde_json::to_string(&f).unwrap().len());
    }

    #[test]
    fn test_date_keeps_milliseconds() {
        let t = 1_700_000_000_123;
        let wire = encode(&Value::Date(Date::from_millis(t))).unwrap();
        assert_eq!(decode(&wire).unwrap().as_date().map(Date::millis), Some(t));
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(decode(&encode(&Value::empty_array()).unwrap()).unwrap(), Value::empty_array());
        assert_eq!(decode(&encode(&Value::empty_object()).unwrap()).unwrap(), Value::empty_object());
    }

    #[test]
    fn test_one_shot_truncated_is_incomplete_not_malformed() {
        let wire = encode(&hello_users()).unwrap();
        let err = decode(&wire[..wire.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::Incomplete { .. }));
        assert!(!err.is_malformed());

        assert!(decode("").is_err());
    }

    #[test]
    fn test_every_prefix_split() {
        let value = mixed();
        let wire = encode(&value).unwrap();
        let bytes = wire.as_bytes();

        for k in 0..=bytes.len() {
            let mut decoder = Decoder::new();
            let first = decoder.feed(&bytes[..k]).unwrap();
            assert_eq!(first.complete, k == bytes.len(), "cut at {}", k);

            let rest = decoder.feed(&bytes[k..]).unwrap();
            assert!(rest.complete, "cut at {}", k);
            assert_eq!(rest.value.as_ref(), Some(&value), "cut at {}", k);
        }
    }

    #[test]
    fn test_byte_at_a_time_partials_grow() {
        let value = hello_users();
        let wire = encode(&value).unwrap();
        let mut decoder = create_streaming_decoder();
        let mut saw_partial_message = false;

        for b in wire.bytes() {
            let progress = decoder.feed([b]).unwrap();
            if !progress.complete {
                if let Some(partial) = &progress.value {
                    saw_partial_message |= partial.get("message").is_some();
                }
            }
        }
        assert!(saw_partial_message);
        assert_eq!(decoder.finish().unwrap(), value);
    }

    #[test]
    fn test_random_chunking() {
        let value = mixed();
        let wire = encode(&value).unwrap();
        let bytes = wire.as_bytes();
        let mut rng = StdRng::seed_from_u64(0x9e37_79b9);

        for _ in 0..50 {
            let mut decoder = Decoder::new();
            let mut pos = 0;
            while pos < bytes.len() {
                let end = (pos + rng.gen_range(1..=16)).min(bytes.len());
                decoder.push(&bytes[pos..end]).unwrap();
                pos = end;
            }
            assert_eq!(decoder.finish().unwrap(), value);
        }
    }

    #[test]
    fn test_decoded_shared_containers_share_allocation() {
        let value = mixed();
        let decoded = decode(&encode(&value).unwrap()).unwrap();
        assert!(decoded.get("a").unwrap().ptr_eq(decoded.get("b").unwrap()));
    }

    #[test]
    fn test_config_without_structural_refs_still_roundtrips() {
        let config = PjConfig {
            structural_refs: false,
            max_dict_entries: 2,
            ..PjConfig::default()
        };
        let value = mixed();
        let wire = encode_with(&value, config.clone()).unwrap();
        let decoded = decode_with(&wire, config).unwrap();

        assert_eq!(decoded, value);
        assert!(!decoded.get("a").unwrap().ptr_eq(decoded.get("b").unwrap()));
    }

    #[test]
    fn test_json_text_roundtrip() {
        let json = r#"{"message":"Hello World","users":[{"id":1,"name":"Alice","active":true}],"score":95.5}"#;
        let wire = encode_json(json).unwrap();
        assert_eq!(decode_json(&wire).unwrap(), json);

        assert!(matches!(encode_json("{oops"), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_typed_roundtrip() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct User {
            id: u32,
            name: String,
            tags: Vec<String>,
        }

        let user = User {
            id: 7,
            name: "Alice".into(),
            tags: vec!["admin".into(), "admin".into()],
        };
        let wire = to_wire(&user).unwrap();
        assert_eq!(from_wire::<User>(&wire).unwrap(), user);
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Boolean),
            any::<i64>().prop_map(Value::Integer),
            (-60i64..60).prop_map(Value::Integer),
            (-1e15f64..1e15).prop_map(Value::Float),
            (-8_640_000_000_000_000i64..8_640_000_000_000_000)
                .prop_map(|ms| Value::Date(Date::from_millis(ms))),
            "\\PC{0,12}".prop_map(Value::String),
            prop::sample::select(vec!["id", "Alice", "admin", "ok"]).prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 64, 12, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..12).prop_map(Value::array),
                prop::collection::btree_map("[a-z]{1,6}", inner.clone(), 0..12)
                    .prop_map(|entries| Value::object(entries)),
                inner.prop_map(|v| Value::array(vec![v.clone(), v])),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_roundtrip(value in arb_value()) {
            let wire = encode(&value).unwrap();
            prop_assert_eq!(decode(&wire).unwrap(), value);
        }

        #[test]
        fn prop_any_split_point(value in arb_value(), cut in any::<prop::sample::Index>()) {
            let wire = encode(&value).unwrap();
            let bytes = wire.as_bytes();
            let k = cut.index(bytes.len() + 1);

            let mut decoder = Decoder::new();
            decoder.feed(&bytes[..k]).unwrap();
            let progress = decoder.feed(&bytes[k..]).unwrap();
            prop_assert!(progress.complete);
            prop_assert_eq!(progress.value, Some(value));
        }
    }
}
