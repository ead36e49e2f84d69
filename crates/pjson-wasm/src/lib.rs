//! WebAssembly bindings for PJSON
//!
//! JSON text crosses the boundary in both directions. Streaming decoders
//! live in a per-thread registry and are addressed by numeric handle.

use pjson_core::{
    compare as core_compare, decode as core_decode, encode as core_encode,
    inspect as core_inspect, Decoder, Value,
};
use std::cell::RefCell;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_json(json: &str) -> Result<Value, JsValue> {
    let json: serde_json::Value = serde_json::from_str(json).map_err(js_error)?;
    Value::from_json(&json).map_err(js_error)
}

// ============================================================================
// One-shot
// ============================================================================

/// Encode JSON text to a PJSON wire string
#[wasm_bindgen]
pub fn pj_encode(json: &str) -> Result<String, JsValue> {
    core_encode(&parse_json(json)?).map_err(js_error)
}

/// Decode a complete PJSON wire string to JSON text
#[wasm_bindgen]
pub fn pj_decode(wire: &str) -> Result<String, JsValue> {
    let value = core_decode(wire).map_err(js_error)?;
    serde_json::to_string(&value.to_json()).map_err(js_error)
}

/// Size comparison for JSON text, as JSON: `{"json","pj","saved","percent"}`
#[wasm_bindgen]
pub fn pj_compare(json: &str) -> Result<String, JsValue> {
    let stats = core_compare(&parse_json(json)?).map_err(js_error)?;
    Ok(serde_json::json!({
        "json": stats.json,
        "pj": stats.pj,
        "saved": stats.saved,
        "percent": stats.percent_saved(),
    })
    .to_string())
}

/// Annotated token listing of a wire string
#[wasm_bindgen]
pub fn pj_inspect(wire: &str) -> Result<String, JsValue> {
    core_inspect(wire).map_err(js_error)
}

// ============================================================================
// Streaming decoders
// ============================================================================

thread_local! {
    static DECODERS: RefCell<HashMap<u32, Decoder>> = RefCell::new(HashMap::new());
    static NEXT_DECODER_ID: RefCell<u32> = RefCell::new(1);
}

fn get_next_id() -> u32 {
    NEXT_DECODER_ID.with(|next_id| {
        let id = *next_id.borrow();
        *next_id.borrow_mut() = id + 1;
        id
    })
}

fn with_decoder<T>(
    id: u32,
    f: impl FnOnce(&mut Decoder) -> Result<T, JsValue>,
) -> Result<T, JsValue> {
    DECODERS.with(|decoders| {
        let mut decoders = decoders.borrow_mut();
        let decoder = decoders
            .get_mut(&id)
            .ok_or_else(|| JsValue::from_str("Invalid decoder ID"))?;
        f(decoder)
    })
}

/// Create a streaming decoder
/// Returns decoder ID
#[wasm_bindgen]
pub fn pj_decoder_create() -> u32 {
    let id = get_next_id();
    DECODERS.with(|decoders| {
        decoders.borrow_mut().insert(id, Decoder::new());
    });
    id
}

/// Feed the next chunk of the stream
///
/// Returns JSON `{"value": <partial or complete value | null>, "complete": bool}`.
#[wasm_bindgen]
pub fn pj_decoder_feed(decoder_id: u32, chunk: &[u8]) -> Result<String, JsValue> {
    with_decoder(decoder_id, |decoder| {
        let progress = decoder.feed(chunk).map_err(js_error)?;
        let value = progress
            .value
            .map(|v| v.to_json())
            .unwrap_or(serde_json::Value::Null);
        Ok(serde_json::json!({
            "value": value,
            "complete": progress.complete,
        })
        .to_string())
    })
}

/// Reset a decoder for a new message
#[wasm_bindgen]
pub fn pj_decoder_reset(decoder_id: u32) -> Result<(), JsValue> {
    with_decoder(decoder_id, |decoder| {
        decoder.reset();
        Ok(())
    })
}

/// Destroy a decoder
#[wasm_bindgen]
pub fn pj_decoder_destroy(decoder_id: u32) -> bool {
    DECODERS.with(|decoders| decoders.borrow_mut().remove(&decoder_id).is_some())
}

// ============================================================================
// Utilities
// ============================================================================

/// Get library version
#[wasm_bindgen]
pub fn pj_version() -> String {
    pjson_core::VERSION.to_string()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_decode_rejects_malformed_wire() {
        let err = pj_decode("}").unwrap_err();
        assert!(err.as_string().unwrap().contains("unknown type tag"));
    }

    #[wasm_bindgen_test]
    fn test_encode_rejects_invalid_json() {
        assert!(pj_encode("{oops").is_err());
        assert!(pj_compare("[1,").is_err());
    }

    #[wasm_bindgen_test]
    fn test_unknown_decoder_id() {
        let id = pj_decoder_create();
        assert!(pj_decoder_destroy(id));

        let err = pj_decoder_feed(id, b"n").unwrap_err();
        assert_eq!(err.as_string().unwrap(), "Invalid decoder ID");
        assert!(pj_decoder_reset(id).is_err());
    }

    #[wasm_bindgen_test]
    fn test_feed_error_persists_until_reset() {
        let id = pj_decoder_create();
        assert!(pj_decoder_feed(id, b"1}").is_err());
        assert!(pj_decoder_feed(id, b"n").is_err());

        pj_decoder_reset(id).unwrap();
        let done: serde_json::Value =
            serde_json::from_str(&pj_decoder_feed(id, b"n").unwrap()).unwrap();
        assert_eq!(done["complete"], true);
        pj_decoder_destroy(id);
    }
}
