//! Size comparison against JSON text

use crate::types::Value;
use crate::{encode, Error, Result};
use serde::Serialize;

/// Byte lengths of one value in both encodings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareStats {
    /// Compact `serde_json` text length
    pub json: usize,
    /// PJSON wire length
    pub pj: usize,
    /// Rounded percentage saved, e.g. `"42%"`; negative when PJSON is larger
    pub saved: String,
}

impl CompareStats {
    fn new(json: usize, pj: usize) -> Self {
        let mut stats = Self {
            json,
            pj,
            saved: String::new(),
        };
        stats.saved = format!("{}%", stats.percent_saved().round() as i64);
        stats
    }

    /// Percentage saved relative to JSON (0 when the JSON is empty)
    pub fn percent_saved(&self) -> f64 {
        if self.json == 0 {
            0.0
        } else {
            100.0 - (self.pj as f64 / self.json as f64) * 100.0
        }
    }
}

/// Measure a value in both encodings
pub fn compare(value: &Value) -> Result<CompareStats> {
    let json = serde_json::to_string(&value.to_json())
        .map_err(|e| Error::SerializeError(e.to_string()))?;
    let pj = encode(value)?;
    Ok(CompareStats::new(json.len(), pj.len()))
}
