//! Single-line JSON rendering for console dumps.

use serde::Serialize;

/// Render `value` as compact JSON for a log field.
pub fn dump<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}
