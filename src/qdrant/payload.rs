//! Helpers for point identifiers and payload timestamps.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Derive a stable UUID point id from a logical key.
///
/// Qdrant only accepts unsigned integers or UUIDs as ids, so the key is hashed and the first
/// 16 digest bytes become the UUID.
pub fn point_id_for_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0_u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

/// Hex SHA-256 of a text, stored for change detection.
pub fn compute_text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Stamp a payload with the ingestion time and a content hash of its `text` field.
pub(crate) fn stamp_payload(mut payload: Map<String, Value>, timestamp_rfc3339: &str) -> Value {
    let hash = payload
        .get("text")
        .and_then(Value::as_str)
        .map(compute_text_hash);
    if let Some(hash) = hash {
        payload.insert("text_hash".into(), Value::String(hash));
    }
    payload.insert(
        "ingested_at".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
