//! Bounded JSON decoding for inbound payloads.

use serde_json::Value;

use crate::error::{DecodeError, Result};

/// Parse `bytes` as JSON, allowing at most `field_budget` slots.
///
/// Every object member and every array element anywhere in the tree takes
/// one slot.
pub fn deserialize_bounded(bytes: &[u8], field_budget: usize) -> Result<Value> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| DecodeError::Malformed)?;
    if slot_count(&value) > field_budget {
        return Err(DecodeError::FieldBudgetExceeded.into());
    }
    Ok(value)
}

/// Number of slots `value` occupies.
pub fn slot_count(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.len() + map.values().map(slot_count).sum::<usize>(),
        Value::Array(items) => items.len() + items.iter().map(slot_count).sum::<usize>(),
        _ => 0,
    }
}
