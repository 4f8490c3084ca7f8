//! Bounded serializer: typed records into a caller-owned payload buffer.

use core::slice;

use log::warn;

use super::document::JsonDocument;
use super::value::Telemetry;
use crate::error::{Result, SerializeError};

/// Encode `values` as one JSON object into `out`.
///
/// At most `N` values are accepted and the encoded text must fit in
/// `out.len() - 1` bytes. On any failure `out` is left untouched. Returns
/// the number of bytes written.
pub fn serialize_fields<const N: usize>(values: &[Telemetry<'_>], out: &mut [u8]) -> Result<usize> {
    if values.len() > N {
        warn!(
            "JSON: too much JSON fields passed ({} > {})",
            values.len(),
            N
        );
        return Err(SerializeError::TooManyFields.into());
    }

    let mut doc = JsonDocument::<N>::new();
    for value in values {
        if !value.serialize_into(&mut doc) {
            warn!("JSON: unable to serialize data");
            return Err(SerializeError::SerializeFailed.into());
        }
    }

    let size = doc.measure();
    let capacity = out.len().saturating_sub(1);
    if size > capacity {
        warn!(
            "JSON: too small buffer for JSON data ({} > {})",
            size, capacity
        );
        return Err(SerializeError::BufferTooSmall.into());
    }

    doc.write_to(out)
        .ok_or(SerializeError::SerializeFailed.into())
}

/// Single-value path: one record, one field slot.
pub fn serialize_keyval(value: &Telemetry<'_>, out: &mut [u8]) -> Result<usize> {
    serialize_fields::<1>(slice::from_ref(value), out)
}
