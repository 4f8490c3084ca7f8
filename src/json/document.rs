//! Fixed-capacity JSON document.
//!
//! The root is `null`, a bare scalar, or an object with at most `N` fields.
//! Field storage is a `heapless::Vec`, so building a document never touches
//! the heap; encoding goes through serde_json into caller-owned sinks.

use std::io;

use log::debug;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::value::Data;

enum Root<'a, const N: usize> {
    Null,
    Scalar(Data<'a>),
    Object(heapless::Vec<(&'a str, Data<'a>), N>),
}

/// JSON value with room for `N` object fields.
pub struct JsonDocument<'a, const N: usize> {
    root: Root<'a, N>,
}

impl<const N: usize> Default for JsonDocument<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> JsonDocument<'a, N> {
    pub const fn new() -> Self {
        Self { root: Root::Null }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.root, Root::Null)
    }

    /// Number of object fields (0 for null and scalar roots).
    pub fn len(&self) -> usize {
        match &self.root {
            Root::Object(fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `doc[key] = value`. A null root becomes an object; an existing key is
    /// overwritten. Returns `false` when the field table is full or the root
    /// is a bare scalar.
    pub fn set_field(&mut self, key: &'a str, value: Data<'a>) -> bool {
        if matches!(self.root, Root::Null) {
            self.root = Root::Object(heapless::Vec::new());
        }
        let Root::Object(fields) = &mut self.root else {
            debug!("json: keyed write '{}' onto a scalar root ignored", key);
            return false;
        };
        if let Some(slot) = fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return true;
        }
        fields.push((key, value)).is_ok()
    }

    /// Replace the root with a bare scalar. Fails when the document already
    /// holds fields.
    pub fn set_scalar(&mut self, value: Data<'a>) -> bool {
        if let Root::Object(fields) = &self.root {
            if !fields.is_empty() {
                return false;
            }
        }
        self.root = Root::Scalar(value);
        true
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &self.root {
            Root::Object(fields) => fields.iter().any(|(k, _)| *k == key),
            _ => false,
        }
    }

    /// Exact length of the encoded JSON text.
    pub fn measure(&self) -> usize {
        let mut counter = ByteCounter(0);
        match serde_json::to_writer(&mut counter, self) {
            Ok(()) => counter.0,
            // Serialize impls below never fail; an error here means the
            // encoder itself broke, so report "does not fit".
            Err(_) => usize::MAX,
        }
    }

    /// Encode into `buf`, returning the number of bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> Option<usize> {
        let capacity = buf.len();
        let mut cursor: &mut [u8] = buf;
        serde_json::to_writer(&mut cursor, self).ok()?;
        Some(capacity - cursor.len())
    }
}

impl<const N: usize> Serialize for JsonDocument<'_, N> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match &self.root {
            Root::Null => s.serialize_unit(),
            Root::Scalar(v) => v.serialize(s),
            Root::Object(fields) => {
                let mut map = s.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// `io::Write` sink that only counts bytes.
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
