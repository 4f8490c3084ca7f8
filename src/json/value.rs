//! Typed key/value record, the unit of telemetry, attribute and RPC
//! response data.
//!
//! A [`Telemetry`] borrows its key and any string payload from the caller;
//! it lives only for the duration of a send (or an RPC dispatch).

use serde::{Serialize, Serializer};

use super::document::JsonDocument;

/// Scalar payload of a [`Telemetry`] record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Data<'a> {
    /// No payload. Serializes to nothing when keyed, `null` otherwise.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    /// Single precision, the real type used on the device.
    Real(f32),
    Str(&'a str),
}

impl Serialize for Data<'_> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::None => s.serialize_unit(),
            Self::Bool(v) => s.serialize_bool(v),
            Self::Int(v) => s.serialize_i64(v),
            Self::Real(v) => s.serialize_f32(v),
            Self::Str(v) => s.serialize_str(v),
        }
    }
}

impl From<bool> for Data<'_> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! int_data {
    ($($t:ty),*) => {$(
        impl From<$t> for Data<'_> {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

int_data!(i8, i16, i32, i64, u8, u16, u32);

/// Wider integers saturate at the `i64` bounds instead of wrapping, so a
/// large count never serializes as a negative number.
macro_rules! saturating_int_data {
    ($($t:ty),*) => {$(
        impl From<$t> for Data<'_> {
            fn from(v: $t) -> Self {
                Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
            }
        }
    )*};
}

saturating_int_data!(u64, usize);

impl From<isize> for Data<'_> {
    fn from(v: isize) -> Self {
        let bound = if v.is_negative() { i64::MIN } else { i64::MAX };
        Self::Int(i64::try_from(v).unwrap_or(bound))
    }
}

impl From<f32> for Data<'_> {
    fn from(v: f32) -> Self {
        Self::Real(v)
    }
}

impl From<f64> for Data<'_> {
    fn from(v: f64) -> Self {
        Self::Real(v as f32)
    }
}

impl<'a> From<&'a str> for Data<'a> {
    fn from(v: &'a str) -> Self {
        Self::Str(v)
    }
}

impl<'a> From<&'a String> for Data<'a> {
    fn from(v: &'a String) -> Self {
        Self::Str(v.as_str())
    }
}

/// One telemetry/attribute record: an optional key and a typed payload.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry<'a> {
    key: Option<&'a str>,
    data: Data<'a>,
}

/// Attributes share the telemetry record layout.
pub type Attribute<'a> = Telemetry<'a>;
/// An RPC handler's return value.
pub type RpcResponse<'a> = Telemetry<'a>;

impl<'a> Telemetry<'a> {
    /// Keyed record, serialized as `"key": value`.
    pub fn new(key: &'a str, value: impl Into<Data<'a>>) -> Self {
        Self {
            key: Some(key),
            data: value.into(),
        }
    }

    /// Keyless record, serialized as a bare JSON scalar.
    pub fn anonymous(value: impl Into<Data<'a>>) -> Self {
        Self {
            key: None,
            data: value.into(),
        }
    }

    /// Empty record; a handler returning this answers with `null`.
    pub const fn none() -> Self {
        Self {
            key: None,
            data: Data::None,
        }
    }

    pub fn key(&self) -> Option<&'a str> {
        self.key
    }

    pub fn data(&self) -> Data<'a> {
        self.data
    }

    /// Write this record into `doc`.
    ///
    /// Keyed records assign `doc[key]` and never report failure (an empty
    /// payload is skipped). Keyless records replace the whole document with
    /// a bare scalar, which fails when the document already holds fields.
    pub fn serialize_into<const N: usize>(&self, doc: &mut JsonDocument<'a, N>) -> bool {
        if matches!(self.data, Data::None) {
            return true;
        }
        match self.key {
            Some(key) => {
                doc.set_field(key, self.data);
                true
            }
            None => doc.set_scalar(self.data),
        }
    }
}
