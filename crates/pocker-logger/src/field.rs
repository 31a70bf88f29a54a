//! Structured log fields.
//!
//! A [`Field`] is a key plus a [`FieldValue`], a closed sum type with one case
//! per payload kind. The free functions in this module are the usual way to
//! build fields at a call site:
//!
//! ```
//! use pocker_logger::field;
//!
//! let fields = vec![field::i64("pct", 97), field::string("disk", "/var")];
//! assert_eq!(fields[0].key, "pct");
//! ```

use crate::encoder::{self, ArrayMarshaler, ObjectMarshaler};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

#[derive(Clone)]
pub enum FieldValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    /// Real and imaginary parts.
    Complex64(f32, f32),
    Complex128(f64, f64),
    String(String),
    Binary(Vec<u8>),
    ByteString(Vec<u8>),
    Stringer(Arc<dyn fmt::Display + Send + Sync>),
    Duration(Duration),
    /// Timestamp already encoded as nanoseconds since the Unix epoch.
    TimeNanos(i64),
    Time(SystemTime),
    Error {
        type_name: &'static str,
        error: Arc<dyn std::error::Error + Send + Sync>,
    },
    Array(Arc<dyn ArrayMarshaler>),
    Object(Arc<dyn ObjectMarshaler>),
    /// Object whose members are meant to be flattened into the parent record.
    Inline(Arc<dyn ObjectMarshaler>),
    /// Opens a namespace: following fields are nested under this key.
    Namespace,
    /// Arbitrary value captured through serde.
    Reflect(serde_json::Value),
    Skip,
}

impl FieldValue {
    /// Short name of the payload kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::I8(_) => "int8",
            FieldValue::I16(_) => "int16",
            FieldValue::I32(_) => "int32",
            FieldValue::I64(_) => "int64",
            FieldValue::U8(_) => "uint8",
            FieldValue::U16(_) => "uint16",
            FieldValue::U32(_) => "uint32",
            FieldValue::U64(_) => "uint64",
            FieldValue::Usize(_) => "usize",
            FieldValue::F32(_) => "float32",
            FieldValue::F64(_) => "float64",
            FieldValue::Complex64(..) => "complex64",
            FieldValue::Complex128(..) => "complex128",
            FieldValue::String(_) => "string",
            FieldValue::Binary(_) => "binary",
            FieldValue::ByteString(_) => "bytestring",
            FieldValue::Stringer(_) => "stringer",
            FieldValue::Duration(_) => "duration",
            FieldValue::TimeNanos(_) => "time",
            FieldValue::Time(_) => "timefull",
            FieldValue::Error { .. } => "error",
            FieldValue::Array(_) => "array",
            FieldValue::Object(_) => "object",
            FieldValue::Inline(_) => "inline",
            FieldValue::Namespace => "namespace",
            FieldValue::Reflect(_) => "reflect",
            FieldValue::Skip => "skip",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Default textual rendering, used for array elements and template arguments.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::I8(v) => write!(f, "{v}"),
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::I32(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::U8(v) => write!(f, "{v}"),
            FieldValue::U16(v) => write!(f, "{v}"),
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::Usize(v) => write!(f, "{v}"),
            FieldValue::F32(v) => write!(f, "{v}"),
            FieldValue::F64(v) => write!(f, "{v}"),
            FieldValue::Complex64(re, im) => write!(f, "({re}{im:+}i)"),
            FieldValue::Complex128(re, im) => write!(f, "({re}{im:+}i)"),
            FieldValue::String(v) => f.write_str(v),
            FieldValue::Binary(bytes) | FieldValue::ByteString(bytes) => {
                let rendered: Vec<String> = bytes.iter().map(u8::to_string).collect();
                write!(f, "[{}]", rendered.join(" "))
            }
            FieldValue::Stringer(v) => write!(f, "{v}"),
            FieldValue::Duration(v) => write!(f, "{v:?}"),
            FieldValue::TimeNanos(nanos) => {
                f.write_str(&rfc3339(DateTime::from_timestamp_nanos(*nanos)))
            }
            FieldValue::Time(time) => f.write_str(&rfc3339(DateTime::<Utc>::from(*time))),
            FieldValue::Error { error, .. } => write!(f, "{error}"),
            FieldValue::Array(array) => f.write_str(&encoder::render_array(array.as_ref())),
            FieldValue::Object(object) | FieldValue::Inline(object) => {
                f.write_str(&encoder::render_object(object.as_ref()))
            }
            FieldValue::Reflect(serde_json::Value::String(s)) => f.write_str(s),
            FieldValue::Reflect(value) => write!(f, "{value}"),
            FieldValue::Namespace | FieldValue::Skip => Ok(()),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self)
    }
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

macro_rules! from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value)
                }
            }
        )*
    };
}

from_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
    Duration => Duration,
    SystemTime => Time,
    serde_json::Value => Reflect,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::String(value.clone())
    }
}

/// One structured key/value pair.
#[derive(Debug, Clone)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

type Key = Cow<'static, str>;

pub fn bool(key: impl Into<Key>, value: bool) -> Field {
    Field::new(key, FieldValue::Bool(value))
}

pub fn i8(key: impl Into<Key>, value: i8) -> Field {
    Field::new(key, FieldValue::I8(value))
}

pub fn i16(key: impl Into<Key>, value: i16) -> Field {
    Field::new(key, FieldValue::I16(value))
}

pub fn i32(key: impl Into<Key>, value: i32) -> Field {
    Field::new(key, FieldValue::I32(value))
}

pub fn i64(key: impl Into<Key>, value: i64) -> Field {
    Field::new(key, FieldValue::I64(value))
}

pub fn u8(key: impl Into<Key>, value: u8) -> Field {
    Field::new(key, FieldValue::U8(value))
}

pub fn u16(key: impl Into<Key>, value: u16) -> Field {
    Field::new(key, FieldValue::U16(value))
}

pub fn u32(key: impl Into<Key>, value: u32) -> Field {
    Field::new(key, FieldValue::U32(value))
}

pub fn u64(key: impl Into<Key>, value: u64) -> Field {
    Field::new(key, FieldValue::U64(value))
}

pub fn usize(key: impl Into<Key>, value: usize) -> Field {
    Field::new(key, FieldValue::Usize(value))
}

pub fn f32(key: impl Into<Key>, value: f32) -> Field {
    Field::new(key, FieldValue::F32(value))
}

pub fn f64(key: impl Into<Key>, value: f64) -> Field {
    Field::new(key, FieldValue::F64(value))
}

pub fn complex64(key: impl Into<Key>, re: f32, im: f32) -> Field {
    Field::new(key, FieldValue::Complex64(re, im))
}

pub fn complex128(key: impl Into<Key>, re: f64, im: f64) -> Field {
    Field::new(key, FieldValue::Complex128(re, im))
}

pub fn string(key: impl Into<Key>, value: impl Into<String>) -> Field {
    Field::new(key, FieldValue::String(value.into()))
}

/// Opaque binary payload.
pub fn binary(key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Field {
    Field::new(key, FieldValue::Binary(value.into()))
}

/// UTF-8 text carried as bytes.
pub fn byte_string(key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Field {
    Field::new(key, FieldValue::ByteString(value.into()))
}

pub fn stringer<T>(key: impl Into<Key>, value: T) -> Field
where
    T: fmt::Display + Send + Sync + 'static,
{
    Field::new(key, FieldValue::Stringer(Arc::new(value)))
}

pub fn duration(key: impl Into<Key>, value: Duration) -> Field {
    Field::new(key, FieldValue::Duration(value))
}

pub fn time(key: impl Into<Key>, value: SystemTime) -> Field {
    Field::new(key, FieldValue::Time(value))
}

pub fn time_nanos(key: impl Into<Key>, unix_nanos: i64) -> Field {
    Field::new(key, FieldValue::TimeNanos(unix_nanos))
}

/// Error under the conventional `error` key.
pub fn error<E>(err: E) -> Field
where
    E: std::error::Error + Send + Sync + 'static,
{
    named_error("error", err)
}

pub fn named_error<E>(key: impl Into<Key>, err: E) -> Field
where
    E: std::error::Error + Send + Sync + 'static,
{
    Field::new(
        key,
        FieldValue::Error {
            type_name: std::any::type_name::<E>(),
            error: Arc::new(err),
        },
    )
}

pub fn array<A>(key: impl Into<Key>, value: A) -> Field
where
    A: ArrayMarshaler + 'static,
{
    Field::new(key, FieldValue::Array(Arc::new(value)))
}

pub fn object<O>(key: impl Into<Key>, value: O) -> Field
where
    O: ObjectMarshaler + 'static,
{
    Field::new(key, FieldValue::Object(Arc::new(value)))
}

pub fn inline<O>(key: impl Into<Key>, value: O) -> Field
where
    O: ObjectMarshaler + 'static,
{
    Field::new(key, FieldValue::Inline(Arc::new(value)))
}

pub fn namespace(key: impl Into<Key>) -> Field {
    Field::new(key, FieldValue::Namespace)
}

/// Captures any serializable value; serialization failures are kept as text.
pub fn any<T: Serialize>(key: impl Into<Key>, value: &T) -> Field {
    let value = serde_json::to_value(value)
        .unwrap_or_else(|err| serde_json::Value::String(format!("<unserializable: {err}>")));
    Field::new(key, FieldValue::Reflect(value))
}

pub fn skip() -> Field {
    Field::new("", FieldValue::Skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_renders_defaults() {
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
        assert_eq!(FieldValue::U64(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(FieldValue::Complex128(1.0, -2.5).to_string(), "(1-2.5i)");
        assert_eq!(FieldValue::Complex64(0.5, 2.0).to_string(), "(0.5+2i)");
        assert_eq!(FieldValue::ByteString(b"hi".to_vec()).to_string(), "[104 105]");
        assert_eq!(FieldValue::TimeNanos(0).to_string(), "1970-01-01T00:00:00Z");
        assert_eq!(FieldValue::Reflect(json!({"a": 1})).to_string(), "{\"a\":1}");
        assert_eq!(FieldValue::Reflect(json!("plain")).to_string(), "plain");
    }

    #[test]
    fn test_error_field_keeps_type_name() {
        let field = error(std::io::Error::other("disk gone"));
        match &field.value {
            FieldValue::Error { type_name, error } => {
                assert_eq!(*type_name, "std::io::error::Error");
                assert_eq!(error.to_string(), "disk gone");
            }
            other => panic!("unexpected value {other:?}"),
        }
        assert_eq!(field.key, "error");
    }

    #[test]
    fn test_any_captures_serializable_values() {
        #[derive(Serialize)]
        struct User {
            name: &'static str,
        }
        let field = any("user", &User { name: "alice" });
        match field.value {
            FieldValue::Reflect(value) => assert_eq!(value, json!({"name": "alice"})),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_from_conversions_pick_native_variants() {
        assert!(matches!(FieldValue::from(42i32), FieldValue::I32(42)));
        assert!(matches!(FieldValue::from("x"), FieldValue::String(_)));
        assert!(matches!(
            FieldValue::from(Duration::from_secs(1)),
            FieldValue::Duration(_)
        ));
        assert_eq!(FieldValue::from(json!(null)).kind(), "reflect");
    }
}
