//! Self-describing array and object values and the encoders that flatten them.
//!
//! Array fields are rendered element by element into a list of strings before
//! they are attached to a span. Nested arrays and objects recurse through the
//! same rendering; a nested failure keeps whatever was rendered so far.

use crate::field::FieldValue;
use std::collections::BTreeMap;
use std::fmt;

/// Failure reported by an [`ArrayMarshaler`] or [`ObjectMarshaler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalError(String);

impl MarshalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MarshalError {}

/// Receives the elements of an array value in order.
pub trait ArrayEncoder {
    fn append(&mut self, value: &FieldValue);

    fn append_bool(&mut self, value: bool) {
        self.append(&FieldValue::Bool(value));
    }

    fn append_i64(&mut self, value: i64) {
        self.append(&FieldValue::I64(value));
    }

    fn append_u64(&mut self, value: u64) {
        self.append(&FieldValue::U64(value));
    }

    fn append_f64(&mut self, value: f64) {
        self.append(&FieldValue::F64(value));
    }

    fn append_str(&mut self, value: &str) {
        self.append(&FieldValue::String(value.to_string()));
    }
}

/// Receives the key/value members of an object value.
pub trait ObjectEncoder {
    fn add(&mut self, key: &str, value: &FieldValue);
}

/// A value that knows how to describe itself as a sequence of elements.
pub trait ArrayMarshaler: Send + Sync {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<(), MarshalError>;
}

/// A value that knows how to describe itself as key/value members.
pub trait ObjectMarshaler: Send + Sync {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), MarshalError>;
}

impl<T> ArrayMarshaler for Vec<T>
where
    T: Into<FieldValue> + Clone + Send + Sync,
{
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<(), MarshalError> {
        for item in self {
            enc.append(&item.clone().into());
        }
        Ok(())
    }
}

impl<T> ObjectMarshaler for BTreeMap<String, T>
where
    T: Into<FieldValue> + Clone + Send + Sync,
{
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), MarshalError> {
        for (key, value) in self {
            enc.add(key, &value.clone().into());
        }
        Ok(())
    }
}

/// Collects the default textual rendering of every appended element.
#[derive(Debug, Default)]
pub struct BufferArrayEncoder {
    strings: Vec<String>,
}

impl BufferArrayEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn into_strings(self) -> Vec<String> {
        self.strings
    }
}

impl ArrayEncoder for BufferArrayEncoder {
    fn append(&mut self, value: &FieldValue) {
        self.strings.push(value.to_string());
    }
}

/// Collects object members as rendered strings, ordered by key.
#[derive(Debug, Default)]
pub struct MapObjectEncoder {
    fields: BTreeMap<String, String>,
}

impl MapObjectEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

impl ObjectEncoder for MapObjectEncoder {
    fn add(&mut self, key: &str, value: &FieldValue) {
        self.fields.insert(key.to_string(), value.to_string());
    }
}

/// Renders an array marshaler to its element strings.
///
/// On failure the elements appended before the error are returned alongside it.
pub fn encode_array(array: &dyn ArrayMarshaler) -> (Vec<String>, Option<MarshalError>) {
    let mut enc = BufferArrayEncoder::new();
    let result = array.marshal_log_array(&mut enc);
    (enc.into_strings(), result.err())
}

/// Renders a nested array as `[a b c]`, keeping partial output on failure.
pub(crate) fn render_array(array: &dyn ArrayMarshaler) -> String {
    let (strings, _) = encode_array(array);
    format!("[{}]", strings.join(" "))
}

/// Renders a nested object as `{k=v, k2=v2}`, keeping partial output on failure.
pub(crate) fn render_object(object: &dyn ObjectMarshaler) -> String {
    let mut enc = MapObjectEncoder::new();
    let _ = object.marshal_log_object(&mut enc);
    let members: Vec<String> = enc
        .fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{{{}}}", members.join(", "))
}
