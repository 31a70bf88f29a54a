//! Conversion of log fields into span attributes.

use crate::encoder;
use crate::field::{Field, FieldValue};
use crate::keys;
use opentelemetry::{Array, Key, KeyValue, StringValue, Value};
use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Appends the attribute(s) for `field` to `attrs`.
///
/// Every field kind maps to exactly one representation. Conversion never fails:
/// problems are reported as a `<key>_error` string attribute instead.
pub fn append_field(attrs: &mut Vec<KeyValue>, field: &Field) {
    let key = &field.key;
    match &field.value {
        FieldValue::Bool(v) => attrs.push(KeyValue::new(otel_key(key), *v)),
        FieldValue::I8(v) => attrs.push(KeyValue::new(otel_key(key), i64::from(*v))),
        FieldValue::I16(v) => attrs.push(KeyValue::new(otel_key(key), i64::from(*v))),
        FieldValue::I32(v) => attrs.push(KeyValue::new(otel_key(key), i64::from(*v))),
        FieldValue::I64(v) => attrs.push(KeyValue::new(otel_key(key), *v)),
        FieldValue::U8(v) => attrs.push(KeyValue::new(otel_key(key), i64::from(*v))),
        FieldValue::U16(v) => attrs.push(KeyValue::new(otel_key(key), i64::from(*v))),
        FieldValue::U32(v) => attrs.push(KeyValue::new(otel_key(key), i64::from(*v))),
        // Values above i64::MAX wrap to negative numbers.
        FieldValue::U64(v) => attrs.push(KeyValue::new(otel_key(key), *v as i64)),
        FieldValue::Usize(v) => attrs.push(KeyValue::new(otel_key(key), *v as i64)),
        FieldValue::F32(v) => attrs.push(KeyValue::new(otel_key(key), f64::from(*v))),
        FieldValue::F64(v) => attrs.push(KeyValue::new(otel_key(key), *v)),
        FieldValue::Complex64(re, im) => attrs.push(KeyValue::new(
            otel_key(key),
            format!("({}{}i)", exp_f32(*re), signed(exp_f32(*im))),
        )),
        FieldValue::Complex128(re, im) => attrs.push(KeyValue::new(
            otel_key(key),
            format!("({}{}i)", exp_f64(*re), signed(exp_f64(*im))),
        )),
        FieldValue::String(v) => attrs.push(KeyValue::new(otel_key(key), v.clone())),
        FieldValue::Binary(bytes) | FieldValue::ByteString(bytes) => attrs.push(KeyValue::new(
            otel_key(key),
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        FieldValue::Stringer(v) => attrs.push(KeyValue::new(otel_key(key), v.to_string())),
        FieldValue::Duration(d) => attrs.push(KeyValue::new(otel_key(key), duration_nanos(*d))),
        FieldValue::TimeNanos(nanos) => attrs.push(KeyValue::new(otel_key(key), *nanos)),
        FieldValue::Time(t) => attrs.push(KeyValue::new(otel_key(key), unix_nanos(*t))),
        FieldValue::Error { type_name, error } => {
            attrs.push(KeyValue::new(keys::span::EXCEPTION_TYPE, *type_name));
            attrs.push(KeyValue::new(
                keys::span::EXCEPTION_MESSAGE,
                error.to_string(),
            ));
        }
        FieldValue::Reflect(value) => attrs.push(json_attribute(otel_key(key), value)),
        FieldValue::Array(array) => {
            let (strings, err) = encoder::encode_array(array.as_ref());
            match err {
                Some(err) => attrs.push(error_attribute(
                    key,
                    format!("unable to marshal array: {err}"),
                )),
                None => {
                    let values: Vec<StringValue> =
                        strings.into_iter().map(StringValue::from).collect();
                    attrs.push(KeyValue::new(
                        otel_key(key),
                        Value::Array(Array::String(values)),
                    ));
                }
            }
        }
        FieldValue::Object(_) => attrs.push(error_attribute(
            key,
            "object encoding is not implemented".to_string(),
        )),
        FieldValue::Skip => {}
        other @ (FieldValue::Inline(_) | FieldValue::Namespace) => attrs.push(error_attribute(
            key,
            format!("unknown field type: {}", other.kind()),
        )),
    }
}

/// Converts a whole field list, skipping namespace markers.
pub fn convert_fields(fields: &[Field]) -> Vec<KeyValue> {
    let mut attrs = Vec::with_capacity(fields.len() + 4);
    for field in fields {
        if matches!(field.value, FieldValue::Namespace) {
            continue;
        }
        append_field(&mut attrs, field);
    }
    attrs
}

/// Best-effort attribute for a loosely typed value from a key/value call.
pub fn loose_attribute(key: impl Into<Key>, value: &FieldValue) -> KeyValue {
    let key = key.into();
    match value {
        FieldValue::Bool(v) => KeyValue::new(key, *v),
        FieldValue::I8(v) => KeyValue::new(key, i64::from(*v)),
        FieldValue::I16(v) => KeyValue::new(key, i64::from(*v)),
        FieldValue::I32(v) => KeyValue::new(key, i64::from(*v)),
        FieldValue::I64(v) => KeyValue::new(key, *v),
        FieldValue::U8(v) => KeyValue::new(key, i64::from(*v)),
        FieldValue::U16(v) => KeyValue::new(key, i64::from(*v)),
        FieldValue::U32(v) => KeyValue::new(key, i64::from(*v)),
        FieldValue::U64(v) => KeyValue::new(key, *v as i64),
        FieldValue::Usize(v) => KeyValue::new(key, *v as i64),
        FieldValue::F32(v) => KeyValue::new(key, f64::from(*v)),
        FieldValue::F64(v) => KeyValue::new(key, *v),
        FieldValue::String(v) => KeyValue::new(key, v.clone()),
        FieldValue::Reflect(v) => json_attribute(key, v),
        other => KeyValue::new(key, other.to_string()),
    }
}

/// Maps a JSON value onto the closest attribute type.
///
/// Scalars and homogeneous scalar arrays keep their type; anything else is
/// attached as its JSON text.
pub fn json_attribute(key: impl Into<Key>, value: &serde_json::Value) -> KeyValue {
    use serde_json::Value as Json;

    let key = key.into();
    match value {
        Json::Bool(b) => KeyValue::new(key, *b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => KeyValue::new(key, i),
            None => match n.as_f64() {
                Some(f) => KeyValue::new(key, f),
                None => KeyValue::new(key, n.to_string()),
            },
        },
        Json::String(s) => KeyValue::new(key, s.clone()),
        Json::Array(items) => match homogeneous_array(items) {
            Some(array) => KeyValue::new(key, Value::Array(array)),
            None => KeyValue::new(key, value.to_string()),
        },
        Json::Null | Json::Object(_) => KeyValue::new(key, value.to_string()),
    }
}

fn homogeneous_array(items: &[serde_json::Value]) -> Option<Array> {
    use serde_json::Value as Json;

    let first = items.first()?;
    match first {
        Json::Bool(_) => items
            .iter()
            .map(Json::as_bool)
            .collect::<Option<Vec<_>>>()
            .map(Array::Bool),
        Json::Number(n) if n.is_i64() => items
            .iter()
            .map(Json::as_i64)
            .collect::<Option<Vec<_>>>()
            .map(Array::I64),
        Json::Number(_) => items
            .iter()
            .map(Json::as_f64)
            .collect::<Option<Vec<_>>>()
            .map(Array::F64),
        Json::String(_) => items
            .iter()
            .map(|item| item.as_str().map(|s| StringValue::from(s.to_string())))
            .collect::<Option<Vec<_>>>()
            .map(Array::String),
        _ => None,
    }
}

fn otel_key(key: &Cow<'static, str>) -> Key {
    match key {
        Cow::Borrowed(s) => Key::from_static_str(s),
        Cow::Owned(s) => Key::new(s.clone()),
    }
}

fn error_attribute(key: &str, message: String) -> KeyValue {
    KeyValue::new(format!("{key}{}", keys::ERROR_SUFFIX), message)
}

fn duration_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

/// Nanoseconds since the Unix epoch, negative before it, saturating at the i64 range.
pub(crate) fn unix_nanos(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|n| -n)
            .unwrap_or(i64::MIN),
    }
}

fn exp_f32(v: f32) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    go_exponent(&format!("{v:E}"))
}

fn exp_f64(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    go_exponent(&format!("{v:E}"))
}

/// Rewrites `1.5E3` as `1.5E+03`: explicit exponent sign, at least two digits.
fn go_exponent(rendered: &str) -> String {
    let Some((mantissa, exp)) = rendered.split_once('E') else {
        return rendered.to_string();
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exp),
    };
    format!("{mantissa}E{sign}{digits:0>2}")
}

fn signed(part: String) -> String {
    if part.starts_with('+') || part.starts_with('-') {
        part
    } else {
        format!("+{part}")
    }
}
