//! Helpers for navigating type-tree value graphs.
//!
//! Deserialized objects arrive as [`serde_value::Value`] maps keyed by
//! field name. These accessors keep the edit code in `swap` readable and
//! tolerant of the integer-width variants the deserializer may produce.

use serde_value::Value;

/// Field lookup on a map value
pub fn get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Map(map) => map.get(&Value::String(key.to_string())),
        _ => None,
    }
}

/// Mutable field lookup on a map value
pub fn get_mut<'a>(value: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match value {
        Value::Map(map) => map.get_mut(&Value::String(key.to_string())),
        _ => None,
    }
}

/// String field accessor
pub fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match get(value, key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Integer field accessor, widening any integer variant
pub fn get_i64(value: &Value, key: &str) -> Option<i64> {
    as_i64(get(value, key)?)
}

/// Widen any integer variant to i64
pub fn as_i64(value: &Value) -> Option<i64> {
    match *value {
        Value::U8(v) => Some(v.into()),
        Value::U16(v) => Some(v.into()),
        Value::U32(v) => Some(v.into()),
        Value::U64(v) => i64::try_from(v).ok(),
        Value::I8(v) => Some(v.into()),
        Value::I16(v) => Some(v.into()),
        Value::I32(v) => Some(v.into()),
        Value::I64(v) => Some(v),
        _ => None,
    }
}

/// Sequence field accessor
pub fn get_seq<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    match get(value, key)? {
        Value::Seq(items) => Some(items),
        _ => None,
    }
}

/// Mutable sequence field accessor
pub fn get_seq_mut<'a>(value: &'a mut Value, key: &str) -> Option<&'a mut Vec<Value>> {
    match get_mut(value, key)? {
        Value::Seq(items) => Some(items),
        _ => None,
    }
}

/// Byte payload accessor; typeless data may arrive as bytes or as a
/// sequence of small integers depending on the deserializer
pub fn as_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Bytes(bytes) => Some(bytes.clone()),
        Value::Seq(items) => items
            .iter()
            .map(|item| as_i64(item).and_then(|v| u8::try_from(v).ok()))
            .collect(),
        _ => None,
    }
}

fn set(value: &mut Value, key: &str, new: Value) {
    if let Value::Map(map) = value {
        map.insert(Value::String(key.to_string()), new);
    }
}

pub fn set_i32(value: &mut Value, key: &str, v: i32) {
    set(value, key, Value::I32(v));
}

pub fn set_i64(value: &mut Value, key: &str, v: i64) {
    set(value, key, Value::I64(v));
}

pub fn set_f32(value: &mut Value, key: &str, v: f32) {
    set(value, key, Value::F32(v));
}

pub fn set_str(value: &mut Value, key: &str, v: &str) {
    set(value, key, Value::String(v.to_string()));
}

pub fn set_bytes(value: &mut Value, key: &str, v: Vec<u8>) {
    set(value, key, Value::Bytes(v));
}

pub fn set_seq(value: &mut Value, key: &str, v: Vec<Value>) {
    set(value, key, Value::Seq(v));
}

/// Build a map value from (key, value) pairs
pub fn map(fields: Vec<(&str, Value)>) -> Value {
    Value::Map(
        fields
            .into_iter()
            .map(|(k, v)| (Value::String(k.to_string()), v))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        map(vec![
            ("m_Name", Value::String("runtime_crd100101".into())),
            ("m_Width", Value::I32(1024)),
            ("count", Value::U16(7)),
            (
                "items",
                Value::Seq(vec![Value::I32(1), Value::I32(2)]),
            ),
            ("payload", Value::Bytes(vec![1, 2, 3])),
        ])
    }

    #[test]
    fn test_get_accessors() {
        let value = sample();
        assert_eq!(get_str(&value, "m_Name"), Some("runtime_crd100101"));
        assert_eq!(get_i64(&value, "m_Width"), Some(1024));
        assert_eq!(get_i64(&value, "count"), Some(7));
        assert_eq!(get_seq(&value, "items").map(<[Value]>::len), Some(2));
        assert!(get(&value, "missing").is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let mut value = sample();
        set_i32(&mut value, "m_Width", 2048);
        set_str(&mut value, "m_Name", "renamed");

        assert_eq!(get_i64(&value, "m_Width"), Some(2048));
        assert_eq!(get_str(&value, "m_Name"), Some("renamed"));
    }

    #[test]
    fn test_bytes_from_seq() {
        let value = Value::Seq(vec![Value::U8(9), Value::I32(10)]);
        assert_eq!(as_bytes(&value), Some(vec![9, 10]));

        let value = Value::Seq(vec![Value::I32(-1)]);
        assert_eq!(as_bytes(&value), None);
    }

    #[test]
    fn test_seq_mut_truncate() {
        let mut value = sample();
        get_seq_mut(&mut value, "items").unwrap().truncate(1);
        assert_eq!(get_seq(&value, "items").map(<[Value]>::len), Some(1));
    }
}
