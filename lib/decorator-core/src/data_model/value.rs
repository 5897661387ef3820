use serde::{Deserialize, Serialize};

/// A tagged, immutable value.
///
/// When serialized, the value is tagged with its data type, such as `{"double": 21.5}`, so that the kind survives a
/// round trip through formats, like JSON, that cannot tell a `Double` from a `Float`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedValue {
    /// Boolean value.
    Boolean(bool),

    /// Raw bytes.
    ByteArray(Vec<u8>),

    /// 64-bit floating point value.
    Double(f64),

    /// 32-bit floating point value.
    Float(f32),

    /// 32-bit signed integer value.
    Integer(i32),

    /// 64-bit signed integer value.
    Long(i64),

    /// String value.
    String(String),
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        Self::ByteArray(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
