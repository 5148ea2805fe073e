use crate::{Error, Result};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A value bound to a statement parameter or read from a result column.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,

    Bool(bool),

    /// Signed 16-bit integer, used by the feature type discriminator
    I16(i16),

    I32(i32),

    I64(i64),

    F64(f64),

    Decimal(Decimal),

    String(String),

    /// Binary data: encoded features and well-known binary geometries
    Bytes(Vec<u8>),

    Date(NaiveDate),

    Time(NaiveTime),

    Timestamp(NaiveDateTime),

    Uuid(Uuid),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Reads any integer variant as an `i64`.
    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Self::I16(v) => Ok(i64::from(*v)),
            Self::I32(v) => Ok(i64::from(*v)),
            Self::I64(v) => Ok(*v),
            Self::String(v) => v
                .parse()
                .map_err(|_| Error::invalid_result(format!("expected integer, got `{v}`"))),
            _ => Err(Error::invalid_result(format!("expected integer, got {self:?}"))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Text form of key-like values: integers, strings and UUIDs.
    pub fn to_key_string(&self) -> Result<String> {
        match self {
            Self::I16(v) => Ok(v.to_string()),
            Self::I32(v) => Ok(v.to_string()),
            Self::I64(v) => Ok(v.to_string()),
            Self::String(v) => Ok(v.clone()),
            Self::Uuid(v) => Ok(v.to_string()),
            _ => Err(Error::invalid_result(format!("expected a key, got {self:?}"))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Self::I16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl<T> From<Option<T>> for Value
where
    Self: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::from(value),
            None => Self::Null,
        }
    }
}
