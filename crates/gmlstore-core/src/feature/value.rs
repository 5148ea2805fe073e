use super::Geometry;
use crate::schema::QName;
use crate::Result;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: QName,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Value {
    /// A nil property.
    #[default]
    Null,

    Primitive(PrimitiveValue),

    Geometry(Geometry),

    /// Reference to another feature by id.
    Reference { href: String },

    Code {
        value: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        code_space: Option<String>,
    },

    Complex(ComplexValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveValue {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

/// Value of an element with a complex type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<PrimitiveValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: QName,
    pub value: PrimitiveValue,
}

impl Value {
    pub fn reference(href: impl Into<String>) -> Value {
        Value::Reference { href: href.into() }
    }

    pub fn code(value: impl Into<String>, code_space: Option<&str>) -> Value {
        Value::Code {
            value: value.into(),
            code_space: code_space.map(str::to_string),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            Value::Complex(complex) => Some(complex),
            _ => None,
        }
    }

    /// Calls `f` for every geometry in this value, depth first.
    pub fn visit_geometries(&self, f: &mut impl FnMut(&Geometry) -> Result<()>) -> Result<()> {
        match self {
            Value::Geometry(geometry) => f(geometry),
            Value::Complex(complex) => {
                for child in &complex.children {
                    child.value.visit_geometries(f)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl ComplexValue {
    pub fn attribute(&self, name: &QName) -> Option<&PrimitiveValue> {
        self.attributes
            .iter()
            .find(|attr| attr.name == *name)
            .map(|attr| &attr.value)
    }

    pub fn children<'a>(&'a self, name: &'a QName) -> impl Iterator<Item = &'a Value> + 'a {
        self.children
            .iter()
            .filter(move |child| child.name == *name)
            .map(|child| &child.value)
    }
}

impl PrimitiveValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<PrimitiveValue> for Value {
    fn from(value: PrimitiveValue) -> Self {
        Value::Primitive(value)
    }
}

impl From<Geometry> for Value {
    fn from(value: Geometry) -> Self {
        Value::Geometry(value)
    }
}

impl From<ComplexValue> for Value {
    fn from(value: ComplexValue) -> Self {
        Value::Complex(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Primitive(PrimitiveValue::String(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Primitive(PrimitiveValue::String(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Primitive(PrimitiveValue::Integer(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Primitive(PrimitiveValue::Double(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Primitive(PrimitiveValue::Boolean(value))
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::String(value.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::String(value)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(value: i64) -> Self {
        PrimitiveValue::Integer(value)
    }
}

impl From<f64> for PrimitiveValue {
    fn from(value: f64) -> Self {
        PrimitiveValue::Double(value)
    }
}

impl From<bool> for PrimitiveValue {
    fn from(value: bool) -> Self {
        PrimitiveValue::Boolean(value)
    }
}
