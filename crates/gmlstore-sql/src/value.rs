//! Conversions between feature property values and column values.

use gmlstore_core::{
    err,
    feature::PrimitiveValue,
    schema::app::PrimitiveType,
    stmt::Value,
    Result,
};

/// The column value storing `value` in a column of type `ty`.
pub(crate) fn to_column(value: PrimitiveValue, ty: PrimitiveType) -> Result<Value> {
    use PrimitiveValue as P;

    let column = match (ty, value) {
        (PrimitiveType::String, value) => Value::String(lexical(&value)),
        (PrimitiveType::Boolean, P::Boolean(v)) => Value::Bool(v),
        (PrimitiveType::Boolean, P::String(v)) => match v.trim() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(err!("`{v}` is not a boolean")),
        },
        (PrimitiveType::Integer, P::Integer(v)) => Value::I64(v),
        (PrimitiveType::Integer, P::String(v)) => Value::I64(
            v.trim()
                .parse()
                .map_err(|_| err!("`{v}` is not an integer"))?,
        ),
        (PrimitiveType::Double, P::Double(v)) => Value::F64(v),
        (PrimitiveType::Double, P::Integer(v)) => Value::F64(v as f64),
        (PrimitiveType::Double, P::String(v)) => Value::F64(
            v.trim()
                .parse()
                .map_err(|_| err!("`{v}` is not a number"))?,
        ),
        (PrimitiveType::Decimal, P::Decimal(v)) => Value::Decimal(v),
        (PrimitiveType::Decimal, P::Integer(v)) => Value::Decimal(v.into()),
        (PrimitiveType::Decimal, P::String(v)) => Value::Decimal(
            v.trim()
                .parse()
                .map_err(|_| err!("`{v}` is not a decimal"))?,
        ),
        (PrimitiveType::Date, P::Date(v)) => Value::Date(v),
        (PrimitiveType::Date, P::String(v)) => Value::Date(
            v.trim().parse().map_err(|_| err!("`{v}` is not a date"))?,
        ),
        (PrimitiveType::DateTime, P::DateTime(v)) => Value::Timestamp(v),
        (PrimitiveType::DateTime, P::String(v)) => Value::Timestamp(
            v.trim()
                .parse()
                .map_err(|_| err!("`{v}` is not a date-time"))?,
        ),
        (PrimitiveType::Time, P::Time(v)) => Value::Time(v),
        (PrimitiveType::Time, P::String(v)) => Value::Time(
            v.trim().parse().map_err(|_| err!("`{v}` is not a time"))?,
        ),
        (ty, value) => return Err(err!("cannot store {value:?} as {ty}")),
    };

    Ok(column)
}

/// The property value read back from a column of type `ty`. `None` for SQL
/// `NULL`.
pub(crate) fn from_column(value: &Value, ty: PrimitiveType) -> Result<Option<PrimitiveValue>> {
    use PrimitiveValue as P;

    let property = match (ty, value) {
        (_, Value::Null) => return Ok(None),
        (PrimitiveType::String, value) => P::String(value.to_key_string()?),
        (PrimitiveType::Boolean, Value::Bool(v)) => P::Boolean(*v),
        (PrimitiveType::Integer, value) => P::Integer(value.to_i64()?),
        (PrimitiveType::Double, Value::F64(v)) => P::Double(*v),
        (PrimitiveType::Double, Value::Decimal(v)) => P::Decimal(*v),
        (PrimitiveType::Double, value) => P::Double(value.to_i64()? as f64),
        (PrimitiveType::Decimal, Value::Decimal(v)) => P::Decimal(*v),
        (PrimitiveType::Decimal, value) => P::Decimal(value.to_i64()?.into()),
        (PrimitiveType::Date, Value::Date(v)) => P::Date(*v),
        (PrimitiveType::DateTime, Value::Timestamp(v)) => P::DateTime(*v),
        (PrimitiveType::Time, Value::Time(v)) => P::Time(*v),
        (ty, value) => return Err(err!("cannot read {value:?} as {ty}")),
    };

    Ok(Some(property))
}

/// Text form of a primitive value, as written to string columns.
pub(crate) fn lexical(value: &PrimitiveValue) -> String {
    match value {
        PrimitiveValue::Boolean(v) => v.to_string(),
        PrimitiveValue::Integer(v) => v.to_string(),
        PrimitiveValue::Double(v) => v.to_string(),
        PrimitiveValue::Decimal(v) => v.to_string(),
        PrimitiveValue::String(v) => v.clone(),
        PrimitiveValue::Date(v) => v.to_string(),
        PrimitiveValue::DateTime(v) => v.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        PrimitiveValue::Time(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_into_column_types() {
        assert_eq!(
            to_column(PrimitiveValue::Integer(7), PrimitiveType::String).unwrap(),
            Value::String("7".into())
        );
        assert_eq!(
            to_column(PrimitiveValue::String(" 12 ".into()), PrimitiveType::Integer).unwrap(),
            Value::I64(12)
        );
        assert!(to_column(PrimitiveValue::String("x".into()), PrimitiveType::Integer).is_err());
        assert!(to_column(PrimitiveValue::Boolean(true), PrimitiveType::Date).is_err());
    }

    #[test]
    fn reads_back_by_column_type() {
        assert_eq!(
            from_column(&Value::I32(3), PrimitiveType::Integer).unwrap(),
            Some(PrimitiveValue::Integer(3))
        );
        assert_eq!(from_column(&Value::Null, PrimitiveType::String).unwrap(), None);
        assert_eq!(
            from_column(&Value::I64(5), PrimitiveType::String).unwrap(),
            Some(PrimitiveValue::String("5".into()))
        );
    }
}
