use gmlstore_core::stmt::Value as CoreValue;
use postgres_types::{private::BytesMut, to_sql_checked, IsNull, ToSql, Type};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// A statement parameter, converted to whatever type the server inferred for
/// its placeholder.
///
/// Integer properties are carried as `I64` whatever the column width, so
/// integers narrow or widen to the target type here. Narrowing fails if the
/// value does not fit.
#[derive(Debug)]
pub struct Value(pub(crate) CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        match &self.0 {
            CoreValue::Null => Ok(IsNull::Yes),
            CoreValue::Bool(value) => match *ty {
                Type::BOOL => value.to_sql(ty, out),
                _ if is_text(ty) => value.to_string().to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::I16(value) => integer(i64::from(*value), ty, out),
            CoreValue::I32(value) => integer(i64::from(*value), ty, out),
            CoreValue::I64(value) => integer(*value, ty, out),
            CoreValue::F64(value) => match *ty {
                Type::FLOAT8 => value.to_sql(ty, out),
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*value)?.to_sql(ty, out),
                _ if is_text(ty) => value.to_string().to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::Decimal(value) => match *ty {
                Type::NUMERIC => value.to_sql(ty, out),
                Type::FLOAT8 => value
                    .to_f64()
                    .ok_or_else(|| mismatch(&self.0, ty))?
                    .to_sql(ty, out),
                _ if is_text(ty) => value.to_string().to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::String(value) => match *ty {
                Type::UUID => Uuid::parse_str(value)?.to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 => integer(value.trim().parse()?, ty, out),
                _ if is_text(ty) => value.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::Bytes(value) => match *ty {
                Type::BYTEA => value.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::Date(value) => match *ty {
                Type::DATE => value.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::Time(value) => match *ty {
                Type::TIME => value.to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::Timestamp(value) => match *ty {
                Type::TIMESTAMP => value.to_sql(ty, out),
                Type::TIMESTAMPTZ => value.and_utc().to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
            CoreValue::Uuid(value) => match *ty {
                Type::UUID => value.to_sql(ty, out),
                _ if is_text(ty) => value.to_string().to_sql(ty, out),
                _ => Err(mismatch(&self.0, ty)),
            },
        }
    }

    // NULL binds to any placeholder, including PostGIS types; other
    // combinations are checked in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn integer(value: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(value)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(value)?.to_sql(ty, out),
        Type::INT8 => value.to_sql(ty, out),
        Type::NUMERIC => Decimal::from(value).to_sql(ty, out),
        Type::FLOAT8 => (value as f64).to_sql(ty, out),
        Type::FLOAT4 => (value as f32).to_sql(ty, out),
        _ if is_text(ty) => value.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind integer {value} to a parameter of type {ty}").into()),
    }
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn mismatch(value: &CoreValue, ty: &Type) -> BoxError {
    format!("cannot bind {value:?} to a parameter of type {ty}").into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: CoreValue, ty: &Type) -> Result<BytesMut, BoxError> {
        let mut out = BytesMut::new();
        Value::from(value).to_sql(ty, &mut out)?;
        Ok(out)
    }

    #[test]
    fn integers_follow_the_placeholder_width() {
        assert_eq!(encode(CoreValue::I64(7), &Type::INT2).unwrap().len(), 2);
        assert_eq!(encode(CoreValue::I64(7), &Type::INT4).unwrap().len(), 4);
        assert_eq!(encode(CoreValue::I16(7), &Type::INT8).unwrap().len(), 8);
    }

    #[test]
    fn narrowing_out_of_range_fails() {
        assert!(encode(CoreValue::I64(i64::from(i32::MAX) + 1), &Type::INT4).is_err());
        assert!(encode(CoreValue::I32(40_000), &Type::INT2).is_err());
    }

    #[test]
    fn null_binds_anywhere() {
        let mut out = BytesMut::new();
        let ret = Value::from(CoreValue::Null).to_sql(&Type::BYTEA, &mut out).unwrap();
        assert!(matches!(ret, IsNull::Yes));
        assert!(<Value as ToSql>::accepts(&Type::BOOL));
    }

    #[test]
    fn strings_parse_into_keys() {
        let id = Uuid::new_v4();
        assert_eq!(
            encode(CoreValue::String(id.to_string()), &Type::UUID).unwrap().len(),
            16
        );
        assert!(encode(CoreValue::String("x".into()), &Type::INT4).is_err());
        assert_eq!(
            &encode(CoreValue::String("abc".into()), &Type::TEXT).unwrap()[..],
            b"abc"
        );
    }

    #[test]
    fn bytes_only_bind_to_bytea() {
        assert!(encode(CoreValue::Bytes(vec![1, 2]), &Type::BYTEA).is_ok());
        assert!(encode(CoreValue::Bytes(vec![1, 2]), &Type::TEXT).is_err());
    }
}
