use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Scalar value types of simple-typed GML properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveType {
    Boolean,
    Date,
    DateTime,
    Decimal,
    Double,
    Integer,
    String,
    Time,
}

impl PrimitiveType {
    /// Maps an XML Schema built-in type (local name, e.g. `dateTime`) to the
    /// closest primitive type. Unknown types fall back to strings.
    pub fn from_xsd(local: &str) -> PrimitiveType {
        match local {
            "boolean" => PrimitiveType::Boolean,
            "date" => PrimitiveType::Date,
            "dateTime" => PrimitiveType::DateTime,
            "time" => PrimitiveType::Time,
            "decimal" => PrimitiveType::Decimal,
            "double" | "float" => PrimitiveType::Double,
            "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger"
            | "positiveInteger" | "negativeInteger" | "nonPositiveInteger" | "unsignedInt"
            | "unsignedLong" | "unsignedShort" | "unsignedByte" => PrimitiveType::Integer,
            _ => PrimitiveType::String,
        }
    }

    /// Maps a database column type name, as reported by the catalog, back to a
    /// primitive type.
    pub fn from_sql_type_name(name: &str) -> Option<PrimitiveType> {
        let name = name.to_ascii_lowercase();
        let ty = match name.as_str() {
            "bool" | "boolean" => PrimitiveType::Boolean,
            "date" => PrimitiveType::Date,
            "timestamp" | "timestamptz" | "timestamp without time zone"
            | "timestamp with time zone" => PrimitiveType::DateTime,
            "time" | "timetz" | "time without time zone" | "time with time zone" => {
                PrimitiveType::Time
            }
            "numeric" | "decimal" => PrimitiveType::Decimal,
            "float4" | "float8" | "real" | "double precision" => PrimitiveType::Double,
            "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "serial"
            | "bigserial" => PrimitiveType::Integer,
            "text" | "varchar" | "character varying" | "bpchar" | "character" | "char"
            | "uuid" | "name" => PrimitiveType::String,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Date => "date",
            PrimitiveType::DateTime => "date-time",
            PrimitiveType::Decimal => "decimal",
            PrimitiveType::Double => "double",
            PrimitiveType::Integer => "integer",
            PrimitiveType::String => "string",
            PrimitiveType::Time => "time",
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "boolean" => PrimitiveType::Boolean,
            "date" => PrimitiveType::Date,
            "date-time" | "dateTime" => PrimitiveType::DateTime,
            "decimal" => PrimitiveType::Decimal,
            "double" => PrimitiveType::Double,
            "integer" => PrimitiveType::Integer,
            "string" => PrimitiveType::String,
            "time" => PrimitiveType::Time,
            _ => return Err(format!("unknown primitive type `{s}`")),
        };
        Ok(ty)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
