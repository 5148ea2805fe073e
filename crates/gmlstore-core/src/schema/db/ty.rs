use crate::schema::app::{CoordinateDimension, GeometryType, PrimitiveType};

/// Database storage types, as they appear in `CREATE TABLE` statements and in
/// the catalog.
///
/// The mapping layer works with [`PrimitiveType`] and [`GeometryType`]; this
/// type is what the DDL generator emits and what introspection reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Boolean,

    /// A signed integer of `n` bytes
    Integer(u8),

    /// An auto-incrementing 4 byte integer
    Serial,

    Text,

    /// Arbitrary-precision decimal
    Numeric,

    DoublePrecision,

    Bytea,

    Timestamp,

    Date,

    Time,

    Uuid,

    /// A PostGIS geometry column. An SRID of `-1` leaves the column
    /// unconstrained.
    Geometry {
        ty: GeometryType,
        dim: CoordinateDimension,
        srid: i32,
    },

    /// A type the mapping layer does not interpret.
    Custom(String),
}

impl Type {
    /// Default storage type for values of a primitive type.
    pub fn from_primitive(ty: PrimitiveType) -> Type {
        match ty {
            PrimitiveType::Boolean => Type::Boolean,
            PrimitiveType::Date => Type::Date,
            PrimitiveType::DateTime => Type::Timestamp,
            PrimitiveType::Decimal => Type::Numeric,
            PrimitiveType::Double => Type::DoublePrecision,
            PrimitiveType::Integer => Type::Integer(4),
            PrimitiveType::String => Type::Text,
            PrimitiveType::Time => Type::Time,
        }
    }

    /// Interprets a catalog type name such as `int4` or `character varying`.
    pub fn from_sql_name(name: &str) -> Type {
        match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Type::Boolean,
            "int2" | "smallint" => Type::Integer(2),
            "int4" | "integer" | "int" => Type::Integer(4),
            "int8" | "bigint" => Type::Integer(8),
            "serial" => Type::Serial,
            "text" | "varchar" | "character varying" | "bpchar" | "character" | "char"
            | "name" => Type::Text,
            "numeric" | "decimal" => Type::Numeric,
            "float4" | "float8" | "real" | "double precision" => Type::DoublePrecision,
            "bytea" => Type::Bytea,
            "timestamp" | "timestamptz" | "timestamp without time zone"
            | "timestamp with time zone" => Type::Timestamp,
            "date" => Type::Date,
            "time" | "timetz" | "time without time zone" | "time with time zone" => Type::Time,
            "uuid" => Type::Uuid,
            "geometry" => Type::Geometry {
                ty: GeometryType::Geometry,
                dim: CoordinateDimension::Dim2,
                srid: crate::schema::app::UNDEFINED_SRID,
            },
            other => Type::Custom(other.to_string()),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer(_) | Type::Serial)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Type::Text)
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, Type::Geometry { .. })
    }

    /// The primitive type values of this column read back as.
    pub fn to_primitive(&self) -> Option<PrimitiveType> {
        let ty = match self {
            Type::Boolean => PrimitiveType::Boolean,
            Type::Integer(_) | Type::Serial => PrimitiveType::Integer,
            Type::Text | Type::Uuid => PrimitiveType::String,
            Type::Numeric => PrimitiveType::Decimal,
            Type::DoublePrecision => PrimitiveType::Double,
            Type::Timestamp => PrimitiveType::DateTime,
            Type::Date => PrimitiveType::Date,
            Type::Time => PrimitiveType::Time,
            Type::Bytea | Type::Geometry { .. } | Type::Custom(_) => return None,
        };
        Some(ty)
    }
}
