use super::Type;
use crate::schema::app::{CoordinateDimension, Crs, GeometryType};

/// What the catalog reports about one column of an existing table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,

    pub ty: Type,

    pub nullable: bool,

    /// True if the column draws its values from a sequence (`nextval`
    /// default) or is an identity column.
    pub auto_increment: bool,

    /// Registry information, for geometry columns.
    pub geometry: Option<GeometryColumn>,
}

/// A `geometry_columns` registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryColumn {
    pub ty: GeometryType,
    pub dim: CoordinateDimension,
    pub srid: i32,
    pub crs: Crs,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, ty: Type) -> ColumnMetadata {
        ColumnMetadata {
            name: name.into(),
            ty,
            nullable: true,
            auto_increment: false,
            geometry: None,
        }
    }

    pub fn auto_increment(mut self) -> ColumnMetadata {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> ColumnMetadata {
        self.nullable = false;
        self
    }
}

impl GeometryColumn {
    /// Registry information used when a geometry column is missing from
    /// `geometry_columns`: undefined SRID, EPSG:4326, two dimensions, generic
    /// geometry type.
    pub fn fallback() -> GeometryColumn {
        GeometryColumn {
            ty: GeometryType::Geometry,
            dim: CoordinateDimension::Dim2,
            srid: crate::schema::app::UNDEFINED_SRID,
            crs: Crs::default(),
        }
    }
}
