use super::Statement;

use gmlstore_core::schema::app::{CoordinateDimension, GeometryType};

/// Registers a geometry column through the PostGIS `AddGeometryColumn`
/// function, for releases that lack typed geometry columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AddGeometryColumn {
    pub table: String,
    pub column: String,
    pub srid: i32,
    pub ty: GeometryType,
    pub dim: CoordinateDimension,
}

impl Statement {
    pub fn add_geometry_column(
        table: impl Into<String>,
        column: impl Into<String>,
        ty: GeometryType,
        dim: CoordinateDimension,
        srid: i32,
    ) -> Self {
        AddGeometryColumn {
            table: table.into(),
            column: column.into(),
            srid,
            ty,
            dim,
        }
        .into()
    }
}

impl From<AddGeometryColumn> for Statement {
    fn from(value: AddGeometryColumn) -> Self {
        Self::AddGeometryColumn(value)
    }
}
