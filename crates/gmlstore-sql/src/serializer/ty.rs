use super::{Params, ToSql};

use gmlstore_core::schema::{
    app::{CoordinateDimension, UNDEFINED_SRID},
    db,
};

impl ToSql for &db::Type {
    fn to_sql<T: Params>(self, f: &mut super::Formatter<'_, T>) {
        use db::Type::*;

        match self {
            Boolean => fmt!(f, "boolean"),
            Integer(2) => fmt!(f, "smallint"),
            Integer(8) => fmt!(f, "bigint"),
            Integer(_) => fmt!(f, "integer"),
            Serial => fmt!(f, "serial"),
            Text => fmt!(f, "text"),
            Numeric => fmt!(f, "numeric"),
            DoublePrecision => fmt!(f, "double precision"),
            Bytea => fmt!(f, "bytea"),
            Timestamp => fmt!(f, "timestamp"),
            Date => fmt!(f, "date"),
            Time => fmt!(f, "time"),
            Uuid => fmt!(f, "uuid"),
            Geometry { srid, .. } if *srid == UNDEFINED_SRID => fmt!(f, "geometry"),
            Geometry { ty, dim, srid } => {
                let z = match dim {
                    CoordinateDimension::Dim2 => "",
                    CoordinateDimension::Dim3 => "Z",
                };
                let srid = *srid;
                fmt!(f, "geometry(" ty.postgis_name() z "," srid ")")
            }
            Custom(name) => fmt!(f, name),
        }
    }
}
