use super::app::{Crs, CoordinateDimension, FeatureType, GeometryType, PropertyType, TypeRef};
use super::db::{ColumnMetadata, GeometryColumn, PhysicalSchema};
use super::mapping::{
    ColumnRef, FeatureTypeMapping, FidMapping, GeometryMapping, IdGenerator, Mapping, MappingKind,
    PrimitiveMapping, ValuePath,
};
use super::QName;
use crate::driver::{Connection, GeometryRegistryEntry};
use crate::{Error, Result};

use indexmap::IndexMap;
use tracing::{debug, warn};

/// Reads table metadata from a live database.
///
/// Column metadata is fetched once per table and cached for the lifetime of
/// the introspector; [`Introspector::into_physical`] hands the cache to the
/// mapping builder.
#[derive(Debug)]
pub struct Introspector<'a> {
    connection: &'a mut dyn Connection,
    cache: PhysicalSchema,
}

impl<'a> Introspector<'a> {
    pub fn new(connection: &'a mut dyn Connection) -> Introspector<'a> {
        Introspector {
            connection,
            cache: PhysicalSchema::default(),
        }
    }

    /// Columns of `table`, with registry information for geometry columns.
    /// Empty if the table does not exist.
    pub async fn columns(&mut self, table: &str) -> Result<&IndexMap<String, ColumnMetadata>> {
        if !self.cache.contains_table(table) {
            let columns = self.load(table).await?;
            self.cache.insert_table(table, columns);
        }

        self.cache
            .table(table)
            .ok_or_else(|| Error::invalid_result(format!("table `{table}` missing from cache")))
    }

    /// Derives a feature type and its mapping from an existing table.
    ///
    /// Every column becomes a single-valued property named after it, in
    /// `namespace`. The id column is `fid_column` if given, the first
    /// auto-increment column otherwise.
    pub async fn introspect(
        &mut self,
        table: &str,
        feature_type: QName,
        fid_column: Option<&str>,
    ) -> Result<(FeatureType, FeatureTypeMapping)> {
        let columns = self.columns(table).await?;
        if columns.is_empty() {
            return Err(Error::invalid_schema(format!("table `{table}` does not exist")));
        }

        let fid = fid_mapping(&feature_type, table, columns, fid_column)?;

        let mut ft = FeatureType::new(feature_type.clone());
        let mut properties = IndexMap::new();

        for column in columns.values() {
            if column.name == fid.column {
                continue;
            }

            let name = QName {
                namespace: feature_type.namespace.clone(),
                prefix: feature_type.prefix.clone(),
                local: column.name.clone(),
            };

            let (ty, kind) = if let Some(geometry) = &column.geometry {
                (
                    TypeRef::Geometry {
                        ty: geometry.ty,
                        dim: Some(geometry.dim),
                    },
                    MappingKind::Geometry(GeometryMapping {
                        column: ColumnRef::new(&column.name),
                        ty: geometry.ty,
                        dim: geometry.dim,
                        crs: geometry.crs.clone(),
                        srid: geometry.srid,
                    }),
                )
            } else if let Some(primitive) = column.ty.to_primitive() {
                (
                    TypeRef::primitive(primitive),
                    MappingKind::Primitive(PrimitiveMapping {
                        column: ColumnRef::new(&column.name),
                        ty: primitive,
                    }),
                )
            } else {
                warn!(table, column = %column.name, ty = ?column.ty, "column type cannot be mapped; skipping");
                continue;
            };

            let mut property = PropertyType::new(name.clone(), ty);
            property.min_occurs = u32::from(!column.nullable);
            ft.properties.push(property);
            properties.insert(
                name.clone(),
                Some(Mapping::new(ValuePath::element(name), kind)),
            );
        }

        debug!(table, feature_type = %feature_type, properties = properties.len(), "introspected table");

        let mapping = FeatureTypeMapping {
            name: feature_type,
            table: table.to_ascii_lowercase(),
            fid,
            properties,
        };
        Ok((ft, mapping))
    }

    /// The metadata cache, for the mapping builder.
    pub fn physical(&self) -> &PhysicalSchema {
        &self.cache
    }

    pub fn into_physical(self) -> PhysicalSchema {
        self.cache
    }

    async fn load(&mut self, table: &str) -> Result<IndexMap<String, ColumnMetadata>> {
        let mut columns = IndexMap::new();

        for mut column in self.connection.columns(table).await? {
            if column.ty.is_geometry() {
                let entry = self.connection.geometry_column(table, &column.name).await;
                column.geometry = Some(registry_info(table, &column.name, entry));
            }
            columns.insert(column.name.to_ascii_lowercase(), column);
        }

        Ok(columns)
    }
}

/// Interprets a registry lookup, falling back to an unconstrained 2D
/// geometry if it failed or found nothing.
fn registry_info(
    table: &str,
    column: &str,
    entry: Result<Option<GeometryRegistryEntry>>,
) -> GeometryColumn {
    let entry = match entry {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            warn!(table, column, "geometry column is not registered; using defaults");
            return GeometryColumn::fallback();
        }
        Err(err) => {
            warn!(table, column, error = %err, "geometry registry lookup failed; using defaults");
            return GeometryColumn::fallback();
        }
    };

    let ty = match GeometryType::from_postgis(&entry.type_name) {
        Some(ty) => ty,
        None => {
            warn!(table, column, ty = %entry.type_name, "unknown geometry type; using GEOMETRY");
            GeometryType::Geometry
        }
    };

    let crs = if entry.srid > 0 {
        Crs::epsg(entry.srid)
    } else {
        Crs::default()
    };

    GeometryColumn {
        ty,
        dim: CoordinateDimension::from_count(entry.dimension),
        srid: entry.srid,
        crs,
    }
}

fn fid_mapping(
    feature_type: &QName,
    table: &str,
    columns: &IndexMap<String, ColumnMetadata>,
    fid_column: Option<&str>,
) -> Result<FidMapping> {
    let prefix = format!("{}_", feature_type.local.to_uppercase());

    let column = match fid_column {
        Some(name) => columns.get(&name.to_ascii_lowercase()).ok_or_else(|| {
            Error::invalid_mapping_config(format!(
                "fid column `{name}` does not exist in table `{table}`"
            ))
        })?,
        None => columns
            .values()
            .find(|column| column.auto_increment)
            .ok_or_else(|| {
                Error::invalid_mapping_config(format!(
                    "table `{table}` has no auto-increment column and no fid column is configured"
                ))
            })?,
    };

    let generator = if column.auto_increment {
        IdGenerator::AutoIncrement
    } else if column.ty.is_text() || column.ty == super::db::Type::Uuid {
        IdGenerator::Uuid
    } else {
        return Err(Error::invalid_mapping_config(format!(
            "fid column `{}` of table `{table}` neither auto-increments nor holds text",
            column.name
        )));
    };

    Ok(FidMapping {
        column: column.name.to_ascii_lowercase(),
        ty: column.ty.clone(),
        generator,
        prefix,
    })
}
