//! Mapping from explicit per-property configuration.

use super::BuildSchema;
use crate::schema::app::{self, GeometryType, PrimitiveType};
use crate::schema::config::expr::{self, ColumnExpr};
use crate::schema::config::{FeatureTypeConfig, PropertyConfig, PropertyKindConfig};
use crate::schema::mapped::DiagnosticKind;
use crate::schema::mapping::{
    BlobMapping, CodeMapping, ColumnRef, CompoundMapping, DbField, FeatureReferenceMapping, FeatureTypeMapping,
    JoinChain, JoinStep, Mapping, MappingKind, PathStep, PrimitiveMapping, ValuePath,
};
use crate::schema::QName;
use crate::{Error, Result};

use indexmap::IndexMap;
use tracing::warn;

impl BuildSchema<'_> {
    pub(super) fn map_explicit(
        &mut self,
        ft: &app::FeatureType,
        config: &FeatureTypeConfig,
    ) -> Result<FeatureTypeMapping> {
        let Some(table) = config.table.as_deref() else {
            return Err(Error::invalid_mapping_config(format!(
                "feature type {}: missing `table`",
                ft.name
            )));
        };
        let table = table.to_ascii_lowercase();

        let fid = self.configured_fid(&ft.name, &table, config.fid.as_ref())?;
        self.naming.explicit_context(&table, &fid.column);

        let mut properties = IndexMap::new();
        for property in &config.properties {
            let name = match self.property_path(property) {
                Ok(ValuePath { steps }) => match steps.into_iter().next() {
                    Some(PathStep::Element(name)) => name,
                    _ => {
                        self.invalid_property(&ft.name, &property.path, "a property path must name an element");
                        continue;
                    }
                },
                Err(err) => {
                    self.invalid_property(&ft.name, &property.path, err.to_string());
                    continue;
                }
            };

            match self.explicit_mapping(&table, property) {
                Ok(mapping) => {
                    properties.insert(name, Some(mapping));
                }
                Err(err) => {
                    self.invalid_property(&ft.name, &property.path, err.to_string());
                    properties.insert(name, None);
                }
            }
        }

        Ok(FeatureTypeMapping {
            name: ft.name.clone(),
            table,
            fid,
            properties,
        })
    }

    /// Blob mode keeps no relational tables; only the id mapping matters.
    pub(super) fn blob_only(
        &mut self,
        ft: &app::FeatureType,
        config: Option<&FeatureTypeConfig>,
    ) -> Result<FeatureTypeMapping> {
        let fid = match config {
            Some(config) => {
                let table = config.table.clone().unwrap_or_default();
                self.configured_fid(&ft.name, &table, config.fid.as_ref())?
            }
            None => self.default_fid(&ft.name),
        };

        Ok(FeatureTypeMapping {
            name: ft.name.clone(),
            table: BlobMapping::default().table,
            fid,
            properties: IndexMap::new(),
        })
    }

    /// Builds one configured mapping whose columns live in `table`, unless
    /// the mapping joins to another table.
    fn explicit_mapping(&self, table: &str, config: &PropertyConfig) -> Result<Mapping> {
        let path = self.property_path(config)?;

        let join = match &config.join {
            Some(src) => Some(self.join_chain(table, src, config.index.as_deref())?),
            None => None,
        };
        let target = join
            .as_ref()
            .map(|join| join.target_table().to_string())
            .unwrap_or_else(|| table.to_string());

        let kind = match config.kind {
            PropertyKindConfig::Primitive => {
                let column = self.column(&target, config.mapping.as_deref(), "mapping")?;
                let ty = match &config.ty {
                    Some(ty) => ty.parse::<PrimitiveType>().map_err(Error::invalid_mapping_config)?,
                    None => self
                        .physical
                        .and_then(|physical| physical.column(&target, &column.name))
                        .and_then(|column| column.ty.to_primitive())
                        .unwrap_or(PrimitiveType::String),
                };
                MappingKind::Primitive(PrimitiveMapping { column, ty })
            }
            PropertyKindConfig::Geometry => {
                let column = self.column(&target, config.mapping.as_deref(), "mapping")?;
                let ty = match &config.ty {
                    Some(ty) => ty.parse::<GeometryType>().map_err(Error::invalid_mapping_config)?,
                    None => GeometryType::Geometry,
                };
                let mut mapping = self.geometry_mapping(&target, column.name, ty, config.dim);
                if let Some(crs) = &config.crs {
                    mapping.crs = crs.clone();
                    mapping.srid = crs.epsg_code().unwrap_or(mapping.srid);
                }
                if let Some(srid) = config.srid {
                    mapping.srid = srid;
                }
                MappingKind::Geometry(mapping)
            }
            PropertyKindConfig::Feature => {
                let column = self.column(&target, config.mapping.as_deref(), "mapping")?;
                let target = match &config.target {
                    Some(name) => Some(self.qname(name)?),
                    None => None,
                };
                MappingKind::FeatureReference(FeatureReferenceMapping { column, target })
            }
            PropertyKindConfig::Code => MappingKind::Code(CodeMapping {
                value: self.column(&target, config.mapping.as_deref(), "mapping")?,
                code_space: self.column(&target, config.code_space.as_deref(), "code_space")?,
            }),
            PropertyKindConfig::Compound => {
                if config.particles.is_empty() {
                    return Err(Error::invalid_mapping_config(
                        "a compound mapping needs at least one particle",
                    ));
                }
                let particles = config
                    .particles
                    .iter()
                    .map(|particle| self.explicit_mapping(&target, particle))
                    .collect::<Result<Vec<_>>>()?;
                MappingKind::Compound(CompoundMapping { particles })
            }
        };

        if join.is_none() && config.index.is_some() {
            return Err(Error::invalid_mapping_config(
                "`index` is only valid together with `join`",
            ));
        }

        Ok(Mapping { path, join, kind })
    }

    fn property_path(&self, config: &PropertyConfig) -> Result<ValuePath> {
        let src = config.path.trim();
        if src == "text()" {
            return Ok(ValuePath::text());
        }
        if let Some(attribute) = src.strip_prefix('@') {
            return Ok(ValuePath::attribute(self.qname(attribute)?));
        }
        Ok(ValuePath::element(self.qname(src)?))
    }

    fn qname(&self, src: &str) -> Result<QName> {
        match self.config {
            Some(config) => config.qname(self.app, src),
            None => self.app.qname(src),
        }
    }

    fn column(&self, table: &str, src: Option<&str>, field: &str) -> Result<ColumnRef> {
        let Some(src) = src else {
            return Err(Error::invalid_mapping_config(format!("missing `{field}`")));
        };

        let ColumnExpr {
            table: qualifier,
            column,
        } = expr::parse_column(src)
            .map_err(|err| Error::invalid_mapping_config(format!("`{src}`: {err}")))?;

        if let Some(qualifier) = qualifier {
            if !qualifier.eq_ignore_ascii_case(table) {
                return Err(Error::invalid_mapping_config(format!(
                    "`{src}`: column is not on table `{table}`"
                )));
            }
        }

        if let Some(physical) = self.physical {
            if physical.contains_table(table) && physical.column(table, &column).is_none() {
                return Err(Error::invalid_mapping_config(format!(
                    "`{src}`: table `{table}` has no column `{column}`"
                )));
            }
        }

        Ok(ColumnRef::new(column.to_ascii_lowercase()))
    }

    fn join_chain(&self, table: &str, src: &str, order: Option<&str>) -> Result<JoinChain> {
        let steps = expr::parse_join(src)
            .map_err(|err| Error::invalid_mapping_config(format!("`{src}`: {err}")))?;

        let mut current = table.to_ascii_lowercase();
        let mut chain = vec![];
        for step in steps {
            let to_table = step.table.to_ascii_lowercase();
            chain.push(JoinStep {
                from: DbField::new(current.clone(), step.from_column.to_ascii_lowercase()),
                to: DbField::new(to_table.clone(), step.column.to_ascii_lowercase()),
            });
            current = to_table;
        }

        let chain = JoinChain::from_steps(chain)
            .ok_or_else(|| Error::invalid_mapping_config(format!("`{src}`: empty join")))?;

        Ok(match order {
            Some(order) => {
                let column = expr::parse_column(order)
                    .map_err(|err| Error::invalid_mapping_config(format!("`{order}`: {err}")))?;
                chain.with_order_column(column.column.to_ascii_lowercase())
            }
            None => chain,
        })
    }

    fn invalid_property(&mut self, feature_type: &QName, path: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(feature_type = %feature_type, path, error = %message, "invalid property mapping");
        self.diagnostic(
            feature_type,
            path.to_string(),
            DiagnosticKind::InvalidExpression,
            message,
        );
    }
}
