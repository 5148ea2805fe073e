//! Explicit mapping configuration, loaded from TOML.
//!
//! ```toml
//! mode = "hybrid"
//!
//! [namespaces]
//! app = "http://example.org/app"
//!
//! [[feature_type]]
//! name = "app:Building"
//! table = "building"
//! fid = { column = "id", generator = "auto", prefix = "BUILDING_" }
//!
//! [[feature_type.property]]
//! path = "app:name"
//! kind = "primitive"
//! type = "string"
//! mapping = "value"
//! join = "id=building_name.parentfk"
//! ```

pub mod expr;

use super::app::{CoordinateDimension, Crs, Schema};
use super::{QName, StorageMode};
use crate::{Error, Result};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    #[serde(default)]
    pub mode: StorageMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_crs: Option<Crs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_srid: Option<i32>,

    /// Prefix bindings for names in this document, in addition to those of
    /// the application schema.
    #[serde(default)]
    pub namespaces: IndexMap<String, String>,

    #[serde(default, rename = "feature_type")]
    pub feature_types: Vec<FeatureTypeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureTypeConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<FidConfig>,

    #[serde(default, rename = "property")]
    pub properties: Vec<PropertyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FidConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// `auto`, `sequence` or `uuid`.
    #[serde(default = "default_generator")]
    pub generator: String,

    /// Sequence name, required by the `sequence` generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,

    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyConfig {
    /// `prefix:local`, `{ns}local`, `@attribute` or `text()`.
    pub path: String,

    pub kind: PropertyKindConfig,

    /// Primitive or geometry type name.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,

    /// Column expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,

    /// Column expression of the code space, for code properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_space: Option<String>,

    /// Join expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<String>,

    /// Ordering column of the joined table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// Referenced feature type, for feature references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<CoordinateDimension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Crs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srid: Option<i32>,

    #[serde(default, rename = "particle")]
    pub particles: Vec<PropertyConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKindConfig {
    Primitive,
    Geometry,
    Feature,
    Code,
    Compound,
}

impl MappingConfig {
    pub fn from_toml(src: &str) -> Result<MappingConfig> {
        Ok(toml::from_str(src)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<MappingConfig> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)?;
        MappingConfig::from_toml(&src)
            .map_err(|err| err.context(format!("loading {}", path.display())))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| Error::invalid_mapping_config(err.to_string()))
    }

    /// Resolves a name of this document, consulting its own prefix bindings
    /// first, then the schema's.
    pub fn qname(&self, schema: &Schema, src: &str) -> Result<QName> {
        QName::parse(src, |prefix| {
            self.namespaces
                .get(prefix)
                .cloned()
                .or_else(|| schema.resolve_prefix(prefix))
        })
        .map_err(Error::invalid_mapping_config)
    }

    /// The entry for `name`, if the document configures that feature type.
    pub fn feature_type(&self, schema: &Schema, name: &QName) -> Result<Option<&FeatureTypeConfig>> {
        for ft in &self.feature_types {
            if self.qname(schema, &ft.name)? == *name {
                return Ok(Some(ft));
            }
        }
        Ok(None)
    }
}

fn default_generator() -> String {
    "auto".to_string()
}
