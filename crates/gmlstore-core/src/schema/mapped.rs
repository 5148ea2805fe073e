use super::app::Crs;
use super::mapping::{BBoxTableMapping, BlobMapping, FeatureTypeMapping, IdGenerator};
use super::QName;
use crate::{Error, Result};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage strategy of a mapped schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Every property lives in its own column or related table.
    Relational,

    /// Whole features are stored as encoded payloads in one table.
    Blob,

    /// Both: payloads in the objects table, properties in relational tables
    /// keyed by the payload row id.
    #[default]
    Hybrid,
}

/// The result of mapping an application schema onto tables. Immutable once
/// built; shared by every operation of a feature store.
#[derive(Debug, Clone)]
pub struct MappedSchema {
    pub mode: StorageMode,

    pub feature_types: IndexMap<QName, FeatureTypeMapping>,

    /// Discriminator values of the feature type registry, in declaration
    /// order.
    pub type_ids: IndexMap<QName, i16>,

    pub blob: BlobMapping,

    pub bbox: BBoxTableMapping,

    /// CRS geometries are stored in.
    pub storage_crs: Crs,

    /// SRID of the storage CRS, `-1` if undefined.
    pub storage_srid: i32,

    /// Properties and particles that could not be mapped.
    pub diagnostics: Vec<Diagnostic>,
}

/// A mapping gap recorded while building a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub feature_type: QName,

    /// Property path from the feature type down to the skipped element.
    pub path: String,

    pub kind: DiagnosticKind,

    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Element with the same type already being expanded further up.
    Cycle,
    BlockListed,
    Wildcard,
    Unmappable,
    InvalidExpression,
}

/// A feature id split into the feature type it belongs to and its kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct IdAnalysis<'a> {
    pub mapping: &'a FeatureTypeMapping,
    pub kernel: IdKernel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKernel {
    Integer(i64),
    Uuid(uuid::Uuid),
}

impl MappedSchema {
    pub fn feature_type(&self, name: &QName) -> Option<&FeatureTypeMapping> {
        self.feature_types.get(name)
    }

    pub fn type_id(&self, name: &QName) -> Option<i16> {
        self.type_ids.get(name).copied()
    }

    pub fn type_name(&self, id: i16) -> Option<&QName> {
        self.type_ids
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(name, _)| name)
    }

    pub fn has_blob(&self) -> bool {
        matches!(self.mode, StorageMode::Blob | StorageMode::Hybrid)
    }

    pub fn has_relational(&self) -> bool {
        matches!(self.mode, StorageMode::Relational | StorageMode::Hybrid)
    }

    /// Splits an external feature id into feature type and kernel.
    ///
    /// The feature type whose prefix is the longest prefix of `id` wins. The
    /// rest must be an integer for auto-increment and sequence generators,
    /// and a UUID for the UUID generator.
    pub fn analyze_id(&self, id: &str) -> Result<IdAnalysis<'_>> {
        let mapping = self
            .feature_types
            .values()
            .filter(|ft| id.starts_with(&ft.fid.prefix))
            .max_by_key(|ft| ft.fid.prefix.len())
            .ok_or_else(|| Error::invalid_feature_id(id, "no feature type has a matching prefix"))?;

        let kernel = &id[mapping.fid.prefix.len()..];
        let kernel = match mapping.fid.generator {
            IdGenerator::AutoIncrement | IdGenerator::Sequence { .. } => kernel
                .parse()
                .map(IdKernel::Integer)
                .map_err(|_| Error::invalid_feature_id(id, "kernel is not an integer"))?,
            IdGenerator::Uuid => kernel
                .parse()
                .map(IdKernel::Uuid)
                .map_err(|_| Error::invalid_feature_id(id, "kernel is not a UUID"))?,
        };

        Ok(IdAnalysis { mapping, kernel })
    }
}

impl fmt::Display for IdKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKernel::Integer(v) => write!(f, "{v}"),
            IdKernel::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.feature_type, self.path, self.message)
    }
}
