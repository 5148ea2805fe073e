mod block_list;
mod explicit;
mod fid;
mod synthesize;

use super::app::{self, Crs, UNDEFINED_SRID};
use super::config::MappingConfig;
use super::db::PhysicalSchema;
use super::mapped::{Diagnostic, DiagnosticKind, MappedSchema, StorageMode};
use super::mapping::{BBoxTableMapping, BlobMapping, FeatureTypeMapping};
use super::naming::NamingManager;
use super::QName;
use crate::{Error, Result};

use indexmap::IndexMap;
use tracing::{debug, info};

/// Maps an application schema onto tables.
///
/// Feature types with an entry in the mapping configuration are mapped as
/// configured; every other concrete feature type gets a synthesized layout.
#[derive(Debug, Default)]
pub struct Builder {
    /// Storage mode used when no configuration sets one.
    mode: Option<StorageMode>,
}

/// Used to track state during the build process
struct BuildSchema<'a> {
    app: &'a app::Schema,

    config: Option<&'a MappingConfig>,

    /// Columns of existing tables.
    physical: Option<&'a PhysicalSchema>,

    mode: StorageMode,

    storage_crs: Crs,

    storage_srid: i32,

    naming: NamingManager,

    diagnostics: Vec<Diagnostic>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&mut self, mode: StorageMode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    pub fn build(
        &self,
        app: &app::Schema,
        config: Option<&MappingConfig>,
        physical: Option<&PhysicalSchema>,
    ) -> Result<MappedSchema> {
        let mode = config
            .map(|config| config.mode)
            .or(self.mode)
            .unwrap_or_default();

        let configured_crs = config.and_then(|config| config.storage_crs.clone());
        let storage_srid = config
            .and_then(|config| config.storage_srid)
            .or_else(|| configured_crs.as_ref().and_then(Crs::epsg_code))
            .unwrap_or(UNDEFINED_SRID);

        let mut builder = BuildSchema {
            app,
            config,
            physical,
            mode,
            storage_crs: configured_crs.unwrap_or_default(),
            storage_srid,
            naming: NamingManager::new(),
            diagnostics: vec![],
        };

        // Reserve the auxiliary table names before any feature type can
        // claim them.
        let blob = BlobMapping::default();
        let bbox = BBoxTableMapping::default();
        builder.naming.explicit_context(&bbox.table, &bbox.id_column);
        builder.naming.explicit_context(&blob.table, &blob.id_column);

        if let Some(config) = config {
            builder.verify_config(config)?;
        }

        let mut feature_types = IndexMap::new();
        let mut type_ids = IndexMap::new();

        for (i, ft) in app.concrete_feature_types().enumerate() {
            let id = i16::try_from(i + 1).map_err(|_| {
                Error::unsupported_feature("more than 32767 feature types")
            })?;
            type_ids.insert(ft.name.clone(), id);

            let mapping = builder
                .build_feature_type(ft)
                .map_err(|err| err.context(format!("mapping feature type {}", ft.name)))?;

            debug!(
                feature_type = %ft.name,
                table = %mapping.table,
                properties = mapping.properties.len(),
                "mapped feature type"
            );
            feature_types.insert(ft.name.clone(), mapping);
        }

        info!(
            mode = ?mode,
            feature_types = feature_types.len(),
            diagnostics = builder.diagnostics.len(),
            "built mapped schema"
        );

        Ok(MappedSchema {
            mode,
            feature_types,
            type_ids,
            blob,
            bbox,
            storage_crs: builder.storage_crs,
            storage_srid: builder.storage_srid,
            diagnostics: builder.diagnostics,
        })
    }
}

impl BuildSchema<'_> {
    fn build_feature_type(&mut self, ft: &app::FeatureType) -> Result<FeatureTypeMapping> {
        let explicit = match self.config {
            Some(config) => config.feature_type(self.app, &ft.name)?,
            None => None,
        };

        if self.mode == StorageMode::Blob {
            return self.blob_only(ft, explicit);
        }

        match explicit {
            Some(explicit) => self.map_explicit(ft, explicit),
            None => Ok(self.synthesize(ft)),
        }
    }

    /// Every configured feature type must exist in the schema.
    fn verify_config(&self, config: &MappingConfig) -> Result<()> {
        for entry in &config.feature_types {
            let name = config.qname(self.app, &entry.name)?;
            match self.app.feature_type(&name) {
                Some(ft) if ft.is_abstract => {
                    return Err(Error::invalid_mapping_config(format!(
                        "feature type {name} is abstract and cannot be mapped"
                    )));
                }
                Some(_) => {}
                None => {
                    return Err(Error::invalid_mapping_config(format!(
                        "unknown feature type {name}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn diagnostic(
        &mut self,
        feature_type: &QName,
        path: String,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            feature_type: feature_type.clone(),
            path,
            kind,
            message: message.into(),
        });
    }
}
