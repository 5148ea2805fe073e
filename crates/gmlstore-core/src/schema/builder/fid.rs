use super::BuildSchema;
use crate::schema::config::FidConfig;
use crate::schema::db;
use crate::schema::mapping::{FidMapping, IdGenerator};
use crate::schema::{QName, StorageMode};
use crate::{Error, Result};

/// Key column of synthesized tables.
pub(super) const DEFAULT_FID_COLUMN: &str = "id";

impl BuildSchema<'_> {
    /// Feature id mapping of a feature type without configuration.
    pub(super) fn default_fid(&self, feature_type: &QName) -> FidMapping {
        let prefix = default_prefix(feature_type);
        match self.mode {
            StorageMode::Relational => FidMapping::auto_increment(DEFAULT_FID_COLUMN, prefix),
            // The key is the objects table id.
            StorageMode::Hybrid | StorageMode::Blob => FidMapping {
                column: DEFAULT_FID_COLUMN.to_string(),
                ty: db::Type::Integer(4),
                generator: IdGenerator::AutoIncrement,
                prefix,
            },
        }
    }

    /// Feature id mapping from configuration, checked against the table if
    /// it already exists.
    pub(super) fn configured_fid(
        &self,
        feature_type: &QName,
        table: &str,
        config: Option<&FidConfig>,
    ) -> Result<FidMapping> {
        let existing = self.physical.and_then(|physical| physical.table(table));

        let generator = match config.map(|c| c.generator.as_str()).unwrap_or("auto") {
            "auto" => IdGenerator::AutoIncrement,
            "uuid" => IdGenerator::Uuid,
            "sequence" => {
                let Some(name) = config.and_then(|c| c.sequence.clone()) else {
                    return Err(Error::invalid_mapping_config(format!(
                        "feature type {feature_type}: the sequence generator requires `sequence`"
                    )));
                };
                IdGenerator::Sequence { name }
            }
            other => {
                return Err(Error::invalid_mapping_config(format!(
                    "feature type {feature_type}: unknown id generator `{other}`"
                )));
            }
        };

        let column = match (config.and_then(|c| c.column.clone()), existing) {
            (Some(column), Some(columns)) => {
                if !columns.contains_key(&column.to_ascii_lowercase()) {
                    return Err(Error::invalid_mapping_config(format!(
                        "feature type {feature_type}: fid column `{column}` does not exist in table `{table}`"
                    )));
                }
                column
            }
            (Some(column), None) => column,
            (None, Some(columns)) => {
                let auto = columns.values().find(|column| column.auto_increment);
                match auto {
                    Some(column) => column.name.clone(),
                    None => {
                        return Err(Error::invalid_mapping_config(format!(
                            "feature type {feature_type}: table `{table}` has no auto-increment column and no fid column is configured"
                        )));
                    }
                }
            }
            (None, None) => DEFAULT_FID_COLUMN.to_string(),
        };

        let ty = match (self.mode, &generator) {
            (StorageMode::Hybrid | StorageMode::Blob, _) => db::Type::Integer(4),
            (StorageMode::Relational, IdGenerator::AutoIncrement) => db::Type::Serial,
            (StorageMode::Relational, IdGenerator::Sequence { .. }) => db::Type::Integer(4),
            (StorageMode::Relational, IdGenerator::Uuid) => db::Type::Text,
        };

        let prefix = match config {
            Some(config) => config.prefix.clone(),
            None => default_prefix(feature_type),
        };

        Ok(FidMapping {
            column: column.to_ascii_lowercase(),
            ty,
            generator,
            prefix,
        })
    }
}

/// `BUILDING_` for `app:Building`.
fn default_prefix(feature_type: &QName) -> String {
    format!("{}_", feature_type.local.to_uppercase())
}
