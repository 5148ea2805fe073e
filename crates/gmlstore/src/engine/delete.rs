use super::Engine;

use gmlstore_core::{
    schema::{IdKernel, QName},
    stmt::Value,
    Connection, Error, Result,
};
use gmlstore_sql::update;

use indexmap::IndexMap;
use tracing::debug;

impl Engine {
    /// Deletes features by external id, returning the number of deleted
    /// feature rows. Ids of features that do not exist are ignored; a
    /// malformed id fails the whole operation before anything is deleted.
    pub(crate) async fn delete(&self, conn: &mut dyn Connection, ids: &[String]) -> Result<u64> {
        let schema = &self.schema;

        let mut by_type: IndexMap<&QName, Vec<&String>> = IndexMap::new();
        for id in ids {
            let analysis = schema.analyze_id(id)?;
            by_type.entry(&analysis.mapping.name).or_default().push(id);
        }

        let mut count = 0;
        for (name, ids) in &by_type {
            let mapping = schema.feature_type(name).ok_or_else(|| {
                Error::invalid_schema(format!("feature type {name} is not mapped"))
            })?;

            let keys = if schema.has_blob() {
                let gml_ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                let rows = self
                    .query_rows(conn, &update::object_ids(schema, &gml_ids))
                    .await?;
                rows.iter()
                    .map(|row| row.get(0).cloned())
                    .collect::<Result<Vec<_>>>()?
            } else {
                let mut keys = vec![];
                for id in ids {
                    keys.push(match schema.analyze_id(id)?.kernel {
                        IdKernel::Integer(v) => Value::I64(v),
                        IdKernel::Uuid(v) => Value::Uuid(v),
                    });
                }
                keys
            };

            let deleted = self
                .exec_batch(conn, keys, |key| update::delete_feature(schema, mapping, key))
                .await?;
            debug!(feature_type = %name, deleted, "deleted features");
            count += deleted;
        }

        self.refresh_extents(conn, by_type.keys().copied()).await?;
        Ok(count)
    }
}
