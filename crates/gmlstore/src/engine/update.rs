use super::Engine;

use gmlstore_core::{
    feature::Property,
    schema::IdKernel,
    stmt::Value,
    Connection, Error, Result,
};
use gmlstore_sql::update::{self, UpdateBuilder};

use indexmap::IndexSet;
use tracing::debug;

impl Engine {
    /// Replaces the values of the given properties of the feature `id`. A
    /// property listed only with nil values is cleared.
    pub(crate) async fn update(
        &self,
        conn: &mut dyn Connection,
        id: &str,
        properties: &[Property],
    ) -> Result<()> {
        let schema = &self.schema;
        let analysis = schema.analyze_id(id)?;
        let mapping = analysis.mapping;

        let key = if schema.has_blob() {
            let rows = self
                .query_rows(conn, &update::object_payload(schema, id))
                .await?;
            let row = rows
                .first()
                .ok_or_else(|| Error::invalid_feature_id(id, "no such feature"))?;
            let object_id = row.get(0)?.clone();

            let data = row.get(1)?.as_bytes().ok_or_else(|| {
                Error::invalid_result(format!("feature {id} has no stored payload"))
            })?;
            let mut feature = self.codec.decode(data)?;

            let names: IndexSet<_> = properties.iter().map(|p| &p.name).collect();
            feature.properties.retain(|p| !names.contains(&p.name));
            feature.properties.extend(
                properties
                    .iter()
                    .filter(|p| !p.value.is_null())
                    .cloned(),
            );

            let envelope = self.envelope(&feature)?;
            let data = self.codec.encode(&feature)?;
            self.exec(
                conn,
                &update::objects_update(schema, object_id.clone(), data, envelope),
            )
            .await?;

            object_id
        } else {
            match analysis.kernel {
                IdKernel::Integer(v) => Value::I64(v),
                IdKernel::Uuid(v) => Value::Uuid(v),
            }
        };

        if schema.has_relational() {
            let plan = UpdateBuilder::new(mapping, self.transform.as_ref()).build(key, properties)?;
            for statement in &plan.statements {
                self.exec(conn, statement).await?;
            }
            for row in plan.inserts {
                self.insert_tree(conn, row, None).await?;
            }
        }

        debug!(id, properties = properties.len(), "updated feature");
        self.refresh_extents(conn, [&mapping.name]).await
    }
}
