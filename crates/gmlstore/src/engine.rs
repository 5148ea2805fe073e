//! Executes feature operations over one connection.
//!
//! The engine owns everything an operation needs besides the connection: the
//! mapped schema, the SQL serializer matching the database, the payload codec
//! and the coordinate transform. It is shared by every session of a store.

mod delete;
mod insert;
pub use insert::IdGen;

mod query;
pub use query::Query;

mod update;

use gmlstore_core::{
    feature::{CoordinateTransform, Envelope, Feature, FeatureCodec},
    schema::MappedSchema,
    stmt::{Row, Value},
    Connection, Error, Result,
};
use gmlstore_sql::{Serializer, Statement};

use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub(crate) struct Engine {
    pub(crate) schema: Arc<MappedSchema>,
    pub(crate) serializer: Serializer,
    pub(crate) codec: Arc<dyn FeatureCodec>,
    pub(crate) transform: Arc<dyn CoordinateTransform>,
    pub(crate) id_filter_threshold: usize,
}

impl Engine {
    /// Creates every table of the schema.
    pub(crate) async fn create_tables(&self, conn: &mut dyn Connection) -> Result<()> {
        for sql in gmlstore_sql::ddl::generate(&self.schema, &self.serializer) {
            debug!(sql = %sql, "executing DDL");
            conn.execute(&sql, &[]).await?;
        }
        Ok(())
    }

    pub(crate) async fn exec(&self, conn: &mut dyn Connection, stmt: &Statement) -> Result<u64> {
        let mut params = vec![];
        let sql = self.serializer.serialize(stmt, &mut params);
        debug!(sql = %sql, params = params.len(), "executing statement");
        conn.execute(&sql, &params).await
    }

    pub(crate) async fn query_rows(
        &self,
        conn: &mut dyn Connection,
        stmt: &Statement,
    ) -> Result<Vec<Row>> {
        let mut params = vec![];
        let sql = self.serializer.serialize(stmt, &mut params);
        debug!(sql = %sql, params = params.len(), "executing query");
        conn.query(&sql, &params).await
    }

    /// Executes the statements built by `build` for every value of `batch`
    /// as one batch. The statements must only differ in their parameters.
    pub(crate) async fn exec_batch(
        &self,
        conn: &mut dyn Connection,
        batch: Vec<Value>,
        build: impl Fn(Value) -> Statement,
    ) -> Result<u64> {
        let mut sql = None;
        let mut params = Vec::with_capacity(batch.len());

        for value in batch {
            let mut row = vec![];
            let text = self.serializer.serialize(&build(value), &mut row);
            sql.get_or_insert(text);
            params.push(row);
        }

        let Some(sql) = sql else {
            return Ok(0);
        };

        debug!(sql = %sql, rows = params.len(), "executing batch");
        conn.execute_batch(&sql, &params).await
    }

    /// Draws one integer from a `SELECT nextval(..)` statement.
    async fn next_value(&self, conn: &mut dyn Connection, stmt: &Statement) -> Result<i64> {
        let rows = self.query_rows(conn, stmt).await?;
        let row = rows
            .first()
            .ok_or_else(|| Error::invalid_result("sequence returned no row"))?;
        row.get(0)?.to_i64()
    }

    /// Bounding box of every geometry of `feature`, in the storage CRS.
    fn envelope(&self, feature: &Feature) -> Result<Option<Envelope>> {
        let target = &self.schema.storage_crs;
        let mut envelope: Option<Envelope> = None;

        for property in &feature.properties {
            property.value.visit_geometries(&mut |geometry| {
                let e = if geometry.crs.same_as(target) {
                    geometry.envelope()?
                } else {
                    self.transform.transform(geometry, target)?.envelope()?
                };
                envelope = Some(match envelope.take() {
                    Some(acc) => acc.merge(&e),
                    None => e,
                });
                Ok(())
            })?;
        }

        Ok(envelope)
    }

    /// Recomputes the registry extents of the given feature types. Types
    /// without anything to compute an extent from are skipped.
    async fn refresh_extents<'a>(
        &self,
        conn: &mut dyn Connection,
        types: impl IntoIterator<Item = &'a gmlstore_core::schema::QName>,
    ) -> Result<()> {
        for name in types {
            let Some(mapping) = self.schema.feature_type(name) else {
                continue;
            };

            match gmlstore_sql::update::refresh_extent(&self.schema, mapping) {
                Ok(stmt) => {
                    self.exec(conn, &stmt).await?;
                }
                Err(err) if err.is_unsupported_feature() => {
                    debug!(feature_type = %name, "no extent to maintain");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
