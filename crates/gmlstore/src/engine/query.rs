use super::Engine;

use gmlstore_core::{
    feature::{Envelope, Feature},
    schema::{db, mapping::FeatureTypeMapping, IdKernel, QName},
    stmt::Value,
    Connection, Error, Result,
};
use gmlstore_sql::{
    filter::{self, SortBy},
    query::MultiTypeQuery,
    Filter, QueryBuilder, Statement,
};

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// What to read of one feature type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,

    pub sort: Vec<SortBy>,

    /// Loose pre-filter on the feature envelope.
    pub bbox: Option<Envelope>,
}

impl Query {
    pub fn new() -> Query {
        Query::default()
    }

    pub fn filter(mut self, filter: Filter) -> Query {
        self.filter = Some(filter);
        self
    }

    pub fn sort_by(mut self, sort: SortBy) -> Query {
        self.sort.push(sort);
        self
    }

    pub fn bbox(mut self, envelope: Envelope) -> Query {
        self.bbox = Some(envelope);
        self
    }
}

/// An id list moved into a temporary table.
struct IdTable {
    name: String,
    ids: Vec<String>,
}

static NEXT_ID_TABLE: AtomicU64 = AtomicU64::new(1);

impl Engine {
    pub(crate) async fn query(
        &self,
        conn: &mut dyn Connection,
        feature_type: &QName,
        query: &Query,
    ) -> Result<Vec<Feature>> {
        let mapping = self.schema.feature_type(feature_type).ok_or_else(|| {
            Error::invalid_schema(format!("feature type {feature_type} is not mapped"))
        })?;

        let mut filter = query.filter.clone();
        let mut tables = vec![];
        if let Some(filter) = &mut filter {
            self.spill_ids(filter, &mut tables);
        }

        if tables.is_empty() {
            return self.run_query(conn, mapping, filter.as_ref(), query).await;
        }

        let result = self
            .query_with_id_tables(conn, mapping, &tables, filter.as_ref(), query)
            .await;

        for table in &tables {
            let drop = Statement::drop_table_if_exists(&table.name);
            if let Err(err) = self.exec(conn, &drop).await {
                warn!(table = %table.name, error = %err, "failed to drop id table");
            }
        }

        result
    }

    /// Reads features of several types overlapping `bbox`, ordered by the
    /// position of their type in `types`.
    pub(crate) async fn query_types(
        &self,
        conn: &mut dyn Connection,
        types: &[QName],
        bbox: &Envelope,
    ) -> Result<Vec<Feature>> {
        let query = MultiTypeQuery::build(&self.schema, types, bbox)?;
        let rows = self.query_rows(conn, &query.statement).await?;
        query.reconstruct(&rows, self.codec.as_ref())
    }

    async fn run_query(
        &self,
        conn: &mut dyn Connection,
        mapping: &FeatureTypeMapping,
        filter: Option<&Filter>,
        query: &Query,
    ) -> Result<Vec<Feature>> {
        let feature_query = QueryBuilder::new(&self.schema, mapping).build(
            filter,
            &query.sort,
            query.bbox.as_ref(),
        )?;
        let rows = self.query_rows(conn, &feature_query.statement).await?;
        debug!(feature_type = %mapping.name, rows = rows.len(), "read rows");
        feature_query.reconstruct(&rows, self.codec.as_ref())
    }

    async fn query_with_id_tables(
        &self,
        conn: &mut dyn Connection,
        mapping: &FeatureTypeMapping,
        tables: &[IdTable],
        filter: Option<&Filter>,
        query: &Query,
    ) -> Result<Vec<Feature>> {
        let ty = if self.schema.has_blob() {
            db::Type::Text
        } else {
            mapping.fid.ty.clone()
        };

        for table in tables {
            self.exec(conn, &filter::create_id_table(&table.name, ty.clone()))
                .await?;

            let values = self.id_values(mapping, &table.ids)?;
            self.exec_batch(conn, values, |id| filter::insert_id(&table.name, id))
                .await?;
        }

        self.run_query(conn, mapping, filter, query).await
    }

    /// Replaces id lists longer than the threshold with temporary tables.
    fn spill_ids(&self, filter: &mut Filter, tables: &mut Vec<IdTable>) {
        match filter {
            Filter::Ids(ids) if ids.len() > self.id_filter_threshold => {
                let name = format!(
                    "gmlstore_ids_{}",
                    NEXT_ID_TABLE.fetch_add(1, Ordering::Relaxed)
                );
                tables.push(IdTable {
                    name: name.clone(),
                    ids: std::mem::take(ids),
                });
                *filter = Filter::IdTable(name);
            }
            Filter::And(operands) | Filter::Or(operands) => {
                for operand in operands {
                    self.spill_ids(operand, tables);
                }
            }
            Filter::Not(operand) => self.spill_ids(operand, tables),
            _ => {}
        }
    }

    /// The id table contents for `ids`: the ids themselves where the objects
    /// table is queried, the kernels of this feature type's ids otherwise.
    fn id_values(&self, mapping: &FeatureTypeMapping, ids: &[String]) -> Result<Vec<Value>> {
        if self.schema.has_blob() {
            return Ok(ids.iter().map(|id| Value::from(id.as_str())).collect());
        }

        let mut values = vec![];
        for id in ids {
            let analysis = self.schema.analyze_id(id)?;
            if analysis.mapping.name != mapping.name {
                continue;
            }
            values.push(match analysis.kernel {
                IdKernel::Integer(v) => Value::I64(v),
                IdKernel::Uuid(v) => Value::Uuid(v),
            });
        }
        Ok(values)
    }
}
