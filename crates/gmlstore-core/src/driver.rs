mod capability;
pub use capability::Capability;

use crate::{async_trait, schema::db::ColumnMetadata, stmt, Result};

use std::fmt::Debug;

#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Describes the connected database, which informs SQL generation.
    fn capability(&self) -> &Capability;

    /// Opens a new connection.
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// A single database session.
///
/// Every method is one round trip. Statements run in autocommit mode unless
/// a transaction was opened with [`Connection::begin`].
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Executes a statement, returning the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[stmt::Value]) -> Result<u64>;

    /// Executes a statement returning rows.
    async fn query(&mut self, sql: &str, params: &[stmt::Value]) -> Result<Vec<stmt::Row>>;

    /// Executes one statement once per parameter set. Fails as a whole if any
    /// execution fails; returns the total number of affected rows otherwise.
    async fn execute_batch(&mut self, sql: &str, batch: &[Vec<stmt::Value>]) -> Result<u64> {
        let mut count = 0;
        for params in batch {
            count += self.execute(sql, params).await?;
        }
        Ok(count)
    }

    /// Columns of an existing table, in table order. Empty if the table does
    /// not exist.
    async fn columns(&mut self, table: &str) -> Result<Vec<ColumnMetadata>>;

    /// The `geometry_columns` entry of a column, if there is one.
    async fn geometry_column(
        &mut self,
        table: &str,
        column: &str,
    ) -> Result<Option<GeometryRegistryEntry>>;

    async fn begin(&mut self) -> Result<()> {
        self.execute("BEGIN", &[]).await.map(|_| ())
    }

    async fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT", &[]).await.map(|_| ())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK", &[]).await.map(|_| ())
    }
}

/// A raw row of the `geometry_columns` registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryRegistryEntry {
    /// Geometry type name, e.g. `MULTIPOLYGON`.
    pub type_name: String,

    /// Coordinate dimension.
    pub dimension: i32,

    pub srid: i32,
}
