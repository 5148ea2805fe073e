use crate::{
    config::StoreConfig,
    engine::{Engine, IdGen, Query},
    pool::Pool,
    session::Session,
};

use gmlstore_core::{
    driver::{Capability, Driver},
    feature::{CoordinateTransform, Envelope, Feature, FeatureCodec, JsonCodec, NoTransform, Property},
    schema::{IdAnalysis, MappedSchema, QName},
    Error, Result,
};
use gmlstore_sql::Serializer;

use std::sync::Arc;
use tracing::{info, warn};

/// Stores and reads features of a mapped application schema.
///
/// Cloning is cheap; clones share the connection pool. Every read borrows a
/// pooled connection for its duration. Writes go through a
/// [`Transaction`](crate::Transaction) of a [`Session`]; the `insert`,
/// `update` and `delete` shortcuts run one transaction each.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    engine: Engine,
    pool: Pool,
}

/// Configures a [`FeatureStore`].
#[derive(Debug)]
pub struct Builder {
    schema: MappedSchema,
    codec: Arc<dyn FeatureCodec>,
    transform: Arc<dyn CoordinateTransform>,
    config: StoreConfig,
}

impl Builder {
    /// Payload codec of the objects table. Defaults to [`JsonCodec`].
    pub fn codec(mut self, codec: impl FeatureCodec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Reprojection into the storage CRS. Defaults to [`NoTransform`].
    pub fn transform(mut self, transform: impl CoordinateTransform) -> Self {
        self.transform = Arc::new(transform);
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the store on top of an already opened driver.
    pub fn build(self, driver: impl Driver) -> Result<FeatureStore> {
        self.build_boxed(Box::new(driver))
    }

    /// Opens the driver for the configured URL and creates the store.
    pub async fn connect(self) -> Result<FeatureStore> {
        let url = self
            .config
            .url
            .clone()
            .ok_or_else(|| Error::invalid_mapping_config("no connection URL configured"))?;
        let driver = crate::connect::driver_for(&url).await?;
        self.build_boxed(driver)
    }

    fn build_boxed(self, driver: Box<dyn Driver>) -> Result<FeatureStore> {
        let serializer = Serializer::for_capability(driver.capability());
        let pool = Pool::new(driver, &self.config.pool)?;

        info!(
            mode = ?self.schema.mode,
            feature_types = self.schema.feature_types.len(),
            legacy_postgis = pool.capability().legacy_postgis,
            "feature store ready"
        );

        let engine = Engine {
            schema: Arc::new(self.schema),
            serializer,
            codec: self.codec,
            transform: self.transform,
            id_filter_threshold: self.config.id_filter_threshold,
        };

        Ok(FeatureStore {
            shared: Arc::new(Shared { engine, pool }),
        })
    }
}

impl FeatureStore {
    pub fn builder(schema: MappedSchema) -> Builder {
        Builder {
            schema,
            codec: Arc::new(JsonCodec),
            transform: Arc::new(NoTransform),
            config: StoreConfig::default(),
        }
    }

    pub fn schema(&self) -> &MappedSchema {
        &self.shared.engine.schema
    }

    pub fn capability(&self) -> &Capability {
        self.shared.pool.capability()
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.shared.engine
    }

    /// The DDL creating every table of the schema, in execution order.
    pub fn ddl(&self) -> Vec<String> {
        let engine = self.engine();
        gmlstore_sql::ddl::generate(&engine.schema, &engine.serializer)
    }

    /// Executes [`FeatureStore::ddl`], statement by statement.
    pub async fn create_tables(&self) -> Result<()> {
        let mut conn = self.shared.pool.get().await?;
        self.engine().create_tables(&mut **conn).await
    }

    /// Starts a session on a connection of its own.
    pub async fn session(&self) -> Result<Session> {
        let connection = self.shared.pool.get().await?;
        Ok(Session::new(self.clone(), connection))
    }

    /// Splits an external feature id into feature type and kernel.
    pub fn analyze_id(&self, id: &str) -> Result<IdAnalysis<'_>> {
        self.schema().analyze_id(id)
    }

    /// Reads the features of one type matching `query`.
    pub async fn query(&self, feature_type: &QName, query: &Query) -> Result<Vec<Feature>> {
        let mut conn = self.shared.pool.get().await?;
        self.engine().query(&mut **conn, feature_type, query).await
    }

    /// Reads the features of several types overlapping `bbox` with one
    /// query, in the order of `types`.
    pub async fn query_types(&self, types: &[QName], bbox: &Envelope) -> Result<Vec<Feature>> {
        let mut conn = self.shared.pool.get().await?;
        self.engine().query_types(&mut **conn, types, bbox).await
    }

    /// Inserts `features` in a transaction of their own.
    pub async fn insert(&self, features: &[Feature], id_gen: IdGen) -> Result<Vec<String>> {
        let session = self.session().await?;
        let mut tx = session.begin().await?;
        match tx.insert(features, id_gen).await {
            Ok(ids) => {
                tx.commit().await?;
                Ok(ids)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback after a failed write failed");
                }
                Err(err)
            }
        }
    }

    /// Replaces property values of one feature in a transaction of its own.
    pub async fn update(&self, id: &str, properties: &[Property]) -> Result<()> {
        let session = self.session().await?;
        let mut tx = session.begin().await?;
        match tx.update(id, properties).await {
            Ok(()) => tx.commit().await,
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback after a failed write failed");
                }
                Err(err)
            }
        }
    }

    /// Deletes features by id in a transaction of its own.
    pub async fn delete(&self, ids: &[String]) -> Result<u64> {
        let session = self.session().await?;
        let mut tx = session.begin().await?;
        match tx.delete(ids).await {
            Ok(count) => {
                tx.commit().await?;
                Ok(count)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback after a failed write failed");
                }
                Err(err)
            }
        }
    }
}
