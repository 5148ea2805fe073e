use crate::{
    engine::{IdGen, Query},
    pool::PoolConnection,
    FeatureStore,
};

use gmlstore_core::{
    feature::{Envelope, Feature, Property},
    schema::QName,
    Connection, Error, Result,
};

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// A logical session: one pooled connection, at most one active
/// transaction.
///
/// While a transaction is active the session's connection belongs to it;
/// beginning another one, or reading through the session, fails with
/// [`Error::is_transaction_active`] until the transaction is committed or
/// rolled back.
#[derive(Debug)]
pub struct Session {
    store: FeatureStore,
    connection: Arc<Mutex<PoolConnection>>,
}

/// An open transaction. Changes are visible to other sessions once
/// committed. Dropping an open transaction rolls it back in the background.
#[derive(Debug)]
pub struct Transaction {
    store: FeatureStore,
    connection: Option<OwnedMutexGuard<PoolConnection>>,
}

impl Session {
    pub(crate) fn new(store: FeatureStore, connection: PoolConnection) -> Session {
        Session {
            store,
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    /// Starts a transaction. Fails if one is already active.
    pub async fn begin(&self) -> Result<Transaction> {
        let mut connection = self
            .connection
            .clone()
            .try_lock_owned()
            .map_err(|_| Error::transaction_active())?;

        connection.begin().await?;
        debug!("transaction started");

        Ok(Transaction {
            store: self.store.clone(),
            connection: Some(connection),
        })
    }

    pub async fn query(&self, feature_type: &QName, query: &Query) -> Result<Vec<Feature>> {
        let mut connection = self
            .connection
            .try_lock()
            .map_err(|_| Error::transaction_active())?;
        self.store
            .engine()
            .query(&mut ***connection, feature_type, query)
            .await
    }

    pub async fn query_types(&self, types: &[QName], bbox: &Envelope) -> Result<Vec<Feature>> {
        let mut connection = self
            .connection
            .try_lock()
            .map_err(|_| Error::transaction_active())?;
        self.store
            .engine()
            .query_types(&mut ***connection, types, bbox)
            .await
    }
}

impl Transaction {
    /// Stores `features`, returning their external ids in input order.
    pub async fn insert(&mut self, features: &[Feature], id_gen: IdGen) -> Result<Vec<String>> {
        let conn = connection(&mut self.connection)?;
        self.store.engine().insert(conn, features, id_gen).await
    }

    /// Replaces the values of the listed properties of feature `id`.
    pub async fn update(&mut self, id: &str, properties: &[Property]) -> Result<()> {
        let conn = connection(&mut self.connection)?;
        self.store.engine().update(conn, id, properties).await
    }

    /// Deletes features by id, returning the number of deleted features.
    pub async fn delete(&mut self, ids: &[String]) -> Result<u64> {
        let conn = connection(&mut self.connection)?;
        self.store.engine().delete(conn, ids).await
    }

    /// Reads features, including the changes of this transaction.
    pub async fn query(&mut self, feature_type: &QName, query: &Query) -> Result<Vec<Feature>> {
        let conn = connection(&mut self.connection)?;
        self.store.engine().query(conn, feature_type, query).await
    }

    pub async fn query_types(&mut self, types: &[QName], bbox: &Envelope) -> Result<Vec<Feature>> {
        let conn = connection(&mut self.connection)?;
        self.store.engine().query_types(conn, types, bbox).await
    }

    pub async fn commit(mut self) -> Result<()> {
        connection(&mut self.connection)?.commit().await?;
        self.connection = None;
        debug!("transaction committed");
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        // A failed rollback is not retried on drop.
        let result = connection(&mut self.connection)?.rollback().await;
        self.connection = None;
        result?;
        debug!("transaction rolled back");
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        warn!("transaction dropped while active; rolling back");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = connection.rollback().await {
                        warn!(error = %err, "rollback of a dropped transaction failed");
                    }
                });
            }
            Err(_) => warn!("no runtime to roll back on; the connection is discarded"),
        }
    }
}

fn connection(
    connection: &mut Option<OwnedMutexGuard<PoolConnection>>,
) -> Result<&mut dyn Connection> {
    match connection.as_deref_mut() {
        Some(connection) => Ok(&mut ***connection),
        None => Err(Error::invalid_result("transaction is already finished")),
    }
}
