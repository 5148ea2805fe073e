//! Connection pooling for database connections.

use std::ops::{Deref, DerefMut};

use gmlstore_core::{
    driver::{Capability, Driver},
    Connection, Error, Result,
};

use crate::config::PoolConfig;

/// A connection pool that manages database connections.
#[derive(Debug)]
pub struct Pool {
    inner: deadpool::managed::Pool<Manager>,
    capability: Capability,
}

impl Pool {
    /// Creates a new connection pool from the given driver.
    pub fn new(driver: Box<dyn Driver>, config: &PoolConfig) -> Result<Self> {
        let capability = driver.capability().clone();

        let inner = deadpool::managed::Pool::builder(Manager { driver })
            .runtime(deadpool::Runtime::Tokio1)
            .max_size(config.max_size)
            .build()
            .map_err(Error::connection_pool)?;

        Ok(Self { inner, capability })
    }

    /// Retrieves a connection from the pool.
    pub async fn get(&self) -> Result<PoolConnection> {
        let connection = self.inner.get().await.map_err(Error::connection_pool)?;
        Ok(PoolConnection { inner: connection })
    }

    /// Returns the database driver's capabilities.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }
}

#[derive(Debug)]
struct Manager {
    driver: Box<dyn Driver>,
}

impl deadpool::managed::Manager for Manager {
    type Type = Box<dyn Connection>;
    type Error = Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.driver.connect().await
    }

    async fn recycle(
        &self,
        _obj: &mut Self::Type,
        _metrics: &deadpool::managed::Metrics,
    ) -> deadpool::managed::RecycleResult<Self::Error> {
        Ok(())
    }
}

/// A connection retrieved from a pool.
///
/// When dropped, the connection is returned to the pool for reuse.
#[derive(Debug)]
pub struct PoolConnection {
    inner: deadpool::managed::Object<Manager>,
}

impl Deref for PoolConnection {
    type Target = Box<dyn Connection>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PoolConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
