//! Stores GML features in PostGIS, in relational tables, as encoded
//! payloads, or both.
//!
//! A [`FeatureStore`] is built from a [`MappedSchema`] and a database
//! driver. Reads go through the store or a [`Session`]; writes run inside a
//! [`Transaction`].

mod config;
pub use config::{PoolConfig, StoreConfig};

mod connect;
pub use connect::driver_for;

mod engine;
pub use engine::{IdGen, Query};

mod pool;
pub use pool::{Pool, PoolConnection};

mod session;
pub use session::{Session, Transaction};

mod store;
pub use store::{Builder, FeatureStore};

pub use gmlstore_core::{
    feature::{Envelope, Property},
    schema::{MappedSchema, MappingConfig, QName, StorageMode},
    Error, Feature, Result,
};
pub use gmlstore_sql::{
    filter::{CompareOp, PropertyPath, SortBy},
    Filter,
};

#[cfg(feature = "postgresql")]
pub use gmlstore_driver_postgresql as postgresql;
