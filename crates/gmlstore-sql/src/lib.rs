pub mod ddl;

pub mod filter;
pub use filter::Filter;

pub mod insert;
pub use insert::{InsertRow, InsertTreeBuilder};

pub mod query;
pub use query::{FeatureQuery, QueryBuilder};

pub mod serializer;
pub use serializer::{Params, Serializer};

pub mod stmt;
pub use stmt::Statement;

pub mod update;

mod value;
