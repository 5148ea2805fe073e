pub mod driver;
pub use driver::{Connection, Driver};

mod error;
pub use error::{Error, IntoError};

pub mod feature;
pub use feature::Feature;

pub mod schema;

pub mod stmt;

pub use async_trait::async_trait;

pub type Result<T, E = Error> = core::result::Result<T, E>;
