pub mod app;

mod builder;
pub use builder::Builder;

pub mod config;
pub use config::MappingConfig;

pub mod db;

mod introspect;
pub use introspect::Introspector;

mod mapped;
pub use mapped::{Diagnostic, DiagnosticKind, IdAnalysis, IdKernel, MappedSchema, StorageMode};

pub mod mapping;

mod name;
pub use name::{QName, GMD_NS, GML32_NS, GML_NS, XLINK_NS};

pub mod naming;
