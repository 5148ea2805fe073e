mod blob;
pub use blob::{BBoxTableMapping, BlobMapping};

mod feature_type;
pub use feature_type::{FeatureTypeMapping, PropertyLookup};

mod fid;
pub use fid::{FidMapping, IdGenerator};

mod join;
pub use join::{DbField, JoinChain, JoinStep};

mod node;
pub use node::{
    CodeMapping, ColumnRef, CompoundMapping, FeatureReferenceMapping, GeometryMapping, Mapping,
    MappingKind, PrimitiveMapping,
};

mod path;
pub use path::{PathStep, ValuePath};

/// Name of the key column every child table carries.
pub const CHILD_KEY_COLUMN: &str = "id";

/// Name of the foreign key column pointing from a child table back to its
/// parent row.
pub const PARENT_FK_COLUMN: &str = "parentfk";
