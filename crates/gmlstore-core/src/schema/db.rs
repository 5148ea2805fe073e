mod column;
pub use column::{ColumnMetadata, GeometryColumn};

mod physical;
pub use physical::PhysicalSchema;

mod ty;
pub use ty::Type;
