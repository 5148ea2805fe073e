mod complex_type;
pub use complex_type::{AttributeDecl, ComplexType, Particle, Term};

mod element;
pub use element::ElementDecl;

mod feature_type;
pub use feature_type::{FeatureType, MaxOccurs, PropertyType};

mod geometry;
pub use geometry::{CoordinateDimension, Crs, GeometryType, UNDEFINED_SRID};

mod primitive;
pub use primitive::PrimitiveType;

mod schema;
pub use schema::Schema;

mod ty;
pub use ty::TypeRef;
