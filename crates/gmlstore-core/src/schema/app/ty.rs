use super::{CoordinateDimension, GeometryType, PrimitiveType};
use crate::schema::QName;

use serde::{Deserialize, Serialize};

/// The value type of a property or of a child element inside a complex type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeRef {
    /// A simple value.
    Primitive { ty: PrimitiveType },

    /// A geometry value.
    Geometry {
        ty: GeometryType,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        dim: Option<CoordinateDimension>,
    },

    /// An `xlink:href` reference to another feature, optionally constrained
    /// to a target feature type.
    FeatureReference {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<QName>,
    },

    /// A `gml:CodeType` value: text plus a `codeSpace` attribute.
    Code,

    /// A named complex type, expanded from the schema's type declarations.
    Complex { name: QName },
}

impl TypeRef {
    pub fn primitive(ty: PrimitiveType) -> TypeRef {
        TypeRef::Primitive { ty }
    }

    pub fn geometry(ty: GeometryType) -> TypeRef {
        TypeRef::Geometry { ty, dim: None }
    }

    pub fn complex(name: QName) -> TypeRef {
        TypeRef::Complex { name }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, TypeRef::Complex { .. })
    }

    pub fn complex_name(&self) -> Option<&QName> {
        match self {
            TypeRef::Complex { name } => Some(name),
            _ => None,
        }
    }
}
