use super::TypeRef;
use crate::schema::QName;

use serde::{Deserialize, Serialize};

/// A global element declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDecl {
    pub name: QName,

    #[serde(rename = "type")]
    pub ty: TypeRef,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    /// Head of the substitution group this element belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_group: Option<QName>,
}

impl ElementDecl {
    pub fn new(name: QName, ty: TypeRef) -> ElementDecl {
        ElementDecl {
            name,
            ty,
            is_abstract: false,
            substitution_group: None,
        }
    }

    pub fn substitutes(mut self, head: QName) -> ElementDecl {
        self.substitution_group = Some(head);
        self
    }

    pub fn abstract_(mut self) -> ElementDecl {
        self.is_abstract = true;
        self
    }
}
