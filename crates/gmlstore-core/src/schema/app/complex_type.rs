use super::{MaxOccurs, PrimitiveType};
use crate::schema::QName;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexType {
    pub name: QName,

    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,

    /// Type of the text content, for complex types with simple content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<PrimitiveType>,

    /// Child element particles, in declaration order.
    #[serde(default)]
    pub particles: Vec<Particle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: QName,

    #[serde(rename = "type")]
    pub ty: PrimitiveType,

    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub term: Term,

    #[serde(default = "one")]
    pub min_occurs: u32,

    #[serde(default)]
    pub max_occurs: MaxOccurs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Term {
    /// Reference to a global element declaration.
    Element { name: QName },

    /// An `xs:any` wildcard.
    Wildcard {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
    },
}

impl Particle {
    pub fn element(name: QName) -> Particle {
        Particle {
            term: Term::Element { name },
            min_occurs: 1,
            max_occurs: MaxOccurs::Bounded(1),
        }
    }

    pub fn wildcard() -> Particle {
        Particle {
            term: Term::Wildcard { namespace: None },
            min_occurs: 0,
            max_occurs: MaxOccurs::Unbounded,
        }
    }

    pub fn occurs(mut self, min: u32, max: MaxOccurs) -> Particle {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn is_multi(&self) -> bool {
        self.max_occurs.is_multi()
    }
}

fn one() -> u32 {
    1
}
