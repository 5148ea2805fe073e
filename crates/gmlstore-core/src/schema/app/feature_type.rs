use super::TypeRef;
use crate::schema::QName;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureType {
    pub name: QName,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    /// Property declarations, in document order.
    #[serde(default)]
    pub properties: Vec<PropertyType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyType {
    pub name: QName,

    #[serde(default = "one")]
    pub min_occurs: u32,

    #[serde(default)]
    pub max_occurs: MaxOccurs,

    #[serde(default)]
    pub nillable: bool,

    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// Upper bound on the occurrences of a property or particle.
///
/// Serialized as a number or the string `"unbounded"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl FeatureType {
    pub fn new(name: QName) -> FeatureType {
        FeatureType {
            name,
            is_abstract: false,
            properties: vec![],
        }
    }

    pub fn property(&self, name: &QName) -> Option<&PropertyType> {
        self.properties.iter().find(|p| p.name == *name)
    }

    pub fn with_property(mut self, property: PropertyType) -> FeatureType {
        self.properties.push(property);
        self
    }
}

impl PropertyType {
    pub fn new(name: QName, ty: TypeRef) -> PropertyType {
        PropertyType {
            name,
            min_occurs: 1,
            max_occurs: MaxOccurs::Bounded(1),
            nillable: false,
            ty,
        }
    }

    pub fn occurs(mut self, min: u32, max: MaxOccurs) -> PropertyType {
        self.min_occurs = min;
        self.max_occurs = max;
        self
    }

    pub fn is_multi(&self) -> bool {
        self.max_occurs.is_multi()
    }
}

impl MaxOccurs {
    pub fn is_multi(self) -> bool {
        match self {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

fn one() -> u32 {
    1
}

impl Serialize for MaxOccurs {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxOccurs::Bounded(n) => s.serialize_u32(*n),
            MaxOccurs::Unbounded => s.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for MaxOccurs {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u32),
            Text(String),
        }

        match Repr::deserialize(d)? {
            Repr::Number(n) => Ok(MaxOccurs::Bounded(n)),
            Repr::Text(s) if s == "unbounded" => Ok(MaxOccurs::Unbounded),
            Repr::Text(s) => s
                .parse()
                .map(MaxOccurs::Bounded)
                .map_err(|_| serde::de::Error::custom(format!("invalid maxOccurs `{s}`"))),
        }
    }
}
