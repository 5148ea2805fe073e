mod codec;
pub use codec::{FeatureCodec, JsonCodec};

mod geometry;
pub use geometry::{Envelope, Geometry};

mod transform;
pub use transform::{CoordinateTransform, NoTransform};

mod value;
pub use value::{Attribute, ComplexValue, PrimitiveValue, Property, Value};

pub mod wkb;

use crate::schema::QName;

use serde::{Deserialize, Serialize};

/// A feature instance: a typed, identified bag of properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub ty: QName,

    /// External feature id. Unset for features that have not been stored
    /// yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Property values in document order. Multi-valued properties repeat.
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Feature {
    pub fn new(ty: QName) -> Feature {
        Feature {
            ty,
            id: None,
            properties: vec![],
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Feature {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, name: QName, value: impl Into<Value>) -> Feature {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: QName, value: impl Into<Value>) {
        self.properties.push(Property {
            name,
            value: value.into(),
        });
    }

    /// Values of a property, in document order.
    pub fn values<'a>(&'a self, name: &'a QName) -> impl Iterator<Item = &'a Value> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name == *name)
            .map(|p| &p.value)
    }

    /// Bounding box of every geometry anywhere in the feature.
    pub fn envelope(&self) -> crate::Result<Option<Envelope>> {
        let mut envelope: Option<Envelope> = None;
        for property in &self.properties {
            property.value.visit_geometries(&mut |geometry| {
                let e = geometry.envelope()?;
                envelope = Some(match envelope.take() {
                    Some(acc) => acc.merge(&e),
                    None => e,
                });
                Ok(())
            })?;
        }
        Ok(envelope)
    }
}
