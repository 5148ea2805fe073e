use super::Feature;
use crate::Result;

use std::fmt::Debug;

/// Encodes whole features into the payload stored in the objects table.
pub trait FeatureCodec: Debug + Send + Sync + 'static {
    fn encode(&self, feature: &Feature) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Feature>;
}

/// Stores features as JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl FeatureCodec for JsonCodec {
    fn encode(&self, feature: &Feature) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(feature)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Feature> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{ComplexValue, Geometry, PrimitiveValue, Property, Value};
    use crate::schema::app::Crs;
    use crate::schema::QName;

    #[test]
    fn json_payload() {
        let ns = "http://example.org/app";
        let feature = Feature::new(QName::new(ns, "Building"))
            .with_id("BUILDING_1")
            .with_property(QName::new(ns, "name"), "Town hall")
            .with_property(
                QName::new(ns, "position"),
                Geometry::point(Crs::epsg(4326), 7.0, 51.0),
            )
            .with_property(
                QName::new(ns, "address"),
                ComplexValue {
                    attributes: vec![],
                    text: None,
                    children: vec![Property {
                        name: QName::new(ns, "street"),
                        value: Value::Primitive(PrimitiveValue::String("Main St".into())),
                    }],
                },
            );

        let bytes = JsonCodec.encode(&feature).unwrap();
        assert_eq!(JsonCodec.decode(&bytes).unwrap(), feature);
        assert!(JsonCodec.decode(b"{").unwrap_err().is_codec());
    }
}
