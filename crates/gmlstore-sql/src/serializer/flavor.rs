use super::Serializer;

use gmlstore_core::driver::Capability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flavor {
    Postgis,

    /// PostGIS before 1.3: unprefixed function names and no typed geometry
    /// columns.
    PostgisLegacy,
}

impl Serializer {
    pub fn postgis() -> Serializer {
        Serializer {
            flavor: Flavor::Postgis,
        }
    }

    pub fn postgis_legacy() -> Serializer {
        Serializer {
            flavor: Flavor::PostgisLegacy,
        }
    }

    pub fn for_capability(capability: &Capability) -> Serializer {
        if capability.legacy_postgis {
            Serializer::postgis_legacy()
        } else {
            Serializer::postgis()
        }
    }

    /// True if geometry columns must be added with `AddGeometryColumn`.
    pub fn is_legacy(&self) -> bool {
        self.flavor == Flavor::PostgisLegacy
    }
}
