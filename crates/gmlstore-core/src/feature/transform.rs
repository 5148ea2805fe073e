use super::Geometry;
use crate::schema::app::Crs;
use crate::{Error, Result};

use std::fmt::Debug;

/// Reprojects geometries into the storage CRS before they are written.
pub trait CoordinateTransform: Debug + Send + Sync + 'static {
    fn transform(&self, geometry: &Geometry, target: &Crs) -> Result<Geometry>;
}

/// Accepts geometries already in the target CRS and rejects all others.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransform;

impl CoordinateTransform for NoTransform {
    fn transform(&self, geometry: &Geometry, target: &Crs) -> Result<Geometry> {
        if geometry.crs.same_as(target) {
            return Ok(geometry.clone());
        }
        Err(Error::transform_failed(
            geometry.crs.as_str(),
            target.as_str(),
            "no coordinate transformation is configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_crs_passes_through() {
        let geometry = Geometry::point(Crs::new("urn:ogc:def:crs:EPSG::4326"), 1.0, 2.0);
        let out = NoTransform.transform(&geometry, &Crs::epsg(4326)).unwrap();
        assert_eq!(out, geometry);
    }

    #[test]
    fn other_crs_fails() {
        let geometry = Geometry::point(Crs::epsg(25832), 1.0, 2.0);
        let err = NoTransform.transform(&geometry, &Crs::epsg(4326)).unwrap_err();
        assert!(err.is_transform_failed());
    }
}
