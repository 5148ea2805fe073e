use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// SRID used when the spatial reference of a geometry column is unknown.
pub const UNDEFINED_SRID: i32 = -1;

/// Geometry kinds, as far as the storage layer distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryType {
    Geometry,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    MultiGeometry,
}

impl GeometryType {
    /// Maps a PostGIS geometry type name (as listed in `geometry_columns`) to
    /// a geometry type. Returns `None` for names this catalog does not know.
    pub fn from_postgis(name: &str) -> Option<GeometryType> {
        let ty = match name.to_ascii_uppercase().as_str() {
            "GEOMETRY" => GeometryType::Geometry,
            "POINT" => GeometryType::Point,
            "LINESTRING" => GeometryType::LineString,
            "POLYGON" => GeometryType::Polygon,
            "MULTIPOINT" => GeometryType::MultiPoint,
            "MULTILINESTRING" => GeometryType::MultiLineString,
            "MULTIPOLYGON" => GeometryType::MultiPolygon,
            "GEOMETRYCOLLECTION" => GeometryType::MultiGeometry,
            _ => return None,
        };
        Some(ty)
    }

    /// The PostGIS type name used in column definitions.
    pub fn postgis_name(self) -> &'static str {
        match self {
            GeometryType::Geometry => "GEOMETRY",
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::MultiGeometry => "GEOMETRYCOLLECTION",
        }
    }

    /// Maps a GML geometry element local name (e.g. `Polygon`,
    /// `MultiSurface`) to a geometry type.
    pub fn from_gml(local: &str) -> GeometryType {
        match local {
            "Point" => GeometryType::Point,
            "LineString" | "Curve" | "CompositeCurve" => GeometryType::LineString,
            "Polygon" | "Surface" | "CompositeSurface" => GeometryType::Polygon,
            "MultiPoint" => GeometryType::MultiPoint,
            "MultiLineString" | "MultiCurve" => GeometryType::MultiLineString,
            "MultiPolygon" | "MultiSurface" => GeometryType::MultiPolygon,
            "MultiGeometry" => GeometryType::MultiGeometry,
            _ => GeometryType::Geometry,
        }
    }
}

impl FromStr for GeometryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "geometry" => GeometryType::Geometry,
            "point" => GeometryType::Point,
            "line-string" => GeometryType::LineString,
            "polygon" => GeometryType::Polygon,
            "multi-point" => GeometryType::MultiPoint,
            "multi-line-string" => GeometryType::MultiLineString,
            "multi-polygon" => GeometryType::MultiPolygon,
            "multi-geometry" => GeometryType::MultiGeometry,
            _ => {
                return GeometryType::from_postgis(s)
                    .ok_or_else(|| format!("unknown geometry type `{s}`"))
            }
        };
        Ok(ty)
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.postgis_name())
    }
}

/// Number of coordinate components stored per vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateDimension {
    #[default]
    #[serde(rename = "2d")]
    Dim2,
    #[serde(rename = "3d")]
    Dim3,
}

impl CoordinateDimension {
    pub fn from_count(n: i32) -> CoordinateDimension {
        if n == 3 {
            CoordinateDimension::Dim3
        } else {
            CoordinateDimension::Dim2
        }
    }

    pub fn count(self) -> i32 {
        match self {
            CoordinateDimension::Dim2 => 2,
            CoordinateDimension::Dim3 => 3,
        }
    }
}

/// A coordinate reference system identifier such as `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(pub String);

impl Crs {
    pub fn new(code: impl Into<String>) -> Crs {
        Crs(code.into())
    }

    pub fn epsg(code: i32) -> Crs {
        Crs(format!("EPSG:{code}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The EPSG code, for identifiers of the form `EPSG:<code>`,
    /// `urn:ogc:def:crs:EPSG::<code>` or `http://www.opengis.net/def/crs/EPSG/0/<code>`.
    pub fn epsg_code(&self) -> Option<i32> {
        let s = self.0.trim();
        let upper = s.to_ascii_uppercase();
        if !upper.contains("EPSG") {
            return None;
        }
        let code = s.rsplit([':', '/']).next()?;
        code.parse().ok()
    }

    /// Two identifiers denote the same CRS if their EPSG codes match, or if
    /// they are textually equal.
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg_code(), other.epsg_code()) {
            (Some(a), Some(b)) => a == b,
            _ => self.0 == other.0,
        }
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::epsg(4326)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
