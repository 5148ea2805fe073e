use super::wkb;
use crate::schema::app::Crs;
use crate::Result;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A geometry in well-known binary form, tagged with its CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub crs: Crs,

    #[serde(serialize_with = "to_hex", deserialize_with = "from_hex")]
    pub wkb: Vec<u8>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Geometry {
    pub fn new(crs: Crs, wkb: Vec<u8>) -> Geometry {
        Geometry { crs, wkb }
    }

    pub fn point(crs: Crs, x: f64, y: f64) -> Geometry {
        Geometry::new(crs, wkb::point(x, y))
    }

    pub fn envelope(&self) -> Result<Envelope> {
        wkb::envelope(&self.wkb)
    }
}

impl Envelope {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Envelope {
        Envelope {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn point(x: f64, y: f64) -> Envelope {
        Envelope::new(x, y, x, y)
    }

    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn merge(&self, other: &Envelope) -> Envelope {
        Envelope {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// The envelope as a closed polygon ring.
    pub fn to_wkb(&self) -> Vec<u8> {
        wkb::polygon(&[vec![
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
        ]])
    }
}

fn to_hex<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    s.serialize_str(&out)
}

fn from_hex<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(d)?;
    if s.len() % 2 != 0 {
        return Err(serde::de::Error::custom("odd number of hex digits"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex at {i}")))
        })
        .collect()
}
