//! Minimal well-known binary support: enough to compute envelopes and to
//! write the polygons stored as bounding boxes.

use super::Envelope;
use crate::schema::app::{CoordinateDimension, GeometryType};
use crate::{Error, Result};

use std::fmt;

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

#[derive(Debug)]
struct WkbError(String);

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    little_endian: bool,
}

struct Header {
    ty: u32,
    dims: usize,
}

/// Bounding box of a WKB or EWKB geometry. Fails for empty geometries.
pub fn envelope(bytes: &[u8]) -> Result<Envelope> {
    let mut reader = Reader::new(bytes);
    let mut envelope: Option<Envelope> = None;
    reader.geometry(&mut |x, y| {
        envelope = Some(match envelope {
            Some(mut acc) => {
                acc.expand(x, y);
                acc
            }
            None => Envelope::point(x, y),
        });
    })?;
    envelope.ok_or_else(|| Error::codec(WkbError("empty geometry has no envelope".into())))
}

/// Geometry type and coordinate dimension of a WKB geometry.
pub fn geometry_type(bytes: &[u8]) -> Result<(GeometryType, CoordinateDimension)> {
    let mut reader = Reader::new(bytes);
    let header = reader.header()?;
    let ty = match header.ty {
        1 => GeometryType::Point,
        2 => GeometryType::LineString,
        3 => GeometryType::Polygon,
        4 => GeometryType::MultiPoint,
        5 => GeometryType::MultiLineString,
        6 => GeometryType::MultiPolygon,
        7 => GeometryType::MultiGeometry,
        other => return Err(unsupported(other)),
    };
    let dim = if header.dims >= 3 {
        CoordinateDimension::Dim3
    } else {
        CoordinateDimension::Dim2
    };
    Ok((ty, dim))
}

pub fn point(x: f64, y: f64) -> Vec<u8> {
    let mut out = header(1);
    push_coord(&mut out, x, y);
    out
}

pub fn line_string(points: &[(f64, f64)]) -> Vec<u8> {
    let mut out = header(2);
    push_points(&mut out, points);
    out
}

pub fn polygon(rings: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let mut out = header(3);
    push_len(&mut out, rings.len());
    for ring in rings {
        push_points(&mut out, ring);
    }
    out
}

fn header(ty: u32) -> Vec<u8> {
    let mut out = vec![1];
    out.extend_from_slice(&ty.to_le_bytes());
    out
}

fn push_len(out: &mut Vec<u8>, len: usize) {
    // Counts beyond u32 cannot be encoded; callers pass in-memory geometries.
    out.extend_from_slice(&(len as u32).to_le_bytes());
}

fn push_points(out: &mut Vec<u8>, points: &[(f64, f64)]) {
    push_len(out, points.len());
    for (x, y) in points {
        push_coord(out, *x, *y);
    }
}

fn push_coord(out: &mut Vec<u8>, x: f64, y: f64) {
    out.extend_from_slice(&x.to_le_bytes());
    out.extend_from_slice(&y.to_le_bytes());
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader {
            buf,
            pos: 0,
            little_endian: true,
        }
    }

    fn header(&mut self) -> Result<Header> {
        self.little_endian = match self.u8()? {
            0 => false,
            1 => true,
            other => {
                return Err(Error::codec(WkbError(format!(
                    "invalid byte order marker {other}"
                ))))
            }
        };

        let raw = self.u32()?;
        let mut dims = 2;
        if raw & EWKB_Z != 0 {
            dims += 1;
        }
        if raw & EWKB_M != 0 {
            dims += 1;
        }
        if raw & EWKB_SRID != 0 {
            self.u32()?;
        }

        // ISO WKB encodes Z, M and ZM as +1000, +2000 and +3000.
        let code = raw & 0x0FFF_FFFF;
        dims += match code / 1000 {
            1 | 2 => 1,
            3 => 2,
            _ => 0,
        };

        Ok(Header {
            ty: code % 1000,
            dims,
        })
    }

    fn geometry(&mut self, visit: &mut impl FnMut(f64, f64)) -> Result<()> {
        let header = self.header()?;
        match header.ty {
            1 => {
                let (x, y) = self.coord(header.dims)?;
                // An empty point is encoded with NaN coordinates.
                if !x.is_nan() && !y.is_nan() {
                    visit(x, y);
                }
            }
            2 => self.points(header.dims, visit)?,
            3 => {
                for _ in 0..self.len()? {
                    self.points(header.dims, visit)?;
                }
            }
            4..=7 => {
                for _ in 0..self.len()? {
                    self.geometry(visit)?;
                }
            }
            other => return Err(unsupported(other)),
        }
        Ok(())
    }

    fn points(&mut self, dims: usize, visit: &mut impl FnMut(f64, f64)) -> Result<()> {
        for _ in 0..self.len()? {
            let (x, y) = self.coord(dims)?;
            visit(x, y);
        }
        Ok(())
    }

    fn coord(&mut self, dims: usize) -> Result<(f64, f64)> {
        let x = self.f64()?;
        let y = self.f64()?;
        for _ in 2..dims {
            self.f64()?;
        }
        Ok((x, y))
    }

    fn len(&mut self) -> Result<usize> {
        let len = self.u32()? as usize;
        // Every element takes at least 8 bytes; reject counts the remaining
        // input cannot hold before looping over them.
        if len > (self.buf.len() - self.pos) / 8 + 1 {
            return Err(truncated());
        }
        Ok(len)
    }

    fn u8(&mut self) -> Result<u8> {
        let b = *self.buf.get(self.pos).ok_or_else(truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self.take()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn f64(&mut self) -> Result<f64> {
        let bytes: [u8; 8] = self.take()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.buf.get(self.pos..self.pos + N).ok_or_else(truncated)?;
        self.pos += N;
        let mut out = [0; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}

fn truncated() -> Error {
    Error::codec(WkbError("truncated WKB".into()))
}

fn unsupported(code: u32) -> Error {
    Error::codec(WkbError(format!("unsupported WKB geometry type {code}")))
}

impl std::error::Error for WkbError {}

impl fmt::Display for WkbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_envelope() {
        let env = envelope(&point(7.5, 51.0)).unwrap();
        assert_eq!(env, Envelope::point(7.5, 51.0));
    }

    #[test]
    fn polygon_envelope() {
        let ring = vec![(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0), (0.0, 0.0)];
        let env = envelope(&polygon(&[ring])).unwrap();
        assert_eq!(env, Envelope::new(0.0, 0.0, 4.0, 3.0));
        assert_eq!(
            geometry_type(&polygon(&[])).unwrap(),
            (GeometryType::Polygon, CoordinateDimension::Dim2)
        );
    }

    #[test]
    fn big_endian_ewkb_point_z_with_srid() {
        let mut bytes = vec![0];
        bytes.extend_from_slice(&(1 | EWKB_Z | EWKB_SRID).to_be_bytes());
        bytes.extend_from_slice(&4326u32.to_be_bytes());
        for v in [1.0f64, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        assert_eq!(envelope(&bytes).unwrap(), Envelope::point(1.0, 2.0));
        assert_eq!(
            geometry_type(&bytes).unwrap(),
            (GeometryType::Point, CoordinateDimension::Dim3)
        );
    }

    #[test]
    fn multi_geometry() {
        let mut bytes = header(7);
        push_len(&mut bytes, 2);
        bytes.extend(point(-1.0, 5.0));
        bytes.extend(line_string(&[(2.0, 2.0), (3.0, -4.0)]));
        assert_eq!(envelope(&bytes).unwrap(), Envelope::new(-1.0, -4.0, 3.0, 5.0));
    }

    #[test]
    fn malformed_input() {
        assert!(envelope(&[]).unwrap_err().is_codec());
        assert!(envelope(&point(1.0, 2.0)[..10]).is_err());
        assert!(envelope(&polygon(&[])).is_err());
        assert!(envelope(&[1, 99, 0, 0, 0]).is_err());
    }

    #[test]
    fn envelope_polygon_round_trip() {
        let env = Envelope::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(envelope(&env.to_wkb()).unwrap(), env);
    }
}
