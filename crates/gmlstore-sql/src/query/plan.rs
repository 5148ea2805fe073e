use super::FeatureQuery;
use crate::value;

use gmlstore_core::{
    feature::{
        Attribute, ComplexValue, FeatureCodec, Geometry, PrimitiveValue, Property,
        Value as FeatureValue,
    },
    schema::{
        app::{Crs, PrimitiveType},
        mapping::{FeatureTypeMapping, Mapping, PathStep},
        QName,
    },
    stmt::Row,
    Error, Feature, Result,
};
use indexmap::IndexMap;

/// Where the parts of a feature sit in a result row.
#[derive(Debug)]
pub(super) struct ReadPlan<'a> {
    pub(super) mapping: &'a FeatureTypeMapping,

    /// Internal key; rows with equal keys belong to one feature.
    pub(super) key: usize,

    pub(super) gml_id: Option<usize>,

    /// Encoded feature payload.
    pub(super) data: Option<usize>,

    pub(super) properties: Vec<(&'a QName, ReadNode<'a>)>,
}

#[derive(Debug)]
pub(super) struct ReadNode<'a> {
    pub(super) mapping: &'a Mapping,

    /// Key of the joined row holding the value; distinguishes occurrences.
    pub(super) key: Option<usize>,

    pub(super) kind: ReadKind<'a>,
}

#[derive(Debug)]
pub(super) enum ReadKind<'a> {
    Primitive { column: usize, ty: PrimitiveType },
    Geometry { column: usize, crs: &'a Crs },
    Reference { column: usize },
    Code { value: usize, code_space: usize },
    Compound(Vec<ReadNode<'a>>),
}

impl FeatureQuery<'_> {
    /// Rebuilds features from the result rows. Rows multiplied by joins are
    /// grouped by feature key, and joined values are de-duplicated by the key
    /// of the row holding them.
    ///
    /// An encoded payload, when present, takes precedence over the columns.
    pub fn reconstruct(&self, rows: &[Row], codec: &dyn FeatureCodec) -> Result<Vec<Feature>> {
        let plan = &self.plan;

        let mut features: IndexMap<String, Vec<&Row>> = IndexMap::new();
        for row in rows {
            let key = row.get(plan.key)?.to_key_string()?;
            features.entry(key).or_default().push(row);
        }

        features
            .iter()
            .map(|(key, rows)| plan.read_feature(key, rows, codec))
            .collect()
    }
}

impl ReadPlan<'_> {
    fn read_feature(&self, key: &str, rows: &[&Row], codec: &dyn FeatureCodec) -> Result<Feature> {
        let Some(first) = rows.first() else {
            return Err(Error::invalid_result("feature without rows"));
        };

        let gml_id = match self.gml_id {
            Some(column) => Some(first.get(column)?.to_key_string()?),
            None => None,
        };

        if let Some(column) = self.data {
            if let Some(bytes) = first.get(column)?.as_bytes() {
                let mut feature = codec.decode(bytes)?;
                if feature.id.is_none() {
                    feature.id = gml_id;
                }
                return Ok(feature);
            }
        }

        let id = gml_id.unwrap_or_else(|| self.mapping.fid.external_id(key));
        let mut feature = Feature::new(self.mapping.name.clone()).with_id(id);

        for (name, node) in &self.properties {
            for value in node.read(rows)? {
                feature.push((*name).clone(), value);
            }
        }

        Ok(feature)
    }
}

impl ReadNode<'_> {
    /// Values of this node across `rows`, one per occurrence.
    fn read(&self, rows: &[&Row]) -> Result<Vec<FeatureValue>> {
        let Some(key) = self.key else {
            return Ok(self.kind.read(rows)?.into_iter().collect());
        };

        let mut occurrences: IndexMap<String, Vec<&Row>> = IndexMap::new();
        for row in rows {
            let value = row.get(key)?;
            if value.is_null() {
                continue;
            }
            occurrences
                .entry(value.to_key_string()?)
                .or_default()
                .push(row);
        }

        let mut out = vec![];
        for rows in occurrences.values() {
            out.extend(self.kind.read(rows)?);
        }
        Ok(out)
    }
}

impl ReadKind<'_> {
    fn read(&self, rows: &[&Row]) -> Result<Option<FeatureValue>> {
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let value = match self {
            ReadKind::Primitive { column, ty } => {
                value::from_column(row.get(*column)?, *ty)?.map(FeatureValue::Primitive)
            }
            ReadKind::Geometry { column, crs } => {
                let value = row.get(*column)?;
                if value.is_null() {
                    None
                } else {
                    let bytes = value.as_bytes().ok_or_else(|| {
                        Error::invalid_result(format!("expected well-known binary, got {value:?}"))
                    })?;
                    Some(Geometry::new((*crs).clone(), bytes.to_vec()).into())
                }
            }
            ReadKind::Reference { column } => {
                let value = row.get(*column)?;
                if value.is_null() {
                    None
                } else {
                    Some(FeatureValue::reference(value.to_key_string()?))
                }
            }
            ReadKind::Code { value, code_space } => {
                let value = row.get(*value)?;
                if value.is_null() {
                    None
                } else {
                    let code_space = row.get(*code_space)?.as_str();
                    Some(FeatureValue::code(value.to_key_string()?, code_space))
                }
            }
            ReadKind::Compound(particles) => read_complex(particles, rows)?,
        };

        Ok(value)
    }
}

fn read_complex(particles: &[ReadNode<'_>], rows: &[&Row]) -> Result<Option<FeatureValue>> {
    let mut complex = ComplexValue::default();

    for particle in particles {
        let values = particle.read(rows)?;

        match particle.mapping.path.steps.as_slice() {
            [PathStep::Element(name)] => {
                complex
                    .children
                    .extend(values.into_iter().map(|value| Property {
                        name: name.clone(),
                        value,
                    }));
            }
            [PathStep::Attribute(name)] => {
                if let Some(value) = first_primitive(values) {
                    complex.attributes.push(Attribute {
                        name: name.clone(),
                        value,
                    });
                }
            }
            [PathStep::Text] => complex.text = first_primitive(values),
            _ => {}
        }
    }

    if complex.attributes.is_empty() && complex.text.is_none() && complex.children.is_empty() {
        Ok(None)
    } else {
        Ok(Some(complex.into()))
    }
}

fn first_primitive(values: Vec<FeatureValue>) -> Option<PrimitiveValue> {
    values.into_iter().find_map(|value| match value {
        FeatureValue::Primitive(value) => Some(value),
        _ => None,
    })
}
